//! Dense cell ownership for the battlefield.

use skirmish_core::{CellCoord, OccupancyView, UnitId};

/// Row-major grid recording which living unit owns each cell.
#[derive(Clone, Debug)]
pub(crate) struct OccupancyGrid {
    columns: u32,
    rows: u32,
    cells: Vec<Option<UnitId>>,
}

impl OccupancyGrid {
    pub(crate) fn new(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            cells: vec![None; capacity],
        }
    }

    pub(crate) fn clear(&mut self) {
        self.cells.fill(None);
    }

    pub(crate) fn occupant(&self, cell: CellCoord) -> Option<UnitId> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    /// Cells outside the grid are never free.
    pub(crate) fn is_free(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .is_some_and(|index| self.cells.get(index).copied().flatten().is_none())
    }

    pub(crate) fn occupy(&mut self, unit: UnitId, cell: CellCoord) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = Some(unit);
            }
        }
    }

    /// Frees `cell` only while `unit` still owns it.
    pub(crate) fn vacate(&mut self, unit: UnitId, cell: CellCoord) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                if *slot == Some(unit) {
                    *slot = None;
                }
            }
        }
    }

    pub(crate) fn view(&self) -> OccupancyView<'_> {
        OccupancyView::new(&self.cells, self.columns, self.rows)
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vacate_ignores_foreign_owner() {
        let mut grid = OccupancyGrid::new(4, 3);
        let cell = CellCoord::new(2, 1);
        grid.occupy(UnitId::new(1), cell);
        grid.vacate(UnitId::new(2), cell);
        assert_eq!(grid.occupant(cell), Some(UnitId::new(1)));
        grid.vacate(UnitId::new(1), cell);
        assert!(grid.is_free(cell));
    }

    #[test]
    fn outside_cells_are_never_free() {
        let grid = OccupancyGrid::new(4, 3);
        assert!(!grid.is_free(CellCoord::new(4, 0)));
        assert_eq!(grid.view().dimensions(), (4, 3));
    }
}
