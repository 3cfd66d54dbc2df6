//! TOML scenario files describing a headless battle.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use skirmish_core::{BattleConfig, BattleGrid, CellCoord, Team, UnitKind};

/// Battle setup loaded from disk.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct Scenario {
    pub(crate) config: BattleConfig,
    pub(crate) placement: Vec<PlacementSpec>,
    pub(crate) starting_gold: u32,
    pub(crate) frames: u32,
    pub(crate) frame_ms: u64,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            config: BattleConfig::default(),
            placement: Vec::new(),
            starting_gold: 200,
            frames: 3_600,
            frame_ms: 16,
        }
    }
}

/// One unit dropped on the board before the battle starts.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub(crate) struct PlacementSpec {
    pub(crate) kind: UnitKind,
    /// Defaults to the owner of the half containing the cell.
    #[serde(default)]
    pub(crate) team: Option<Team>,
    pub(crate) column: u32,
    pub(crate) row: u32,
}

impl PlacementSpec {
    pub(crate) fn cell(&self) -> CellCoord {
        CellCoord::new(self.column, self.row)
    }

    pub(crate) fn team_on(&self, grid: &BattleGrid) -> Team {
        self.team.unwrap_or_else(|| grid.half_of(self.cell()))
    }
}

impl Scenario {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid scenario {}", path.display()))
    }

    pub(crate) fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
