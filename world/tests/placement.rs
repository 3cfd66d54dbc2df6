use std::time::Duration;

use glam::Vec2;
use skirmish_core::{
    BattleConfig, BattlePhase, CellCoord, Command, Event, PlacementError, RemovalError,
    StartError, Team, Treasury, UnitKind,
};
use skirmish_system_economy::GoldLedger;
use skirmish_world::{self as world, query, World};

fn centre(world: &World, column: u32, row: u32) -> Vec2 {
    query::grid(world).cell_center(CellCoord::new(column, row))
}

fn place(
    world: &mut World,
    ledger: &mut GoldLedger,
    kind: UnitKind,
    team: Team,
    column: u32,
    row: u32,
) -> Vec<Event> {
    let mut events = Vec::new();
    let position = centre(world, column, row);
    world::apply(
        world,
        Command::PlaceUnit {
            kind,
            team,
            position,
            treasury: ledger.treasury(),
        },
        &mut events,
    );
    ledger.handle(&events);
    events
}

fn start(world: &mut World) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, Command::StartBattle, &mut events);
    events
}

#[test]
fn setup_placement_is_free_and_occupies_cell() {
    let mut world = World::new();
    let mut ledger = GoldLedger::new(500);

    let events = place(&mut world, &mut ledger, UnitKind::Archer, Team::Blue, 2, 3);

    assert!(matches!(
        events.as_slice(),
        [Event::UnitSpawned {
            kind: UnitKind::Archer,
            team: Team::Blue,
            ..
        }]
    ));
    assert_eq!(ledger.balance(Team::Blue), 500);
    assert!(query::occupancy_view(&world)
        .occupant(CellCoord::new(2, 3))
        .is_some());
    assert_eq!(query::roster(&world, Team::Blue).len(), 1);
    assert!(query::roster(&world, Team::Red).is_empty());
}

#[test]
fn charged_setup_placement_bills_the_half_owner() {
    let config = BattleConfig {
        charge_setup_placement: true,
        ..BattleConfig::default()
    };
    let mut world = World::with_config(config);
    let mut ledger = GoldLedger::new(500);

    let events = place(&mut world, &mut ledger, UnitKind::Warrior, Team::Blue, 12, 0);

    assert!(events.contains(&Event::UnitPlaced {
        team: Team::Red,
        cost: 80,
    }));
    assert_eq!(ledger.balance(Team::Red), 420);
    assert_eq!(ledger.balance(Team::Blue), 500);
    assert_eq!(query::roster(&world, Team::Blue).len(), 1);
}

#[test]
fn occupied_and_outside_cells_are_rejected() {
    let mut world = World::new();
    let mut ledger = GoldLedger::new(500);
    let _ = place(&mut world, &mut ledger, UnitKind::Lancer, Team::Red, 9, 1);

    let events = place(&mut world, &mut ledger, UnitKind::Archer, Team::Red, 9, 1);
    assert!(matches!(
        events.as_slice(),
        [Event::PlacementRejected {
            reason: PlacementError::CellOccupied,
            ..
        }]
    ));

    let mut events = Vec::new();
    let outside = Vec2::new(-5.0, 20.0);
    let result = world.place_unit(
        UnitKind::Archer,
        Team::Blue,
        outside,
        Treasury::default(),
        &mut events,
    );
    assert_eq!(result, Err(PlacementError::InvalidCell));
    assert!(events.is_empty(), "rejections must not mutate state");
    assert_eq!(query::unit_view(&world).into_vec().len(), 1);
}

#[test]
fn reinforcements_cost_gold_during_battle() {
    let mut world = World::new();
    let mut ledger = GoldLedger::with_balances(100, 30);
    let _ = place(&mut world, &mut ledger, UnitKind::Archer, Team::Blue, 0, 0);
    let _ = place(&mut world, &mut ledger, UnitKind::Archer, Team::Red, 15, 7);
    let _ = start(&mut world);

    let events = place(&mut world, &mut ledger, UnitKind::Archer, Team::Red, 14, 7);
    assert!(matches!(
        events.as_slice(),
        [Event::PlacementRejected {
            reason: PlacementError::InsufficientFunds,
            ..
        }]
    ));
    assert_eq!(ledger.balance(Team::Red), 30);

    let events = place(&mut world, &mut ledger, UnitKind::Archer, Team::Blue, 1, 0);
    assert!(events.contains(&Event::UnitPlaced {
        team: Team::Blue,
        cost: 50,
    }));
    assert_eq!(ledger.balance(Team::Blue), 50);
}

#[test]
fn place_then_remove_restores_cell_and_ledger() {
    let config = BattleConfig {
        charge_setup_placement: true,
        ..BattleConfig::default()
    };
    let mut world = World::with_config(config);
    let mut ledger = GoldLedger::new(300);
    let _ = place(&mut world, &mut ledger, UnitKind::Lancer, Team::Blue, 4, 4);
    assert_eq!(ledger.balance(Team::Blue), 200);

    let mut events = Vec::new();
    let position = centre(&world, 4, 4);
    world::apply(&mut world, Command::RemoveUnit { position }, &mut events);
    ledger.handle(&events);

    assert!(matches!(
        events.as_slice(),
        [Event::UnitRemoved {
            team: Team::Blue,
            refund: 100,
            ..
        }]
    ));
    assert_eq!(ledger.balance(Team::Blue), 300);
    assert!(query::occupancy_view(&world).is_free(CellCoord::new(4, 4)));
    assert!(query::roster(&world, Team::Blue).is_empty());
}

#[test]
fn removal_is_rejected_outside_setup_or_on_empty_cells() {
    let mut world = World::new();
    let mut ledger = GoldLedger::new(0);
    let mut events = Vec::new();

    assert_eq!(
        world.remove_unit(centre(&world, 3, 3), &mut events),
        Err(RemovalError::EmptyCell)
    );
    assert_eq!(
        world.remove_unit(Vec2::new(5_000.0, 0.0), &mut events),
        Err(RemovalError::InvalidCell)
    );

    let _ = place(&mut world, &mut ledger, UnitKind::Pawn, Team::Blue, 3, 3);
    let _ = place(&mut world, &mut ledger, UnitKind::Pawn, Team::Red, 12, 3);
    let _ = start(&mut world);

    let position = centre(&world, 3, 3);
    world::apply(&mut world, Command::RemoveUnit { position }, &mut events);
    assert_eq!(
        events.last(),
        Some(&Event::RemovalRejected {
            position,
            reason: RemovalError::InvalidPhase,
        })
    );
    assert_eq!(query::roster(&world, Team::Blue).len(), 1);
}

#[test]
fn battle_requires_both_teams_and_starts_once() {
    let mut world = World::new();
    let mut ledger = GoldLedger::new(0);
    let _ = place(&mut world, &mut ledger, UnitKind::Warrior, Team::Blue, 1, 1);

    assert_eq!(
        start(&mut world),
        vec![Event::BattleStartRejected {
            reason: StartError::MissingOpponents,
        }]
    );
    assert_eq!(query::phase(&world), BattlePhase::Setup);

    let _ = place(&mut world, &mut ledger, UnitKind::Warrior, Team::Red, 14, 1);
    assert_eq!(
        start(&mut world),
        vec![Event::PhaseChanged {
            phase: BattlePhase::Battle,
        }]
    );
    assert_eq!(
        start(&mut world),
        vec![Event::BattleStartRejected {
            reason: StartError::InvalidPhase,
        }]
    );
}

#[test]
fn clear_all_is_idempotent() {
    let mut world = World::new();
    let mut ledger = GoldLedger::new(0);
    let _ = place(&mut world, &mut ledger, UnitKind::Archer, Team::Blue, 2, 2);
    let _ = place(&mut world, &mut ledger, UnitKind::Archer, Team::Red, 13, 2);
    let _ = start(&mut world);

    let mut events = Vec::new();
    for _ in 0..80 {
        world::apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(16),
            },
            &mut events,
        );
    }

    let mut first = Vec::new();
    world::apply(&mut world, Command::ClearAll, &mut first);
    assert_eq!(
        first,
        vec![
            Event::PhaseChanged {
                phase: BattlePhase::Setup,
            },
            Event::BattleCleared,
        ]
    );

    let mut second = Vec::new();
    world::apply(&mut world, Command::ClearAll, &mut second);
    assert_eq!(second, vec![Event::BattleCleared]);

    assert_eq!(query::phase(&world), BattlePhase::Setup);
    assert!(query::unit_view(&world).into_vec().is_empty());
    assert!(query::projectiles(&world).is_empty());
    assert!(query::occupancy_view(&world).iter().all(|cell| cell.is_none()));
}

#[test]
fn halves_split_the_board() {
    let world = World::new();
    assert_eq!(query::half_of(&world, CellCoord::new(7, 0)), Team::Blue);
    assert_eq!(query::half_of(&world, CellCoord::new(8, 7)), Team::Red);
    assert_eq!(
        query::cell_at(&world, Vec2::new(61.0, 73.0)),
        Some(CellCoord::new(1, 1))
    );
    assert_eq!(query::welcome_banner(&world), "Welcome to Skirmish.");
}
