#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a Skirmish battle headlessly.

mod scenario;

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use skirmish_core::{Command, Event, Team};
use skirmish_system_economy::GoldLedger;
use skirmish_world::{self as world, query, World};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::scenario::Scenario;

const BUNDLED_SCENARIO: &str = include_str!("../scenarios/skirmish.toml");

/// Headless two-team autobattler.
#[derive(Parser, Debug)]
#[command(name = "skirmish")]
#[command(about = "Place two armies from a TOML scenario and let them fight")]
struct Args {
    /// Scenario file; the bundled three-on-three is used when omitted.
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Overrides the number of simulated frames.
    #[arg(long)]
    frames: Option<u32>,

    /// Overrides the frame length in milliseconds.
    #[arg(long)]
    frame_ms: Option<u64>,

    /// Log filter directive, takes precedence over RUST_LOG.
    #[arg(long)]
    log: Option<String>,
}

/// Entry point for the Skirmish command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log.as_deref())?;

    let mut scenario = match &args.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::parse(BUNDLED_SCENARIO).context("bundled scenario is invalid")?,
    };
    if let Some(frames) = args.frames {
        scenario.frames = frames;
    }
    if let Some(frame_ms) = args.frame_ms {
        scenario.frame_ms = frame_ms;
    }

    run(&scenario)
}

fn init_tracing(directive: Option<&str>) -> Result<()> {
    let filter = match directive {
        Some(directive) => EnvFilter::try_new(directive)
            .with_context(|| format!("invalid log filter {directive:?}"))?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("skirmish=info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn run(scenario: &Scenario) -> Result<()> {
    let mut world = World::with_config(scenario.config.clone());
    let mut ledger = GoldLedger::new(scenario.starting_gold);
    let grid = query::grid(&world);
    println!("{}", query::welcome_banner(&world));

    let mut events = Vec::new();
    for spec in &scenario.placement {
        events.clear();
        world::apply(
            &mut world,
            Command::PlaceUnit {
                kind: spec.kind,
                team: spec.team_on(&grid),
                position: grid.cell_center(spec.cell()),
                treasury: ledger.treasury(),
            },
            &mut events,
        );
        ledger.handle(&events);
        for event in &events {
            if let Event::PlacementRejected { reason, .. } = event {
                warn!(
                    kind = ?spec.kind,
                    column = spec.column,
                    row = spec.row,
                    %reason,
                    "placement skipped"
                );
            }
        }
    }

    events.clear();
    world::apply(&mut world, Command::StartBattle, &mut events);
    if let Some(Event::BattleStartRejected { reason }) = events.first() {
        bail!("battle could not start: {reason}");
    }
    info!(
        blue = query::roster(&world, Team::Blue).len(),
        red = query::roster(&world, Team::Red).len(),
        "battle started"
    );

    let dt = Duration::from_millis(scenario.frame_ms);
    let mut outcome = None;
    let mut elapsed = 0u32;
    while elapsed < scenario.frames && outcome.is_none() {
        events.clear();
        world::apply(&mut world, Command::Tick { dt }, &mut events);
        ledger.handle(&events);
        elapsed += 1;
        outcome = events.iter().find_map(|event| match event {
            Event::BattleDecided { winner } => Some(*winner),
            _ => None,
        });
    }

    match outcome {
        Some(Some(team)) => println!("{team:?} wins after {elapsed} frames"),
        Some(None) => println!("Both armies fell after {elapsed} frames"),
        None => println!("No decision after {elapsed} frames"),
    }
    for team in Team::ALL {
        let roster = query::roster(&world, team);
        println!(
            "{team:?}: {} standing, {} gold",
            roster.len(),
            ledger.balance(team)
        );
        for unit in roster {
            println!(
                "  {:?} #{} {}/{} hp",
                unit.kind,
                unit.id.get(),
                unit.hp,
                unit.max_hp
            );
        }
    }
    Ok(())
}
