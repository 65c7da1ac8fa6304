//! Headless runner: load a level, tick it, print a JSON summary.
//!
//! ```text
//! sneak-headless level.txt --ticks 600 --dt-ms 16 --trap --steer right
//! RUST_LOG=sneak_engine=debug sneak-headless level.txt
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use serde::Serialize;
use sneak_engine::prelude::*;

/// Run a stealth-maze level without a window.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Level grid text file.
    level: PathBuf,

    /// Number of ticks to run.
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Simulated milliseconds per tick.
    #[arg(long = "dt-ms", default_value_t = 16.0)]
    dt_ms: f32,

    /// JSON file overriding the default tuning.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Level number, for per-level tuning such as which levels patrol.
    #[arg(long = "level-number")]
    level_number: Option<u32>,

    /// Spring a trap before the first tick so the guard gives chase.
    #[arg(long)]
    trap: bool,

    /// Hold a direction key for the whole run.
    #[arg(long, value_enum)]
    steer: Option<Direction>,

    /// Stop as soon as the player is caught or escapes.
    #[arg(long)]
    stop_on_end: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl From<Direction> for Facing {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Up => Facing::Up,
            Direction::Down => Facing::Down,
            Direction::Left => Facing::Left,
            Direction::Right => Facing::Right,
        }
    }
}

#[derive(Serialize)]
struct Summary {
    ticks: u64,
    sim_ms: f64,
    status: &'static str,
    outcomes: Vec<Outcome>,
    player: Vec2,
    pursuers: Vec<Vec2>,
    pending_events: usize,
}

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    anyhow::ensure!(
        args.dt_ms.is_finite() && args.dt_ms > 0.0,
        "--dt-ms must be positive, got {}",
        args.dt_ms
    );

    let config = match &args.config {
        Some(path) => SimConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SimConfig::default(),
    };
    let config = match args.level_number {
        Some(number) => config.for_level(number),
        None => config,
    };
    let text = std::fs::read_to_string(&args.level)
        .with_context(|| format!("reading level {}", args.level.display()))?;
    let grid = LevelGrid::parse(&text)
        .with_context(|| format!("parsing level {}", args.level.display()))?;
    let mut sim = Simulation::new(grid, config).context("spawning level")?;

    if args.trap {
        let sprung = sim.spring_trap();
        tracing::info!(?sprung, "pursuit armed from the command line");
    }
    if let Some(direction) = args.steer {
        sim.steer(Some(direction.into()));
    }

    let mut outcomes = Vec::new();
    for _ in 0..args.ticks {
        outcomes.extend(sim.tick(args.dt_ms).outcomes);
        if args.stop_on_end && sim.status() != RunStatus::Running {
            break;
        }
    }

    let world = sim.world();
    let position = |e: EntityId| {
        world
            .get_component::<Motion>(e)
            .map(|m| m.position)
            .unwrap_or(Vec2::ZERO)
    };
    let summary = Summary {
        ticks: sim.tick_count(),
        sim_ms: sim.now_ms(),
        status: match sim.status() {
            RunStatus::Running => "running",
            RunStatus::Caught => "caught",
            RunStatus::Won => "won",
        },
        outcomes,
        player: position(sim.player()),
        pursuers: world.entities_with::<Pursuer>().into_iter().map(position).collect(),
        pending_events: sim.scheduler().len(),
    };
    tracing::info!(ticks = summary.ticks, status = summary.status, "run finished");
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
