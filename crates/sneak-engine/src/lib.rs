//! Sneak Engine -- simulation core for a grid-based stealth maze.
//!
//! This crate builds on [`sneak_ecs`] to run one level of the game: a
//! player slips through a walled grid while a patrolling guard, sweeping
//! lights and cameras, traps and scripted tools react to it. The core is
//! headless and single-threaded; the [`World`](sneak_ecs::world::World) is
//! passed explicitly to every system.
//!
//! The pieces, in the order a tick runs them:
//!
//! - [`scheduler`] and [`events`]: deferred one-shot actions used by tools.
//! - [`pathfinder`]: rate-limited BFS pursuit once a trap has been sprung.
//! - [`motion`]: velocity rate limiting and integration.
//! - [`collision`]: bounding-circle overlaps and the player/wall stop.
//! - [`reactions`]: what the player's collisions mean for the game.
//! - [`turn`]: patrol and light-sweep reversal.
//!
//! [`tick::Simulation`] strings them together.
//!
//! # Quick Start
//!
//! ```
//! use sneak_engine::prelude::*;
//!
//! let level = "\
//! WWWWWWWWWWWW
//! W          W
//! W S      G W
//! W    T     W
//! W          W
//! WWWWWWWWWWWW";
//! let grid = LevelGrid::parse(level).unwrap();
//! let mut sim = Simulation::new(grid, SimConfig::default()).unwrap();
//!
//! sim.steer(Some(Facing::Right));
//! let outcomes = sim.run_ticks(60, 16.0);
//! println!("{} outcomes", outcomes.len());
//! assert_eq!(sim.tick_count(), 60);
//! ```

#![deny(unsafe_code)]

pub mod collision;
pub mod components;
pub mod config;
pub mod events;
pub mod level;
pub mod math;
pub mod motion;
pub mod pathfinder;
pub mod reactions;
pub mod scheduler;
pub mod tick;
pub mod tools;
pub mod turn;

/// Re-export the ECS crate for convenience.
pub use sneak_ecs;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use sneak_ecs::prelude::*;

    pub use crate::collision::{CollisionRecord, CollisionSet, WallStop};
    pub use crate::components::{
        Camera, Caught, Conversation, Deadly, Exit, Facing, Halted, Light, Motion, Pickup, Player,
        Pursuer, Stopable, ToolKind, Trap, Trappable, Victorious,
    };
    pub use crate::config::{ConfigError, EntitySizes, SimConfig};
    pub use crate::events::{EventAction, EventContext, EventScheduler};
    pub use crate::level::{GridCell, LevelError, LevelGrid, LightKind, LightSpawn, WallCell};
    pub use crate::math::Vec2;
    pub use crate::pathfinder::Pursuit;
    pub use crate::reactions::Outcome;
    pub use crate::scheduler::{ScheduledEvent, Scheduler};
    pub use crate::tick::{RunStatus, Simulation, TickDiagnostics, TickReport};
    pub use crate::tools::{Inventory, ToolError, ToolUse};
    pub use crate::turn::TurnTimer;
}
