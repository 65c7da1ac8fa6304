//! The per-tick driver that owns a running level.
//!
//! Each [`Simulation::tick`] runs the phases in a fixed order:
//!
//! 1. due scheduled events fire,
//! 2. pursuit recomputes chase vectors (when armed),
//! 3. velocities are rate limited and positions advance,
//! 4. overlaps are detected and the player's halt is released if clear,
//! 5. the player's collisions are reacted to,
//! 6. turn timers reverse patrols and sweeps, and guard facing updates.
//!
//! The collision set is cleared before the tick returns.
//!
//! # Example
//!
//! ```
//! use sneak_engine::prelude::*;
//!
//! let grid = LevelGrid::parse("WWWWWWWW\nW S    W\nW    E W\nWWWWWWWW").unwrap();
//! let mut sim = Simulation::new(grid, SimConfig::default()).unwrap();
//! for _ in 0..10 {
//!     sim.tick(16.0);
//! }
//! assert_eq!(sim.tick_count(), 10);
//! ```

use std::time::{Duration, Instant};

use sneak_ecs::prelude::*;

use crate::collision::{self, CollisionRecord, CollisionSet};
use crate::components::{
    Caught, Conversation, Facing, Halted, Motion, Player, ToolKind, Trap, Trappable, Victorious,
};
use crate::config::SimConfig;
use crate::events::{self, EventContext, EventScheduler};
use crate::level::{spawn_level, LevelError, LevelGrid};
use crate::math::Vec2;
use crate::motion;
use crate::pathfinder::Pursuit;
use crate::reactions::{self, Outcome};
use crate::tools::{self, Inventory, ToolError, ToolUse};
use crate::turn;

// ---------------------------------------------------------------------------
// TickReport / TickDiagnostics
// ---------------------------------------------------------------------------

/// What one tick observed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Every collision record of the tick, both directions.
    pub collisions: Vec<CollisionRecord>,
    /// Entities whose turn timer ran out.
    pub turns: Vec<EntityId>,
    pub outcomes: Vec<Outcome>,
    /// Scheduled events fired.
    pub events_fired: usize,
    /// Whether pursuit recomputed its chase vectors.
    pub chase_updated: bool,
}

/// Timing diagnostics for the last tick.
#[derive(Debug, Clone, Default)]
pub struct TickDiagnostics {
    /// Wall-clock time per phase, in execution order.
    pub phase_times: Vec<(&'static str, Duration)>,
    pub total_time: Duration,
}

/// Coarse state of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Caught,
    Won,
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// A level being played.
pub struct Simulation {
    world: World,
    scheduler: EventScheduler,
    pursuit: Pursuit,
    grid: LevelGrid,
    inventory: Inventory,
    config: SimConfig,
    collisions: CollisionSet,
    now_ms: f64,
    tick_counter: u64,
    last_diagnostics: TickDiagnostics,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &self.tick_counter)
            .field("now_ms", &self.now_ms)
            .field("entities", &self.world.entity_count())
            .field("pending_events", &self.scheduler.len())
            .finish()
    }
}

impl Simulation {
    /// Spawn `grid` into a fresh world.
    pub fn new(grid: LevelGrid, config: SimConfig) -> Result<Self, LevelError> {
        let mut world = World::new();
        spawn_level(&mut world, &grid, &config)?;
        Ok(Self {
            world,
            scheduler: EventScheduler::new(),
            pursuit: Pursuit::new(&config),
            grid,
            inventory: Inventory::new(),
            config,
            collisions: CollisionSet::new(),
            now_ms: 0.0,
            tick_counter: 0,
            last_diagnostics: TickDiagnostics::default(),
        })
    }

    /// Advance the simulation by `elapsed_ms` of simulated time.
    pub fn tick(&mut self, elapsed_ms: f32) -> TickReport {
        let tick_start = Instant::now();
        let mut phase_times = Vec::with_capacity(6);
        let mut report = TickReport::default();
        self.now_ms += f64::from(elapsed_ms);

        let start = Instant::now();
        let mut ctx = EventContext {
            world: &mut self.world,
            pursuit: &mut self.pursuit,
            config: &self.config,
        };
        report.events_fired = events::run_due(&mut self.scheduler, self.now_ms, &mut ctx);
        phase_times.push(("events", start.elapsed()));

        let start = Instant::now();
        report.chase_updated = self.pursuit.step(&mut self.world, &self.grid, elapsed_ms);
        phase_times.push(("pursuit", start.elapsed()));

        let start = Instant::now();
        motion::step(&mut self.world, elapsed_ms);
        phase_times.push(("motion", start.elapsed()));

        let start = Instant::now();
        collision::detect(&self.world, self.config.light_inflation, &mut self.collisions);
        collision::release_halt_if_clear(&mut self.world);
        phase_times.push(("collision", start.elapsed()));

        let start = Instant::now();
        report.outcomes = reactions::react(
            &mut self.world,
            &self.collisions,
            &mut self.inventory,
            self.config.wall_push,
        );
        phase_times.push(("reactions", start.elapsed()));

        let start = Instant::now();
        report.turns = turn::update_turns(&mut self.world, elapsed_ms);
        turn::update_pursuer_facing(&mut self.world);
        phase_times.push(("turns", start.elapsed()));

        report.collisions = self.collisions.records().to_vec();
        self.collisions.clear();
        self.tick_counter += 1;
        self.last_diagnostics = TickDiagnostics {
            phase_times,
            total_time: tick_start.elapsed(),
        };
        if !report.outcomes.is_empty() {
            tracing::debug!(tick = self.tick_counter, outcomes = ?report.outcomes, "tick outcomes");
        }
        report
    }

    /// Run `count` ticks of `elapsed_ms` each, collecting every outcome.
    pub fn run_ticks(&mut self, count: u64, elapsed_ms: f32) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        for _ in 0..count {
            outcomes.extend(self.tick(elapsed_ms).outcomes);
        }
        outcomes
    }

    /// Reload the level from its grid.
    ///
    /// Pending events are dropped, pursuit is reset, the inventory is
    /// emptied and the clock returns to zero.
    pub fn restart(&mut self) -> Result<(), LevelError> {
        self.scheduler.clear();
        self.pursuit.reset();
        self.world.clear();
        self.inventory.clear();
        self.collisions.clear();
        self.now_ms = 0.0;
        self.tick_counter = 0;
        spawn_level(&mut self.world, &self.grid, &self.config)?;
        tracing::info!("level restarted");
        Ok(())
    }

    // -- input --------------------------------------------------------------

    /// Point the player's velocity goal in `direction`, or stop it with
    /// `None`. Ignored while the player is halted.
    pub fn steer(&mut self, direction: Option<Facing>) {
        let Some(player) = self.world.first_with::<Player>() else {
            return;
        };
        if self.world.has_component::<Halted>(player) {
            return;
        }
        let speed = self.config.player_speed;
        let goal = match direction {
            None => Vec2::ZERO,
            Some(Facing::Up) => Vec2::new(0.0, -speed),
            Some(Facing::Down) => Vec2::new(0.0, speed),
            Some(Facing::Left) => Vec2::new(-speed, 0.0),
            Some(Facing::Right) => Vec2::new(speed, 0.0),
        };
        if let Some(m) = self.world.get_component_mut::<Motion>(player) {
            m.velocity_goal = goal;
        }
        if let Some(facing) = direction {
            self.world
                .insert_component(player, facing)
                .expect("player read above is alive");
        }
    }

    /// Answer every NPC currently talking to the player: `crime` reports a
    /// crime, otherwise none. Ignored once the player has won.
    ///
    /// Returns the NPCs that reached a verdict.
    pub fn answer_conversation(&mut self, crime: bool) -> Vec<EntityId> {
        let won = self
            .world
            .first_with::<Player>()
            .is_some_and(|p| self.world.has_component::<Victorious>(p));
        if won {
            return Vec::new();
        }
        let mut settled = Vec::new();
        for npc in self.world.entities_with::<Conversation>() {
            if let Some(state) = self.world.get_component_mut::<Conversation>(npc) {
                let before = *state;
                let after = before.on_answer(crime);
                *state = after;
                if before != after {
                    tracing::info!(%npc, verdict = ?after, "conversation settled");
                    settled.push(npc);
                }
            }
        }
        settled
    }

    /// Let the player move again after hitting a wall.
    pub fn release_halt(&mut self) -> bool {
        collision::release_halt(&mut self.world)
    }

    /// Use a held tool, consuming it on success.
    ///
    /// A failed use (say, a hammer aimed at open floor) keeps the tool.
    pub fn use_tool(&mut self, tool: ToolUse) -> Result<(), ToolError> {
        let kind = tool.kind();
        if !self.inventory.contains(kind) {
            return Err(ToolError::NotInInventory(kind));
        }
        let mut ctx = EventContext {
            world: &mut self.world,
            pursuit: &mut self.pursuit,
            config: &self.config,
        };
        tools::apply(tool, &mut ctx, &mut self.scheduler, self.now_ms)?;
        self.inventory.take(kind)
    }

    /// Put a tool straight into the inventory.
    pub fn give_tool(&mut self, tool: ToolKind) {
        self.inventory.add(tool);
    }

    /// Spring the first unsprung trap as if the player had touched it, or
    /// arm pursuit directly if the level has no trap. Returns the trap
    /// sprung, if any.
    pub fn spring_trap(&mut self) -> Option<EntityId> {
        match self.world.first_with::<Trap>() {
            Some(trap) => {
                reactions::spring_trap(&mut self.world, trap);
                Some(trap)
            }
            None => {
                if self.world.count::<Trappable>() == 0 {
                    self.world.spawn_with(Trappable);
                }
                None
            }
        }
    }

    // -- accessors ----------------------------------------------------------

    /// Whether the run is still going, lost or won.
    pub fn status(&self) -> RunStatus {
        match self.world.first_with::<Player>() {
            Some(p) if self.world.has_component::<Caught>(p) => RunStatus::Caught,
            Some(p) if self.world.has_component::<Victorious>(p) => RunStatus::Won,
            _ => RunStatus::Running,
        }
    }

    /// The player entity.
    ///
    /// # Panics
    ///
    /// Panics if the level has no player, which [`spawn_level`] rules out.
    pub fn player(&self) -> EntityId {
        self.world
            .first_with::<Player>()
            .expect("running level has no player")
    }

    /// Ticks run since the level (re)started.
    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// Simulated milliseconds since the level (re)started.
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// The world being simulated.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world access for setup and tests.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The level the world was spawned from.
    pub fn grid(&self) -> &LevelGrid {
        &self.grid
    }

    /// The tuning in use.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Tools the player holds.
    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Events waiting to fire.
    pub fn scheduler(&self) -> &EventScheduler {
        &self.scheduler
    }

    /// Pursuit state, for inspection.
    pub fn pursuit(&self) -> &Pursuit {
        &self.pursuit
    }

    /// Phase timings of the most recent tick.
    pub fn last_diagnostics(&self) -> &TickDiagnostics {
        &self.last_diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Pursuer;

    const ROOM: &str = "\
WWWWWWWWWWWWWWWWWWWW
W                  W
W  S           G   W
W                  W
W                  W
WWWWWWWWWWWWWWWWWWWW";

    fn sim() -> Simulation {
        Simulation::new(LevelGrid::parse(ROOM).unwrap(), SimConfig::default()).unwrap()
    }

    #[test]
    fn tick_advances_clock_and_diagnostics() {
        let mut sim = sim();
        sim.tick(16.0);
        sim.tick(16.0);
        assert_eq!(sim.tick_count(), 2);
        assert_eq!(sim.now_ms(), 32.0);
        let names: Vec<&str> = sim.last_diagnostics().phase_times.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec!["events", "pursuit", "motion", "collision", "reactions", "turns"]
        );
    }

    #[test]
    fn steer_moves_player() {
        let mut sim = sim();
        let player = sim.player();
        let before = sim.world().get_component::<Motion>(player).unwrap().position;
        sim.steer(Some(Facing::Down));
        // Velocity ramps by elapsed_ms per tick; 200 reached within one 250 ms tick.
        sim.tick(250.0);
        let after = sim.world().get_component::<Motion>(player).unwrap().position;
        assert!(after.y > before.y);
        assert_eq!(sim.world().get_component::<Facing>(player), Some(&Facing::Down));
    }

    #[test]
    fn using_missing_tool_fails() {
        let mut sim = sim();
        assert_eq!(
            sim.use_tool(ToolUse::Bee),
            Err(ToolError::NotInInventory(ToolKind::Bee))
        );
    }

    #[test]
    fn restart_clears_events_and_respawns() {
        let mut sim = sim();
        sim.give_tool(ToolKind::Bee);
        sim.use_tool(ToolUse::Bee).unwrap();
        assert_eq!(sim.scheduler().len(), 1);
        sim.tick(100.0);

        sim.restart().unwrap();
        assert!(sim.scheduler().is_empty());
        assert_eq!(sim.now_ms(), 0.0);
        assert_eq!(sim.world().count::<Pursuer>(), 1);
        assert_eq!(sim.status(), RunStatus::Running);
    }

    #[test]
    fn answers_are_ignored_after_winning() {
        let mut sim = sim();
        let npc = sim.world_mut().spawn_with(Conversation::InProgress);
        let player = sim.player();
        sim.world_mut().insert_component(player, Victorious).unwrap();

        assert!(sim.answer_conversation(true).is_empty());
        assert_eq!(
            sim.world().get_component::<Conversation>(npc),
            Some(&Conversation::InProgress)
        );
    }
}
