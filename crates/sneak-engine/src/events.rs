//! Scheduled event actions and their dispatcher.
//!
//! Actions are plain data: every entity they mention is a generational
//! handle captured when the action was queued, and [`dispatch`] checks each
//! one is still alive before touching it.

use serde::{Deserialize, Serialize};
use sneak_ecs::prelude::*;

use crate::components::{Motion, Pursuer};
use crate::config::SimConfig;
use crate::level::{spawn_light, LightSpawn};
use crate::pathfinder::Pursuit;
use crate::scheduler::{ScheduledEvent, Scheduler};
use crate::turn::TurnTimer;

/// What a scheduled event does when it fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventAction {
    /// Put back a motion saved before a freeze.
    RestoreMotion { target: EntityId, motion: Motion },
    /// Put back a turn timer's countdown saved before a freeze.
    RestoreTurnTimer { target: EntityId, remaining_ms: f32 },
    SetPursuitEnabled(bool),
    /// Freeze every pursuer now and restore them at `restore_at_ms`.
    FreezePursuers { restore_at_ms: f64 },
    /// Recreate lights and cameras that were switched off.
    RespawnLights { lights: Vec<LightSpawn> },
}

/// The mutable simulation state an action may touch.
pub struct EventContext<'a> {
    pub world: &'a mut World,
    pub pursuit: &'a mut Pursuit,
    pub config: &'a SimConfig,
}

/// Scheduler specialised to [`EventAction`].
pub type EventScheduler = Scheduler<EventAction>;

/// Fire every event due at `now_ms` against `ctx`.
pub fn run_due(scheduler: &mut EventScheduler, now_ms: f64, ctx: &mut EventContext<'_>) -> usize {
    scheduler.tick(now_ms, |event, scheduler| dispatch(event, scheduler, ctx))
}

/// Apply one fired event.
pub fn dispatch(
    event: ScheduledEvent<EventAction>,
    scheduler: &mut EventScheduler,
    ctx: &mut EventContext<'_>,
) {
    match event.action {
        EventAction::RestoreMotion { target, motion } => {
            match ctx.world.get_component_mut::<Motion>(target) {
                Some(current) => *current = motion,
                None => tracing::debug!(%target, "motion restore skipped, target gone"),
            }
        }
        EventAction::RestoreTurnTimer {
            target,
            remaining_ms,
        } => match ctx.world.get_component_mut::<TurnTimer>(target) {
            Some(timer) => timer.remaining_ms = remaining_ms,
            // A sprung trap strips pursuers of their timers.
            None => tracing::debug!(%target, "turn timer restore skipped, timer gone"),
        },
        EventAction::SetPursuitEnabled(enabled) => ctx.pursuit.set_enabled(enabled),
        EventAction::FreezePursuers { restore_at_ms } => {
            let pursuers = ctx.world.entities_with::<Pursuer>();
            freeze(ctx.world, &pursuers, restore_at_ms, scheduler);
            ctx.pursuit.set_enabled(false);
            scheduler.schedule(restore_at_ms, EventAction::SetPursuitEnabled(true));
        }
        EventAction::RespawnLights { lights } => {
            for spawn in &lights {
                spawn_light(ctx.world, spawn, ctx.config);
            }
            tracing::debug!(count = lights.len(), "lights respawned");
        }
    }
}

/// Zero the motion of each target and every turn timer in the world,
/// scheduling restores of the saved values at `restore_at_ms`.
///
/// Targets without a [`Motion`] are skipped.
pub fn freeze(
    world: &mut World,
    targets: &[EntityId],
    restore_at_ms: f64,
    scheduler: &mut EventScheduler,
) {
    for &target in targets {
        let Some(motion) = world.get_component_mut::<Motion>(target) else {
            continue;
        };
        scheduler.schedule(
            restore_at_ms,
            EventAction::RestoreMotion {
                target,
                motion: *motion,
            },
        );
        motion.stop();
    }

    for entity in world.entities_with::<TurnTimer>() {
        if let Some(timer) = world.get_component::<TurnTimer>(entity) {
            scheduler.schedule(
                restore_at_ms,
                EventAction::RestoreTurnTimer {
                    target: entity,
                    remaining_ms: timer.remaining_ms,
                },
            );
        }
    }
    tracing::debug!(targets = targets.len(), restore_at_ms, "frozen");
}
