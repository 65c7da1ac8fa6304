//! Scripted tools and the inventory that holds them.
//!
//! Each tool is a one-shot effect built on the event scheduler: it changes
//! the world now and queues the events that undo the change later.

use std::collections::HashMap;

use sneak_ecs::prelude::*;

use crate::components::{Camera, Light, Motion, Pursuer, ToolKind};
use crate::events::{freeze, EventAction, EventContext, EventScheduler};
use crate::level::{GridCell, LightKind, LightSpawn, WallCell};

/// Errors from using a tool.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    #[error("no {0:?} in the inventory")]
    NotInInventory(ToolKind),

    /// The hammer has to be aimed at a standing wall.
    #[error("no wall at cell ({}, {})", .0.col, .0.row)]
    NoWallAtTarget(GridCell),
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

/// Tools the player has picked up and not yet used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    counts: HashMap<ToolKind, u32>,
}

impl Inventory {
    /// An empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Put one `tool` in.
    pub fn add(&mut self, tool: ToolKind) {
        *self.counts.entry(tool).or_insert(0) += 1;
    }

    /// How many of `tool` are held.
    pub fn count(&self, tool: ToolKind) -> u32 {
        self.counts.get(&tool).copied().unwrap_or(0)
    }

    /// Whether at least one `tool` is held.
    pub fn contains(&self, tool: ToolKind) -> bool {
        self.count(tool) > 0
    }

    /// Remove one `tool`, failing if none is held.
    pub fn take(&mut self, tool: ToolKind) -> Result<(), ToolError> {
        match self.counts.get_mut(&tool) {
            Some(n) if *n > 0 => {
                *n -= 1;
                if *n == 0 {
                    self.counts.remove(&tool);
                }
                Ok(())
            }
            _ => Err(ToolError::NotInInventory(tool)),
        }
    }

    /// Whether no tool is held.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Drop every tool, as on level restart.
    pub fn clear(&mut self) {
        self.counts.clear();
    }
}

// ---------------------------------------------------------------------------
// Tool use
// ---------------------------------------------------------------------------

/// A request to use a tool, with any aim it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolUse {
    Sandglass,
    RemoteControl,
    Hammer { target: GridCell },
    Bee,
}

impl ToolUse {
    /// The inventory entry this use consumes.
    pub fn kind(self) -> ToolKind {
        match self {
            ToolUse::Sandglass => ToolKind::Sandglass,
            ToolUse::RemoteControl => ToolKind::RemoteControl,
            ToolUse::Hammer { .. } => ToolKind::Hammer,
            ToolUse::Bee => ToolKind::Bee,
        }
    }
}

/// Apply a tool's effect at simulated time `now_ms`.
pub fn apply(
    tool: ToolUse,
    ctx: &mut EventContext<'_>,
    scheduler: &mut EventScheduler,
    now_ms: f64,
) -> Result<(), ToolError> {
    match tool {
        ToolUse::Sandglass => sandglass(ctx, scheduler, now_ms),
        ToolUse::RemoteControl => {
            remote_control(ctx.world, scheduler, now_ms, ctx.config.remote_control_ms)
        }
        ToolUse::Hammer { target } => {
            hammer(ctx.world, target, ctx.config.hammer_range)?;
        }
        ToolUse::Bee => bee(
            scheduler,
            now_ms,
            ctx.config.bee_going_ms,
            ctx.config.bee_stay_ms,
        ),
    }
    tracing::info!(tool = ?tool.kind(), now_ms, "tool used");
    Ok(())
}

/// Freeze pursuers, lights and turn timers, and pause pursuit, for the
/// configured duration.
pub fn sandglass(ctx: &mut EventContext<'_>, scheduler: &mut EventScheduler, now_ms: f64) {
    let restore_at = now_ms + f64::from(ctx.config.sandglass_ms);
    let mut targets = ctx.world.entities_with::<Pursuer>();
    targets.extend(ctx.world.entities_with::<Light>());
    freeze(ctx.world, &targets, restore_at, scheduler);
    ctx.pursuit.set_enabled(false);
    scheduler.schedule(restore_at, EventAction::SetPursuitEnabled(true));
}

/// Switch off every light and camera, scheduling their return after
/// `duration_ms`.
pub fn remote_control(
    world: &mut World,
    scheduler: &mut EventScheduler,
    now_ms: f64,
    duration_ms: f32,
) {
    let mut lights = Vec::new();
    for entity in world.entities_with::<Light>() {
        if let (Some(light), Some(m)) = (
            world.get_component::<Light>(entity),
            world.get_component::<Motion>(entity),
        ) {
            lights.push(LightSpawn {
                kind: LightKind::Light,
                position: m.position,
                orientation: light.orientation,
            });
        }
        world.despawn(entity).expect("listed light is alive");
    }
    for entity in world.entities_with::<Camera>() {
        if let (Some(camera), Some(m)) = (
            world.get_component::<Camera>(entity),
            world.get_component::<Motion>(entity),
        ) {
            lights.push(LightSpawn {
                kind: LightKind::Camera,
                position: m.position,
                orientation: camera.orientation,
            });
        }
        world.despawn(entity).expect("listed camera is alive");
    }
    tracing::debug!(switched_off = lights.len(), "lights off");
    scheduler.schedule(
        now_ms + f64::from(duration_ms),
        EventAction::RespawnLights { lights },
    );
}

/// Break the walls in the square of cells from `range` before `target` up
/// to `range - 1` after it, on both axes.
///
/// Only wall entities are removed; the level grid used for pathfinding is
/// left as loaded. Returns the number of walls broken.
pub fn hammer(world: &mut World, target: GridCell, range: i32) -> Result<usize, ToolError> {
    let walls: Vec<(EntityId, GridCell)> = world
        .query::<WallCell>()
        .map(|(entity, cell)| (entity, cell.0))
        .collect();
    if !walls.iter().any(|&(_, cell)| cell == target) {
        return Err(ToolError::NoWallAtTarget(target));
    }

    let mut broken = 0;
    for (entity, cell) in walls {
        let in_range = (-range..range).contains(&(cell.col - target.col))
            && (-range..range).contains(&(cell.row - target.row));
        if in_range {
            world.despawn(entity).expect("queried wall is alive");
            broken += 1;
        }
    }
    tracing::debug!(?target, broken, "walls broken");
    Ok(broken)
}

/// Send the swarm: pursuers freeze after `going_ms` and recover `stay_ms`
/// later.
pub fn bee(scheduler: &mut EventScheduler, now_ms: f64, going_ms: f32, stay_ms: f32) {
    let stop_at = now_ms + f64::from(going_ms);
    let restore_at_ms = stop_at + f64::from(stay_ms);
    scheduler.schedule(stop_at, EventAction::FreezePursuers { restore_at_ms });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Stopable;
    use crate::math::Vec2;

    #[test]
    fn inventory_take_consumes_one() {
        let mut inv = Inventory::new();
        inv.add(ToolKind::Bee);
        inv.add(ToolKind::Bee);
        inv.take(ToolKind::Bee).unwrap();
        assert_eq!(inv.count(ToolKind::Bee), 1);
        inv.take(ToolKind::Bee).unwrap();
        assert_eq!(
            inv.take(ToolKind::Bee),
            Err(ToolError::NotInInventory(ToolKind::Bee))
        );
        assert!(inv.is_empty());
    }

    fn wall(world: &mut World, col: i32, row: i32) -> EntityId {
        let e = world.spawn_with(Motion::at(
            Vec2::new(col as f32 * 20.0, row as f32 * 20.0),
            Vec2::new(20.0, 20.0),
        ));
        world.insert_component(e, Stopable).unwrap();
        world.insert_component(e, WallCell(GridCell::new(col, row))).unwrap();
        e
    }

    #[test]
    fn hammer_breaks_square_around_target() {
        let mut world = World::new();
        for col in 0..10 {
            wall(&mut world, col, 0);
        }
        let broken = hammer(&mut world, GridCell::new(5, 0), 3).unwrap();
        // Columns 2..=7: three before the target, two after.
        assert_eq!(broken, 6);
        assert_eq!(world.count::<Stopable>(), 4);
    }

    #[test]
    fn hammer_square_stops_short_on_the_far_side() {
        let mut world = World::new();
        let column: Vec<EntityId> = (0..10).map(|row| wall(&mut world, 0, row)).collect();
        hammer(&mut world, GridCell::new(0, 5), 3).unwrap();

        assert!(world.is_alive(column[1]));
        assert!(!world.is_alive(column[2]));
        assert!(!world.is_alive(column[7]));
        assert!(world.is_alive(column[8]));
    }

    #[test]
    fn hammer_needs_a_wall() {
        let mut world = World::new();
        wall(&mut world, 0, 0);
        assert_eq!(
            hammer(&mut world, GridCell::new(4, 4), 3),
            Err(ToolError::NoWallAtTarget(GridCell::new(4, 4)))
        );
        assert_eq!(world.count::<Stopable>(), 1);
    }

    #[test]
    fn bee_schedules_delayed_freeze() {
        let mut scheduler = EventScheduler::new();
        bee(&mut scheduler, 1_000.0, 2_000.0, 3_000.0);
        let pending = scheduler.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].fire_at_ms, 3_000.0);
        assert_eq!(
            pending[0].action,
            EventAction::FreezePursuers {
                restore_at_ms: 6_000.0
            }
        );
    }
}
