//! Overlap detection and the player/wall stop resolver.
//!
//! Detection is a brute-force O(n²) sweep over every entity with a
//! [`Motion`]. Each overlapping pair is recorded twice, once per direction,
//! so consumers can filter on `subject` alone. Nothing here reacts to a
//! collision beyond the wall stop; the reaction layer reads the
//! [`CollisionSet`].

use serde::{Deserialize, Serialize};
use sneak_ecs::prelude::*;

use crate::components::{Halted, Light, Motion, Player, Stopable};
use crate::math::Vec2;

// ---------------------------------------------------------------------------
// CollisionRecord / CollisionSet
// ---------------------------------------------------------------------------

/// One direction of an overlapping pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionRecord {
    /// The entity this record is about.
    pub subject: EntityId,
    /// The entity it overlaps.
    pub other: EntityId,
}

/// Collision records produced in one tick. Cleared at the end of the tick.
#[derive(Debug, Clone, Default)]
pub struct CollisionSet {
    records: Vec<CollisionRecord>,
}

impl CollisionSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the pair in both directions.
    pub fn push_pair(&mut self, a: EntityId, b: EntityId) {
        self.records.push(CollisionRecord { subject: a, other: b });
        self.records.push(CollisionRecord { subject: b, other: a });
    }

    /// Every record pushed this tick, in push order.
    pub fn records(&self) -> &[CollisionRecord] {
        &self.records
    }

    /// Records whose subject is `entity`.
    pub fn involving(&self, entity: EntityId) -> impl Iterator<Item = &CollisionRecord> {
        self.records.iter().filter(move |r| r.subject == entity)
    }

    /// Number of records, counting both directions.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no overlap was recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record. Called at the end of each tick.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Squared bounding-circle radius for an extent.
fn radius_squared(scale: Vec2) -> f32 {
    let half = scale.abs() / 2.0;
    half.dot(half)
}

/// Bounding-circle overlap test between two extents at two positions.
///
/// The pair overlaps when the centre distance is inside the larger of the
/// two circles. The sign of `scale` is ignored.
pub fn collides(pos_a: Vec2, scale_a: Vec2, pos_b: Vec2, scale_b: Vec2) -> bool {
    let dist_sq = (pos_a - pos_b).length_squared();
    dist_sq < radius_squared(scale_a).max(radius_squared(scale_b))
}

/// Overlap test for two motions, without light inflation.
pub fn motions_collide(a: &Motion, b: &Motion) -> bool {
    collides(a.position, a.scale, b.position, b.scale)
}

/// Find every overlapping pair and append both directions to `out`.
///
/// Lights have `light_inflation` added to their extent first, which widens
/// the beam and flattens it.
pub fn detect(world: &World, light_inflation: Vec2, out: &mut CollisionSet) {
    let bodies: Vec<(EntityId, Vec2, Vec2)> = world
        .query::<Motion>()
        .map(|(entity, m)| {
            let scale = if world.has_component::<Light>(entity) {
                m.scale + light_inflation
            } else {
                m.scale
            };
            (entity, m.position, scale)
        })
        .collect();

    for (i, &(a, pos_a, scale_a)) in bodies.iter().enumerate() {
        for &(b, pos_b, scale_b) in &bodies[i + 1..] {
            if collides(pos_a, scale_a, pos_b, scale_b) {
                out.push_pair(a, b);
            }
        }
    }
    tracing::trace!(bodies = bodies.len(), records = out.len(), "collision sweep");
}

// ---------------------------------------------------------------------------
// Wall stop
// ---------------------------------------------------------------------------

/// Result of resolving a player/wall overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WallStop {
    /// The player was halted and nudged off the wall.
    Pushed,
    /// The player was already halted; nothing changed.
    AlreadyHalted,
}

/// Halt `player` against `wall` and push it `push` units away along the
/// dominant axis of `wall - player`.
///
/// Ties between the axes push vertically. A player exactly on the wall
/// centre is halted but not moved.
///
/// # Panics
///
/// Panics if either entity has no [`Motion`] or `player` is not alive.
pub fn resolve_wall_stop(
    world: &mut World,
    player: EntityId,
    wall: EntityId,
    push: f32,
) -> WallStop {
    if world.has_component::<Halted>(player) {
        return WallStop::AlreadyHalted;
    }
    let wall_pos = world
        .get_component::<Motion>(wall)
        .expect("wall has no Motion")
        .position;
    world
        .insert_component(player, Halted)
        .expect("halted player is alive");

    let motion = world
        .get_component_mut::<Motion>(player)
        .expect("player has no Motion");
    let diff = wall_pos - motion.position;
    motion.stop();
    if diff.x.abs() > diff.y.abs() {
        motion.position.x -= push * diff.x.signum();
    } else if diff.y != 0.0 {
        motion.position.y -= push * diff.y.signum();
    }
    tracing::debug!(%player, %wall, position = ?motion.position, "player halted by wall");
    WallStop::Pushed
}

/// Lift [`Halted`] from the player once it no longer overlaps any wall.
///
/// Returns `true` if the tag was removed.
pub fn release_halt_if_clear(world: &mut World) -> bool {
    let Some(player) = world.first_with::<Player>() else {
        return false;
    };
    if !world.has_component::<Halted>(player) {
        return false;
    }
    let Some(player_motion) = world.get_component::<Motion>(player) else {
        return false;
    };
    let touching = world.entities_with::<Stopable>().into_iter().any(|wall| {
        world
            .get_component::<Motion>(wall)
            .is_some_and(|m| motions_collide(m, player_motion))
    });
    if touching {
        return false;
    }
    world.remove_component::<Halted>(player);
    tracing::debug!(%player, "player clear of walls, halt released");
    true
}

/// Unconditionally lift [`Halted`] from the player.
pub fn release_halt(world: &mut World) -> bool {
    world
        .first_with::<Player>()
        .and_then(|player| world.remove_component::<Halted>(player))
        .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(world: &mut World, x: f32, y: f32, size: f32) -> EntityId {
        world.spawn_with(Motion::at(Vec2::new(x, y), Vec2::new(size, size)))
    }

    #[test]
    fn overlap_uses_larger_circle() {
        // Radius² of a 20x20 box is 200; of a 2x2 box is 2.
        let big = Vec2::new(20.0, 20.0);
        let small = Vec2::new(2.0, 2.0);
        assert!(collides(Vec2::ZERO, big, Vec2::new(14.0, 0.0), small));
        assert!(!collides(Vec2::ZERO, big, Vec2::new(15.0, 0.0), small));
    }

    #[test]
    fn negative_scale_is_ignored() {
        let flipped = Vec2::new(-20.0, 20.0);
        assert!(collides(Vec2::ZERO, flipped, Vec2::new(10.0, 0.0), Vec2::new(1.0, 1.0)));
    }

    #[test]
    fn detect_emits_both_directions() {
        let mut world = World::new();
        let a = body(&mut world, 0.0, 0.0, 10.0);
        let b = body(&mut world, 3.0, 0.0, 10.0);
        let _far = body(&mut world, 500.0, 0.0, 10.0);

        let mut set = CollisionSet::new();
        detect(&world, Vec2::ZERO, &mut set);
        assert_eq!(set.len(), 2);
        assert!(set.records().contains(&CollisionRecord { subject: a, other: b }));
        assert!(set.records().contains(&CollisionRecord { subject: b, other: a }));
    }

    #[test]
    fn light_inflation_widens_reach() {
        let mut world = World::new();
        let light = body(&mut world, 0.0, 0.0, 10.0);
        world.insert_component(light, Light::default()).unwrap();
        let _target = body(&mut world, 40.0, 0.0, 2.0);

        let mut set = CollisionSet::new();
        detect(&world, Vec2::ZERO, &mut set);
        assert!(set.is_empty());

        detect(&world, Vec2::new(90.0, -30.0), &mut set);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn wall_stop_pushes_once() {
        let mut world = World::new();
        let player = world.spawn_with(Motion {
            position: Vec2::new(100.0, 100.0),
            velocity: Vec2::new(40.0, 0.0),
            velocity_goal: Vec2::new(200.0, 0.0),
            ..Motion::default()
        });
        let wall = body(&mut world, 110.0, 102.0, 20.2);

        assert_eq!(resolve_wall_stop(&mut world, player, wall, 15.0), WallStop::Pushed);
        assert_eq!(resolve_wall_stop(&mut world, player, wall, 15.0), WallStop::AlreadyHalted);

        let m = world.get_component::<Motion>(player).unwrap();
        assert_eq!(m.position, Vec2::new(85.0, 100.0));
        assert_eq!(m.velocity, Vec2::ZERO);
        assert_eq!(m.velocity_goal, Vec2::ZERO);
        assert!(world.has_component::<Halted>(player));
    }

    #[test]
    fn halt_released_when_clear_of_walls() {
        let mut world = World::new();
        let player = body(&mut world, 0.0, 0.0, 10.0);
        world.insert_component(player, Player).unwrap();
        world.insert_component(player, Halted).unwrap();
        let wall = body(&mut world, 5.0, 0.0, 20.0);
        world.insert_component(wall, Stopable).unwrap();

        assert!(!release_halt_if_clear(&mut world));
        world.get_component_mut::<Motion>(player).unwrap().position = Vec2::new(-100.0, 0.0);
        assert!(release_halt_if_clear(&mut world));
        assert!(!world.has_component::<Halted>(player));
    }
}
