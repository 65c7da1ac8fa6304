//! Motion integration: velocity rate limiting and position/angle advance.

use sneak_ecs::prelude::*;

use crate::components::{Halted, Light, Motion, Victorious};
use crate::math::Vec2;

/// Move `current` toward `goal` by at most `max_delta` on each axis.
///
/// An axis within `max_delta` of its goal snaps exactly onto it.
pub fn approach(goal: Vec2, current: Vec2, max_delta: f32) -> Vec2 {
    Vec2::new(
        approach_axis(goal.x, current.x, max_delta),
        approach_axis(goal.y, current.y, max_delta),
    )
}

fn approach_axis(goal: f32, current: f32, max_delta: f32) -> f32 {
    let diff = goal - current;
    if diff > max_delta {
        (current + max_delta).min(goal)
    } else if diff < -max_delta {
        (current - max_delta).max(goal)
    } else {
        goal
    }
}

/// Rate-limit every non-light velocity toward its goal.
///
/// The step allowance is the elapsed time in milliseconds, so velocities
/// change by at most `elapsed_ms` units per second per tick.
pub fn rate_limit_velocities(world: &mut World, elapsed_ms: f32) {
    for entity in world.entities_with::<Motion>() {
        if world.has_component::<Light>(entity) {
            continue;
        }
        let motion = world
            .get_component_mut::<Motion>(entity)
            .expect("entity listed by the Motion store has no Motion");
        motion.velocity = approach(motion.velocity_goal, motion.velocity, elapsed_ms);
    }
}

/// Advance positions and angles by one step.
///
/// Lights rotate by `velocity.x` radians per second. Everything else
/// translates unless it is [`Halted`] or [`Victorious`].
pub fn integrate(world: &mut World, elapsed_ms: f32) {
    let step_s = elapsed_ms / 1000.0;
    for entity in world.entities_with::<Motion>() {
        let is_light = world.has_component::<Light>(entity);
        let frozen =
            world.has_component::<Halted>(entity) || world.has_component::<Victorious>(entity);
        let motion = world
            .get_component_mut::<Motion>(entity)
            .expect("entity listed by the Motion store has no Motion");
        if is_light {
            motion.angle += motion.velocity.x * step_s;
        } else if !frozen {
            motion.position += motion.velocity * step_s;
        }
    }
}

/// Full motion phase: rate limiting then integration.
pub fn step(world: &mut World, elapsed_ms: f32) {
    rate_limit_velocities(world, elapsed_ms);
    integrate(world, elapsed_ms);
    tracing::trace!(elapsed_ms, "motion step");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approach_clamps_each_axis_independently() {
        let v = approach(Vec2::new(100.0, -3.0), Vec2::ZERO, 10.0);
        assert_eq!(v, Vec2::new(10.0, -3.0));
    }

    #[test]
    fn approach_snaps_exactly_within_step() {
        let v = approach(Vec2::new(0.25, 0.0), Vec2::new(0.2, 0.0), 1.0);
        assert_eq!(v.x, 0.25);
    }

    #[test]
    fn light_rotates_instead_of_moving() {
        let mut world = World::new();
        let light = world.spawn_with(Motion {
            velocity: Vec2::new(0.5, 0.0),
            ..Motion::default()
        });
        world.insert_component(light, Light { orientation: 0 }).unwrap();

        step(&mut world, 1000.0);

        let m = world.get_component::<Motion>(light).unwrap();
        assert_eq!(m.position, Vec2::ZERO);
        assert!((m.angle - 0.5).abs() < 1e-6);
        // Lights keep their sweep velocity; the goal is not applied.
        assert_eq!(m.velocity, Vec2::new(0.5, 0.0));
    }

    #[test]
    fn halted_entities_keep_position() {
        let mut world = World::new();
        let e = world.spawn_with(Motion {
            velocity: Vec2::new(50.0, 0.0),
            velocity_goal: Vec2::new(50.0, 0.0),
            ..Motion::default()
        });
        world.insert_component(e, Halted).unwrap();
        integrate(&mut world, 100.0);
        assert_eq!(world.get_component::<Motion>(e).unwrap().position, Vec2::ZERO);

        world.remove_component::<Halted>(e);
        integrate(&mut world, 100.0);
        assert_eq!(
            world.get_component::<Motion>(e).unwrap().position,
            Vec2::new(5.0, 0.0)
        );
    }

    #[test]
    fn velocity_ramps_toward_goal() {
        let mut world = World::new();
        let e = world.spawn_with(Motion {
            velocity_goal: Vec2::new(100.0, 0.0),
            ..Motion::default()
        });
        rate_limit_velocities(&mut world, 16.0);
        assert_eq!(world.get_component::<Motion>(e).unwrap().velocity.x, 16.0);
    }
}
