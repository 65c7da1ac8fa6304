//! Periodic direction reversal for patrols and light sweeps.

use serde::{Deserialize, Serialize};
use sneak_ecs::prelude::*;

use crate::components::{Facing, Light, Motion, Pursuer};

/// Countdown that reports a "turn" each time it runs out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurnTimer {
    pub remaining_ms: f32,
    pub period_ms: f32,
}

impl TurnTimer {
    /// A timer that first fires one full period from now.
    pub fn new(period_ms: f32) -> Self {
        Self {
            remaining_ms: period_ms,
            period_ms,
        }
    }

    /// Count down by `elapsed_ms`. Returns `true` if the timer ran out.
    ///
    /// The overshoot carries into the next period; at most one turn is
    /// reported per call however large `elapsed_ms` is.
    pub fn advance(&mut self, elapsed_ms: f32) -> bool {
        self.remaining_ms -= elapsed_ms;
        if self.remaining_ms > 0.0 {
            return false;
        }
        self.remaining_ms += self.period_ms;
        if self.remaining_ms <= 0.0 {
            self.remaining_ms = self.period_ms;
        }
        true
    }
}

/// Advance every [`TurnTimer`] and apply the reversals that came due.
///
/// Pursuers flip the horizontal component of their velocity goal; lights
/// flip their sweep velocity. Returns the entities that turned.
///
/// # Panics
///
/// Panics if a timed entity has no [`Motion`].
pub fn update_turns(world: &mut World, elapsed_ms: f32) -> Vec<EntityId> {
    let mut turned = Vec::new();
    for entity in world.entities_with::<TurnTimer>() {
        let fired = world
            .get_component_mut::<TurnTimer>(entity)
            .is_some_and(|timer| timer.advance(elapsed_ms));
        if !fired {
            continue;
        }
        let is_pursuer = world.has_component::<Pursuer>(entity);
        let is_light = world.has_component::<Light>(entity);
        let motion = world
            .get_component_mut::<Motion>(entity)
            .expect("entity with a TurnTimer has no Motion");
        if is_pursuer {
            motion.velocity_goal.x = -motion.velocity_goal.x;
        }
        if is_light {
            motion.velocity.x = -motion.velocity.x;
        }
        tracing::trace!(%entity, is_pursuer, is_light, "turned");
        turned.push(entity);
    }
    turned
}

/// Recompute each pursuer's [`Facing`] from its current velocity.
pub fn update_pursuer_facing(world: &mut World) {
    for entity in world.entities_with::<Pursuer>() {
        let Some(velocity) = world.get_component::<Motion>(entity).map(|m| m.velocity) else {
            continue;
        };
        world
            .insert_component(entity, Facing::from_velocity(velocity))
            .expect("listed pursuer is alive");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec2;

    #[test]
    fn overshoot_carries_into_next_period() {
        let mut t = TurnTimer::new(12_000.0);
        assert!(t.advance(13_000.0));
        assert_eq!(t.remaining_ms, 11_000.0);
        assert!(!t.advance(10_000.0));
        assert!(t.advance(1_000.0));
        assert_eq!(t.remaining_ms, 12_000.0);
    }

    #[test]
    fn huge_step_reports_once_and_resets() {
        let mut t = TurnTimer::new(100.0);
        assert!(t.advance(1_000.0));
        assert_eq!(t.remaining_ms, 100.0);
    }

    #[test]
    fn pursuer_and_light_reverse_differently() {
        let mut world = World::new();
        let guard = world.spawn_with(Motion {
            velocity: Vec2::new(-50.0, 0.0),
            velocity_goal: Vec2::new(-50.0, 0.0),
            ..Motion::default()
        });
        world.insert_component(guard, Pursuer).unwrap();
        world.insert_component(guard, TurnTimer::new(10.0)).unwrap();

        let light = world.spawn_with(Motion {
            velocity: Vec2::new(0.5, 0.0),
            ..Motion::default()
        });
        world.insert_component(light, Light::default()).unwrap();
        world.insert_component(light, TurnTimer::new(10.0)).unwrap();

        let turned = update_turns(&mut world, 10.0);
        assert_eq!(turned.len(), 2);

        let g = world.get_component::<Motion>(guard).unwrap();
        assert_eq!(g.velocity_goal.x, 50.0);
        assert_eq!(g.velocity.x, -50.0);
        let l = world.get_component::<Motion>(light).unwrap();
        assert_eq!(l.velocity.x, -0.5);
    }

    #[test]
    fn facing_follows_velocity() {
        let mut world = World::new();
        let guard = world.spawn_with(Motion {
            velocity: Vec2::new(0.0, -20.0),
            ..Motion::default()
        });
        world.insert_component(guard, Pursuer).unwrap();
        update_pursuer_facing(&mut world);
        assert_eq!(world.get_component::<Facing>(guard), Some(&Facing::Up));
    }
}
