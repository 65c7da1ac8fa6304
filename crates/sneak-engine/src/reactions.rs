//! Gameplay reactions to the player's collisions.
//!
//! For each record whose subject is the player, the first matching rule in
//! the order deadly, pickup, wall, exit, trap, conversation applies and the
//! rest are skipped for that record.

use serde::{Deserialize, Serialize};
use sneak_ecs::prelude::*;

use crate::collision::{resolve_wall_stop, CollisionSet, WallStop};
use crate::components::{
    Caught, Conversation, Deadly, Exit, Motion, Pickup, Player, Pursuer, Stopable, ToolKind, Trap,
    Trappable, Victorious,
};
use crate::math::Vec2;
use crate::tools::Inventory;
use crate::turn::TurnTimer;

/// Something that happened to the player this tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    /// First contact with a deadly entity.
    Caught { by: EntityId },
    PickedUp { tool: ToolKind },
    WallStop(WallStop),
    /// First contact with the exit.
    Won,
    TrapSprung { trap: EntityId },
    /// First contact with an NPC; it now waits for the player's answer.
    ConversationStarted { npc: EntityId },
}

/// Apply the player's collisions to the world.
pub fn react(
    world: &mut World,
    collisions: &CollisionSet,
    inventory: &mut Inventory,
    wall_push: f32,
) -> Vec<Outcome> {
    let mut outcomes = Vec::new();
    let Some(player) = world.first_with::<Player>() else {
        return outcomes;
    };

    for record in collisions.involving(player) {
        let other = record.other;
        // An earlier record this tick may have despawned it.
        if !world.is_alive(other) {
            continue;
        }
        if world.has_component::<Deadly>(other) {
            if !world.has_component::<Caught>(player) {
                world
                    .insert_component(player, Caught)
                    .expect("player read from this tick is alive");
                if let Some(m) = world.get_component_mut::<Motion>(other) {
                    m.velocity = Vec2::ZERO;
                }
                tracing::info!(%player, by = %other, "player caught");
                outcomes.push(Outcome::Caught { by: other });
            }
        } else if let Some(&Pickup(tool)) = world.get_component::<Pickup>(other) {
            if !world.has_component::<Caught>(player) {
                world.despawn(other).expect("pickup checked alive above");
                inventory.add(tool);
                tracing::info!(?tool, "tool picked up");
                outcomes.push(Outcome::PickedUp { tool });
            }
        } else if world.has_component::<Stopable>(other) {
            let stop = resolve_wall_stop(world, player, other, wall_push);
            outcomes.push(Outcome::WallStop(stop));
        } else if world.has_component::<Exit>(other) {
            if !world.has_component::<Victorious>(player) {
                world
                    .insert_component(player, Victorious)
                    .expect("player read from this tick is alive");
                tracing::info!(%player, "exit reached");
                outcomes.push(Outcome::Won);
            }
        } else if world.has_component::<Trap>(other) {
            spring_trap(world, other);
            outcomes.push(Outcome::TrapSprung { trap: other });
        } else if let Some(state) = world.get_component_mut::<Conversation>(other) {
            let before = *state;
            *state = before.on_contact();
            if before != *state {
                tracing::info!(npc = %other, "conversation started");
                outcomes.push(Outcome::ConversationStarted { npc: other });
            }
        }
    }
    outcomes
}

/// Remove the trap, mark the world trapped, and take pursuers off patrol.
///
/// # Panics
///
/// Panics if `trap` is not alive.
pub fn spring_trap(world: &mut World, trap: EntityId) {
    world.despawn(trap).expect("sprung trap is alive");
    world.spawn_with(Trappable);
    for pursuer in world.entities_with::<Pursuer>() {
        world.remove_component::<TurnTimer>(pursuer);
        if let Some(m) = world.get_component_mut::<Motion>(pursuer) {
            m.velocity = Vec2::ZERO;
        }
    }
    tracing::info!(%trap, "trap sprung, pursuit armed");
}
