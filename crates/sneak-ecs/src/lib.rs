//! Sneak ECS -- generational entity handles and typed component storage.
//!
//! This crate is the entity/component store the simulation core runs on.
//! Entities are opaque [`EntityId`](entity::EntityId)s; components are plain
//! values kept in one sparse-set [`ComponentStore`](storage::ComponentStore)
//! per type. Despawning bumps the handle's generation, so handles captured
//! earlier (for instance by a deferred event) fail existence checks instead of
//! aliasing a recycled slot.
//!
//! # Quick Start
//!
//! ```
//! use sneak_ecs::prelude::*;
//!
//! #[derive(Debug, PartialEq)]
//! struct Position { x: f32, y: f32 }
//!
//! let mut world = World::new();
//! let entity = world.spawn_with(Position { x: 0.0, y: 0.0 });
//! assert_eq!(world.get_component::<Position>(entity), Some(&Position { x: 0.0, y: 0.0 }));
//!
//! world.despawn(entity).unwrap();
//! assert!(!world.has_component::<Position>(entity));
//! ```

#![deny(unsafe_code)]

pub mod entity;
pub mod storage;
pub mod world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by store operations.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// The entity does not exist (stale generation or never allocated).
    #[error("entity {entity:?} does not exist (stale or never allocated)")]
    StaleEntity { entity: entity::EntityId },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::entity::EntityId;
    pub use crate::storage::{Component, ComponentStore};
    pub use crate::world::World;
    pub use crate::EcsError;
}
