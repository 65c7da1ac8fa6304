//! The [`World`] owns the entity allocator and one [`ComponentStore`] per
//! component type. Systems receive it by reference; there is no global
//! registry.

use std::any::TypeId;
use std::collections::HashMap;

use crate::entity::{EntityAllocator, EntityId};
use crate::storage::{Component, ComponentStore, ErasedStore};
use crate::EcsError;

/// The top-level entity/component container.
#[derive(Default)]
pub struct World {
    allocator: EntityAllocator,
    stores: HashMap<TypeId, Box<dyn ErasedStore>>,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entity_count", &self.allocator.alive_count())
            .field("store_count", &self.stores.len())
            .finish()
    }
}

impl World {
    /// An empty world.
    pub fn new() -> Self {
        Self::default()
    }

    // -- stores -------------------------------------------------------------

    /// Typed read access to the store for `T`, if any `T` was ever attached.
    pub fn store<T: Component>(&self) -> Option<&ComponentStore<T>> {
        self.stores
            .get(&TypeId::of::<T>())
            .and_then(|s| s.as_any().downcast_ref::<ComponentStore<T>>())
    }

    /// Typed write access to the store for `T`, created on first use.
    pub fn store_mut<T: Component>(&mut self) -> &mut ComponentStore<T> {
        self.stores
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ComponentStore::<T>::new()))
            .as_any_mut()
            .downcast_mut::<ComponentStore<T>>()
            .expect("store registered under a mismatched TypeId")
    }

    // -- entity lifecycle ---------------------------------------------------

    /// Create an entity with no components.
    pub fn spawn(&mut self) -> EntityId {
        self.allocator.allocate()
    }

    /// Create an entity carrying a single component.
    pub fn spawn_with<T: Component>(&mut self, component: T) -> EntityId {
        let entity = self.spawn();
        self.store_mut::<T>().insert(entity, component);
        entity
    }

    /// Detach every component from `entity` and retire its handle.
    pub fn despawn(&mut self, entity: EntityId) -> Result<(), EcsError> {
        if !self.allocator.deallocate(entity) {
            return Err(EcsError::StaleEntity { entity });
        }
        for store in self.stores.values_mut() {
            store.detach(entity);
        }
        tracing::trace!(%entity, "despawned");
        Ok(())
    }

    /// Whether `entity` is live (right index and generation).
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.allocator.is_alive(entity)
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.allocator.alive_count()
    }

    /// Despawn everything. Outstanding handles all become stale.
    pub fn clear(&mut self) {
        for entity in self.allocator.alive_entities() {
            self.allocator.deallocate(entity);
        }
        for store in self.stores.values_mut() {
            store.clear();
        }
    }

    // -- component access ---------------------------------------------------

    /// Attach (or overwrite) a component on a live entity.
    pub fn insert_component<T: Component>(
        &mut self,
        entity: EntityId,
        component: T,
    ) -> Result<(), EcsError> {
        if !self.is_alive(entity) {
            return Err(EcsError::StaleEntity { entity });
        }
        self.store_mut::<T>().insert(entity, component);
        Ok(())
    }

    /// Detach a component, returning it if it was present.
    pub fn remove_component<T: Component>(&mut self, entity: EntityId) -> Option<T> {
        self.stores
            .get_mut(&TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<ComponentStore<T>>()?
            .remove(entity)
    }

    /// The `T` attached to `entity`, if any.
    pub fn get_component<T: Component>(&self, entity: EntityId) -> Option<&T> {
        self.store::<T>()?.get(entity)
    }

    /// Mutable access to the `T` attached to `entity`.
    pub fn get_component_mut<T: Component>(&mut self, entity: EntityId) -> Option<&mut T> {
        self.stores
            .get_mut(&TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<ComponentStore<T>>()?
            .get_mut(entity)
    }

    /// Whether `entity` carries a `T`.
    pub fn has_component<T: Component>(&self, entity: EntityId) -> bool {
        self.store::<T>().is_some_and(|s| s.contains(entity))
    }

    /// Snapshot of the entities carrying `T`.
    ///
    /// Returned by value so callers can mutate the world while walking it.
    pub fn entities_with<T: Component>(&self) -> Vec<EntityId> {
        self.store::<T>()
            .map(|s| s.entities().to_vec())
            .unwrap_or_default()
    }

    /// Number of entities carrying `T`.
    pub fn count<T: Component>(&self) -> usize {
        self.store::<T>().map_or(0, ComponentStore::len)
    }

    /// First entity carrying `T`, if any.
    pub fn first_with<T: Component>(&self) -> Option<EntityId> {
        self.store::<T>()?.entities().first().copied()
    }

    /// Iterate `(entity, &T)` pairs.
    pub fn query<T: Component>(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.store::<T>().into_iter().flat_map(|s| s.iter())
    }
}
