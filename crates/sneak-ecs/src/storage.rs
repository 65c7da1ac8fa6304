//! Typed component storage.
//!
//! Each component type lives in its own [`ComponentStore`], a sparse set keyed
//! by entity slot index. Dense arrays keep iteration contiguous; the sparse
//! side gives O(1) attach/detach/lookup. Lookups compare the full
//! [`EntityId`], so a stale handle never reads a reused slot's data.

use std::any::Any;

use crate::entity::EntityId;

/// Marker trait for anything storable as a component.
pub trait Component: 'static {}

impl<T: 'static> Component for T {}

/// Sparse-set storage for one component type.
#[derive(Debug)]
pub struct ComponentStore<T> {
    /// Slot index -> position in the dense arrays.
    sparse: Vec<Option<usize>>,
    entities: Vec<EntityId>,
    values: Vec<T>,
}

impl<T> Default for ComponentStore<T> {
    fn default() -> Self {
        Self {
            sparse: Vec::new(),
            entities: Vec::new(),
            values: Vec::new(),
        }
    }
}

impl<T> ComponentStore<T> {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn dense_index(&self, entity: EntityId) -> Option<usize> {
        let dense = (*self.sparse.get(entity.index() as usize)?)?;
        (self.entities[dense] == entity).then_some(dense)
    }

    /// Attach `value` to `entity`, returning the value it replaced.
    pub fn insert(&mut self, entity: EntityId, value: T) -> Option<T> {
        if let Some(dense) = self.dense_index(entity) {
            return Some(std::mem::replace(&mut self.values[dense], value));
        }
        let slot = entity.index() as usize;
        if slot >= self.sparse.len() {
            self.sparse.resize(slot + 1, None);
        }
        // A previous generation of this slot may still own a dense entry.
        if let Some(stale) = self.sparse[slot] {
            self.swap_remove(stale);
        }
        self.sparse[slot] = Some(self.values.len());
        self.entities.push(entity);
        self.values.push(value);
        None
    }

    /// Detach and return the component for `entity`.
    pub fn remove(&mut self, entity: EntityId) -> Option<T> {
        let dense = self.dense_index(entity)?;
        Some(self.swap_remove(dense))
    }

    fn swap_remove(&mut self, dense: usize) -> T {
        let removed = self.entities.swap_remove(dense);
        self.sparse[removed.index() as usize] = None;
        if let Some(moved) = self.entities.get(dense) {
            self.sparse[moved.index() as usize] = Some(dense);
        }
        self.values.swap_remove(dense)
    }

    /// The component of `entity`, if it has one.
    pub fn get(&self, entity: EntityId) -> Option<&T> {
        self.dense_index(entity).map(|dense| &self.values[dense])
    }

    /// Mutable access to the component of `entity`.
    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut T> {
        self.dense_index(entity).map(|dense| &mut self.values[dense])
    }

    /// Whether `entity` has a component here.
    pub fn contains(&self, entity: EntityId) -> bool {
        self.dense_index(entity).is_some()
    }

    /// Number of stored components.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the store holds nothing.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entities holding this component, in dense (insertion-ish) order.
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// Every `(entity, component)` pair in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.entities.iter().copied().zip(self.values.iter())
    }

    /// Mutable iteration in dense order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.entities.iter().copied().zip(self.values.iter_mut())
    }

    /// Remove every component.
    pub fn clear(&mut self) {
        self.sparse.clear();
        self.entities.clear();
        self.values.clear();
    }
}

// ---------------------------------------------------------------------------
// Type-erased access used by the world
// ---------------------------------------------------------------------------

/// Object-safe view of a [`ComponentStore`] so the world can detach every
/// component of a despawned entity without knowing the concrete types.
pub(crate) trait ErasedStore {
    fn detach(&mut self, entity: EntityId);
    fn clear(&mut self);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedStore for ComponentStore<T> {
    fn detach(&mut self, entity: EntityId) {
        self.remove(entity);
    }

    fn clear(&mut self) {
        ComponentStore::clear(self);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
