//! Generational entity handles and their allocator.
//!
//! An [`EntityId`] packs a *generation* counter in the high 32 bits and a slot
//! *index* in the low 32 bits. Despawning bumps the slot's generation, so any
//! handle captured before the despawn (for example by a scheduled event) no
//! longer resolves once the slot is reused.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// A generational entity handle with no data of its own.
///
/// Layout: `[generation: u32 | index: u32]`
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Build a handle from a slot index and generation.
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | index as u64)
    }

    /// Slot index (low 32 bits).
    #[inline]
    pub fn index(self) -> u32 {
        self.0 as u32
    }

    /// Generation (high 32 bits).
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Pack into a single `u64`, generation in the high half.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// Inverse of [`EntityId::to_raw`].
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// EntityAllocator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Slot {
    generation: u32,
    alive: bool,
}

/// Hands out [`EntityId`]s and recycles freed slots.
///
/// Freed slots are reused oldest-first so a single hot slot does not burn
/// through its generations while others sit idle.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    slots: Vec<Slot>,
    free: VecDeque<u32>,
    live: usize,
}

impl EntityAllocator {
    /// An allocator with no live entities.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a handle, reusing a freed slot when one is available.
    pub fn allocate(&mut self) -> EntityId {
        self.live += 1;
        if let Some(index) = self.free.pop_front() {
            let slot = &mut self.slots[index as usize];
            slot.alive = true;
            return EntityId::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            alive: true,
        });
        EntityId::new(index, 0)
    }

    /// Free a handle and bump its slot generation.
    ///
    /// Returns `false` when the handle was already dead or stale.
    pub fn deallocate(&mut self, id: EntityId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let slot = &mut self.slots[id.index() as usize];
        slot.alive = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push_back(id.index());
        self.live -= 1;
        true
    }

    /// `true` if `id` names a live slot with a matching generation.
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.slots
            .get(id.index() as usize)
            .is_some_and(|slot| slot.alive && slot.generation == id.generation())
    }

    /// Number of live entities.
    pub fn alive_count(&self) -> usize {
        self.live
    }

    /// Every currently live handle, in slot order.
    pub fn alive_entities(&self) -> Vec<EntityId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.alive)
            .map(|(index, slot)| EntityId::new(index as u32, slot.generation))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_unique_indices() {
        let mut alloc = EntityAllocator::new();
        let mut indices: Vec<u32> = (0..64).map(|_| alloc.allocate().index()).collect();
        indices.sort();
        indices.dedup();
        assert_eq!(indices.len(), 64);
    }

    #[test]
    fn recycled_slot_gets_next_generation() {
        let mut alloc = EntityAllocator::new();
        let first = alloc.allocate();
        assert!(alloc.deallocate(first));
        let second = alloc.allocate();
        assert_eq!(second.index(), first.index());
        assert_eq!(second.generation(), first.generation() + 1);
    }

    #[test]
    fn stale_handle_stays_dead_after_reuse() {
        let mut alloc = EntityAllocator::new();
        let old = alloc.allocate();
        alloc.deallocate(old);
        let _new = alloc.allocate();
        assert!(!alloc.is_alive(old));
    }

    #[test]
    fn double_free_is_rejected() {
        let mut alloc = EntityAllocator::new();
        let e = alloc.allocate();
        assert!(alloc.deallocate(e));
        assert!(!alloc.deallocate(e));
        assert_eq!(alloc.alive_count(), 0);
    }

    #[test]
    fn alive_entities_lists_live_handles_only() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        alloc.deallocate(a);
        assert_eq!(alloc.alive_entities(), vec![b]);
    }

    #[test]
    fn raw_roundtrip_preserves_fields() {
        let id = EntityId::new(42, 7);
        assert_eq!(EntityId::from_raw(id.to_raw()), id);
        assert_eq!(id.index(), 42);
        assert_eq!(id.generation(), 7);
    }
}
