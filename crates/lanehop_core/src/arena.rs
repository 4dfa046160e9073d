//! # Entity Arena
//!
//! Generational slot storage for entities that outlive a single chunk.
//!
//! Handles are [`EntityId`]s: an index into the slot array plus a
//! generation counter. Removing a value bumps the slot's generation, so
//! any handle still pointing at the old value resolves to `None` instead
//! of aliasing whatever is stored there next.

/// Handle to a value stored in an [`EntityArena`].
///
/// The ID is split into two parts:
/// - Lower 32 bits: slot index
/// - Upper 32 bits: generation of the slot when the value was inserted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates an ID from slot index and generation.
    ///
    /// # Arguments
    ///
    /// * `index` - Slot index (0 to 2^32-1)
    /// * `generation` - Generation counter (0 to 2^32-1)
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Returns the slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Growable generational arena.
///
/// Unlike a fixed pool, the arena grows when the free list is empty;
/// freed slots are reused before new ones are appended. Iteration order
/// is slot order, which is stable for a given sequence of operations.
#[derive(Debug, Clone)]
pub struct EntityArena<T> {
    /// Slot storage.
    slots: Vec<Slot<T>>,
    /// Indices of vacant slots.
    free_list: Vec<u32>,
    /// Number of occupied slots.
    len: usize,
}

impl<T> Default for EntityArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EntityArena<T> {
    /// Creates an empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Creates an empty arena with room for `capacity` values.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Number of stored values.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if nothing is stored.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stores a value and returns its handle.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` slots would be needed.
    pub fn insert(&mut self, value: T) -> EntityId {
        self.len += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return EntityId::new(index, slot.generation);
        }

        assert!(
            self.slots.len() < u32::MAX as usize,
            "Entity arena exceeded u32 slots"
        );
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        EntityId::new(index, 0)
    }

    /// Removes a value. Stale or unknown handles return `None`.
    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index());
        self.len -= 1;
        Some(value)
    }

    /// Looks up a value.
    #[inline]
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&T> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.value.as_ref()
    }

    /// Looks up a value mutably.
    #[inline]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.value.as_mut()
    }

    /// Returns true if the handle still resolves.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Iterates over stored values in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value
                .as_ref()
                .map(|v| (EntityId::new(index as u32, slot.generation), v))
        })
    }

    /// Iterates mutably over stored values in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
            let generation = slot.generation;
            slot.value
                .as_mut()
                .map(|v| (EntityId::new(index as u32, generation), v))
        })
    }

    /// Keeps only the values for which `keep` returns true.
    ///
    /// Returns how many values were removed.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(EntityId, &T) -> bool,
    {
        let mut removed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let id = EntityId::new(index as u32, slot.generation);
            let drop_it = slot.value.as_ref().is_some_and(|v| !keep(id, v));
            if drop_it {
                slot.value = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free_list.push(index as u32);
                removed += 1;
            }
        }
        self.len -= removed;
        removed
    }

    /// Removes everything. Outstanding handles become stale.
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free_list.push(index as u32);
            }
        }
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_layout() {
        let id = EntityId::new(12345, 67890);
        assert_eq!(id.index(), 12345);
        assert_eq!(id.generation(), 67890);
    }

    #[test]
    fn test_insert_get_remove() {
        let mut arena = EntityArena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(a), Some(&"a"));
        assert_eq!(arena.remove(a), Some("a"));
        assert_eq!(arena.remove(a), None);
        assert_eq!(arena.len(), 1);
        assert!(arena.contains(b));
    }

    #[test]
    fn test_stale_handle_after_reuse() {
        let mut arena = EntityArena::new();
        let old = arena.insert(1);
        arena.remove(old);
        let new = arena.insert(2);

        assert_eq!(old.index(), new.index());
        assert_ne!(old, new);
        assert_eq!(arena.get(old), None);
        assert_eq!(arena.get(new), Some(&2));
    }

    #[test]
    fn test_retain_and_clear() {
        let mut arena = EntityArena::with_capacity(8);
        let ids: Vec<_> = (0..8).map(|i| arena.insert(i)).collect();

        let removed = arena.retain(|_, v| v % 2 == 0);
        assert_eq!(removed, 4);
        assert_eq!(arena.len(), 4);
        assert!(arena.get(ids[1]).is_none());
        assert_eq!(arena.get(ids[2]), Some(&2));

        arena.clear();
        assert!(arena.is_empty());
        assert!(arena.get(ids[2]).is_none());
        assert_eq!(arena.iter().count(), 0);
    }

    #[test]
    fn test_iter_mut_updates_in_place() {
        let mut arena = EntityArena::new();
        arena.insert(1);
        arena.insert(2);
        for (_, v) in arena.iter_mut() {
            *v *= 10;
        }
        let values: Vec<_> = arena.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![10, 20]);
    }
}
