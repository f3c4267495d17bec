/// Object pool: fixed slots that are recycled, never freed.
///
/// `next()` hands out the first slot whose object no longer exists, or grows
/// the pool by one default object. Each slot carries a generation that is
/// bumped on reuse, so a `Handle` kept from an earlier life of the slot
/// resolves to `None` instead of silently pointing at the new occupant.

use super::object::GameObject;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    object: T,
}

#[derive(Debug)]
pub struct ObjectPool<T> {
    slots: Vec<Slot<T>>,
}

impl<T> Default for ObjectPool<T> {
    fn default() -> Self {
        ObjectPool { slots: Vec::new() }
    }
}

impl<T: GameObject + Default> ObjectPool<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ObjectPool { slots: Vec::with_capacity(capacity) }
    }

    /// A slot for a new object. The returned object is either a fresh
    /// default or a dead one from an earlier life; the caller respawns it.
    pub fn next(&mut self) -> (Handle, &mut T) {
        let index = match self.slots.iter().position(|s| !s.object.does_exist()) {
            Some(i) => {
                let slot = &mut self.slots[i];
                slot.generation = slot.generation.wrapping_add(1);
                i
            }
            None => {
                self.slots.push(Slot { generation: 0, object: T::default() });
                self.slots.len() - 1
            }
        };
        let slot = &mut self.slots[index];
        (Handle { index: index as u32, generation: slot.generation }, &mut slot.object)
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots
            .get(handle.index())
            .filter(|s| s.generation == handle.generation)
            .map(|s| &s.object)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index())
            .filter(|s| s.generation == handle.generation)
            .map(|s| &mut s.object)
    }

    /// Number of slots, live or not.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.object.does_exist()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().map(|s| &s.object)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut().map(|s| &mut s.object)
    }

    /// Handles of every existing object.
    pub fn handles(&self) -> Vec<Handle> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.object.does_exist())
            .map(|(i, s)| Handle { index: i as u32, generation: s.generation })
            .collect()
    }

    /// Mark every object as gone. Slots stay allocated.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.object.force_kill();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::math::Vector;
    use crate::domain::object::ObjectCore;

    #[derive(Default)]
    struct Dot {
        core: ObjectCore,
        tag: u32,
    }

    impl GameObject for Dot {
        fn core(&self) -> &ObjectCore { &self.core }
        fn core_mut(&mut self) -> &mut ObjectCore { &mut self.core }
    }

    fn spawn(pool: &mut ObjectPool<Dot>, tag: u32) -> Handle {
        let (h, dot) = pool.next();
        dot.core.respawn(Vector::ZERO);
        dot.tag = tag;
        h
    }

    #[test]
    fn grows_while_all_slots_are_live() {
        let mut pool = ObjectPool::new();
        let a = spawn(&mut pool, 1);
        let b = spawn(&mut pool, 2);
        assert_ne!(a.index(), b.index());
        assert_eq!(pool.capacity(), 2);
        assert_eq!(pool.live_count(), 2);
    }

    #[test]
    fn reuses_dead_slot_and_invalidates_old_handle() {
        let mut pool = ObjectPool::new();
        let a = spawn(&mut pool, 1);
        let _b = spawn(&mut pool, 2);

        pool.get_mut(a).unwrap().force_kill();
        let c = spawn(&mut pool, 3);

        assert_eq!(c.index(), a.index());
        assert_eq!(pool.capacity(), 2);
        assert!(pool.get(a).is_none());
        assert_eq!(pool.get(c).map(|d| d.tag), Some(3));
    }

    #[test]
    fn dying_objects_are_not_reused() {
        let mut pool = ObjectPool::new();
        let a = spawn(&mut pool, 1);
        pool.get_mut(a).unwrap().kill();
        let b = spawn(&mut pool, 2);
        assert_ne!(a.index(), b.index());
    }

    #[test]
    fn clear_keeps_slots() {
        let mut pool = ObjectPool::new();
        spawn(&mut pool, 1);
        spawn(&mut pool, 2);
        pool.clear();
        assert_eq!(pool.live_count(), 0);
        assert_eq!(pool.capacity(), 2);
        assert!(pool.handles().is_empty());
        spawn(&mut pool, 3);
        assert_eq!(pool.capacity(), 2);
    }
}
