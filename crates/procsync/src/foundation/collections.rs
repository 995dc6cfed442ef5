//! Specialized collection types

pub use slotmap::SlotMap;

/// Handle-based map using slot map for stable, generation-checked keys
pub type HandleMap<K, T> = SlotMap<K, T>;

/// Fixed-capacity pool whose insert evicts the worst-ranked occupant
///
/// Backed by a slot vector so indices stay stable while entries come and
/// go. When the pool is full, [`BoundedPool::insert_or_evict`] removes the
/// occupant the ranking function scores highest and returns it, keeping
/// the pool's memory footprint constant no matter how fast entries arrive.
#[derive(Debug)]
pub struct BoundedPool<T> {
    slots: Vec<Option<T>>,
}

impl<T> BoundedPool<T> {
    /// Create a pool with a fixed number of slots
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self { slots }
    }

    /// Number of slots in the pool
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// True if no slot is occupied
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|slot| slot.is_none())
    }

    /// Insert an item, evicting the highest-ranked occupant if full
    ///
    /// Returns the evicted item, or `None` if a free slot was available.
    /// Ties rank to the earliest-filled slot so eviction is deterministic.
    pub fn insert_or_evict<F>(&mut self, item: T, rank: F) -> Option<T>
    where
        F: Fn(&T) -> f32,
    {
        if let Some(slot) = self.slots.iter_mut().find(|slot| slot.is_none()) {
            *slot = Some(item);
            return None;
        }

        let mut victim = 0;
        let mut victim_rank = f32::MIN;
        for (index, slot) in self.slots.iter().enumerate() {
            if let Some(occupant) = slot {
                let score = rank(occupant);
                if score > victim_rank {
                    victim = index;
                    victim_rank = score;
                }
            }
        }
        let evicted = self.slots[victim].take();
        self.slots[victim] = Some(item);
        evicted
    }

    /// Remove and return the first item matching the predicate
    pub fn take_where<P>(&mut self, mut predicate: P) -> Option<T>
    where
        P: FnMut(&T) -> bool,
    {
        for slot in &mut self.slots {
            if slot.as_ref().is_some_and(&mut predicate) {
                return slot.take();
            }
        }
        None
    }

    /// Iterate over occupied slots
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    /// Remove all items
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }
}
