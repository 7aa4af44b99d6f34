//! Append-only slot tables shared between executor workers.
//!
//! Slots are addressed by dense `usize` ids handed out by an atomic counter.
//! Each slot is stored in a sharded `DashMap`, so workers holding disjoint vertex
//! locks can read and rewrite their own slots, and allocate fresh ones, without a
//! global lock. Accessors never hand out references: closures passed to
//! [`SlotTable::with`] and [`SlotTable::update`] must not touch the same table.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug)]
pub struct SlotTable<T> {
    slots: DashMap<usize, T>,
    /// Published only after the slot is inserted, so `id < len()` implies
    /// the slot exists.
    len: AtomicUsize,
    alloc: Mutex<()>,
}

impl<T> Default for SlotTable<T> {
    fn default() -> Self {
        Self {
            slots: DashMap::new(),
            len: AtomicUsize::new(0),
            alloc: Mutex::new(()),
        }
    }
}

impl<T: Clone> SlotTable<T> {
    pub fn from_vec(values: Vec<T>) -> Self {
        let len = values.len();
        let slots = DashMap::with_capacity(len);
        for (i, v) in values.into_iter().enumerate() {
            slots.insert(i, v);
        }
        Self {
            slots,
            len: AtomicUsize::new(len),
            alloc: Mutex::new(()),
        }
    }

    /// Number of slots ever allocated (live or dead).
    #[inline]
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reserves a new slot initialised with `value` and returns its id.
    pub fn allocate(&self, value: T) -> usize {
        let _guard = self.alloc.lock();
        let id = self.len.load(Ordering::Acquire);
        self.slots.insert(id, value);
        self.len.store(id + 1, Ordering::Release);
        id
    }

    /// Clones slot `id`, if it exists.
    pub fn get(&self, id: usize) -> Option<T> {
        self.slots.get(&id).map(|r| r.value().clone())
    }

    pub fn with<R>(&self, id: usize, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.slots.get(&id).map(|r| f(r.value()))
    }

    pub fn update<R>(&self, id: usize, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.slots.get_mut(&id).map(|mut r| f(r.value_mut()))
    }

    /// Overwrites slot `id`; ids not yet allocated are ignored.
    pub fn set(&self, id: usize, value: T) {
        if let Some(mut slot) = self.slots.get_mut(&id) {
            *slot = value;
        }
    }

    /// Dense snapshot in id order; missing slots are skipped.
    pub fn to_vec(&self) -> Vec<T> {
        (0..self.len()).filter_map(|i| self.get(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_get_update() {
        let table = SlotTable::from_vec(vec![10u32, 20]);
        assert_eq!(table.len(), 2);
        let id = table.allocate(30);
        assert_eq!(id, 2);
        assert_eq!(table.get(2), Some(30));
        table.update(0, |v| *v += 1);
        assert_eq!(table.with(0, |v| *v * 2), Some(22));
        assert_eq!(table.get(9), None);
    }

    #[test]
    fn set_ignores_unallocated_ids() {
        let table: SlotTable<u8> = SlotTable::default();
        table.set(0, 1);
        assert!(table.is_empty());
        assert_eq!(table.get(0), None);
    }

    #[test]
    fn concurrent_allocation_hands_out_unique_ids() {
        use rayon::prelude::*;
        let table: SlotTable<usize> = SlotTable::default();
        let mut ids: Vec<usize> = (0..256).into_par_iter().map(|i| table.allocate(i)).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 256);
        assert_eq!(table.len(), 256);
    }

    #[test]
    fn writes_racing_allocation_are_kept() {
        use std::sync::Barrier;
        for _ in 0..2_000 {
            let table: SlotTable<usize> = SlotTable::from_vec(vec![0; 8]);
            let barrier = Barrier::new(2);
            std::thread::scope(|s| {
                s.spawn(|| {
                    barrier.wait();
                    let id = table.allocate(0);
                    table.set(id, id + 100);
                });
                s.spawn(|| {
                    barrier.wait();
                    let id = table.allocate(0);
                    table.set(id, id + 100);
                });
            });
            assert_eq!(table.to_vec()[8..], [108, 109]);
        }
    }
}
