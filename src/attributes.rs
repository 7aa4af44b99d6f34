//! Dense per-element attribute storage owned by the application.
//!
//! An [`AttributeCollection`] holds one value per vertex (or face) slot. Its length
//! must stay at least the capacity of the element kind it annotates: operations
//! that allocate slots call [`AttributeCollection::grow_to_at_least`] from their
//! `after` stage before writing the new elements' values. Like the connectivity
//! store it is written through `&self`, so workers holding disjoint vertex locks
//! can update their own entries concurrently.

use crate::mesh_error::MeshWeaveError;
use crate::topology::consolidate::Remap;
use crate::topology::slots::SlotTable;
use parking_lot::Mutex;

#[derive(Debug)]
pub struct AttributeCollection<T> {
    values: SlotTable<T>,
    default: T,
    grow: Mutex<()>,
}

impl<T: Clone + Default> Default for AttributeCollection<T> {
    fn default() -> Self {
        Self::with_default(T::default())
    }
}

impl<T: Clone> AttributeCollection<T> {
    /// Empty collection whose new slots are filled with `default`.
    pub fn with_default(default: T) -> Self {
        Self {
            values: SlotTable::default(),
            default,
            grow: Mutex::new(()),
        }
    }

    pub fn from_vec(values: Vec<T>, default: T) -> Self {
        Self {
            values: SlotTable::from_vec(values),
            default,
            grow: Mutex::new(()),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `index`, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<T> {
        self.values.get(index)
    }

    /// Value at `index`, or the fill value past the end.
    pub fn get_or_default(&self, index: usize) -> T {
        self.values.get(index).unwrap_or_else(|| self.default.clone())
    }

    pub fn set(&self, index: usize, value: T) -> Result<(), MeshWeaveError> {
        let len = self.len();
        if index >= len {
            return Err(MeshWeaveError::AttributeOutOfRange { index, len });
        }
        self.values.set(index, value);
        Ok(())
    }

    pub fn update<R>(&self, index: usize, f: impl FnOnce(&mut T) -> R) -> Result<R, MeshWeaveError> {
        let len = self.len();
        self.values
            .update(index, f)
            .ok_or(MeshWeaveError::AttributeOutOfRange { index, len })
    }

    /// Extends with fill values until `len() >= capacity`. Never shrinks.
    pub fn grow_to_at_least(&self, capacity: usize) {
        if self.len() >= capacity {
            return;
        }
        let _guard = self.grow.lock();
        while self.len() < capacity {
            self.values.allocate(self.default.clone());
        }
    }

    /// Compacts through a vertex remap; dropped slots are discarded.
    pub fn remap_vertices(&mut self, remap: &Remap) {
        self.values = SlotTable::from_vec(Self::compact(self.values.to_vec(), &remap.vertices));
    }

    pub fn remap_faces(&mut self, remap: &Remap) {
        self.values = SlotTable::from_vec(Self::compact(self.values.to_vec(), &remap.faces));
    }

    fn compact(old: Vec<T>, table: &[Option<usize>]) -> Vec<T> {
        let mut kept: Vec<(usize, T)> = old
            .into_iter()
            .enumerate()
            .filter_map(|(i, v)| table.get(i).copied().flatten().map(|n| (n, v)))
            .collect();
        kept.sort_by_key(|(n, _)| *n);
        kept.into_iter().map(|(_, v)| v).collect()
    }

    /// Dense snapshot in index order.
    pub fn to_vec(&self) -> Vec<T> {
        self.values.to_vec()
    }
}
