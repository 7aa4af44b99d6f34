//! Non-blocking per-vertex locks for concurrent local edits.
//!
//! A worker claims every vertex an operation may touch before running it.
//! Acquisition is all-or-nothing over a sorted id list: if any vertex is owned
//! by another worker, everything taken so far is released and the caller gets
//! `None` back. Nobody ever waits on a vertex, and sorted acquisition stays
//! deadlock-free even if blocking were introduced later.
//!
//! Locks are re-entrant per worker: a worker that already owns a vertex keeps it,
//! and only the guard that first claimed a vertex releases it.

use crate::topology::tri_mesh::TriMesh;
use crate::topology::tuple::Tuple;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Owner table: vertex id → worker id.
#[derive(Debug, Default)]
pub struct VertexLocks {
    owners: DashMap<usize, usize>,
}

impl VertexLocks {
    /// Tries to claim every vertex in `vids` for `worker`.
    pub fn try_lock_all<I>(&self, vids: I, worker: usize) -> Option<VertexLockGuard<'_>>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut sorted: Vec<usize> = vids.into_iter().collect();
        sorted.sort_unstable();
        sorted.dedup();

        let mut held = Vec::with_capacity(sorted.len());
        let mut contended = None;
        for vid in sorted {
            // The entry guard must be gone before releasing anything below.
            match self.owners.entry(vid) {
                Entry::Vacant(slot) => {
                    slot.insert(worker);
                    held.push(vid);
                }
                Entry::Occupied(slot) => {
                    if *slot.get() != worker {
                        contended = Some(vid);
                        break;
                    }
                }
            }
        }
        if let Some(vid) = contended {
            log::trace!("worker {worker} lost vertex {vid}; releasing {} locks", held.len());
            self.release(&held, worker);
            return None;
        }
        Some(VertexLockGuard {
            locks: self,
            held,
            worker,
        })
    }

    pub fn owner(&self, vid: usize) -> Option<usize> {
        self.owners.get(&vid).map(|r| *r.value())
    }

    pub fn is_locked(&self, vid: usize) -> bool {
        self.owners.contains_key(&vid)
    }

    pub fn locked_count(&self) -> usize {
        self.owners.len()
    }

    fn release(&self, vids: &[usize], worker: usize) {
        for vid in vids {
            self.owners.remove_if(vid, |_, owner| *owner == worker);
        }
    }
}

/// Releases the vertices it claimed when dropped.
#[derive(Debug)]
pub struct VertexLockGuard<'a> {
    locks: &'a VertexLocks,
    held: Vec<usize>,
    worker: usize,
}

impl VertexLockGuard<'_> {
    pub fn worker(&self) -> usize {
        self.worker
    }

    /// Vertices this guard claimed (excluding re-entrant ones).
    pub fn held(&self) -> &[usize] {
        &self.held
    }
}

impl Drop for VertexLockGuard<'_> {
    fn drop(&mut self) {
        self.locks.release(&self.held, self.worker);
    }
}

// -----------------------------------------------------------------------------
// Lock neighbourhoods
// -----------------------------------------------------------------------------

impl TriMesh {
    /// `vid` and its adjacent vertices.
    pub fn vertex_one_ring_lock_set(&self, vid: usize) -> Vec<usize> {
        let mut set = self.get_one_ring_vids_for_vertex(vid);
        set.push(vid);
        set.sort_unstable();
        set.dedup();
        set
    }

    /// Every vertex within two hops of `vid`.
    pub fn vertex_two_ring_lock_set(&self, vid: usize) -> Vec<usize> {
        let one_ring = self.vertex_one_ring_lock_set(vid);
        let mut set: Vec<usize> = one_ring
            .iter()
            .flat_map(|&v| self.vertex_one_ring_lock_set(v))
            .collect();
        set.sort_unstable();
        set.dedup();
        set
    }

    /// Two-ring of both endpoints of the edge of `t`.
    pub fn edge_two_ring_lock_set(&self, t: &Tuple) -> Vec<usize> {
        let v0 = t.vid();
        let v1 = self.switch_vertex(t).vid();
        let mut set = self.vertex_two_ring_lock_set(v0);
        set.extend(self.vertex_two_ring_lock_set(v1));
        set.sort_unstable();
        set.dedup();
        set
    }

    pub fn try_lock_vertex_one_ring(&self, vid: usize, worker: usize) -> Option<VertexLockGuard<'_>> {
        self.locks().try_lock_all(self.vertex_one_ring_lock_set(vid), worker)
    }

    pub fn try_lock_edge_two_ring(&self, t: &Tuple, worker: usize) -> Option<VertexLockGuard<'_>> {
        self.locks().try_lock_all(self.edge_two_ring_lock_set(t), worker)
    }
}
