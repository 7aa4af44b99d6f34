//! `TriMesh`: the tuple-addressed triangle connectivity store.
//!
//! Faces store their three vertex ids counter-clockwise; vertices store the
//! sorted ids of their incident faces. Elements are never erased in place:
//! removal marks the slot dead, and every rewrite bumps the face version so that
//! outstanding [`Tuple`]s become invalid. All methods take `&self`; structural
//! mutation is safe under concurrency as long as callers hold the vertex locks
//! covering the region they rewrite (see [`crate::topology::locks`]).
//!
//! Navigation never panics on stale handles. A tuple whose vertex is no longer in
//! its face navigates to itself, and callers are expected to check
//! [`TriMesh::is_valid`] wherever liveness is uncertain.

use crate::mesh_error::MeshWeaveError;
use crate::topology::connectivity::{TriangleConnectivity, VertexConnectivity, set_intersection};
use crate::topology::locks::VertexLocks;
use crate::topology::slots::SlotTable;
use crate::topology::tuple::Tuple;
use hashbrown::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct TriMesh {
    pub(crate) vertices: SlotTable<VertexConnectivity>,
    pub(crate) faces: SlotTable<TriangleConnectivity>,
    pub(crate) locks: VertexLocks,
}

impl TriMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the store from a face list over `n_vertices` vertices.
    ///
    /// Vertices that no face references are created dead, since no tuple can
    /// address them.
    pub fn from_faces(n_vertices: usize, faces: &[[usize; 3]]) -> Result<Self, MeshWeaveError> {
        let mut conn = vec![Vec::new(); n_vertices];
        for (fid, f) in faces.iter().enumerate() {
            if let Some(&vid) = f.iter().find(|&&v| v >= n_vertices) {
                return Err(MeshWeaveError::VertexOutOfRange {
                    vid,
                    capacity: n_vertices,
                });
            }
            if f[0] == f[1] || f[1] == f[2] || f[0] == f[2] {
                return Err(MeshWeaveError::DegenerateFace { fid, indices: *f });
            }
            for &v in f {
                conn[v].push(fid);
            }
        }
        let vertices = conn
            .into_iter()
            .enumerate()
            .map(|(vid, tris)| {
                if tris.is_empty() {
                    log::debug!("vertex {vid} has no incident face; marking it removed");
                    VertexConnectivity::vacant()
                } else {
                    VertexConnectivity::live(tris)
                }
            })
            .collect();
        let faces = faces.iter().map(|&f| TriangleConnectivity::live(f)).collect();
        Ok(Self {
            vertices: SlotTable::from_vec(vertices),
            faces: SlotTable::from_vec(faces),
            locks: VertexLocks::default(),
        })
    }

    // -------------------------------------------------------------------------
    // Slot access
    // -------------------------------------------------------------------------

    #[inline]
    pub fn vert_capacity(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn tri_capacity(&self) -> usize {
        self.faces.len()
    }

    pub fn locks(&self) -> &VertexLocks {
        &self.locks
    }

    pub fn vertex_connectivity(&self, vid: usize) -> Option<VertexConnectivity> {
        self.vertices.get(vid)
    }

    pub fn face_connectivity(&self, fid: usize) -> Option<TriangleConnectivity> {
        self.faces.get(fid)
    }

    pub fn is_vertex_removed(&self, vid: usize) -> bool {
        self.vertices.with(vid, |v| v.removed).unwrap_or(true)
    }

    pub fn is_face_removed(&self, fid: usize) -> bool {
        self.faces.with(fid, |f| f.removed).unwrap_or(true)
    }

    /// Incident faces of a live vertex, sorted; empty for dead or unknown ids.
    pub fn conn_tris(&self, vid: usize) -> Vec<usize> {
        self.vertices
            .with(vid, |v| {
                if v.removed {
                    Vec::new()
                } else {
                    v.conn_tris.clone()
                }
            })
            .unwrap_or_default()
    }

    /// Counter-clockwise vertex ids of a live face.
    pub fn oriented_tri_vids(&self, fid: usize) -> Option<[usize; 3]> {
        self.faces
            .with(fid, |f| (!f.removed).then_some(f.indices))
            .flatten()
    }

    pub(crate) fn face_hash(&self, fid: usize) -> Option<u64> {
        self.faces
            .with(fid, |f| (!f.removed).then_some(f.hash))
            .flatten()
    }

    fn local_index(&self, fid: usize, vid: usize) -> Option<usize> {
        self.faces.with(fid, |f| f.find(vid)).flatten()
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    /// Same edge and face, other endpoint.
    pub fn switch_vertex(&self, t: &Tuple) -> Tuple {
        let Some(indices) = self.faces.with(t.fid(), |f| f.indices) else {
            return *t;
        };
        let a = indices[(t.local_eid() + 1) % 3];
        let b = indices[(t.local_eid() + 2) % 3];
        let vid = if a == t.vid() {
            b
        } else if b == t.vid() {
            a
        } else {
            return *t;
        };
        Tuple::new(vid, t.local_eid(), t.fid(), t.hash())
    }

    /// Same vertex and face, the other edge through the vertex.
    pub fn switch_edge(&self, t: &Tuple) -> Tuple {
        let Some(j) = self.local_index(t.fid(), t.vid()) else {
            return *t;
        };
        let (e1, e2) = ((j + 1) % 3, (j + 2) % 3);
        let eid = if t.local_eid() == e1 { e2 } else { e1 };
        Tuple::new(t.vid(), eid, t.fid(), t.hash())
    }

    /// Same vertex and edge, the neighbouring face; `None` on the boundary.
    pub fn switch_face(&self, t: &Tuple) -> Option<Tuple> {
        let v0 = t.vid();
        let v1 = self.switch_vertex(t).vid();
        if v0 == v1 {
            return None;
        }
        let shared = set_intersection(&self.conn_tris(v0), &self.conn_tris(v1));
        let other = shared.into_iter().find(|&f| f != t.fid())?;
        let face = self.faces.get(other)?;
        let l0 = face.find(v0)?;
        let l1 = face.find(v1)?;
        Some(Tuple::new(
            v0,
            TriangleConnectivity::local_edge_between(l0, l1),
            other,
            face.hash,
        ))
    }

    /// True iff the tuple's vertex and face are alive, its version matches the
    /// face, and its local edge passes through its vertex.
    pub fn is_valid(&self, t: &Tuple) -> bool {
        if t.local_eid() > 2 || self.is_vertex_removed(t.vid()) {
            return false;
        }
        self.faces
            .with(t.fid(), |f| {
                !f.removed
                    && f.hash == t.hash()
                    && f.find(t.vid()).is_some_and(|j| j != t.local_eid())
            })
            .unwrap_or(false)
    }

    /// A tuple is counter-clockwise when its vertex is the first endpoint of its
    /// edge in face order.
    pub fn is_ccw(&self, t: &Tuple) -> bool {
        self.local_index(t.fid(), t.vid()) == Some((t.local_eid() + 1) % 3)
    }

    // -------------------------------------------------------------------------
    // Handle constructors
    // -------------------------------------------------------------------------

    fn tuple_at(&self, vid: usize, fid: usize) -> Option<Tuple> {
        let face = self.faces.get(fid).filter(|f| !f.removed)?;
        let j = face.find(vid)?;
        Some(Tuple::new(vid, (j + 2) % 3, fid, face.hash))
    }

    pub fn tuple_from_vertex(&self, vid: usize) -> Option<Tuple> {
        let fid = *self.conn_tris(vid).first()?;
        self.tuple_at(vid, fid)
    }

    pub fn tuple_from_tri(&self, fid: usize) -> Option<Tuple> {
        let face = self.faces.get(fid).filter(|f| !f.removed)?;
        Some(Tuple::new(face.indices[0], 2, fid, face.hash))
    }

    /// Counter-clockwise tuple on local edge `local_eid` of face `fid`.
    pub fn tuple_from_edge(&self, fid: usize, local_eid: usize) -> Option<Tuple> {
        if local_eid > 2 {
            return None;
        }
        let face = self.faces.get(fid).filter(|f| !f.removed)?;
        Some(Tuple::new(
            face.indices[(local_eid + 1) % 3],
            local_eid,
            fid,
            face.hash,
        ))
    }

    /// Tuple based at `a` on edge `(a, b)`, in the lowest-id face holding both.
    pub fn tuple_from_vids(&self, a: usize, b: usize) -> Option<Tuple> {
        let fid = *set_intersection(&self.conn_tris(a), &self.conn_tris(b)).first()?;
        let face = self.faces.get(fid)?;
        let la = face.find(a)?;
        let lb = face.find(b)?;
        Some(Tuple::new(
            a,
            TriangleConnectivity::local_edge_between(la, lb),
            fid,
            face.hash,
        ))
    }

    // -------------------------------------------------------------------------
    // Whole-mesh enumeration
    // -------------------------------------------------------------------------

    pub fn get_vertices(&self) -> Vec<Tuple> {
        (0..self.vert_capacity())
            .filter_map(|vid| self.tuple_from_vertex(vid))
            .collect()
    }

    pub fn get_faces(&self) -> Vec<Tuple> {
        (0..self.tri_capacity())
            .filter_map(|fid| self.tuple_from_tri(fid))
            .collect()
    }

    /// Every edge once, as a counter-clockwise tuple of its lowest-id face.
    pub fn get_edges(&self) -> Vec<Tuple> {
        let mut edges = Vec::new();
        for fid in 0..self.tri_capacity() {
            for eid in 0..3 {
                let Some(t) = self.tuple_from_edge(fid, eid) else {
                    break;
                };
                match self.switch_face(&t) {
                    Some(other) if other.fid() < fid => {}
                    _ => edges.push(t),
                }
            }
        }
        edges
    }

    pub fn valid_vertex_count(&self) -> usize {
        (0..self.vert_capacity())
            .filter(|&v| !self.is_vertex_removed(v))
            .count()
    }

    pub fn valid_face_count(&self) -> usize {
        (0..self.tri_capacity())
            .filter(|&f| !self.is_face_removed(f))
            .count()
    }

    // -------------------------------------------------------------------------
    // Local queries
    // -------------------------------------------------------------------------

    /// One tuple per incident face, each based at `vid`.
    pub fn get_one_ring_tris_for_vertex(&self, vid: usize) -> Vec<Tuple> {
        self.conn_tris(vid)
            .into_iter()
            .filter_map(|fid| self.tuple_at(vid, fid))
            .collect()
    }

    /// Sorted ids of the vertices adjacent to `vid`.
    pub fn get_one_ring_vids_for_vertex(&self, vid: usize) -> Vec<usize> {
        let mut ring: Vec<usize> = self
            .conn_tris(vid)
            .into_iter()
            .filter_map(|fid| self.oriented_tri_vids(fid))
            .flat_map(|f| f.into_iter())
            .filter(|&v| v != vid)
            .collect();
        ring.sort_unstable();
        ring.dedup();
        ring
    }

    /// One tuple per incident edge, each based at `vid`.
    pub fn get_one_ring_edges_for_vertex(&self, vid: usize) -> Vec<Tuple> {
        let mut seen = HashSet::new();
        let mut edges = Vec::new();
        for fid in self.conn_tris(vid) {
            let Some(face) = self.faces.get(fid).filter(|f| !f.removed) else {
                continue;
            };
            let Some(j) = face.find(vid) else { continue };
            for (eid, other) in [((j + 1) % 3, (j + 2) % 3), ((j + 2) % 3, (j + 1) % 3)] {
                if seen.insert(face.indices[other]) {
                    edges.push(Tuple::new(vid, eid, fid, face.hash));
                }
            }
        }
        edges
    }

    /// The one or two faces sharing the edge of `t`, sorted by face id.
    pub fn tris_bounded_by_edge(&self, t: &Tuple) -> Vec<Tuple> {
        let mut tris = vec![*t];
        if let Some(other) = self.switch_face(t) {
            tris.push(other);
        }
        tris.sort_by_key(|x| x.fid());
        tris
    }

    pub fn is_boundary_edge(&self, t: &Tuple) -> bool {
        self.switch_face(t).is_none()
    }

    /// `(fid, local_eid)` of edge `(a, b)` when exactly one live face holds it.
    pub fn boundary_edge_address(&self, a: usize, b: usize) -> Option<(usize, usize)> {
        let shared = set_intersection(&self.conn_tris(a), &self.conn_tris(b));
        let [fid] = shared[..] else {
            return None;
        };
        let face = self.faces.get(fid)?;
        let la = face.find(a)?;
        let lb = face.find(b)?;
        Some((fid, TriangleConnectivity::local_edge_between(la, lb)))
    }

    /// A vertex is on the boundary when one of its edges bounds a single face.
    pub fn is_boundary_vertex(&self, vid: usize) -> bool {
        let mut counts: HashMap<usize, usize> = HashMap::new();
        for fid in self.conn_tris(vid) {
            if let Some(f) = self.oriented_tri_vids(fid) {
                for v in f.into_iter().filter(|&v| v != vid) {
                    *counts.entry(v).or_default() += 1;
                }
            }
        }
        counts.values().any(|&c| c == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 0 --- 1
    // | \   |
    // |  \  |
    // 3 --- 2
    fn square() -> TriMesh {
        TriMesh::from_faces(4, &[[0, 2, 1], [0, 3, 2]]).unwrap()
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            TriMesh::from_faces(2, &[[0, 1, 2]]).unwrap_err(),
            MeshWeaveError::VertexOutOfRange { vid: 2, capacity: 2 }
        );
        assert_eq!(
            TriMesh::from_faces(3, &[[0, 1, 1]]).unwrap_err(),
            MeshWeaveError::DegenerateFace {
                fid: 0,
                indices: [0, 1, 1]
            }
        );
    }

    #[test]
    fn switches_are_involutions() {
        let m = square();
        for t in m.get_faces().into_iter().flat_map(|f| {
            let e = m.switch_edge(&f);
            [f, m.switch_vertex(&f), e, m.switch_vertex(&e)]
        }) {
            assert!(m.is_valid(&t));
            assert_eq!(m.switch_vertex(&m.switch_vertex(&t)), t);
            assert_eq!(m.switch_edge(&m.switch_edge(&t)), t);
            if let Some(o) = m.switch_face(&t) {
                assert_eq!(m.switch_face(&o), Some(t));
            }
        }
    }

    #[test]
    fn diagonal_is_interior() {
        let m = square();
        let t = m.tuple_from_vids(0, 2).unwrap();
        assert!(!m.is_boundary_edge(&t));
        let fids: Vec<_> = m.tris_bounded_by_edge(&t).iter().map(|x| x.fid()).collect();
        assert_eq!(fids, vec![0, 1]);
        let b = m.tuple_from_vids(0, 1).unwrap();
        assert!(m.is_boundary_edge(&b));
        assert_eq!(m.boundary_edge_address(1, 0), Some((0, 1)));
        assert_eq!(m.boundary_edge_address(0, 2), None);
    }

    #[test]
    fn enumeration_counts() {
        let m = square();
        assert_eq!(m.get_vertices().len(), 4);
        assert_eq!(m.get_faces().len(), 2);
        assert_eq!(m.get_edges().len(), 5);
        assert_eq!(m.get_one_ring_vids_for_vertex(0), vec![1, 2, 3]);
        assert_eq!(m.get_one_ring_edges_for_vertex(0).len(), 3);
        assert_eq!(m.get_one_ring_tris_for_vertex(2).len(), 2);
        assert!(m.is_boundary_vertex(0));
    }

    #[test]
    fn ccw_follows_face_order() {
        let m = square();
        let t = m.tuple_from_edge(0, 0).unwrap();
        assert_eq!(t.vid(), 2);
        assert!(m.is_ccw(&t));
        assert!(!m.is_ccw(&m.switch_vertex(&t)));
    }

    #[test]
    fn isolated_vertex_is_dead() {
        let m = TriMesh::from_faces(4, &[[0, 1, 2]]).unwrap();
        assert!(m.is_vertex_removed(3));
        assert_eq!(m.valid_vertex_count(), 3);
        assert!(m.tuple_from_vertex(3).is_none());
    }
}
