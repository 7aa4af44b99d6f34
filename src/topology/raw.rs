//! Raw connectivity mutations: collapse, split, and swap.
//!
//! These primitives rewrite incidence arrays and report the new handles. They do
//! no manifoldness or geometry checks; the operation protocol decides whether a
//! mutation is allowed and whether its result is kept. Every primitive records a
//! [`ConnectivityDiff`] holding the pre-image of each slot it touched, so a
//! rejected edit can be rolled back with [`TriMesh::rollback`].
//!
//! Callers must hold the vertex locks covering the edge's two-ring when other
//! workers may be mutating the mesh.

use crate::mesh_error::MeshWeaveError;
use crate::topology::connectivity::{
    TriangleConnectivity, VertexConnectivity, set_intersection, set_union,
};
use crate::topology::tri_mesh::TriMesh;
use crate::topology::tuple::Tuple;
use serde::{Deserialize, Serialize};

/// How a mutation renamed vertices, for seam re-stitching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relabel {
    /// `v1` and `v2` were merged into `new`.
    Collapse { v1: usize, v2: usize, new: usize },
    /// Edge `(v1, v2)` gained the midpoint vertex `new`.
    Split { v1: usize, v2: usize, new: usize },
}

/// Pre-images of every slot touched by one or more raw edits.
#[derive(Debug, Clone, Default)]
pub struct ConnectivityDiff {
    vertices: Vec<(usize, VertexConnectivity)>,
    faces: Vec<(usize, TriangleConnectivity)>,
    allocated_vertices: Vec<usize>,
    allocated_faces: Vec<usize>,
}

impl ConnectivityDiff {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
            && self.faces.is_empty()
            && self.allocated_vertices.is_empty()
            && self.allocated_faces.is_empty()
    }

    /// Ids of pre-existing vertices whose slot was rewritten.
    pub fn touched_vertices(&self) -> impl Iterator<Item = usize> + '_ {
        self.vertices.iter().map(|(v, _)| *v)
    }

    pub fn touched_faces(&self) -> impl Iterator<Item = usize> + '_ {
        self.faces.iter().map(|(f, _)| *f)
    }

    pub fn allocated_vertices(&self) -> &[usize] {
        &self.allocated_vertices
    }

    pub fn allocated_faces(&self) -> &[usize] {
        &self.allocated_faces
    }

    /// Appends `later`, recorded after `self`. Rollback replays in reverse, so
    /// the earliest pre-image of each slot wins.
    pub fn append(&mut self, mut later: ConnectivityDiff) {
        self.vertices.append(&mut later.vertices);
        self.faces.append(&mut later.faces);
        self.allocated_vertices.append(&mut later.allocated_vertices);
        self.allocated_faces.append(&mut later.allocated_faces);
    }

    fn record_vertex(&mut self, mesh: &TriMesh, vid: usize) {
        if self.allocated_vertices.contains(&vid) || self.vertices.iter().any(|(v, _)| *v == vid) {
            return;
        }
        if let Some(old) = mesh.vertices.get(vid) {
            self.vertices.push((vid, old));
        }
    }

    fn record_face(&mut self, mesh: &TriMesh, fid: usize) {
        if self.allocated_faces.contains(&fid) || self.faces.iter().any(|(f, _)| *f == fid) {
            return;
        }
        if let Some(old) = mesh.faces.get(fid) {
            self.faces.push((fid, old));
        }
    }
}

/// Outcome of a successful raw mutation.
#[derive(Debug, Clone)]
pub struct RawEdit {
    /// Handle the caller continues from (operation-specific, see each primitive).
    pub return_tuple: Tuple,
    /// One tuple per face created or rewritten around the result.
    pub new_tris: Vec<Tuple>,
    pub relabel: Option<Relabel>,
    pub diff: ConnectivityDiff,
}

impl TriMesh {
    fn write_vertex(&self, diff: &mut ConnectivityDiff, vid: usize, f: impl FnOnce(&mut VertexConnectivity)) {
        diff.record_vertex(self, vid);
        self.vertices.update(vid, f);
    }

    fn write_face(&self, diff: &mut ConnectivityDiff, fid: usize, f: impl FnOnce(&mut TriangleConnectivity)) {
        diff.record_face(self, fid);
        self.faces.update(fid, f);
    }

    fn allocate_vertex(&self, diff: &mut ConnectivityDiff) -> usize {
        let vid = self.vertices.allocate(VertexConnectivity::vacant());
        diff.allocated_vertices.push(vid);
        vid
    }

    fn allocate_face(&self, diff: &mut ConnectivityDiff) -> usize {
        let fid = self.faces.allocate(TriangleConnectivity::vacant());
        diff.allocated_faces.push(fid);
        fid
    }

    /// Restores every slot recorded in `diff`; allocated slots are left dead.
    pub fn rollback(&self, diff: ConnectivityDiff) {
        for (fid, old) in diff.faces.into_iter().rev() {
            self.faces.set(fid, old);
        }
        for (vid, old) in diff.vertices.into_iter().rev() {
            self.vertices.set(vid, old);
        }
        for fid in diff.allocated_faces {
            self.faces.update(fid, |f| {
                f.removed = true;
                f.hash += 1;
            });
        }
        for vid in diff.allocated_vertices {
            self.vertices.set(vid, VertexConnectivity::vacant());
        }
    }

    /// Merges the endpoints of `t` into a freshly allocated vertex.
    ///
    /// Faces containing the edge are removed, the remaining faces around either
    /// endpoint are rewired to the new vertex, and both endpoints die. The return
    /// tuple is based at the new vertex; `new_tris` is its one-ring.
    pub fn collapse_edge_raw(&self, t: &Tuple) -> Result<RawEdit, MeshWeaveError> {
        if !self.is_valid(t) {
            return Err(MeshWeaveError::InvalidTuple(*t));
        }
        let v1 = t.vid();
        let v2 = self.switch_vertex(t).vid();
        let n1 = self.conn_tris(v1);
        let n2 = self.conn_tris(v2);
        let removed = set_intersection(&n1, &n2);
        let survivors: Vec<usize> = set_union(&n1, &n2)
            .into_iter()
            .filter(|f| removed.binary_search(f).is_err())
            .collect();
        if survivors.is_empty() {
            return Err(MeshWeaveError::DegenerateCollapse(*t));
        }

        let mut diff = ConnectivityDiff::default();
        let new_vid = self.allocate_vertex(&mut diff);

        for &fid in &removed {
            let Some(indices) = self.oriented_tri_vids(fid) else {
                continue;
            };
            for opp in indices.into_iter().filter(|&v| v != v1 && v != v2) {
                self.write_vertex(&mut diff, opp, |v| v.erase_tri(fid));
            }
            self.write_face(&mut diff, fid, |f| {
                f.removed = true;
                f.hash += 1;
            });
        }
        for &fid in &survivors {
            self.write_face(&mut diff, fid, |f| {
                for slot in f.indices.iter_mut() {
                    if *slot == v1 || *slot == v2 {
                        *slot = new_vid;
                    }
                }
                f.hash += 1;
            });
        }
        for vid in [v1, v2] {
            self.write_vertex(&mut diff, vid, |v| {
                v.removed = true;
                v.conn_tris.clear();
            });
        }
        self.vertices
            .set(new_vid, VertexConnectivity::live(survivors));

        crate::debug_invariants!(self.validate_vertex_fan(new_vid), "collapse_edge_raw");

        let new_tris = self.get_one_ring_tris_for_vertex(new_vid);
        let return_tuple = *new_tris
            .first()
            .ok_or(MeshWeaveError::DegenerateCollapse(*t))?;
        Ok(RawEdit {
            return_tuple,
            new_tris,
            relabel: Some(Relabel::Collapse {
                v1,
                v2,
                new: new_vid,
            }),
            diff,
        })
    }

    /// Inserts a vertex in the middle of the edge of `t`.
    ///
    /// Each face bounded by the edge keeps the half touching `t.vid()` and gets a
    /// new sibling face for the other half, with vertex order preserved. The
    /// return tuple is `t`'s vertex, local edge, and face, now pointing along the
    /// half-edge towards the new vertex.
    pub fn split_edge_raw(&self, t: &Tuple) -> Result<RawEdit, MeshWeaveError> {
        if !self.is_valid(t) {
            return Err(MeshWeaveError::InvalidTuple(*t));
        }
        let v1 = t.vid();
        let v2 = self.switch_vertex(t).vid();
        let bounded = self.tris_bounded_by_edge(t);

        let mut diff = ConnectivityDiff::default();
        let new_vid = self.allocate_vertex(&mut diff);
        let mut new_conn = Vec::with_capacity(4);

        for side in &bounded {
            let fid = side.fid();
            let Some(indices) = self.oriented_tri_vids(fid) else {
                self.rollback(diff);
                return Err(MeshWeaveError::InvalidTuple(*side));
            };
            let (Some(i), Some(j)) = (
                indices.iter().position(|&v| v == v1),
                indices.iter().position(|&v| v == v2),
            ) else {
                self.rollback(diff);
                return Err(MeshWeaveError::ConnectivityMismatch { vid: v2, fid });
            };
            let k = 3 - i - j;
            let opposite = indices[k];

            let new_fid = self.allocate_face(&mut diff);
            let mut sibling = [0; 3];
            sibling[i] = new_vid;
            sibling[j] = v2;
            sibling[k] = opposite;
            self.faces.set(
                new_fid,
                TriangleConnectivity {
                    indices: sibling,
                    removed: false,
                    hash: 1,
                },
            );
            self.write_face(&mut diff, fid, |f| {
                f.indices[j] = new_vid;
                f.hash += 1;
            });
            self.write_vertex(&mut diff, v2, |v| {
                v.erase_tri(fid);
                v.insert_tri(new_fid);
            });
            self.write_vertex(&mut diff, opposite, |v| v.insert_tri(new_fid));
            new_conn.push(fid);
            new_conn.push(new_fid);
        }
        new_conn.sort_unstable();
        self.vertices.set(new_vid, VertexConnectivity::live(new_conn));

        crate::debug_invariants!(self.validate_vertex_fan(new_vid), "split_edge_raw");

        let return_tuple = Tuple::from_mesh(self, v1, t.local_eid(), t.fid());
        Ok(RawEdit {
            return_tuple,
            new_tris: self.get_one_ring_tris_for_vertex(new_vid),
            relabel: Some(Relabel::Split { v1, v2, new: new_vid }),
            diff,
        })
    }

    /// Flips the interior edge of `t` to join the two opposite vertices.
    ///
    /// For faces `(v1, v2, v3)` and `(v2, v1, v4)` the result is `(v1, v4, v3)`
    /// and `(v2, v3, v4)` in the same slots. The return tuple is based at `v4` on
    /// the new edge in `t`'s face.
    pub fn swap_edge_raw(&self, t: &Tuple) -> Result<RawEdit, MeshWeaveError> {
        if !self.is_valid(t) {
            return Err(MeshWeaveError::InvalidTuple(*t));
        }
        let other = self
            .switch_face(t)
            .ok_or(MeshWeaveError::BoundaryEdge(*t))?;
        let v1 = t.vid();
        let v2 = self.switch_vertex(t).vid();
        let f1 = t.fid();
        let f2 = other.fid();
        let (Some(tri1), Some(tri2)) = (self.oriented_tri_vids(f1), self.oriented_tri_vids(f2)) else {
            return Err(MeshWeaveError::InvalidTuple(*t));
        };
        let v3 = tri1[t.local_eid()];
        let v4 = tri2[other.local_eid()];
        let (Some(p2), Some(p1)) = (
            tri1.iter().position(|&v| v == v2),
            tri2.iter().position(|&v| v == v1),
        ) else {
            return Err(MeshWeaveError::ConnectivityMismatch { vid: v1, fid: f2 });
        };

        let mut diff = ConnectivityDiff::default();
        self.write_face(&mut diff, f1, |f| {
            f.indices[p2] = v4;
            f.hash += 1;
        });
        self.write_face(&mut diff, f2, |f| {
            f.indices[p1] = v3;
            f.hash += 1;
        });
        self.write_vertex(&mut diff, v1, |v| v.erase_tri(f2));
        self.write_vertex(&mut diff, v2, |v| v.erase_tri(f1));
        self.write_vertex(&mut diff, v3, |v| v.insert_tri(f2));
        self.write_vertex(&mut diff, v4, |v| v.insert_tri(f1));

        crate::debug_invariants!(self.validate_vertex_fan(v4), "swap_edge_raw");

        let p3 = tri1
            .iter()
            .position(|&v| v == v3)
            .ok_or(MeshWeaveError::ConnectivityMismatch { vid: v3, fid: f1 })?;
        let return_tuple = Tuple::from_mesh(
            self,
            v4,
            TriangleConnectivity::local_edge_between(p2, p3),
            f1,
        );
        let new_tris = [f1, f2]
            .into_iter()
            .filter_map(|fid| self.tuple_from_tri(fid))
            .collect();
        Ok(RawEdit {
            return_tuple,
            new_tris,
            relabel: None,
            diff,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug_invariants::DebugInvariants;

    // Two triangles sharing the diagonal (0, 2).
    fn square() -> TriMesh {
        TriMesh::from_faces(4, &[[0, 2, 1], [0, 3, 2]]).unwrap()
    }

    #[test]
    fn split_interior_edge_adds_two_faces() {
        let m = square();
        let t = m.tuple_from_vids(0, 2).unwrap();
        let edit = m.split_edge_raw(&t).unwrap();
        assert_eq!(m.vert_capacity(), 5);
        assert_eq!(m.tri_capacity(), 4);
        assert_eq!(edit.new_tris.len(), 4);
        assert!(m.is_valid(&edit.return_tuple));
        assert_eq!(edit.return_tuple.vid(), 0);
        assert_eq!(m.switch_vertex(&edit.return_tuple).vid(), 4);
        assert!(!m.is_valid(&t));
        m.validate_invariants().unwrap();
    }

    #[test]
    fn split_boundary_edge_adds_one_face() {
        let m = square();
        let t = m.tuple_from_vids(0, 1).unwrap();
        let edit = m.split_edge_raw(&t).unwrap();
        assert_eq!(m.tri_capacity(), 3);
        assert_eq!(edit.new_tris.len(), 2);
        m.validate_invariants().unwrap();
    }

    #[test]
    fn collapse_interior_edge() {
        // fan of four triangles around vertex 4
        let m = TriMesh::from_faces(5, &[[0, 1, 4], [1, 2, 4], [2, 3, 4], [3, 0, 4]]).unwrap();
        let t = m.tuple_from_vids(4, 0).unwrap();
        let edit = m.collapse_edge_raw(&t).unwrap();
        assert_eq!(edit.return_tuple.vid(), 5);
        assert_eq!(m.valid_vertex_count(), 4);
        assert_eq!(m.valid_face_count(), 2);
        assert_eq!(
            edit.relabel,
            Some(Relabel::Collapse { v1: 4, v2: 0, new: 5 })
        );
        m.validate_invariants().unwrap();
    }

    #[test]
    fn collapse_single_triangle_is_degenerate() {
        let m = TriMesh::from_faces(3, &[[0, 1, 2]]).unwrap();
        let t = m.tuple_from_vids(0, 1).unwrap();
        assert!(matches!(
            m.collapse_edge_raw(&t),
            Err(MeshWeaveError::DegenerateCollapse(_))
        ));
        assert_eq!(m.vert_capacity(), 3);
    }

    #[test]
    fn swap_flips_diagonal() {
        let m = square();
        let t = m.tuple_from_vids(0, 2).unwrap();
        let edit = m.swap_edge_raw(&t).unwrap();
        let r = edit.return_tuple;
        let mut ends = [r.vid(), m.switch_vertex(&r).vid()];
        ends.sort_unstable();
        assert_eq!(ends, [1, 3]);
        assert!(m.tuple_from_vids(0, 2).is_none());
        m.validate_invariants().unwrap();
    }

    #[test]
    fn swap_rejects_boundary() {
        let m = square();
        let t = m.tuple_from_vids(0, 1).unwrap();
        assert!(matches!(
            m.swap_edge_raw(&t),
            Err(MeshWeaveError::BoundaryEdge(_))
        ));
    }

    #[test]
    fn rollback_restores_connectivity() {
        let m = square();
        let before: Vec<_> = (0..2).map(|f| m.face_connectivity(f).unwrap()).collect();
        let t = m.tuple_from_vids(0, 2).unwrap();
        let edit = m.split_edge_raw(&t).unwrap();
        m.rollback(edit.diff);
        let after: Vec<_> = (0..2).map(|f| m.face_connectivity(f).unwrap()).collect();
        assert_eq!(before, after);
        assert!(m.is_valid(&t));
        assert_eq!(m.valid_vertex_count(), 4);
        assert_eq!(m.valid_face_count(), 2);
        m.validate_invariants().unwrap();
    }
}
