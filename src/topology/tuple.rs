//! `Tuple`: an oriented handle into a triangle mesh
//!
//! A tuple names one vertex, one edge, and one face at once: the base vertex
//! `vid`, the local edge `eid` (0..3) of face `fid` that contains it, and the face
//! itself. Local edge `e` is the edge opposite local vertex `e`, so it joins local
//! vertices `(e + 1) % 3` and `(e + 2) % 3`.
//!
//! Each tuple also carries the version (`hash`) its face had when the tuple was
//! built. Mutations bump the version of every face they touch, so
//! [`Tuple::is_valid`] detects handles that outlived their element in O(1).
//!
//! Navigation is provided in both directions for readability: `t.switch_vertex(&m)`
//! forwards to [`TriMesh::switch_vertex`](crate::topology::TriMesh::switch_vertex).

use crate::topology::tri_mesh::TriMesh;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Oriented `(vertex, local edge, face, version)` handle.
#[derive(
    Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Tuple {
    vid: usize,
    eid: usize,
    fid: usize,
    hash: u64,
}

impl Tuple {
    /// Builds a tuple from raw parts without consulting any mesh.
    #[inline]
    pub const fn new(vid: usize, eid: usize, fid: usize, hash: u64) -> Self {
        Self { vid, eid, fid, hash }
    }

    /// Builds a tuple stamped with the live version of face `fid`.
    ///
    /// A removed or unknown face yields version 0, which never validates.
    pub fn from_mesh(mesh: &TriMesh, vid: usize, eid: usize, fid: usize) -> Self {
        let hash = mesh.face_hash(fid).unwrap_or(0);
        Self { vid, eid, fid, hash }
    }

    #[inline]
    pub const fn vid(&self) -> usize {
        self.vid
    }

    #[inline]
    pub const fn local_eid(&self) -> usize {
        self.eid
    }

    #[inline]
    pub const fn fid(&self) -> usize {
        self.fid
    }

    #[inline]
    pub const fn hash(&self) -> u64 {
        self.hash
    }

    /// Global edge id: the smaller of `3 * fid + eid` over the one or two faces
    /// bounding this edge.
    pub fn eid(&self, mesh: &TriMesh) -> usize {
        let own = 3 * self.fid + self.eid;
        match self.switch_face(mesh) {
            Some(other) => own.min(3 * other.fid + other.eid),
            None => own,
        }
    }

    pub fn switch_vertex(&self, mesh: &TriMesh) -> Tuple {
        mesh.switch_vertex(self)
    }

    pub fn switch_edge(&self, mesh: &TriMesh) -> Tuple {
        mesh.switch_edge(self)
    }

    pub fn switch_face(&self, mesh: &TriMesh) -> Option<Tuple> {
        mesh.switch_face(self)
    }

    pub fn is_valid(&self, mesh: &TriMesh) -> bool {
        mesh.is_valid(self)
    }

    pub fn is_ccw(&self, mesh: &TriMesh) -> bool {
        mesh.is_ccw(self)
    }

    pub fn is_boundary_edge(&self, mesh: &TriMesh) -> bool {
        mesh.is_boundary_edge(self)
    }
}

impl fmt::Debug for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tuple(v{}, e{}, f{}, h{})",
            self.vid, self.eid, self.fid, self.hash
        )
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.vid, self.eid, self.fid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_and_formatting() {
        let t = Tuple::new(4, 2, 7, 3);
        assert_eq!(t.vid(), 4);
        assert_eq!(t.local_eid(), 2);
        assert_eq!(t.fid(), 7);
        assert_eq!(t.hash(), 3);
        assert_eq!(format!("{t:?}"), "Tuple(v4, e2, f7, h3)");
        assert_eq!(format!("{t}"), "(4, 2, 7)");
    }

    #[test]
    fn stale_version_is_distinct() {
        let a = Tuple::new(1, 0, 0, 1);
        let b = Tuple::new(1, 0, 0, 2);
        assert_ne!(a, b);
        assert!(a < b);
    }
}
