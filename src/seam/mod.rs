//! Seam (mirror) pairings between boundary edges of a cut mesh.
//!
//! A mesh cut into charts keeps two copies of every cut edge, one on each side.
//! [`MirrorMap`] stores, per `(face, local edge)` slot, the address of the other
//! copy. Pairings are symmetric: writing one side with [`MirrorMap::set_pair`]
//! always writes the other.
//!
//! Orientation convention: across a seam the two copies are traversed in
//! opposite directions, as the two faces of an interior edge are. For a
//! counter-clockwise edge `a → b`, the counter-clockwise mirror edge runs from
//! the copy of `b` to the copy of `a`. [`Seams::oriented_mirror_edge`] preserves
//! counter-clockwise-ness, and [`Seams::mirror_vertex`] returns the handle based
//! at the copy of the input's own vertex.

pub mod stitch;

use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshWeaveError;
use crate::topology::consolidate::Remap;
use crate::topology::{MeshAccess, TriMesh, Tuple};
use dashmap::DashMap;
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub use stitch::{SeamPair, SeamSnapshot};

/// Address of one local edge slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeAddress {
    pub fid: usize,
    pub local_eid: usize,
}

impl EdgeAddress {
    #[inline]
    pub const fn new(fid: usize, local_eid: usize) -> Self {
        Self { fid, local_eid }
    }

    #[inline]
    pub fn of(t: &Tuple) -> Self {
        Self::new(t.fid(), t.local_eid())
    }
}

type MirrorSlots = [Option<EdgeAddress>; 3];

/// Per-face mirror slots. Faces without any seam edge have no entry.
#[derive(Debug, Default)]
pub struct MirrorMap {
    slots: DashMap<usize, MirrorSlots>,
}

impl MirrorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (EdgeAddress, EdgeAddress)>,
    {
        let map = Self::new();
        for (a, b) in pairs {
            map.set_pair(a, b);
        }
        map
    }

    pub fn get(&self, at: EdgeAddress) -> Option<EdgeAddress> {
        if at.local_eid > 2 {
            return None;
        }
        self.slots.get(&at.fid).and_then(|s| s[at.local_eid])
    }

    fn set_slot(&self, at: EdgeAddress, value: Option<EdgeAddress>) {
        if at.local_eid > 2 {
            return;
        }
        match value {
            Some(_) => {
                self.slots.entry(at.fid).or_insert([None; 3])[at.local_eid] = value;
            }
            None => {
                if let Some(mut slots) = self.slots.get_mut(&at.fid) {
                    slots[at.local_eid] = None;
                }
                self.slots.remove_if(&at.fid, |_, s| s.iter().all(Option::is_none));
            }
        }
    }

    /// Mirrors `a` and `b` to each other.
    pub fn set_pair(&self, a: EdgeAddress, b: EdgeAddress) {
        self.set_slot(a, Some(b));
        self.set_slot(b, Some(a));
    }

    /// Clears `at` and, if it points back, its partner.
    pub fn clear_edge(&self, at: EdgeAddress) {
        if let Some(other) = self.get(at) {
            if self.get(other) == Some(at) {
                self.set_slot(other, None);
            }
        }
        self.set_slot(at, None);
    }

    pub fn clear_face(&self, fid: usize) {
        for local_eid in 0..3 {
            self.clear_edge(EdgeAddress::new(fid, local_eid));
        }
    }

    pub(crate) fn face_slots(&self, fid: usize) -> MirrorSlots {
        self.slots.get(&fid).map(|s| *s).unwrap_or([None; 3])
    }

    pub(crate) fn restore_face_slots(&self, fid: usize, slots: MirrorSlots) {
        if slots.iter().all(Option::is_none) {
            self.slots.remove(&fid);
        } else {
            self.slots.insert(fid, slots);
        }
    }

    /// Every pairing once, lower address first, sorted.
    pub fn pairs(&self) -> Vec<(EdgeAddress, EdgeAddress)> {
        let mut out: Vec<_> = self
            .slots
            .iter()
            .flat_map(|entry| {
                let fid = *entry.key();
                let slots = *entry.value();
                (0..3).filter_map(move |e| slots[e].map(|m| (EdgeAddress::new(fid, e), m)))
            })
            .filter(|(a, b)| a < b)
            .collect();
        out.sort_unstable();
        out
    }

    /// Number of mirrored edge slots (twice the number of pairs).
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .map(|s| s.iter().filter(|m| m.is_some()).count())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Renumbers faces after [`TriMesh::consolidate`]; pairings that touch a
    /// dropped face are discarded.
    pub fn remap(&mut self, remap: &Remap) {
        let pairs = self.pairs();
        self.slots.clear();
        let moved = |a: EdgeAddress| remap.face(a.fid).map(|fid| EdgeAddress::new(fid, a.local_eid));
        for (a, b) in pairs {
            if let (Some(a), Some(b)) = (moved(a), moved(b)) {
                self.set_pair(a, b);
            }
        }
    }

    /// Checks symmetry, liveness, boundary-ness, and non-degeneracy of every
    /// pairing against `mesh`.
    pub fn validate(&self, mesh: &TriMesh) -> Result<(), MeshWeaveError> {
        for entry in self.slots.iter() {
            let fid = *entry.key();
            for (local_eid, mirror) in entry.value().iter().enumerate() {
                let Some(mirror) = *mirror else { continue };
                let dangling = MeshWeaveError::MirrorDangling { fid, local_eid };
                let (Some(face), Some(other)) =
                    (mesh.oriented_tri_vids(fid), mesh.oriented_tri_vids(mirror.fid))
                else {
                    return Err(dangling);
                };
                if mirror.local_eid > 2 {
                    return Err(dangling);
                }
                if self.get(mirror) != Some(EdgeAddress::new(fid, local_eid)) {
                    return Err(MeshWeaveError::MirrorAsymmetry { fid, local_eid });
                }
                let here = mesh
                    .tuple_from_edge(fid, local_eid)
                    .ok_or(MeshWeaveError::MirrorDangling { fid, local_eid })?;
                if !mesh.is_boundary_edge(&here) {
                    return Err(MeshWeaveError::SeamEdgeNotBoundary { fid, local_eid });
                }
                if (mirror.fid == fid && mirror.local_eid == local_eid)
                    || face[local_eid] == other[mirror.local_eid]
                {
                    return Err(MeshWeaveError::MirrorDegenerate { fid, local_eid });
                }
            }
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Query view
// -----------------------------------------------------------------------------

/// Read-only seam queries over a mesh and its (optional) mirror map.
///
/// With no map every edge is unmirrored and every query degrades to the plain
/// single-chart answer.
#[derive(Debug, Clone, Copy)]
pub struct Seams<'a> {
    mesh: &'a TriMesh,
    mirrors: Option<&'a MirrorMap>,
}

impl<'a> Seams<'a> {
    pub fn new(mesh: &'a TriMesh, mirrors: Option<&'a MirrorMap>) -> Self {
        Self { mesh, mirrors }
    }

    pub fn of<M: MeshAccess + ?Sized>(m: &'a M) -> Self {
        Self::new(m.tri_mesh(), m.mirror_map())
    }

    pub fn mesh(&self) -> &'a TriMesh {
        self.mesh
    }

    pub fn mirrors(&self) -> Option<&'a MirrorMap> {
        self.mirrors
    }

    fn mirror_address(&self, t: &Tuple) -> Option<EdgeAddress> {
        self.mirrors?.get(EdgeAddress::of(t))
    }

    pub fn is_seam_edge(&self, t: &Tuple) -> bool {
        self.mirror_address(t).is_some()
    }

    /// The mirror copy of `t`'s edge, counter-clockwise iff `t` is.
    pub fn oriented_mirror_edge(&self, t: &Tuple) -> Option<Tuple> {
        let at = self.mirror_address(t)?;
        let m = self.mesh.tuple_from_edge(at.fid, at.local_eid)?;
        Some(if self.mesh.is_ccw(t) {
            m
        } else {
            self.mesh.switch_vertex(&m)
        })
    }

    /// Mirror copy of `t`'s edge, based at the copy of `t`'s vertex.
    pub fn mirror_vertex(&self, t: &Tuple) -> Option<Tuple> {
        self.oriented_mirror_edge(t)
            .map(|m| self.mesh.switch_vertex(&m))
    }

    /// `vid` and every vertex identified with it through chains of seam edges,
    /// sorted.
    pub fn all_mirror_vids(&self, vid: usize) -> Vec<usize> {
        let mut seen: HashSet<usize> = [vid].into_iter().collect();
        if self.mirrors.is_none_or(MirrorMap::is_empty) {
            return vec![vid];
        }
        let mut queue = VecDeque::from([vid]);
        while let Some(v) = queue.pop_front() {
            for t in self.mesh.get_one_ring_edges_for_vertex(v) {
                if let Some(m) = self.mirror_vertex(&t) {
                    if seen.insert(m.vid()) {
                        queue.push_back(m.vid());
                    }
                }
            }
        }
        let mut class: Vec<usize> = seen.into_iter().collect();
        class.sort_unstable();
        class
    }

    /// Smallest id of `vid`'s mirror class.
    pub fn canonical_vid(&self, vid: usize) -> usize {
        self.all_mirror_vids(vid)[0]
    }

    pub fn is_seam_vertex(&self, vid: usize) -> bool {
        self.mirrors.is_some()
            && self
                .mesh
                .get_one_ring_edges_for_vertex(vid)
                .iter()
                .any(|t| self.is_seam_edge(t))
    }

    /// The handle on the other side of `t`'s edge, based at (the copy of)
    /// `t`'s vertex: the mirror for seam edges, the adjacent face otherwise.
    pub fn sibling_edge(&self, t: &Tuple) -> Option<Tuple> {
        if self.is_seam_edge(t) {
            self.mirror_vertex(t)
        } else {
            self.mesh.switch_face(t)
        }
    }

    /// One-ring faces of `vid` and of all its mirror copies.
    pub fn one_ring_tris_across_seams(&self, vid: usize) -> Vec<Tuple> {
        self.all_mirror_vids(vid)
            .into_iter()
            .flat_map(|v| self.mesh.get_one_ring_tris_for_vertex(v))
            .collect()
    }
}

impl DebugInvariants for Seams<'_> {
    fn validate_invariants(&self) -> Result<(), MeshWeaveError> {
        self.mesh.validate_invariants()?;
        match self.mirrors {
            Some(map) => map.validate(self.mesh),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Two triangles glued along one seam edge:
    /// face 0 = (0, 2, 1), face 1 = (3, 4, 5), with 4 ≡ 1 and 5 ≡ 2.
    pub fn diamond() -> (TriMesh, MirrorMap) {
        let mesh = TriMesh::from_faces(6, &[[0, 2, 1], [3, 4, 5]]).unwrap();
        let map = MirrorMap::from_pairs([(EdgeAddress::new(0, 0), EdgeAddress::new(1, 0))]);
        (mesh, map)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::diamond;
    use super::*;

    #[test]
    fn diamond_orientation() {
        let (m, map) = diamond();
        let seams = Seams::new(&m, Some(&map));
        let t = m.tuple_from_edge(0, 0).unwrap();
        assert_eq!(t.vid(), 2);
        let o = seams.oriented_mirror_edge(&t).unwrap();
        assert_eq!((o.vid(), o.fid(), o.local_eid()), (4, 1, 0));
        assert!(m.is_ccw(&o));
        assert_eq!(seams.mirror_vertex(&t).unwrap().vid(), 5);
        let back = seams.oriented_mirror_edge(&o).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn mirror_classes() {
        let (m, map) = diamond();
        let seams = Seams::new(&m, Some(&map));
        assert_eq!(seams.all_mirror_vids(2), vec![2, 5]);
        assert_eq!(seams.all_mirror_vids(4), vec![1, 4]);
        assert_eq!(seams.all_mirror_vids(0), vec![0]);
        assert_eq!(seams.canonical_vid(5), 2);
        assert!(seams.is_seam_vertex(1));
        assert!(!seams.is_seam_vertex(0));
        assert_eq!(seams.one_ring_tris_across_seams(1).len(), 2);
        seams.validate_invariants().unwrap();
    }

    #[test]
    fn sibling_of_interior_edge_is_adjacent_face() {
        let m = TriMesh::from_faces(4, &[[0, 2, 1], [0, 3, 2]]).unwrap();
        let seams = Seams::new(&m, None);
        let t = m.tuple_from_vids(0, 2).unwrap();
        assert_eq!(seams.sibling_edge(&t), m.switch_face(&t));
        assert_eq!(seams.all_mirror_vids(0), vec![0]);
    }

    #[test]
    fn validate_catches_asymmetry_and_interior_seams() {
        let (m, map) = diamond();
        map.set_slot(EdgeAddress::new(1, 0), Some(EdgeAddress::new(0, 1)));
        assert!(matches!(
            map.validate(&m),
            Err(MeshWeaveError::MirrorAsymmetry { .. })
        ));

        let square = TriMesh::from_faces(5, &[[0, 2, 1], [0, 3, 2], [4, 1, 2]]).unwrap();
        let bad = MirrorMap::from_pairs([(EdgeAddress::new(0, 1), EdgeAddress::new(2, 0))]);
        assert_eq!(
            bad.validate(&square),
            Err(MeshWeaveError::SeamEdgeNotBoundary { fid: 2, local_eid: 0 })
        );
    }

    #[test]
    fn remap_follows_faces() {
        let (_, mut map) = diamond();
        let remap = Remap {
            vertices: vec![],
            faces: vec![Some(1), Some(0)],
        };
        map.remap(&remap);
        assert_eq!(
            map.pairs(),
            vec![(EdgeAddress::new(0, 0), EdgeAddress::new(1, 0))]
        );
        map.clear_face(0);
        assert!(map.is_empty());
    }

    #[test]
    fn edge_address_serde() {
        let a = EdgeAddress::new(7, 2);
        let s = serde_json::to_string(&a).unwrap();
        assert_eq!(serde_json::from_str::<EdgeAddress>(&s).unwrap(), a);
    }
}
