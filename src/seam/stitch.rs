//! Re-stitching seam pairings across a paired split or collapse.
//!
//! Slots are addressed by `(face, local edge)`, and both split and collapse
//! rewrite or kill the faces around a seam. Before the edit, every pairing that
//! touches the region is captured as a pair of vertex edges. After the edit the
//! vertex pairs are renamed through the [`Relabel`]s the edit reported and each
//! is relocated to its new slot. A seam edge is always a boundary edge, so its
//! vertex pair identifies exactly one live face.

use crate::mesh_error::MeshWeaveError;
use crate::seam::{EdgeAddress, MirrorMap, MirrorSlots, Seams};
use crate::topology::{Relabel, TriMesh};
use itertools::Itertools;

/// One seam pairing in vertex terms: `mirror[i]` is the copy of `edge[i]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeamPair {
    pub edge: [usize; 2],
    pub mirror: [usize; 2],
}

impl SeamPair {
    /// Reads the pairing stored between `at` and `other`.
    pub fn from_addresses(mesh: &TriMesh, at: EdgeAddress, other: EdgeAddress) -> Option<Self> {
        let f = mesh.oriented_tri_vids(at.fid)?;
        let g = mesh.oriented_tri_vids(other.fid)?;
        let (a, b) = (f[(at.local_eid + 1) % 3], f[(at.local_eid + 2) % 3]);
        let (c, d) = (g[(other.local_eid + 1) % 3], g[(other.local_eid + 2) % 3]);
        Some(Self {
            edge: [a, b],
            mirror: [d, c],
        }
        .normalized())
    }

    /// The same pairing written from either side or in either direction maps to
    /// one representative.
    pub fn normalized(self) -> Self {
        let [a, b] = self.edge;
        let [c, d] = self.mirror;
        [
            self,
            Self { edge: [b, a], mirror: [d, c] },
            Self { edge: [c, d], mirror: [a, b] },
            Self { edge: [d, c], mirror: [b, a] },
        ]
        .into_iter()
        .min()
        .unwrap_or(self)
    }

    fn is_degenerate(&self) -> bool {
        self.edge[0] == self.edge[1] || self.mirror[0] == self.mirror[1]
    }

    fn relabeled(self, relabels: &[Relabel]) -> Vec<SeamPair> {
        let mut pairs = vec![self];
        for r in relabels {
            pairs = pairs.into_iter().flat_map(|p| p.apply(r, relabels)).collect();
        }
        pairs
    }

    fn apply(self, r: &Relabel, all: &[Relabel]) -> Vec<SeamPair> {
        match *r {
            Relabel::Collapse { v1, v2, new } => {
                let m = |v: usize| if v == v1 || v == v2 { new } else { v };
                let p = SeamPair {
                    edge: self.edge.map(m),
                    mirror: self.mirror.map(m),
                };
                if p.is_degenerate() { vec![] } else { vec![p] }
            }
            Relabel::Split { v1, v2, new } => {
                let splits = |e: [usize; 2], a: usize, b: usize| e == [a, b] || e == [b, a];
                if !splits(self.edge, v1, v2) {
                    return vec![self];
                }
                // The mirror side was split by its own relabel in the same edit.
                let mirror_mid = all.iter().find_map(|o| match *o {
                    Relabel::Split { v1, v2, new } if splits(self.mirror, v1, v2) => Some(new),
                    _ => None,
                });
                let Some(n2) = mirror_mid else {
                    return vec![self];
                };
                let [a, b] = self.edge;
                let [c, d] = self.mirror;
                vec![
                    SeamPair { edge: [a, new], mirror: [c, n2] },
                    SeamPair { edge: [new, b], mirror: [n2, d] },
                ]
            }
        }
    }
}

/// Seam state captured before a paired edit.
#[derive(Debug, Clone, Default)]
pub struct SeamSnapshot {
    pairs: Vec<(SeamPair, EdgeAddress, EdgeAddress)>,
    saved: Vec<(usize, MirrorSlots)>,
    written: Vec<usize>,
}

impl SeamSnapshot {
    /// Captures every pairing on faces incident to `vids`.
    pub fn capture(seams: &Seams<'_>, vids: &[usize]) -> Self {
        let mut snap = Self::default();
        let Some(map) = seams.mirrors() else {
            return snap;
        };
        let mesh = seams.mesh();
        let region: Vec<usize> = vids
            .iter()
            .flat_map(|&v| mesh.conn_tris(v))
            .sorted_unstable()
            .dedup()
            .collect();
        let mut faces = region.clone();
        for &fid in &region {
            for (local_eid, mirror) in map.face_slots(fid).into_iter().enumerate() {
                let Some(mirror) = mirror else { continue };
                let at = EdgeAddress::new(fid, local_eid);
                if let Some(pair) = SeamPair::from_addresses(mesh, at, mirror) {
                    snap.pairs.push((pair, at, mirror));
                }
                faces.push(mirror.fid);
            }
        }
        snap.pairs.sort_unstable();
        snap.pairs.dedup_by_key(|(p, _, _)| *p);
        faces.sort_unstable();
        faces.dedup();
        snap.saved = faces.into_iter().map(|f| (f, map.face_slots(f))).collect();
        snap
    }

    pub fn pairs(&self) -> impl Iterator<Item = &SeamPair> {
        self.pairs.iter().map(|(p, _, _)| p)
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Renames every captured pairing through `relabels` and writes it to its
    /// new slots.
    pub fn restitch(
        &mut self,
        mesh: &TriMesh,
        map: &MirrorMap,
        relabels: &[Relabel],
    ) -> Result<(), MeshWeaveError> {
        for (_, at, other) in &self.pairs {
            map.clear_edge(*at);
            map.clear_edge(*other);
        }
        let renamed: Vec<(SeamPair, EdgeAddress)> = self
            .pairs
            .iter()
            .flat_map(|(p, at, _)| p.relabeled(relabels).into_iter().map(|q| (q, *at)))
            .collect();
        for (pair, origin) in renamed {
            let located = (
                mesh.boundary_edge_address(pair.edge[0], pair.edge[1]),
                mesh.boundary_edge_address(pair.mirror[0], pair.mirror[1]),
            );
            let (Some(a), Some(b)) = located else {
                log::warn!("seam edge {pair:?} could not be relocated after edit (was {origin:?})");
                return Err(MeshWeaveError::MirrorDangling {
                    fid: origin.fid,
                    local_eid: origin.local_eid,
                });
            };
            let (a, b) = (EdgeAddress::new(a.0, a.1), EdgeAddress::new(b.0, b.1));
            map.set_pair(a, b);
            self.written.extend([a.fid, b.fid]);
        }
        Ok(())
    }

    /// Puts every slot captured or written back to its pre-edit state.
    pub fn undo(&self, map: &MirrorMap) {
        for &fid in &self.written {
            map.restore_face_slots(fid, [None; 3]);
        }
        for (fid, slots) in &self.saved {
            map.restore_face_slots(*fid, *slots);
        }
    }
}
