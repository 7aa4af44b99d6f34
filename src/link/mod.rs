//! Link condition for edge collapse.
//!
//! Collapsing edge `(v1, v2)` keeps the mesh manifold iff
//! - the vertices shared by `link(v1)` and `link(v2)` are exactly the opposite
//!   vertices of the faces on the edge (the edge link),
//! - both endpoints are on the boundary iff the edge is,
//! - the two vertex links share no edge, neither an ordinary one nor one ending at
//!   the infinite vertex.
//!
//! The infinite vertex closes off boundary fans: a boundary edge `(v, u)` adds the
//! link edge `(u, ∞)`. It is tracked with a flag and a side list rather than as a
//! sentinel id, so it never shows up in ordinary intersections.
//!
//! [`TriMesh::check_link_condition`] works on a single chart;
//! [`Seams::check_link_condition`](crate::seam::Seams::check_link_condition)
//! closes every link under mirroring first.

mod seamed;

use crate::topology::connectivity::set_intersection;
use crate::topology::{TriMesh, Tuple};
use hashbrown::HashMap;
use itertools::Itertools;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexLink {
    /// Sorted adjacent vertices, centre excluded.
    pub vertex: Vec<usize>,
    /// Sorted link edges as sorted vertex pairs.
    pub edge: Vec<[usize; 2]>,
    /// The centre is a boundary vertex.
    pub infinite_vertex: bool,
    /// Link vertices joined to the infinite vertex.
    pub infinite_edge: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeLink {
    /// Sorted opposite vertices of the faces on the edge.
    pub vertex: Vec<usize>,
    /// The edge is a boundary edge.
    pub infinite_vertex: bool,
}

/// Link of the vertex class `centre`, with every id passed through `canon`.
///
/// Each member of `centre` contributes its own fan; plain links pass a single
/// vertex and the identity.
pub(crate) fn build_vertex_link(
    mesh: &TriMesh,
    centre: &[usize],
    canon: impl Fn(usize) -> usize,
) -> VertexLink {
    let mut link = VertexLink::default();
    for &c in centre {
        let mut uses: HashMap<usize, usize> = HashMap::new();
        for fid in mesh.conn_tris(c) {
            let Some(f) = mesh.oriented_tri_vids(fid) else {
                continue;
            };
            let Some((u, w)) = f.into_iter().filter(|&v| v != c).collect_tuple() else {
                continue;
            };
            *uses.entry(u).or_default() += 1;
            *uses.entry(w).or_default() += 1;
            let (cu, cw) = (canon(u), canon(w));
            link.vertex.extend([cu, cw]);
            link.edge.push([cu.min(cw), cu.max(cw)]);
        }
        for (u, n) in uses {
            if n == 1 {
                link.infinite_vertex = true;
                link.infinite_edge.push(canon(u));
            }
        }
    }
    let own: Vec<usize> = centre.iter().map(|&c| canon(c)).collect();
    link.vertex = link
        .vertex
        .into_iter()
        .filter(|v| !own.contains(v))
        .sorted_unstable()
        .dedup()
        .collect();
    link.edge = link.edge.into_iter().sorted_unstable().dedup().collect();
    link.infinite_edge = link.infinite_edge.into_iter().sorted_unstable().dedup().collect();
    link
}

/// Link of the edge copies `sides` (each an endpoint pair), through `canon`.
pub(crate) fn build_edge_link(
    mesh: &TriMesh,
    sides: &[(usize, usize)],
    canon: impl Fn(usize) -> usize,
) -> EdgeLink {
    let mut link = EdgeLink::default();
    for &(a, b) in sides {
        let shared = set_intersection(&mesh.conn_tris(a), &mesh.conn_tris(b));
        if shared.len() == 1 {
            link.infinite_vertex = true;
        }
        for fid in shared {
            if let Some(f) = mesh.oriented_tri_vids(fid) {
                link.vertex
                    .extend(f.into_iter().filter(|&v| v != a && v != b).map(&canon));
            }
        }
    }
    link.vertex.sort_unstable();
    link.vertex.dedup();
    link
}

/// The set test shared by the plain and seam-aware checks.
pub fn link_condition_holds(l1: &VertexLink, l2: &VertexLink, edge: &EdgeLink) -> bool {
    if set_intersection(&l1.vertex, &l2.vertex) != edge.vertex {
        return false;
    }
    if (l1.infinite_vertex && l2.infinite_vertex) != edge.infinite_vertex {
        return false;
    }
    if l1.edge.iter().any(|e| l2.edge.binary_search(e).is_ok()) {
        return false;
    }
    set_intersection(&l1.infinite_edge, &l2.infinite_edge).is_empty()
}

impl TriMesh {
    pub fn vertex_link(&self, vid: usize) -> VertexLink {
        build_vertex_link(self, &[vid], |v| v)
    }

    pub fn edge_link(&self, t: &Tuple) -> EdgeLink {
        let v2 = self.switch_vertex(t).vid();
        build_edge_link(self, &[(t.vid(), v2)], |v| v)
    }

    /// True iff collapsing `t`'s edge keeps the mesh manifold. Read-only.
    pub fn check_link_condition(&self, t: &Tuple) -> bool {
        let v1 = t.vid();
        let v2 = self.switch_vertex(t).vid();
        let ok = link_condition_holds(&self.vertex_link(v1), &self.vertex_link(v2), &self.edge_link(t));
        if !ok {
            log::trace!("link condition fails on edge ({v1}, {v2})");
        }
        ok
    }
}
