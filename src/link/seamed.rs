//! Seam-aware link condition.
//!
//! Every vertex is replaced by its mirror class, named by the class minimum, and
//! a link is the union of the fans of all class members. The edge link unions
//! both copies of a seam edge. Seam edges stay boundary edges on each chart, so
//! their far side contributes the infinite vertex, never a real one.

use super::{EdgeLink, VertexLink, build_edge_link, build_vertex_link, link_condition_holds};
use crate::seam::Seams;
use crate::topology::Tuple;
use hashbrown::HashMap;
use std::cell::RefCell;

impl Seams<'_> {
    /// Memoises `canonical_vid` for one check; classes are walked at most once.
    fn canonicalizer(&self) -> impl Fn(usize) -> usize + '_ {
        let cache: RefCell<HashMap<usize, usize>> = RefCell::new(HashMap::new());
        move |v| {
            if let Some(&c) = cache.borrow().get(&v) {
                return c;
            }
            let class = self.all_mirror_vids(v);
            let c = class[0];
            let mut memo = cache.borrow_mut();
            for m in class {
                memo.insert(m, c);
            }
            c
        }
    }

    pub fn vertex_link(&self, vid: usize) -> VertexLink {
        let class = self.all_mirror_vids(vid);
        build_vertex_link(self.mesh(), &class, self.canonicalizer())
    }

    pub fn edge_link(&self, t: &Tuple) -> EdgeLink {
        let mesh = self.mesh();
        let mut sides = vec![(t.vid(), mesh.switch_vertex(t).vid())];
        if let Some(m) = self.oriented_mirror_edge(t) {
            sides.push((m.vid(), mesh.switch_vertex(&m).vid()));
        }
        build_edge_link(mesh, &sides, self.canonicalizer())
    }

    /// Link condition over mirror-closed links. On a mesh without seams this
    /// agrees with [`TriMesh::check_link_condition`](crate::topology::TriMesh::check_link_condition).
    pub fn check_link_condition(&self, t: &Tuple) -> bool {
        let v1 = t.vid();
        let v2 = self.mesh().switch_vertex(t).vid();
        let ok = link_condition_holds(&self.vertex_link(v1), &self.vertex_link(v2), &self.edge_link(t));
        if !ok {
            log::trace!("seamed link condition fails on edge ({v1}, {v2})");
        }
        ok
    }
}
