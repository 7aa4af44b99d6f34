//! Remeshing operations on a [`PlanarMesh`] and the executor hooks scheduling them.
//!
//! Each operation wraps a topological base operation and adds the planar
//! attribute update in `after`. Collapse, split, and swap run through
//! [`PairedOperation`] so seam pairings are edited on both charts and
//! re-stitched around the region.

use super::geometry::{centroid, distance};
use super::mesh::{PlanarMesh, VertexAttributes};
use crate::executor::PassHooks;
use crate::operations::{
    CollapsePlacement, EdgeCollapse, EdgeSplit, EdgeSwap, EndpointInfo, ExecuteResult, Operation,
    PairedOperation, VertexSmooth, paired_lock_set, run_operation,
};
use crate::topology::connectivity::set_union;
use crate::topology::{MeshAccess, TriMesh, Tuple, VertexLockGuard};
use serde::{Deserialize, Serialize};

/// Absolute tolerance when comparing a queued edge length with the current one.
pub const LENGTH_EPS: f64 = 1e-10;

/// Operation kinds scheduled by the remesher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemeshOp {
    Split,
    Collapse,
    Swap,
    Smooth,
}

fn face_edges(mesh: &TriMesh, fid: usize) -> impl Iterator<Item = Tuple> + '_ {
    (0..3).filter_map(move |eid| mesh.tuple_from_edge(fid, eid))
}

// -----------------------------------------------------------------------------
// Collapse
// -----------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct CollapseCache {
    placement: Option<CollapsePlacement>,
    ends: [VertexAttributes; 2],
}

/// Collapse of a short edge with boundary-aware placement.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemeshCollapse;

impl RemeshCollapse {
    /// Seam vertices are placed like boundary vertices so the seam keeps its
    /// shape in both charts.
    fn endpoint(m: &PlanarMesh, vid: usize, a: &VertexAttributes) -> EndpointInfo {
        EndpointInfo {
            fixed: a.fixed || (m.params.freeze_boundary && a.boundary),
            boundary: a.boundary || m.seams().is_seam_vertex(vid),
        }
    }

    /// Vertices adjacent to either endpoint, excluding both.
    fn collapse_ring(mesh: &TriMesh, v1: usize, v2: usize) -> Vec<usize> {
        set_union(
            &mesh.get_one_ring_vids_for_vertex(v1),
            &mesh.get_one_ring_vids_for_vertex(v2),
        )
        .into_iter()
        .filter(|&v| v != v1 && v != v2)
        .collect()
    }

    /// Squared deviation from the target length of the edges a vertex at `p`
    /// would have to `ring`.
    fn placement_energy(m: &PlanarMesh, p: [f64; 2], ring: &[usize]) -> f64 {
        let target = m.params.target_edge_length;
        ring.iter()
            .map(|&v| {
                let d = distance(p, m.pos(v)) - target;
                d * d
            })
            .sum()
    }
}

impl Operation<PlanarMesh> for RemeshCollapse {
    type Cache = CollapseCache;

    fn name(&self) -> &'static str {
        "remesh_collapse"
    }

    fn before(&self, m: &PlanarMesh, t: &Tuple, cache: &mut CollapseCache) -> bool {
        let mesh = m.tri_mesh();
        if !mesh.is_valid(t) {
            return false;
        }
        let v1 = t.vid();
        let v2 = mesh.switch_vertex(t).vid();
        let (a1, a2) = (m.attrs(v1), m.attrs(v2));
        if a1.boundary && a2.boundary {
            if !mesh.is_boundary_edge(t) {
                log::debug!("collapse ({v1}, {v2}) would pinch the boundary");
                return false;
            }
            if matches!((a1.curve_id, a2.curve_id), (Some(c1), Some(c2)) if c1 != c2) {
                log::debug!("collapse ({v1}, {v2}) spans two boundary curves");
                return false;
            }
        }
        let ring = Self::collapse_ring(mesh, v1, v2);
        let mut first = Self::endpoint(m, v1, &a1);
        let mut second = Self::endpoint(m, v2, &a2);
        // Both charts of a seam edge must keep the same end: the copies' fixed
        // flags are combined and energies summed over both charts.
        let mirror = m.seams().mirror_vertex(t).map(|mt| {
            let (w1, w2) = (mt.vid(), mesh.switch_vertex(&mt).vid());
            (w1, w2, Self::collapse_ring(mesh, w1, w2))
        });
        if let Some((w1, w2, _)) = &mirror {
            first.fixed |= Self::endpoint(m, *w1, &m.attrs(*w1)).fixed;
            second.fixed |= Self::endpoint(m, *w2, &m.attrs(*w2)).fixed;
        }
        let placement = CollapsePlacement::choose(first, second, || {
            let mut e1 = Self::placement_energy(m, a1.pos, &ring);
            let mut e2 = Self::placement_energy(m, a2.pos, &ring);
            if let Some((w1, w2, mirror_ring)) = &mirror {
                e1 += Self::placement_energy(m, m.pos(*w1), mirror_ring);
                e2 += Self::placement_energy(m, m.pos(*w2), mirror_ring);
            }
            (e1, e2)
        });
        let Some(placement) = placement else {
            log::debug!("collapse ({v1}, {v2}) joins two fixed vertices");
            return false;
        };
        if !EdgeCollapse::is_collapsible(m, t) {
            return false;
        }
        cache.placement = Some(placement);
        cache.ends = [a1, a2];
        true
    }

    fn execute(&self, m: &PlanarMesh, t: &Tuple, _cache: &mut CollapseCache) -> ExecuteResult {
        EdgeCollapse.execute(m, t, &mut ())
    }

    fn after(&self, m: &PlanarMesh, result: &ExecuteResult, cache: &mut CollapseCache) -> bool {
        let (Some(placement), Some(rt)) = (cache.placement, result.return_tuple) else {
            return false;
        };
        let new = rt.vid();
        let [a1, a2] = cache.ends;
        let kept = match placement {
            CollapsePlacement::KeepSecond => a2,
            _ => a1,
        };
        let merged = VertexAttributes {
            pos: placement.place(a1.pos, a2.pos),
            partition_id: a1.partition_id,
            boundary: a1.boundary || a2.boundary,
            fixed: a1.fixed || a2.fixed,
            curve_id: kept.curve_id.or(a1.curve_id).or(a2.curve_id),
        };
        m.vertex_attrs.grow_to_at_least(m.tri_mesh().vert_capacity());
        if m.vertex_attrs.set(new, merged).is_err() {
            return false;
        }
        if !m.one_ring_is_positive(new) {
            log::debug!("collapse into {new} would invert a face");
            return false;
        }
        true
    }
}

// -----------------------------------------------------------------------------
// Split
// -----------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct SplitCache {
    ends: [VertexAttributes; 2],
    open_boundary: bool,
}

/// Midpoint split of a long edge.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemeshSplit;

impl Operation<PlanarMesh> for RemeshSplit {
    type Cache = SplitCache;

    fn name(&self) -> &'static str {
        "remesh_split"
    }

    fn before(&self, m: &PlanarMesh, t: &Tuple, cache: &mut SplitCache) -> bool {
        if !EdgeSplit.before(m, t, &mut ()) {
            return false;
        }
        let mesh = m.tri_mesh();
        let v2 = mesh.switch_vertex(t).vid();
        cache.ends = [m.attrs(t.vid()), m.attrs(v2)];
        cache.open_boundary = mesh.is_boundary_edge(t) && !m.seams().is_seam_edge(t);
        true
    }

    fn execute(&self, m: &PlanarMesh, t: &Tuple, _cache: &mut SplitCache) -> ExecuteResult {
        EdgeSplit.execute(m, t, &mut ())
    }

    fn after(&self, m: &PlanarMesh, result: &ExecuteResult, cache: &mut SplitCache) -> bool {
        let Some(rt) = result.return_tuple else {
            return false;
        };
        let mesh = m.tri_mesh();
        let new = mesh.switch_vertex(&rt).vid();
        let [a1, a2] = cache.ends;
        let curve_id = if !cache.open_boundary {
            None
        } else if a1.fixed {
            a2.curve_id
        } else {
            a1.curve_id
        };
        let mid = VertexAttributes {
            pos: CollapsePlacement::Midpoint.place(a1.pos, a2.pos),
            partition_id: a1.partition_id,
            boundary: cache.open_boundary,
            fixed: false,
            curve_id,
        };
        m.vertex_attrs.grow_to_at_least(mesh.vert_capacity());
        m.vertex_attrs.set(new, mid).is_ok()
    }
}

// -----------------------------------------------------------------------------
// Swap
// -----------------------------------------------------------------------------

/// Edge flip accepted when it brings vertex valences closer to ideal.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemeshSwap;

impl RemeshSwap {
    fn ideal_valence(m: &PlanarMesh, vid: usize) -> i64 {
        if m.attrs(vid).boundary || m.seams().is_seam_vertex(vid) {
            4
        } else {
            6
        }
    }

    /// Decrease of the squared valence deviation over the four vertices of the
    /// flip, or `None` if the edge cannot be flipped.
    pub fn valence_gain(m: &PlanarMesh, t: &Tuple) -> Option<f64> {
        if !EdgeSwap::is_swappable(m, t) {
            return None;
        }
        let mesh = m.tri_mesh();
        let other = mesh.switch_face(t)?;
        let quad = [
            (t.vid(), -1),
            (mesh.switch_vertex(t).vid(), -1),
            (mesh.switch_vertex(&mesh.switch_edge(t)).vid(), 1),
            (mesh.switch_vertex(&mesh.switch_edge(&other)).vid(), 1),
        ];
        let gain: i64 = quad
            .iter()
            .map(|&(v, delta)| {
                let dev = m.valence(v) as i64 - Self::ideal_valence(m, v);
                dev * dev - (dev + delta) * (dev + delta)
            })
            .sum();
        Some(gain as f64)
    }
}

impl Operation<PlanarMesh> for RemeshSwap {
    type Cache = ();

    fn name(&self) -> &'static str {
        "remesh_swap"
    }

    fn before(&self, m: &PlanarMesh, t: &Tuple, _cache: &mut ()) -> bool {
        Self::valence_gain(m, t).is_some_and(|g| g > 0.0)
    }

    fn execute(&self, m: &PlanarMesh, t: &Tuple, cache: &mut ()) -> ExecuteResult {
        EdgeSwap.execute(m, t, cache)
    }

    fn after(&self, m: &PlanarMesh, result: &ExecuteResult, _cache: &mut ()) -> bool {
        result
            .new_tuples
            .iter()
            .all(|t| m.face_orientation(t.fid()).is_some_and(|o| o > 0.0))
    }
}

// -----------------------------------------------------------------------------
// Smooth
// -----------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct SmoothCache {
    moved: Option<(usize, [f64; 2])>,
}

/// Moves an interior vertex to the centroid of its neighbours.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemeshSmooth;

impl Operation<PlanarMesh> for RemeshSmooth {
    type Cache = SmoothCache;

    fn name(&self) -> &'static str {
        "remesh_smooth"
    }

    fn before(&self, m: &PlanarMesh, t: &Tuple, _cache: &mut SmoothCache) -> bool {
        if !VertexSmooth.before(m, t, &mut ()) {
            return false;
        }
        let a = m.attrs(t.vid());
        !a.boundary && !a.fixed && !m.seams().is_seam_vertex(t.vid())
    }

    fn execute(&self, m: &PlanarMesh, t: &Tuple, _cache: &mut SmoothCache) -> ExecuteResult {
        VertexSmooth.execute(m, t, &mut ())
    }

    fn after(&self, m: &PlanarMesh, result: &ExecuteResult, cache: &mut SmoothCache) -> bool {
        let Some(vid) = result.return_tuple.map(|t| t.vid()) else {
            return false;
        };
        let ring: Vec<[f64; 2]> = m
            .tri_mesh()
            .get_one_ring_vids_for_vertex(vid)
            .into_iter()
            .map(|v| m.pos(v))
            .collect();
        let Some(target) = centroid(&ring) else {
            return false;
        };
        let Ok(old) = m.vertex_attrs.update(vid, |a| std::mem::replace(&mut a.pos, target)) else {
            return false;
        };
        cache.moved = Some((vid, old));
        m.one_ring_is_positive(vid)
    }

    fn undo(&self, m: &PlanarMesh, cache: &mut SmoothCache) {
        if let Some((vid, old)) = cache.moved.take() {
            if let Err(e) = m.vertex_attrs.update(vid, |a| a.pos = old) {
                log::warn!("cannot restore position of {vid}: {e}");
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Scheduling
// -----------------------------------------------------------------------------

/// Executor hooks for the planar remesher.
///
/// Splits run longest-first and collapses shortest-first. Only edges past the
/// threshold, and flips with a positive valence gain, are queued. A queued
/// item goes stale once its weight moved.
#[derive(Debug, Clone, Copy)]
pub struct RemeshHooks {
    pub split_threshold: f64,
    pub collapse_threshold: f64,
}

impl RemeshHooks {
    pub fn for_mesh(m: &PlanarMesh) -> Self {
        Self {
            split_threshold: m.params.split_threshold(),
            collapse_threshold: m.params.collapse_threshold(),
        }
    }
}

impl PassHooks<PlanarMesh> for RemeshHooks {
    type Op = RemeshOp;

    fn apply(&self, m: &PlanarMesh, op: RemeshOp, t: &Tuple) -> Option<Vec<Tuple>> {
        match op {
            RemeshOp::Split => run_operation(&PairedOperation::new(RemeshSplit, RemeshSplit), m, t),
            RemeshOp::Collapse => {
                run_operation(&PairedOperation::new(RemeshCollapse, RemeshCollapse), m, t)
            }
            RemeshOp::Swap => run_operation(&PairedOperation::new(RemeshSwap, RemeshSwap), m, t),
            RemeshOp::Smooth => run_operation(&RemeshSmooth, m, t),
        }
    }

    fn priority(&self, m: &PlanarMesh, op: RemeshOp, t: &Tuple) -> f64 {
        match op {
            RemeshOp::Split => m.edge_length(t),
            RemeshOp::Collapse => -m.edge_length(t),
            RemeshOp::Swap => RemeshSwap::valence_gain(m, t).unwrap_or(0.0),
            RemeshOp::Smooth => 0.0,
        }
    }

    fn is_weight_up_to_date(&self, m: &PlanarMesh, op: RemeshOp, t: &Tuple, cached: f64) -> bool {
        match op {
            RemeshOp::Split => {
                let len = m.edge_length(t);
                (len - cached).abs() < LENGTH_EPS && len > self.split_threshold
            }
            RemeshOp::Collapse => {
                let len = m.edge_length(t);
                (len + cached).abs() < LENGTH_EPS && len < self.collapse_threshold
            }
            RemeshOp::Swap => cached > 0.0 && self.priority(m, op, t) == cached,
            RemeshOp::Smooth => true,
        }
    }

    fn should_enqueue(&self, op: RemeshOp, priority: f64) -> bool {
        match op {
            RemeshOp::Split => priority > self.split_threshold,
            RemeshOp::Collapse => -priority < self.collapse_threshold,
            RemeshOp::Swap => priority > 0.0,
            RemeshOp::Smooth => true,
        }
    }

    fn renew_neighbor_tuples(&self, m: &PlanarMesh, op: RemeshOp, new_tuples: &[Tuple]) -> Vec<(RemeshOp, Tuple)> {
        if op == RemeshOp::Smooth {
            return Vec::new();
        }
        let mesh = m.tri_mesh();
        new_tuples
            .iter()
            .flat_map(|t| face_edges(mesh, t.fid()))
            .map(|e| (op, e))
            .collect()
    }

    fn lock_vertices<'m>(&self, m: &'m PlanarMesh, t: &Tuple, worker: usize) -> Option<VertexLockGuard<'m>> {
        m.tri_mesh().locks().try_lock_all(paired_lock_set(m, t), worker)
    }

    fn partition_id(&self, m: &PlanarMesh, _op: RemeshOp, t: &Tuple) -> usize {
        m.attrs(t.vid()).partition_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remesh::RemeshParams;
    use crate::remesh::mesh::fixtures::grid;

    #[test]
    fn smooth_recentres_grid_vertex() {
        let m = grid(2, RemeshParams::default());
        m.vertex_attrs.update(4, |a| a.pos = [0.7, 0.6]).unwrap();
        let t = m.mesh().tuple_from_vertex(4).unwrap();
        run_operation(&RemeshSmooth, &m, &t).unwrap();
        assert_eq!(m.pos(4), [1.0, 1.0]);
        // boundary vertices stay put
        let b = m.mesh().tuple_from_vertex(1).unwrap();
        assert!(run_operation(&RemeshSmooth, &m, &b).is_none());
    }

    #[test]
    fn smooth_undoes_inverting_move() {
        // star around vertex 0 with a notch at vertex 4; the ring centroid
        // falls outside the star's kernel
        let points = [
            [0.0, 0.0],
            [-1.0, -1.0],
            [1.0, -1.0],
            [3.0, -0.2],
            [0.2, 0.0],
            [3.0, 0.2],
            [1.0, 1.0],
            [-1.0, 1.0],
        ];
        let faces = [[0, 1, 2], [0, 2, 3], [0, 3, 4], [0, 4, 5], [0, 5, 6], [0, 6, 7], [0, 7, 1]];
        let m = PlanarMesh::new(&points, &faces, RemeshParams::default()).unwrap();
        assert!(m.all_faces_positive());
        let t = m.mesh().tuple_from_vertex(0).unwrap();
        assert!(run_operation(&RemeshSmooth, &m, &t).is_none());
        assert_eq!(m.pos(0), [0.0, 0.0]);
    }

    /// Edge (2, 3) joins two high-valence boundary vertices between two
    /// low-valence interior ones.
    fn bowtie() -> PlanarMesh {
        let points = [
            [0.0, 0.0],
            [2.0, 0.0],
            [1.0, 1.0],
            [1.0, -1.0],
            [-1.0, 1.0],
            [-1.0, -1.0],
            [3.0, 1.0],
            [3.0, -1.0],
        ];
        let faces = [
            [0, 3, 2],
            [1, 2, 3],
            [0, 2, 4],
            [0, 4, 5],
            [0, 5, 3],
            [1, 6, 2],
            [1, 7, 6],
            [1, 3, 7],
        ];
        PlanarMesh::new(&points, &faces, RemeshParams::default()).unwrap()
    }

    #[test]
    fn swap_improves_valence() {
        let m = bowtie();
        let t = m.mesh().tuple_from_vids(2, 3).unwrap();
        assert_eq!(RemeshSwap::valence_gain(&m, &t), Some(8.0));
        run_operation(&RemeshSwap, &m, &t).unwrap();
        let flipped = m.mesh().tuple_from_vids(0, 1).unwrap();
        assert_eq!(RemeshSwap::valence_gain(&m, &flipped), Some(-8.0));
        assert!(m.all_faces_positive());
    }

    #[test]
    fn collapse_respects_fixed_and_curves() {
        let m = grid(2, RemeshParams::default());
        m.set_fixed(0, true).unwrap();
        m.set_fixed(1, true).unwrap();
        let t = m.mesh().tuple_from_vids(0, 1).unwrap();
        assert!(run_operation(&RemeshCollapse, &m, &t).is_none());

        m.set_curve_id(2, Some(0)).unwrap();
        m.set_curve_id(5, Some(1)).unwrap();
        let t = m.mesh().tuple_from_vids(2, 5).unwrap();
        assert!(run_operation(&RemeshCollapse, &m, &t).is_none());

        // interior edge between two boundary vertices
        let t = m.mesh().tuple_from_vids(1, 5).unwrap();
        assert!(run_operation(&RemeshCollapse, &m, &t).is_none());
    }

    #[test]
    fn collapse_keeps_fixed_endpoint_position() {
        let m = grid(2, RemeshParams::default());
        m.set_fixed(4, true).unwrap();
        let t = m.mesh().tuple_from_vids(4, 5).unwrap();
        let out = run_operation(&RemeshCollapse, &m, &t).unwrap();
        let new = out[0].vid();
        assert_eq!(m.pos(new), [1.0, 1.0]);
        assert!(m.attrs(new).fixed);
        assert!(m.attrs(new).boundary);
        assert!(m.all_faces_positive());
    }

    #[test]
    fn split_sets_midpoint_and_boundary_flag() {
        let m = grid(1, RemeshParams::default());
        let boundary = m.mesh().tuple_from_vids(0, 1).unwrap();
        run_operation(&RemeshSplit, &m, &boundary).unwrap();
        assert_eq!(m.pos(4), [0.5, 0.0]);
        assert!(m.attrs(4).boundary);

        let diagonal = m.mesh().tuple_from_vids(0, 3).unwrap();
        run_operation(&RemeshSplit, &m, &diagonal).unwrap();
        assert_eq!(m.pos(5), [0.5, 0.5]);
        assert!(!m.attrs(5).boundary);
    }

    #[test]
    fn stale_items_are_detected() {
        let m = grid(1, RemeshParams::with_target(0.5));
        let hooks = RemeshHooks::for_mesh(&m);
        let t = m.mesh().tuple_from_vids(0, 3).unwrap();
        let p = hooks.priority(&m, RemeshOp::Split, &t);
        assert!(hooks.is_weight_up_to_date(&m, RemeshOp::Split, &t, p));
        m.vertex_attrs.update(3, |a| a.pos = [0.9, 0.9]).unwrap();
        assert!(!hooks.is_weight_up_to_date(&m, RemeshOp::Split, &t, p));
        // short edges are never split
        let hooks = RemeshHooks::for_mesh(&grid(1, RemeshParams::with_target(2.0)));
        assert!(!hooks.is_weight_up_to_date(&m, RemeshOp::Split, &t, p));
    }
}
