//! Paired (mirrored) operations across seams.
//!
//! [`PairedOperation`] runs a primary operation on an edge and, when the edge is
//! a seam edge, a mirror operation on its mirror copy, as one unit. The mirror
//! handle is based at the copy of the primary handle's vertex, so endpoint-wise
//! decisions (which end a collapse keeps, which half a split leaves in the old
//! face) line up on both charts.
//! When the mesh has a mirror map, every pairing around the edited region is
//! re-stitched in `after`, including for unmirrored edits that merely rewrite
//! faces next to a seam.

use super::{ExecuteResult, Operation};
use crate::seam::{SeamSnapshot, Seams};
use crate::topology::connectivity::{set_intersection, set_union};
use crate::topology::{MeshAccess, TriMesh, Tuple};

#[derive(Debug, Clone, Default)]
pub struct PairedOperation<P, Q> {
    pub primary: P,
    pub mirror: Q,
}

impl<P, Q> PairedOperation<P, Q> {
    pub fn new(primary: P, mirror: Q) -> Self {
        Self { primary, mirror }
    }
}

#[derive(Debug, Default)]
pub struct PairedCache<A, B> {
    pub primary: A,
    pub mirror: B,
    mirror_tuple: Option<Tuple>,
    primary_result: ExecuteResult,
    mirror_result: ExecuteResult,
    snapshot: SeamSnapshot,
}

impl<A, B> PairedCache<A, B> {
    /// The mirror handle, once `before` found one.
    pub fn mirror_tuple(&self) -> Option<Tuple> {
        self.mirror_tuple
    }
}

fn edge_faces(m: &TriMesh, t: &Tuple) -> Vec<usize> {
    set_union(&m.conn_tris(t.vid()), &m.conn_tris(m.switch_vertex(t).vid()))
}

impl<M, P, Q> Operation<M> for PairedOperation<P, Q>
where
    M: MeshAccess + ?Sized,
    P: Operation<M>,
    Q: Operation<M>,
{
    type Cache = PairedCache<P::Cache, Q::Cache>;

    fn name(&self) -> &'static str {
        self.primary.name()
    }

    fn before(&self, mesh: &M, t: &Tuple, cache: &mut Self::Cache) -> bool {
        if !self.primary.before(mesh, t, &mut cache.primary) {
            return false;
        }
        let m = mesh.tri_mesh();
        let seams = Seams::of(mesh);
        let mut vids = vec![t.vid(), m.switch_vertex(t).vid()];
        if let Some(mt) = seams.mirror_vertex(t) {
            if !m.is_valid(&mt) {
                return false;
            }
            if !set_intersection(&edge_faces(m, t), &edge_faces(m, &mt)).is_empty() {
                log::debug!("{}: mirror of {t:?} overlaps its own region", self.name());
                return false;
            }
            if !self.mirror.before(mesh, &mt, &mut cache.mirror) {
                return false;
            }
            vids.extend([mt.vid(), m.switch_vertex(&mt).vid()]);
            cache.mirror_tuple = Some(mt);
        }
        cache.snapshot = SeamSnapshot::capture(&seams, &vids);
        true
    }

    fn execute(&self, mesh: &M, t: &Tuple, cache: &mut Self::Cache) -> ExecuteResult {
        let primary = self.primary.execute(mesh, t, &mut cache.primary);
        if !primary.success {
            return primary;
        }
        cache.primary_result = primary.clone();
        let Some(mt) = cache.mirror_tuple else {
            return primary;
        };
        // The primary edit bumps only faces around its own edge, which were
        // checked disjoint from the mirror's in `before`.
        if !mesh.tri_mesh().is_valid(&mt) {
            log::debug!("{}: mirror handle {mt:?} invalidated by primary", self.name());
            let mut failed = primary;
            failed.success = false;
            return failed;
        }
        let mirror = self.mirror.execute(mesh, &mt, &mut cache.mirror);
        cache.mirror_result = mirror.clone();
        primary.merge(mirror)
    }

    fn after(&self, mesh: &M, _result: &ExecuteResult, cache: &mut Self::Cache) -> bool {
        if !self
            .primary
            .after(mesh, &cache.primary_result, &mut cache.primary)
        {
            return false;
        }
        if cache.mirror_tuple.is_some()
            && !self
                .mirror
                .after(mesh, &cache.mirror_result, &mut cache.mirror)
        {
            return false;
        }
        let Some(map) = mesh.mirror_map() else {
            return true;
        };
        let relabels: Vec<_> = cache
            .primary_result
            .relabel
            .iter()
            .chain(&cache.mirror_result.relabel)
            .copied()
            .collect();
        cache
            .snapshot
            .restitch(mesh.tri_mesh(), map, &relabels)
            .is_ok()
    }

    fn undo(&self, mesh: &M, cache: &mut Self::Cache) {
        self.primary.undo(mesh, &mut cache.primary);
        if cache.mirror_tuple.is_some() {
            self.mirror.undo(mesh, &mut cache.mirror);
        }
        if let Some(map) = mesh.mirror_map() {
            cache.snapshot.undo(map);
        }
    }
}

/// Vertices a paired edit on `t` may touch: the edge two-ring, the mirror
/// edge's two-ring, and both endpoints of the mirror of every seam edge around
/// them (their mirror slots are rewritten by re-stitching).
pub fn paired_lock_set<M: MeshAccess + ?Sized>(mesh: &M, t: &Tuple) -> Vec<usize> {
    let m = mesh.tri_mesh();
    let mut set = m.edge_two_ring_lock_set(t);
    let Some(map) = mesh.mirror_map() else {
        return set;
    };
    let seams = Seams::new(m, Some(map));
    if let Some(mt) = seams.mirror_vertex(t) {
        set.extend(m.edge_two_ring_lock_set(&mt));
    }
    let far: Vec<usize> = set
        .iter()
        .flat_map(|&v| m.get_one_ring_edges_for_vertex(v))
        .filter_map(|e| seams.oriented_mirror_edge(&e))
        .flat_map(|me| [me.vid(), m.switch_vertex(&me).vid()])
        .collect();
    set.extend(far);
    set.sort_unstable();
    set.dedup();
    set
}
