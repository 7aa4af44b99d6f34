//! [`PlanarMesh`]: connectivity, seam pairings, and per-vertex planar attributes.

use super::geometry::{distance, orient2d};
use crate::attributes::AttributeCollection;
use crate::debug_invariants::DebugInvariants;
use crate::executor::ExecutorConfig;
use crate::mesh_error::MeshWeaveError;
use crate::partitioning::{PartitionId, edge_cut, part_sizes, partition_by_morton};
use crate::seam::{MirrorMap, Seams};
use crate::topology::{MeshAccess, Remap, TriMesh, Tuple};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VertexAttributes {
    pub pos: [f64; 2],
    pub partition_id: PartitionId,
    /// On an open boundary edge. Seam edges do not count.
    pub boundary: bool,
    /// Never moved, never merged away.
    pub fixed: bool,
    /// Boundary curve the vertex lies on, if the input tagged one.
    pub curve_id: Option<usize>,
}

/// Remeshing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemeshParams {
    pub target_edge_length: f64,
    /// Treat every boundary vertex as fixed.
    pub freeze_boundary: bool,
    /// Split/collapse/swap/smooth rounds run by [`PlanarMesh::remesh`].
    pub iterations: usize,
    pub executor: ExecutorConfig,
}

impl Default for RemeshParams {
    fn default() -> Self {
        Self {
            target_edge_length: 1.0,
            freeze_boundary: false,
            iterations: 5,
            executor: ExecutorConfig::default(),
        }
    }
}

impl RemeshParams {
    pub fn with_target(target_edge_length: f64) -> Self {
        Self {
            target_edge_length,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), MeshWeaveError> {
        if !(self.target_edge_length.is_finite() && self.target_edge_length > 0.0) {
            return Err(MeshWeaveError::InvalidConfig(
                "target_edge_length must be positive and finite",
            ));
        }
        self.executor.validate()
    }

    /// Edges longer than this are split.
    pub fn split_threshold(&self) -> f64 {
        self.target_edge_length * 4.0 / 3.0
    }

    /// Edges shorter than this are collapsed.
    pub fn collapse_threshold(&self) -> f64 {
        self.target_edge_length * 4.0 / 5.0
    }
}

/// A planar triangle mesh, optionally cut into charts glued by a [`MirrorMap`].
///
/// Faces are expected counter-clockwise in the plane; every remeshing operation
/// rejects edits that would make a face non-positive.
#[derive(Debug)]
pub struct PlanarMesh {
    mesh: TriMesh,
    mirrors: Option<MirrorMap>,
    pub vertex_attrs: AttributeCollection<VertexAttributes>,
    pub params: RemeshParams,
}

impl PlanarMesh {
    pub fn new(
        points: &[[f64; 2]],
        faces: &[[usize; 3]],
        params: RemeshParams,
    ) -> Result<Self, MeshWeaveError> {
        params.validate()?;
        let mesh = TriMesh::from_faces(points.len(), faces)?;
        let attrs = points
            .iter()
            .map(|&pos| VertexAttributes {
                pos,
                ..VertexAttributes::default()
            })
            .collect();
        let out = Self {
            mesh,
            mirrors: None,
            vertex_attrs: AttributeCollection::from_vec(attrs, VertexAttributes::default()),
            params,
        };
        out.mark_boundary()?;
        Ok(out)
    }

    /// Attaches seam pairings; boundary flags are recomputed so seam-only
    /// vertices count as interior.
    pub fn with_mirrors(mut self, map: MirrorMap) -> Result<Self, MeshWeaveError> {
        map.validate(&self.mesh)?;
        self.mirrors = Some(map);
        self.mark_boundary()?;
        Ok(self)
    }

    fn mark_boundary(&self) -> Result<(), MeshWeaveError> {
        let seams = self.seams();
        for t in self.mesh.get_vertices() {
            let vid = t.vid();
            let boundary = self
                .mesh
                .get_one_ring_edges_for_vertex(vid)
                .iter()
                .any(|e| self.mesh.is_boundary_edge(e) && !seams.is_seam_edge(e));
            self.vertex_attrs.update(vid, |a| a.boundary = boundary)?;
        }
        Ok(())
    }

    #[inline]
    pub fn mesh(&self) -> &TriMesh {
        &self.mesh
    }

    #[inline]
    pub fn mirrors(&self) -> Option<&MirrorMap> {
        self.mirrors.as_ref()
    }

    pub fn seams(&self) -> Seams<'_> {
        Seams::new(&self.mesh, self.mirrors.as_ref())
    }

    #[inline]
    pub fn attrs(&self, vid: usize) -> VertexAttributes {
        self.vertex_attrs.get_or_default(vid)
    }

    #[inline]
    pub fn pos(&self, vid: usize) -> [f64; 2] {
        self.attrs(vid).pos
    }

    pub fn set_fixed(&self, vid: usize, fixed: bool) -> Result<(), MeshWeaveError> {
        self.vertex_attrs.update(vid, |a| a.fixed = fixed)
    }

    pub fn set_curve_id(&self, vid: usize, curve_id: Option<usize>) -> Result<(), MeshWeaveError> {
        self.vertex_attrs.update(vid, |a| a.curve_id = curve_id)
    }

    pub fn edge_length(&self, t: &Tuple) -> f64 {
        let v2 = self.mesh.switch_vertex(t).vid();
        distance(self.pos(t.vid()), self.pos(v2))
    }

    /// Twice the signed area of face `fid`.
    pub fn face_orientation(&self, fid: usize) -> Option<f64> {
        let [a, b, c] = self.mesh.oriented_tri_vids(fid)?;
        Some(orient2d(self.pos(a), self.pos(b), self.pos(c)))
    }

    /// Every face around `vid` has positive area.
    pub fn one_ring_is_positive(&self, vid: usize) -> bool {
        self.mesh
            .conn_tris(vid)
            .into_iter()
            .all(|fid| self.face_orientation(fid).is_some_and(|o| o > 0.0))
    }

    pub fn all_faces_positive(&self) -> bool {
        self.mesh
            .get_faces()
            .iter()
            .all(|t| self.face_orientation(t.fid()).is_some_and(|o| o > 0.0))
    }

    #[inline]
    pub fn valence(&self, vid: usize) -> usize {
        self.mesh.get_one_ring_vids_for_vertex(vid).len()
    }

    pub fn average_edge_length(&self) -> f64 {
        let edges = self.mesh.get_edges();
        if edges.is_empty() {
            return 0.0;
        }
        edges.iter().map(|t| self.edge_length(t)).sum::<f64>() / edges.len() as f64
    }

    /// Live faces as vertex triples.
    pub fn faces(&self) -> Vec<[usize; 3]> {
        self.mesh
            .get_faces()
            .iter()
            .filter_map(|t| self.mesh.oriented_tri_vids(t.fid()))
            .collect()
    }

    /// Tags every live vertex with a Morton partition in `0..n_parts`.
    pub fn assign_partitions(&self, n_parts: usize) -> Result<(), MeshWeaveError> {
        let vids: Vec<usize> = self.mesh.get_vertices().iter().map(Tuple::vid).collect();
        let points: Vec<[f64; 2]> = vids.iter().map(|&v| self.pos(v)).collect();
        let parts = partition_by_morton(&points, n_parts);
        for (&vid, &part) in vids.iter().zip(&parts) {
            self.vertex_attrs.update(vid, |a| a.partition_id = part)?;
        }
        if log::log_enabled!(log::Level::Debug) {
            let by_vid: Vec<PartitionId> = (0..self.mesh.vert_capacity())
                .map(|v| self.attrs(v).partition_id)
                .collect();
            log::debug!(
                "morton partitions {:?}, edge cut {}",
                part_sizes(&parts),
                edge_cut(&self.mesh, &by_vid)
            );
        }
        Ok(())
    }

    /// Compacts connectivity, attributes, and seam slots together.
    pub fn consolidate(&mut self) -> Result<Remap, MeshWeaveError> {
        let remap = self.mesh.consolidate()?;
        self.vertex_attrs.remap_vertices(&remap);
        if let Some(map) = self.mirrors.as_mut() {
            map.remap(&remap);
        }
        Ok(remap)
    }
}

impl MeshAccess for PlanarMesh {
    fn tri_mesh(&self) -> &TriMesh {
        &self.mesh
    }

    fn mirror_map(&self) -> Option<&MirrorMap> {
        self.mirrors.as_ref()
    }
}

impl DebugInvariants for PlanarMesh {
    fn validate_invariants(&self) -> Result<(), MeshWeaveError> {
        self.seams().validate_invariants()?;
        let len = self.vertex_attrs.len();
        let capacity = self.mesh.vert_capacity();
        if len < capacity {
            return Err(MeshWeaveError::AttributeOutOfRange {
                index: capacity - 1,
                len,
            });
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::grid;
    use super::*;
    use crate::seam::EdgeAddress;

    #[test]
    fn boundary_flags_and_orientation() {
        let m = grid(2, RemeshParams::default());
        assert!(m.all_faces_positive());
        assert!(m.attrs(0).boundary);
        assert!(!m.attrs(4).boundary);
        assert_eq!(m.valence(4), 6);
        assert_eq!(m.edge_length(&m.mesh().tuple_from_vids(0, 4).unwrap()), 2f64.sqrt());
        m.validate_invariants().unwrap();
    }

    #[test]
    fn seam_vertex_detection() {
        // two triangles glued along (2, 1) ~ (4, 5)
        let points = [[0.0, 0.0], [0.5, 1.0], [1.0, 0.0], [5.0, 0.0], [6.0, 0.0], [5.5, 1.0]];
        let map = MirrorMap::from_pairs([(EdgeAddress::new(0, 0), EdgeAddress::new(1, 0))]);
        let m = PlanarMesh::new(&points, &[[0, 2, 1], [3, 4, 5]], RemeshParams::default())
            .unwrap()
            .with_mirrors(map)
            .unwrap();
        // every vertex still touches an open edge
        assert!((0..6).all(|v| m.attrs(v).boundary));
        assert!(m.seams().is_seam_vertex(1));
    }

    #[test]
    fn rejects_bad_params() {
        let params = RemeshParams::with_target(0.0);
        assert!(matches!(params.validate(), Err(MeshWeaveError::InvalidConfig(_))));
        assert!(PlanarMesh::new(&[[0.0, 0.0]], &[], params).is_err());
    }

    #[test]
    fn partitions_cover_requested_range() {
        let m = grid(3, RemeshParams::default());
        m.assign_partitions(4).unwrap();
        let parts: Vec<usize> = (0..16).map(|v| m.attrs(v).partition_id).collect();
        assert!(parts.iter().all(|&p| p < 4));
        assert!(parts.contains(&0) && parts.contains(&3));
    }

    #[test]
    fn partition_write_back_reports_missing_attributes() {
        let m = grid(1, RemeshParams::default());
        let t = m.mesh().tuple_from_vids(0, 1).unwrap();
        let _ = m.mesh().split_edge_raw(&t).unwrap();
        // vertex 4 exists in the connectivity but has no attribute slot yet
        assert!(matches!(
            m.assign_partitions(2),
            Err(MeshWeaveError::AttributeOutOfRange { index: 4, len: 4 })
        ));
    }

    #[test]
    fn consolidate_compacts_attributes() {
        let mut m = grid(1, RemeshParams::default());
        let t = m.mesh().tuple_from_vids(0, 1).unwrap();
        let _ = m.mesh().split_edge_raw(&t).unwrap();
        m.vertex_attrs.grow_to_at_least(m.mesh().vert_capacity());
        let remap = m.consolidate().unwrap();
        assert_eq!(remap.vertex_count(), 5);
        assert_eq!(m.vertex_attrs.len(), 5);
        assert_eq!(m.pos(3), [1.0, 1.0]);
    }
}
