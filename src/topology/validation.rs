//! Consistency checks for the triangle connectivity store.

use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshWeaveError;
use crate::topology::tri_mesh::TriMesh;
use hashbrown::HashMap;

/// Policy for edges shared by more than two faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NonManifoldHandling {
    Ignore,
    Warn,
    #[default]
    Error,
}

impl TriMesh {
    fn validate_face(&self, fid: usize) -> Result<(), MeshWeaveError> {
        let Some(indices) = self.oriented_tri_vids(fid) else {
            return Ok(());
        };
        if indices[0] == indices[1] || indices[1] == indices[2] || indices[0] == indices[2] {
            return Err(MeshWeaveError::DegenerateFace { fid, indices });
        }
        for vid in indices {
            let conn = self.vertex_connectivity(vid).ok_or(MeshWeaveError::VertexOutOfRange {
                vid,
                capacity: self.vert_capacity(),
            })?;
            if conn.removed || conn.conn_tris.binary_search(&fid).is_err() {
                return Err(MeshWeaveError::ConnectivityMismatch { vid, fid });
            }
        }
        Ok(())
    }

    /// Checks `vid`'s incident-face list and every face in it.
    pub fn validate_vertex_fan(&self, vid: usize) -> Result<(), MeshWeaveError> {
        let Some(conn) = self.vertex_connectivity(vid) else {
            return Err(MeshWeaveError::VertexOutOfRange {
                vid,
                capacity: self.vert_capacity(),
            });
        };
        if conn.removed {
            return Ok(());
        }
        if conn.conn_tris.windows(2).any(|w| w[0] >= w[1]) {
            return Err(MeshWeaveError::UnsortedConnectivity(vid));
        }
        for &fid in &conn.conn_tris {
            let contains = self
                .oriented_tri_vids(fid)
                .is_some_and(|f| f.contains(&vid));
            if !contains {
                return Err(MeshWeaveError::ConnectivityMismatch { vid, fid });
            }
            self.validate_face(fid)?;
        }
        Ok(())
    }

    /// Counts faces per edge and reports edges shared by more than two.
    pub fn check_manifold_edges(&self, handling: NonManifoldHandling) -> Result<(), MeshWeaveError> {
        let mut counts: HashMap<(usize, usize), usize> = HashMap::new();
        for fid in 0..self.tri_capacity() {
            let Some(f) = self.oriented_tri_vids(fid) else {
                continue;
            };
            for e in 0..3 {
                let (a, b) = (f[(e + 1) % 3], f[(e + 2) % 3]);
                *counts.entry((a.min(b), a.max(b))).or_default() += 1;
            }
        }
        for (&(v0, v1), &faces) in &counts {
            if faces <= 2 {
                continue;
            }
            match handling {
                NonManifoldHandling::Warn => {
                    log::warn!("Non-manifold edge detected: edge=({v0}, {v1}) faces={faces}");
                }
                NonManifoldHandling::Error => {
                    return Err(MeshWeaveError::NonManifoldEdge { v0, v1, faces });
                }
                NonManifoldHandling::Ignore => {}
            }
        }
        Ok(())
    }
}

impl DebugInvariants for TriMesh {
    fn validate_invariants(&self) -> Result<(), MeshWeaveError> {
        for fid in 0..self.tri_capacity() {
            self.validate_face(fid)?;
        }
        for vid in 0..self.vert_capacity() {
            self.validate_vertex_fan(vid)?;
        }
        self.check_manifold_edges(NonManifoldHandling::Error)
    }
}
