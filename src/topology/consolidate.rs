//! Batch compaction of dead vertex and face slots.

use crate::mesh_error::MeshWeaveError;
use crate::topology::connectivity::{TriangleConnectivity, VertexConnectivity};
use crate::topology::locks::VertexLocks;
use crate::topology::slots::SlotTable;
use crate::topology::tri_mesh::TriMesh;
use serde::{Deserialize, Serialize};

/// Old-id → new-id tables produced by [`TriMesh::consolidate`].
///
/// `None` marks a slot that was dead and has been dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remap {
    pub vertices: Vec<Option<usize>>,
    pub faces: Vec<Option<usize>>,
}

impl Remap {
    #[inline]
    pub fn vertex(&self, old: usize) -> Option<usize> {
        self.vertices.get(old).copied().flatten()
    }

    #[inline]
    pub fn face(&self, old: usize) -> Option<usize> {
        self.faces.get(old).copied().flatten()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.iter().flatten().count()
    }

    pub fn face_count(&self) -> usize {
        self.faces.iter().flatten().count()
    }

    /// True when no slot moved and none was dropped.
    pub fn is_identity(&self) -> bool {
        self.vertices.iter().enumerate().all(|(i, v)| *v == Some(i))
            && self.faces.iter().enumerate().all(|(i, f)| *f == Some(i))
    }
}

fn compaction_table(dead: impl Iterator<Item = bool>) -> Vec<Option<usize>> {
    let mut next = 0;
    dead.map(|removed| {
        if removed {
            None
        } else {
            next += 1;
            Some(next - 1)
        }
    })
    .collect()
}

impl TriMesh {
    /// Removes dead slots and renumbers survivors in their original order.
    ///
    /// Every surviving face gets a new version, so no handle issued before the
    /// call validates afterwards. Attribute collections and mirror maps must be
    /// compacted with the returned [`Remap`]. A live face naming a dead vertex
    /// is reported and leaves the mesh untouched.
    pub fn consolidate(&mut self) -> Result<Remap, MeshWeaveError> {
        let old_vertices = self.vertices.to_vec();
        let old_faces = self.faces.to_vec();

        let remap = Remap {
            vertices: compaction_table(old_vertices.iter().map(|v| v.removed)),
            faces: compaction_table(old_faces.iter().map(|f| f.removed)),
        };

        // Both tables are monotone, so sorted incidence lists stay sorted.
        let vertices: Vec<VertexConnectivity> = old_vertices
            .into_iter()
            .filter(|v| !v.removed)
            .map(|v| {
                VertexConnectivity::live(
                    v.conn_tris.iter().filter_map(|&f| remap.face(f)).collect(),
                )
            })
            .collect();
        let faces = old_faces
            .into_iter()
            .enumerate()
            .filter(|(_, f)| !f.removed)
            .map(|(fid, f)| {
                let mut indices = [0; 3];
                for (slot, vid) in indices.iter_mut().zip(f.indices) {
                    *slot = remap
                        .vertex(vid)
                        .ok_or(MeshWeaveError::DeadVertexReference { fid, vid })?;
                }
                Ok(TriangleConnectivity {
                    indices,
                    removed: false,
                    hash: f.hash + 1,
                })
            })
            .collect::<Result<Vec<_>, MeshWeaveError>>()?;

        log::debug!(
            "consolidate: vertices {} -> {}, faces {} -> {}",
            remap.vertices.len(),
            vertices.len(),
            remap.faces.len(),
            faces.len()
        );

        self.vertices = SlotTable::from_vec(vertices);
        self.faces = SlotTable::from_vec(faces);
        self.locks = VertexLocks::default();
        crate::debug_invariants!(
            crate::debug_invariants::DebugInvariants::validate_invariants(self),
            "consolidate"
        );
        Ok(remap)
    }
}
