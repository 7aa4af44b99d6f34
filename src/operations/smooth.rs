use super::{ExecuteResult, Operation};
use crate::topology::{MeshAccess, Tuple};

/// Vertex relocation. Changes no connectivity: `execute` only reports the
/// one-ring, and the application moves the vertex in its own `after`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VertexSmooth;

impl<M: MeshAccess + ?Sized> Operation<M> for VertexSmooth {
    type Cache = ();

    fn name(&self) -> &'static str {
        "vertex_smooth"
    }

    fn before(&self, mesh: &M, t: &Tuple, _cache: &mut ()) -> bool {
        mesh.tri_mesh().is_valid(t)
    }

    fn execute(&self, mesh: &M, t: &Tuple, _cache: &mut ()) -> ExecuteResult {
        let ring = mesh.tri_mesh().get_one_ring_tris_for_vertex(t.vid());
        ExecuteResult::unchanged(*t, ring)
    }
}
