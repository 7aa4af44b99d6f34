use super::{ExecuteResult, Operation};
use crate::topology::{MeshAccess, Tuple};

/// Flips an interior edge to join the two opposite vertices.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeSwap;

impl EdgeSwap {
    /// Interior edge, distinct opposite vertices, and the flipped edge must not
    /// already exist.
    pub fn is_swappable<M: MeshAccess + ?Sized>(mesh: &M, t: &Tuple) -> bool {
        let m = mesh.tri_mesh();
        if !m.is_valid(t) {
            return false;
        }
        let Some(other) = m.switch_face(t) else {
            return false;
        };
        let v3 = m.switch_vertex(&m.switch_edge(t)).vid();
        let v4 = m.switch_vertex(&m.switch_edge(&other)).vid();
        v3 != v4 && m.tuple_from_vids(v3, v4).is_none()
    }
}

impl<M: MeshAccess + ?Sized> Operation<M> for EdgeSwap {
    type Cache = ();

    fn name(&self) -> &'static str {
        "edge_swap"
    }

    fn before(&self, mesh: &M, t: &Tuple, _cache: &mut ()) -> bool {
        Self::is_swappable(mesh, t)
    }

    fn execute(&self, mesh: &M, t: &Tuple, _cache: &mut ()) -> ExecuteResult {
        match mesh.tri_mesh().swap_edge_raw(t) {
            Ok(edit) => ExecuteResult::from_raw(edit),
            Err(e) => {
                log::debug!("swap_edge_raw failed: {e}");
                ExecuteResult::failed()
            }
        }
    }
}
