use super::{ExecuteResult, Operation};
use crate::topology::{MeshAccess, Tuple};

/// Inserts a midpoint vertex on an edge. Always topologically valid.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeSplit;

impl<M: MeshAccess + ?Sized> Operation<M> for EdgeSplit {
    type Cache = ();

    fn name(&self) -> &'static str {
        "edge_split"
    }

    fn before(&self, mesh: &M, t: &Tuple, _cache: &mut ()) -> bool {
        mesh.tri_mesh().is_valid(t)
    }

    fn execute(&self, mesh: &M, t: &Tuple, _cache: &mut ()) -> ExecuteResult {
        match mesh.tri_mesh().split_edge_raw(t) {
            Ok(edit) => ExecuteResult::from_raw(edit),
            Err(e) => {
                log::debug!("split_edge_raw failed: {e}");
                ExecuteResult::failed()
            }
        }
    }
}
