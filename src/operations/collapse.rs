//! Edge collapse and the placement policy for the merged vertex.

use super::{ExecuteResult, Operation};
use crate::seam::Seams;
use crate::topology::connectivity::{set_intersection, set_union};
use crate::topology::{MeshAccess, Tuple};

/// Merges the endpoints of an edge into a new vertex.
///
/// `before` enforces the link condition (seam-aware when the mesh carries a
/// mirror map) and refuses collapses that would leave no face behind.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeCollapse;

impl EdgeCollapse {
    pub fn is_collapsible<M: MeshAccess + ?Sized>(mesh: &M, t: &Tuple) -> bool {
        let m = mesh.tri_mesh();
        if !m.is_valid(t) {
            return false;
        }
        let v1 = t.vid();
        let v2 = m.switch_vertex(t).vid();
        let (n1, n2) = (m.conn_tris(v1), m.conn_tris(v2));
        if set_union(&n1, &n2).len() == set_intersection(&n1, &n2).len() {
            log::trace!("collapse ({v1}, {v2}) would remove every face around it");
            return false;
        }
        match mesh.mirror_map() {
            Some(map) => Seams::new(m, Some(map)).check_link_condition(t),
            None => m.check_link_condition(t),
        }
    }
}

impl<M: MeshAccess + ?Sized> Operation<M> for EdgeCollapse {
    type Cache = ();

    fn name(&self) -> &'static str {
        "edge_collapse"
    }

    fn before(&self, mesh: &M, t: &Tuple, _cache: &mut ()) -> bool {
        Self::is_collapsible(mesh, t)
    }

    fn execute(&self, mesh: &M, t: &Tuple, _cache: &mut ()) -> ExecuteResult {
        match mesh.tri_mesh().collapse_edge_raw(t) {
            Ok(edit) => ExecuteResult::from_raw(edit),
            Err(e) => {
                log::debug!("collapse_edge_raw failed: {e}");
                ExecuteResult::failed()
            }
        }
    }
}

/// What the collapse needs to know about one endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EndpointInfo {
    pub fixed: bool,
    pub boundary: bool,
}

/// Where the merged vertex goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollapsePlacement {
    KeepFirst,
    KeepSecond,
    Midpoint,
}

impl CollapsePlacement {
    /// A fixed endpoint always wins; two fixed endpoints cannot collapse. Two
    /// boundary endpoints are ranked by `energy`, which returns the local
    /// energy of keeping the first and the second (lower wins, ties keep the
    /// first). A single boundary endpoint is kept. Otherwise the midpoint.
    pub fn choose(
        first: EndpointInfo,
        second: EndpointInfo,
        energy: impl FnOnce() -> (f64, f64),
    ) -> Option<Self> {
        match (first, second) {
            (EndpointInfo { fixed: true, .. }, EndpointInfo { fixed: true, .. }) => None,
            (EndpointInfo { fixed: true, .. }, _) => Some(Self::KeepFirst),
            (_, EndpointInfo { fixed: true, .. }) => Some(Self::KeepSecond),
            (EndpointInfo { boundary: true, .. }, EndpointInfo { boundary: true, .. }) => {
                let (e1, e2) = energy();
                Some(if e2 < e1 { Self::KeepSecond } else { Self::KeepFirst })
            }
            (EndpointInfo { boundary: true, .. }, _) => Some(Self::KeepFirst),
            (_, EndpointInfo { boundary: true, .. }) => Some(Self::KeepSecond),
            _ => Some(Self::Midpoint),
        }
    }

    pub fn place<const D: usize>(self, p1: [f64; D], p2: [f64; D]) -> [f64; D] {
        match self {
            Self::KeepFirst => p1,
            Self::KeepSecond => p2,
            Self::Midpoint => std::array::from_fn(|i| 0.5 * (p1[i] + p2[i])),
        }
    }
}
