//! MeshWeaveError: Unified error type for mesh-weave public APIs
//!
//! Operation rejections (link condition, stale weights, lock contention) are not
//! errors; they surface as `false`/`None` from the operation protocol. This type is
//! reserved for malformed input, corrupted connectivity, and environment failures.

use crate::topology::tuple::Tuple;
use thiserror::Error;

/// Unified error type for mesh-weave operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshWeaveError {
    /// A handle does not reference a live simplex (removed slot or version mismatch).
    #[error("Tuple {0:?} does not reference a live simplex")]
    InvalidTuple(Tuple),
    /// A vertex index is outside the current vertex capacity.
    #[error("vertex {vid} out of range (capacity {capacity})")]
    VertexOutOfRange { vid: usize, capacity: usize },
    /// A face index is outside the current face capacity.
    #[error("face {fid} out of range (capacity {capacity})")]
    FaceOutOfRange { fid: usize, capacity: usize },
    /// A triangle repeats one of its vertices.
    #[error("face {fid} is degenerate: {indices:?}")]
    DegenerateFace { fid: usize, indices: [usize; 3] },
    /// Reverse incidence (vertex → faces) disagrees with the face table.
    #[error("connectivity mismatch between vertex {vid} and face {fid}")]
    ConnectivityMismatch { vid: usize, fid: usize },
    /// A vertex's incident-face list is not sorted or contains duplicates.
    #[error("incident faces of vertex {0} are not strictly sorted")]
    UnsortedConnectivity(usize),
    /// More than two faces share an edge.
    #[error("edge ({v0}, {v1}) is shared by {faces} faces")]
    NonManifoldEdge { v0: usize, v1: usize, faces: usize },
    /// The operation requires an interior edge.
    #[error("Tuple {0:?} lies on a boundary edge")]
    BoundaryEdge(Tuple),
    /// Collapsing would leave the merged vertex without incident faces.
    #[error("collapsing {0:?} would remove every face around both endpoints")]
    DegenerateCollapse(Tuple),
    /// Mirror slot `(fid, local_eid)` does not point back at itself through its mirror.
    #[error("mirror of face {fid} edge {local_eid} is not symmetric")]
    MirrorAsymmetry { fid: usize, local_eid: usize },
    /// Mirror slot references a removed face or a slot that cannot be located.
    #[error("mirror of face {fid} edge {local_eid} points at a dead or missing edge")]
    MirrorDangling { fid: usize, local_eid: usize },
    /// Mirrored edges share their opposite vertex.
    #[error("mirror of face {fid} edge {local_eid} is degenerate")]
    MirrorDegenerate { fid: usize, local_eid: usize },
    /// Only boundary edges may carry a mirror.
    #[error("face {fid} edge {local_eid} carries a mirror but is not a boundary edge")]
    SeamEdgeNotBoundary { fid: usize, local_eid: usize },
    /// A live face still names a dead vertex.
    #[error("live face {fid} references dead vertex {vid}")]
    DeadVertexReference { fid: usize, vid: usize },
    /// Attribute write outside the collection's length.
    #[error("attribute index {index} out of range (len {len})")]
    AttributeOutOfRange { index: usize, len: usize },
    /// The executor could not build its worker pool.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
    /// A configuration value is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}
