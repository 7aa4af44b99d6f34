#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-weave
//!
//! mesh-weave is a library for safely mutating the topology of triangle meshes under
//! concurrent, priority-ordered local edits. Applications (adaptive refinement,
//! remeshing, parameterization cleanup) differ in the quality metric attached to each
//! edit; scheduling, validation, and parallel safety live here.
//!
//! ## Features
//! - Tuple handles `(vertex, local edge, face, version)` over a slot-table connectivity
//!   store, with navigation operators and one-ring queries
//! - Link-condition validation for edge collapse, including a seam-aware variant for
//!   meshes cut into charts
//! - A before/execute/after operation protocol with deterministic rollback
//! - Paired operations that edit both copies of a seam edge as one unit
//! - A partitioned, priority-ordered executor with per-vertex try-locks, retry, and a
//!   serial fallback
//! - A planar isotropic remesher built on the above
//!
//! ## Determinism
//!
//! With `num_threads == 0` a pass is fully serial: equal priorities pop in insertion
//! order and no vertex is ever locked, so repeated runs produce identical meshes.
//! Parallel passes are reproducible in outcome class (counts, validity) but not in
//! the exact sequence of edits.
//!
//! ## Usage
//!
//! ```rust
//! use mesh_weave::prelude::*;
//!
//! let mesh = TriMesh::from_faces(4, &[[0, 1, 2], [0, 2, 3]])?;
//! let diagonal = mesh.tuple_from_vids(0, 2).expect("edge exists");
//! // collapsing an interior edge between two boundary vertices would pinch the mesh
//! assert!(!mesh.check_link_condition(&diagonal));
//! assert!(run_operation(&EdgeSplit, &mesh, &diagonal).is_some());
//! assert_eq!(mesh.valid_face_count(), 4);
//! # Ok::<(), MeshWeaveError>(())
//! ```

pub mod attributes;
pub mod debug_invariants;
pub mod executor;
pub mod link;
pub mod mesh_error;
pub mod operations;
pub mod partitioning;
pub mod remesh;
pub mod seam;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::attributes::AttributeCollection;
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::executor::{ExecutePass, ExecutorConfig, PassHooks, PassStats};
    pub use crate::link::{EdgeLink, VertexLink};
    pub use crate::mesh_error::MeshWeaveError;
    pub use crate::operations::{
        EdgeCollapse, EdgeSplit, EdgeSwap, ExecuteResult, Operation, PairedOperation,
        VertexSmooth, run_operation,
    };
    pub use crate::seam::{EdgeAddress, MirrorMap, Seams};
    pub use crate::topology::{MeshAccess, Remap, TriMesh, Tuple};
}
