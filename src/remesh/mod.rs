//! Isotropic remeshing of planar triangle meshes.
//!
//! A reference application of the engine: it attaches positions and boundary
//! tags to a [`TriMesh`](crate::topology::TriMesh), wraps the base operations
//! with geometric checks, and schedules them through the executor.
//!
//! ```rust
//! use mesh_weave::remesh::{PlanarMesh, RemeshParams};
//!
//! let points = [[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]];
//! let faces = [[0, 1, 2], [0, 2, 3]];
//! let mut mesh = PlanarMesh::new(&points, &faces, RemeshParams::with_target(0.5))?;
//! mesh.remesh()?;
//! assert!(mesh.all_faces_positive());
//! # Ok::<(), mesh_weave::mesh_error::MeshWeaveError>(())
//! ```

pub mod geometry;
pub mod mesh;
pub mod ops;
pub mod passes;

pub use mesh::{PlanarMesh, RemeshParams, VertexAttributes};
pub use ops::{RemeshCollapse, RemeshHooks, RemeshOp, RemeshSmooth, RemeshSplit, RemeshSwap};
pub use passes::IterationStats;
