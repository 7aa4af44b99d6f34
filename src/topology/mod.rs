//! Top-level module for triangle mesh topology.
//!
//! This module provides the tuple-addressed connectivity store and everything that
//! reads or rewrites it directly:
//! - [`Tuple`] handles and their navigation operators
//! - [`TriMesh`], the slot-table store with one-ring queries
//! - raw collapse/split/swap primitives with reversible diffs
//! - per-vertex locks and lock-set builders
//! - consolidation and invariant validation
//!
//! Higher layers (link conditions, seams, operations, the executor) only talk to
//! a mesh through [`MeshAccess`], so an application can wrap a `TriMesh` together
//! with its own attributes and still use the whole engine.

pub mod connectivity;
pub mod consolidate;
pub mod locks;
pub mod raw;
pub mod slots;
pub mod tri_mesh;
pub mod tuple;
pub mod validation;

pub use consolidate::Remap;
pub use locks::{VertexLockGuard, VertexLocks};
pub use raw::{ConnectivityDiff, RawEdit, Relabel};
pub use tri_mesh::TriMesh;
pub use tuple::Tuple;
pub use validation::NonManifoldHandling;

use crate::seam::MirrorMap;

/// Access to the connectivity store (and optional seam map) behind an
/// application mesh type.
pub trait MeshAccess: Sync {
    fn tri_mesh(&self) -> &TriMesh;

    /// Seam pairings, for meshes cut into charts.
    fn mirror_map(&self) -> Option<&MirrorMap> {
        None
    }
}

impl MeshAccess for TriMesh {
    fn tri_mesh(&self) -> &TriMesh {
        self
    }
}

static_assertions::assert_impl_all!(TriMesh: Send, Sync);
static_assertions::assert_impl_all!(Tuple: Copy, Send, Sync);
