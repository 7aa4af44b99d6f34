//! Whole-structure consistency checks.
//!
//! Each layer checks what it owns and then defers to the layer below:
//! a [`TriMesh`](crate::topology::TriMesh) checks face slots, vertex fans and
//! edge manifoldness; [`Seams`](crate::seam::Seams) adds the mirror pairing
//! (symmetric pairs of live boundary edges); a
//! [`PlanarMesh`](crate::remesh::PlanarMesh) adds attribute coverage of every
//! vertex slot.

use crate::mesh_error::MeshWeaveError;

pub trait DebugInvariants {
    /// First broken invariant, if any. Walks every slot.
    fn validate_invariants(&self) -> Result<(), MeshWeaveError>;

    /// Panics on a broken invariant when checks are compiled in.
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "invariant check");
    }
}

/// Runs `$check` at the place named by `$site` and panics with the error
/// when it fails. Compiled in for debug builds and the
/// `strict-invariants`/`check-invariants` features, otherwise `$check` is not
/// evaluated.
#[macro_export]
macro_rules! debug_invariants {
    ($check:expr, $site:literal) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants"))]
        if let Err(e) = $check {
            panic!("mesh-weave invariant broken at {}: {}", $site, e);
        }
    };
}
