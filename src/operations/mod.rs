//! The before/execute/after operation protocol.
//!
//! Every local edit implements [`Operation`]: `before` validates and snapshots
//! into an operation-owned cache, `execute` performs the raw connectivity change
//! and reports it as an [`ExecuteResult`], and `after` updates application state
//! and re-validates. [`run_operation`] drives the three stages. A cache lives on
//! the caller's stack for exactly one attempt.
//!
//! A rejected `after` does not leave the mesh edited: `execute` reports the
//! pre-image of every slot it touched, [`run_operation`] restores them, then calls
//! [`Operation::undo`] so the operation can revert its own attribute writes.

pub mod collapse;
pub mod paired;
pub mod smooth;
pub mod split;
pub mod swap;

pub use collapse::{CollapsePlacement, EdgeCollapse, EndpointInfo};
pub use paired::{PairedCache, PairedOperation, paired_lock_set};
pub use smooth::VertexSmooth;
pub use split::EdgeSplit;
pub use swap::EdgeSwap;

use crate::topology::{ConnectivityDiff, MeshAccess, RawEdit, Relabel, Tuple};

/// What `execute` did.
#[derive(Debug, Clone, Default)]
pub struct ExecuteResult {
    pub success: bool,
    /// Handle the edit continues from, if any.
    pub return_tuple: Option<Tuple>,
    /// Handles on the elements created or rewritten by the edit.
    pub new_tuples: Vec<Tuple>,
    pub relabel: Vec<Relabel>,
    pub diff: ConnectivityDiff,
}

impl ExecuteResult {
    pub fn failed() -> Self {
        Self::default()
    }

    /// A successful edit that changed no connectivity.
    pub fn unchanged(t: Tuple, new_tuples: Vec<Tuple>) -> Self {
        Self {
            success: true,
            return_tuple: Some(t),
            new_tuples,
            ..Self::default()
        }
    }

    pub fn from_raw(edit: RawEdit) -> Self {
        Self {
            success: true,
            return_tuple: Some(edit.return_tuple),
            new_tuples: edit.new_tris,
            relabel: edit.relabel.into_iter().collect(),
            diff: edit.diff,
        }
    }

    /// Combines two edits made in sequence; succeeds only if both did.
    pub fn merge(mut self, later: ExecuteResult) -> Self {
        self.success &= later.success;
        self.new_tuples.extend(later.new_tuples);
        self.relabel.extend(later.relabel);
        self.diff.append(later.diff);
        self
    }
}

/// One local edit expressed as the three-stage protocol.
pub trait Operation<M: ?Sized>: Send + Sync {
    /// Per-attempt scratch state.
    type Cache: Default + Send;

    fn name(&self) -> &'static str;

    /// Applicability check and snapshot. `false` aborts with nothing mutated.
    fn before(&self, mesh: &M, t: &Tuple, cache: &mut Self::Cache) -> bool;

    /// Raw mutation. Reports `success = false` (with whatever it already
    /// recorded in `diff`) instead of leaving a partial edit behind.
    fn execute(&self, mesh: &M, t: &Tuple, cache: &mut Self::Cache) -> ExecuteResult;

    /// Application update and post-validation. `false` rejects the edit.
    fn after(&self, _mesh: &M, _result: &ExecuteResult, _cache: &mut Self::Cache) -> bool {
        true
    }

    /// Reverts attribute writes made by `after`; connectivity is already restored.
    fn undo(&self, _mesh: &M, _cache: &mut Self::Cache) {}
}

/// `before ∧ execute.success ∧ after`, rolled back on any failure after
/// `execute`. Returns the new handles on success.
pub fn run_operation<M, O>(op: &O, mesh: &M, t: &Tuple) -> Option<Vec<Tuple>>
where
    M: MeshAccess + ?Sized,
    O: Operation<M> + ?Sized,
{
    let mut cache = O::Cache::default();
    if !op.before(mesh, t, &mut cache) {
        log::debug!("{}: rejected in before at {t:?}", op.name());
        return None;
    }
    let mut result = op.execute(mesh, t, &mut cache);
    if !result.success {
        log::debug!("{}: execute failed at {t:?}", op.name());
        mesh.tri_mesh().rollback(std::mem::take(&mut result.diff));
        return None;
    }
    if !op.after(mesh, &result, &mut cache) {
        log::debug!("{}: rejected in after at {t:?}; rolling back", op.name());
        mesh.tri_mesh().rollback(std::mem::take(&mut result.diff));
        op.undo(mesh, &mut cache);
        return None;
    }
    Some(result.new_tuples)
}
