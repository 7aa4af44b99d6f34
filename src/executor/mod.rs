//! Partitioned, priority-ordered parallel executor.
//!
//! Each worker owns one priority queue and loops
//! POP → CHECK-VALID → CHECK-STALE → LOCK → APPLY → UNLOCK → ENQUEUE-RENEWALS
//! until its queue runs dry. Lock contention requeues the item with a bumped
//! retry count; past `max_retry_limit` it moves to a shared fallback queue that
//! is drained serially, without locks, after every worker has joined. Workers
//! never wait on a vertex.
//!
//! With `num_threads == 0` everything runs through the serial path and no vertex
//! is ever locked.
//!
//! The application plugs in through [`PassHooks`]: an operation enum, how to
//! apply it, its priority, and which neighbours to revisit after a success.

pub mod queue;

pub use queue::{QueueElement, WorkerQueue};

use crate::mesh_error::MeshWeaveError;
use crate::topology::{MeshAccess, Tuple, VertexLockGuard};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// Executor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Worker threads; 0 runs the pass serially without locking.
    pub num_threads: usize,
    /// Lock failures tolerated before an item moves to the serial fallback.
    pub max_retry_limit: usize,
    /// Successful operations between two evaluations of the stopping criterion.
    pub stopping_criterion_checking_frequency: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            num_threads: 0,
            max_retry_limit: 10,
            stopping_criterion_checking_frequency: 100,
        }
    }
}

impl ExecutorConfig {
    pub fn serial() -> Self {
        Self::default()
    }

    pub fn parallel(num_threads: usize) -> Self {
        Self {
            num_threads,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), MeshWeaveError> {
        if self.stopping_criterion_checking_frequency == 0 {
            return Err(MeshWeaveError::InvalidConfig(
                "stopping_criterion_checking_frequency must be positive",
            ));
        }
        Ok(())
    }
}

/// Application callbacks driving one pass.
pub trait PassHooks<M: MeshAccess + ?Sized>: Sync {
    /// Closed set of operation kinds this application schedules.
    type Op: Copy + Eq + fmt::Debug + Send + Sync;

    /// Runs the operation; `None` is a rejection.
    fn apply(&self, mesh: &M, op: Self::Op, t: &Tuple) -> Option<Vec<Tuple>>;

    /// Higher runs sooner.
    fn priority(&self, mesh: &M, op: Self::Op, t: &Tuple) -> f64;

    /// Follow-up work after `op` succeeded and produced `new_tuples`.
    fn renew_neighbor_tuples(
        &self,
        mesh: &M,
        op: Self::Op,
        new_tuples: &[Tuple],
    ) -> Vec<(Self::Op, Tuple)>;

    /// Whether the item's cached priority still describes the mesh. Must not
    /// mutate. Defaults to recomputing the priority and comparing.
    fn is_weight_up_to_date(&self, mesh: &M, op: Self::Op, t: &Tuple, cached: f64) -> bool {
        self.priority(mesh, op, t) == cached
    }

    /// Admission filter for seeded items and renewals, given the fresh
    /// priority. Items it turns away are never queued.
    fn should_enqueue(&self, _op: Self::Op, _priority: f64) -> bool {
        true
    }

    /// All-or-nothing acquisition of every vertex the operation may touch.
    fn lock_vertices<'m>(&self, mesh: &'m M, t: &Tuple, worker: usize) -> Option<VertexLockGuard<'m>> {
        mesh.tri_mesh().try_lock_edge_two_ring(t, worker)
    }

    fn partition_id(&self, _mesh: &M, _op: Self::Op, _t: &Tuple) -> usize {
        0
    }

    /// Global early-exit predicate, checked every
    /// `stopping_criterion_checking_frequency` successes.
    fn stopping_criterion(&self, _mesh: &M) -> bool {
        false
    }

    /// Called for every rejected operation.
    fn on_fail(&self, _mesh: &M, _op: Self::Op, _t: &Tuple) {}
}

/// Outcome counters of one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassStats {
    pub succeeded: usize,
    pub rejected: usize,
    pub stale: usize,
    pub invalid: usize,
    /// Lock failures (each one requeued or sent to the fallback).
    pub retried: usize,
    pub fell_back: usize,
    pub stopped_early: bool,
}

#[derive(Default)]
struct Counters {
    succeeded: AtomicUsize,
    rejected: AtomicUsize,
    stale: AtomicUsize,
    invalid: AtomicUsize,
    retried: AtomicUsize,
    fell_back: AtomicUsize,
}

struct PassState<'a, M: ?Sized, Op> {
    mesh: &'a M,
    queues: Vec<WorkerQueue<Op>>,
    fallback: WorkerQueue<Op>,
    counters: Counters,
    stop: AtomicBool,
    seq: AtomicU64,
}

impl<M: ?Sized, Op: fmt::Debug> PassState<'_, M, Op> {
    /// The serial queue is never closed; a refused push would mean the item is
    /// lost, so it is reported.
    fn push_fallback(&self, item: QueueElement<Op>) {
        if let Err(item) = self.fallback.push(item) {
            log::warn!("serial queue refused {:?} {:?}; item dropped", item.op, item.tuple);
        }
    }
}

/// One executor pass: configuration plus the application hooks.
#[derive(Debug, Clone, Default)]
pub struct ExecutePass<H> {
    pub hooks: H,
    pub config: ExecutorConfig,
}

impl<H> ExecutePass<H> {
    pub fn new(hooks: H, config: ExecutorConfig) -> Self {
        Self { hooks, config }
    }

    /// Processes `items` and everything they renew until all queues are
    /// empty or the stopping criterion fires.
    pub fn run<M>(&self, mesh: &M, items: Vec<(H::Op, Tuple)>) -> Result<PassStats, MeshWeaveError>
    where
        M: MeshAccess + ?Sized,
        H: PassHooks<M>,
    {
        self.config.validate()?;
        let n = self.config.num_threads;
        let state = PassState {
            mesh,
            queues: (0..n).map(|_| WorkerQueue::default()).collect(),
            fallback: WorkerQueue::default(),
            counters: Counters::default(),
            stop: AtomicBool::new(false),
            seq: AtomicU64::new(0),
        };
        for (op, t) in items {
            let priority = self.hooks.priority(mesh, op, &t);
            if self.hooks.should_enqueue(op, priority) {
                self.enqueue(&state, op, t, priority, n > 0);
            }
        }

        if n > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| MeshWeaveError::ThreadPool(e.to_string()))?;
            let state = &state;
            pool.scope(|s| {
                for worker in 0..n {
                    s.spawn(move |_| self.worker_loop(state, worker));
                }
            });
        }

        while !state.stop.load(Ordering::Acquire) {
            let Some(item) = state.fallback.pop() else { break };
            self.process(&state, item, None);
        }

        let c = &state.counters;
        let stats = PassStats {
            succeeded: c.succeeded.load(Ordering::Relaxed),
            rejected: c.rejected.load(Ordering::Relaxed),
            stale: c.stale.load(Ordering::Relaxed),
            invalid: c.invalid.load(Ordering::Relaxed),
            retried: c.retried.load(Ordering::Relaxed),
            fell_back: c.fell_back.load(Ordering::Relaxed),
            stopped_early: state.stop.load(Ordering::Acquire),
        };
        log::info!(
            "pass done ({n} threads): {} succeeded, {} rejected, {} stale, {} invalid, {} retries, {} to fallback{}",
            stats.succeeded,
            stats.rejected,
            stats.stale,
            stats.invalid,
            stats.retried,
            stats.fell_back,
            if stats.stopped_early { ", stopped early" } else { "" },
        );
        Ok(stats)
    }

    /// Routes a new item to its partition's queue, or to the serial queue when
    /// running serially or when that worker has already finished.
    fn enqueue<M, Op>(&self, state: &PassState<'_, M, Op>, op: Op, t: Tuple, priority: f64, parallel: bool)
    where
        M: MeshAccess + ?Sized,
        H: PassHooks<M, Op = Op>,
        Op: Copy + Eq + fmt::Debug + Send + Sync,
    {
        let seq = state.seq.fetch_add(1, Ordering::Relaxed);
        let item = QueueElement::new(priority, op, t, seq);
        if !parallel {
            state.push_fallback(item);
            return;
        }
        let part = self.hooks.partition_id(state.mesh, op, &t) % state.queues.len();
        if let Err(item) = state.queues[part].push(item) {
            state.push_fallback(item);
        }
    }

    fn worker_loop<M, Op>(&self, state: &PassState<'_, M, Op>, worker: usize)
    where
        M: MeshAccess + ?Sized,
        H: PassHooks<M, Op = Op>,
        Op: Copy + Eq + fmt::Debug + Send + Sync,
    {
        while !state.stop.load(Ordering::Acquire) {
            let Some(item) = state.queues[worker].pop_or_close() else {
                log::trace!("worker {worker} drained its queue");
                break;
            };
            self.process(state, item, Some(worker));
        }
    }

    /// One item through the state machine. `worker == None` is the serial
    /// path: no locking, renewals go to the serial queue.
    fn process<M, Op>(&self, state: &PassState<'_, M, Op>, mut item: QueueElement<Op>, worker: Option<usize>)
    where
        M: MeshAccess + ?Sized,
        H: PassHooks<M, Op = Op>,
        Op: Copy + Eq + fmt::Debug + Send + Sync,
    {
        let mesh = state.mesh;
        let c = &state.counters;
        if !mesh.tri_mesh().is_valid(&item.tuple) {
            log::trace!("drop invalid {:?} {:?}", item.op, item.tuple);
            c.invalid.fetch_add(1, Ordering::Relaxed);
            return;
        }
        if !self
            .hooks
            .is_weight_up_to_date(mesh, item.op, &item.tuple, item.priority)
        {
            log::trace!("drop stale {:?} {:?}", item.op, item.tuple);
            c.stale.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let guard = match worker {
            Some(w) => match self.hooks.lock_vertices(mesh, &item.tuple, w) {
                Some(g) => Some(g),
                None => {
                    c.retried.fetch_add(1, Ordering::Relaxed);
                    item.retry += 1;
                    if item.retry > self.config.max_retry_limit {
                        log::trace!("{:?} {:?} moves to fallback", item.op, item.tuple);
                        c.fell_back.fetch_add(1, Ordering::Relaxed);
                        state.push_fallback(item);
                    } else if let Err(item) = state.queues[w].push(item) {
                        state.push_fallback(item);
                    }
                    std::thread::yield_now();
                    return;
                }
            },
            None => None,
        };

        // Another worker may have rewritten the region between the checks and
        // the lock.
        if !mesh.tri_mesh().is_valid(&item.tuple) {
            c.invalid.fetch_add(1, Ordering::Relaxed);
            return;
        }
        if !self
            .hooks
            .is_weight_up_to_date(mesh, item.op, &item.tuple, item.priority)
        {
            c.stale.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let Some(new_tuples) = self.hooks.apply(mesh, item.op, &item.tuple) else {
            c.rejected.fetch_add(1, Ordering::Relaxed);
            self.hooks.on_fail(mesh, item.op, &item.tuple);
            return;
        };

        let renewals: Vec<(Op, Tuple, f64)> = self
            .hooks
            .renew_neighbor_tuples(mesh, item.op, &new_tuples)
            .into_iter()
            .filter(|(_, t)| mesh.tri_mesh().is_valid(t))
            .map(|(op, t)| (op, t, self.hooks.priority(mesh, op, &t)))
            .filter(|(op, _, p)| self.hooks.should_enqueue(*op, *p))
            .collect();
        drop(guard);
        for (op, t, priority) in renewals {
            self.enqueue(state, op, t, priority, worker.is_some());
        }

        let done = c.succeeded.fetch_add(1, Ordering::AcqRel) + 1;
        if done % self.config.stopping_criterion_checking_frequency == 0
            && self.hooks.stopping_criterion(mesh)
        {
            log::debug!("stopping criterion met after {done} operations");
            state.stop.store(true, Ordering::Release);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::{EdgeSplit, run_operation};
    use crate::topology::TriMesh;

    /// Splits every edge once: renewals are never requested.
    struct SplitAll;

    impl PassHooks<TriMesh> for SplitAll {
        type Op = ();

        fn apply(&self, mesh: &TriMesh, _op: (), t: &Tuple) -> Option<Vec<Tuple>> {
            run_operation(&EdgeSplit, mesh, t)
        }

        fn priority(&self, _mesh: &TriMesh, _op: (), t: &Tuple) -> f64 {
            t.fid() as f64
        }

        fn renew_neighbor_tuples(&self, _mesh: &TriMesh, _op: (), _new: &[Tuple]) -> Vec<((), Tuple)> {
            Vec::new()
        }
    }

    #[test]
    fn config_validation() {
        assert!(ExecutorConfig::default().validate().is_ok());
        let bad = ExecutorConfig {
            stopping_criterion_checking_frequency: 0,
            ..ExecutorConfig::default()
        };
        assert!(matches!(bad.validate(), Err(MeshWeaveError::InvalidConfig(_))));
    }

    #[test]
    fn serial_pass_splits_each_edge() {
        let m = TriMesh::from_faces(4, &[[0, 2, 1], [0, 3, 2]]).unwrap();
        let items = m.get_edges().into_iter().map(|t| ((), t)).collect();
        let stats = ExecutePass::new(SplitAll, ExecutorConfig::serial())
            .run(&m, items)
            .unwrap();
        assert_eq!(stats.succeeded + stats.invalid, 5);
        assert!(stats.succeeded >= 1);
        assert_eq!(m.valid_vertex_count(), 4 + stats.succeeded);
    }
}
