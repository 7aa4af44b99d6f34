//! Priority queues for executor workers.

use crate::topology::Tuple;
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// `(priority, operation, handle, retry count)`, plus an insertion sequence
/// number so equal priorities pop first-in first-out.
#[derive(Debug, Clone, Copy)]
pub struct QueueElement<Op> {
    pub priority: f64,
    pub op: Op,
    pub tuple: Tuple,
    pub retry: usize,
    seq: u64,
}

impl<Op> QueueElement<Op> {
    pub fn new(priority: f64, op: Op, tuple: Tuple, seq: u64) -> Self {
        Self {
            priority,
            op,
            tuple,
            retry: 0,
            seq,
        }
    }
}

impl<Op> PartialEq for QueueElement<Op> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<Op> Eq for QueueElement<Op> {}

impl<Op> PartialOrd for QueueElement<Op> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<Op> Ord for QueueElement<Op> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .total_cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug)]
struct QueueState<Op> {
    heap: BinaryHeap<QueueElement<Op>>,
    closed: bool,
}

/// A max-heap owned by one worker. Other workers may push renewals into it
/// until its owner finds it empty and closes it; pushes to a closed queue are
/// handed back so the caller can route them to the serial fallback.
#[derive(Debug)]
pub struct WorkerQueue<Op> {
    state: Mutex<QueueState<Op>>,
}

impl<Op> Default for WorkerQueue<Op> {
    fn default() -> Self {
        Self {
            state: Mutex::new(QueueState {
                heap: BinaryHeap::new(),
                closed: false,
            }),
        }
    }
}

impl<Op> WorkerQueue<Op> {
    pub fn push(&self, item: QueueElement<Op>) -> Result<(), QueueElement<Op>> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(item);
        }
        state.heap.push(item);
        Ok(())
    }

    pub fn pop(&self) -> Option<QueueElement<Op>> {
        self.state.lock().heap.pop()
    }

    /// Pops the best item, or closes the queue if it is empty.
    pub fn pop_or_close(&self) -> Option<QueueElement<Op>> {
        let mut state = self.state.lock();
        let item = state.heap.pop();
        if item.is_none() {
            state.closed = true;
        }
        item
    }

    pub fn len(&self) -> usize {
        self.state.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
