//! Spatial partitioning of vertices into worker buckets.
//!
//! The executor routes each candidate operation to the queue of its partition.
//! Partitions only need to be spatially coherent, so neighbouring operations
//! usually land on the same worker and rarely contend for locks; they are
//! computed once, up front, from vertex positions.

pub mod metrics;
pub mod morton;

pub use metrics::{edge_cut, part_sizes};
pub use morton::{morton_code, partition_by_morton};

pub type PartitionId = usize;

