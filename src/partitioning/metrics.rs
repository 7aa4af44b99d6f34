//! Partition quality metrics over mesh edges.
//!
//! Intended for debugging, tests, and logging the locality of a partitioning.

use super::PartitionId;
use crate::topology::TriMesh;

/// Number of mesh edges whose endpoints lie in different parts (O(E)).
///
/// Vertices past the end of `parts` count as part 0.
pub fn edge_cut(mesh: &TriMesh, parts: &[PartitionId]) -> usize {
    let part = |v: usize| parts.get(v).copied().unwrap_or(0);
    mesh.get_edges()
        .into_iter()
        .filter(|t| part(t.vid()) != part(mesh.switch_vertex(t).vid()))
        .count()
}

/// Number of entries assigned to each part.
pub fn part_sizes(parts: &[PartitionId]) -> Vec<usize> {
    let n = parts.iter().copied().max().map_or(0, |m| m + 1);
    let mut sizes = vec![0; n];
    for &p in parts {
        sizes[p] += 1;
    }
    sizes
}
