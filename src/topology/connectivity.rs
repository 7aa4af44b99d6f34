//! Per-slot incidence records for the triangle connectivity store.

use serde::{Deserialize, Serialize};

/// Reverse incidence of one vertex: the sorted ids of its incident faces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexConnectivity {
    pub conn_tris: Vec<usize>,
    pub removed: bool,
}

impl VertexConnectivity {
    pub fn live(conn_tris: Vec<usize>) -> Self {
        Self {
            conn_tris,
            removed: false,
        }
    }

    /// A freshly allocated slot, dead until a mutation fills it.
    pub fn vacant() -> Self {
        Self {
            conn_tris: Vec::new(),
            removed: true,
        }
    }

    pub(crate) fn insert_tri(&mut self, fid: usize) {
        if let Err(pos) = self.conn_tris.binary_search(&fid) {
            self.conn_tris.insert(pos, fid);
        }
    }

    pub(crate) fn erase_tri(&mut self, fid: usize) {
        if let Ok(pos) = self.conn_tris.binary_search(&fid) {
            self.conn_tris.remove(pos);
        }
    }
}

/// Forward incidence of one triangle plus its version counter.
///
/// `indices` are stored counter-clockwise; `hash` increases every time the slot
/// is rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriangleConnectivity {
    pub indices: [usize; 3],
    pub removed: bool,
    pub hash: u64,
}

impl TriangleConnectivity {
    pub fn live(indices: [usize; 3]) -> Self {
        Self {
            indices,
            removed: false,
            hash: 0,
        }
    }

    pub fn vacant() -> Self {
        Self {
            indices: [usize::MAX; 3],
            removed: true,
            hash: 0,
        }
    }

    /// Local index of `vid` in this face.
    #[inline]
    pub fn find(&self, vid: usize) -> Option<usize> {
        self.indices.iter().position(|&v| v == vid)
    }

    /// Local edge joining local vertices `a` and `b` (`a != b`).
    #[inline]
    pub fn local_edge_between(a: usize, b: usize) -> usize {
        3 - a - b
    }
}

/// Sorted intersection of two sorted id lists.
pub(crate) fn set_intersection(a: &[usize], b: &[usize]) -> Vec<usize> {
    let (mut i, mut j) = (0, 0);
    let mut out = Vec::new();
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

/// Sorted union of two sorted id lists.
pub(crate) fn set_union(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut out: Vec<usize> = a.iter().chain(b.iter()).copied().collect();
    out.sort_unstable();
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_insert_and_erase() {
        let mut v = VertexConnectivity::live(vec![1, 5]);
        v.insert_tri(3);
        v.insert_tri(3);
        assert_eq!(v.conn_tris, vec![1, 3, 5]);
        v.erase_tri(1);
        v.erase_tri(8);
        assert_eq!(v.conn_tris, vec![3, 5]);
    }

    #[test]
    fn local_edge_is_opposite_third_vertex() {
        assert_eq!(TriangleConnectivity::local_edge_between(0, 1), 2);
        assert_eq!(TriangleConnectivity::local_edge_between(2, 1), 0);
        assert_eq!(TriangleConnectivity::local_edge_between(0, 2), 1);
    }

    #[test]
    fn set_ops() {
        assert_eq!(set_intersection(&[1, 2, 4, 7], &[2, 3, 7]), vec![2, 7]);
        assert_eq!(set_union(&[1, 4], &[0, 4, 9]), vec![0, 1, 4, 9]);
    }
}
