//! Z-order (Morton) partitioning.

use super::PartitionId;
use rayon::prelude::*;

/// Interleaves the low `bits` bits of each coordinate, axis 0 lowest.
pub fn morton_code<const D: usize>(cell: [u64; D], bits: u32) -> u64 {
    let mut code = 0u64;
    for b in 0..bits {
        for (axis, &c) in cell.iter().enumerate() {
            let shift = b as usize * D + axis;
            if shift >= 64 {
                return code;
            }
            code |= ((c >> b) & 1) << shift;
        }
    }
    code
}

/// Assigns each point a partition in `0..n_parts` by sorting points along the
/// Z-order curve and cutting the order into contiguous chunks of
/// `len / n_parts + 1` points.
///
/// Coordinates are normalised to the bounding box and quantised before
/// encoding; non-finite coordinates are treated as the box minimum.
pub fn partition_by_morton<const D: usize>(points: &[[f64; D]], n_parts: usize) -> Vec<PartitionId> {
    if points.is_empty() {
        return Vec::new();
    }
    let n_parts = n_parts.max(1);
    let bits = (64 / D.max(1)).min(21) as u32;
    let scale = ((1u64 << bits) - 1) as f64;

    let mut lo = [f64::INFINITY; D];
    let mut hi = [f64::NEG_INFINITY; D];
    for p in points {
        for axis in 0..D {
            if p[axis].is_finite() {
                lo[axis] = lo[axis].min(p[axis]);
                hi[axis] = hi[axis].max(p[axis]);
            }
        }
    }

    let mut keyed: Vec<(u64, usize)> = points
        .par_iter()
        .enumerate()
        .map(|(i, p)| {
            let cell: [u64; D] = std::array::from_fn(|axis| {
                let extent = hi[axis] - lo[axis];
                if !p[axis].is_finite() || extent <= 0.0 {
                    return 0;
                }
                (((p[axis] - lo[axis]) / extent) * scale).round() as u64
            });
            (morton_code(cell, bits), i)
        })
        .collect();
    keyed.par_sort_unstable();

    let chunk = points.len() / n_parts + 1;
    let mut parts = vec![0; points.len()];
    for (rank, (_, i)) in keyed.into_iter().enumerate() {
        parts[i] = rank / chunk;
    }
    parts
}
