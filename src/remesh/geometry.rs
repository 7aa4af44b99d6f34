//! Planar predicates used by the remesher.
//!
//! Generic over [`num_traits::Float`] so the same code serves `f32` and `f64`
//! coordinate sets.

use num_traits::Float;

/// Twice the signed area of `(a, b, c)`; positive when counter-clockwise.
#[inline]
pub fn orient2d<T: Float>(a: [T; 2], b: [T; 2], c: [T; 2]) -> T {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

#[inline]
pub fn distance<T: Float>(a: [T; 2], b: [T; 2]) -> T {
    (b[0] - a[0]).hypot(b[1] - a[1])
}

/// Signed area of a triangle.
pub fn triangle_area<T: Float>(tri: [[T; 2]; 3]) -> T {
    let half = T::from(0.5).unwrap_or_else(T::one);
    orient2d(tri[0], tri[1], tri[2]) * half
}

/// Arithmetic mean, or `None` for an empty slice.
pub fn centroid<T: Float>(points: &[[T; 2]]) -> Option<[T; 2]> {
    let n = T::from(points.len())?;
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold([T::zero(); 2], |acc, p| [acc[0] + p[0], acc[1] + p[1]]);
    Some([sum[0] / n, sum[1] / n])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_sign() {
        let (a, b, c) = ([0.0, 0.0], [1.0, 0.0], [0.0, 1.0]);
        assert_eq!(orient2d(a, b, c), 1.0);
        assert_eq!(orient2d(a, c, b), -1.0);
        assert_eq!(orient2d(a, b, [2.0, 0.0]), 0.0);
        assert_eq!(triangle_area([a, b, c]), 0.5);
    }

    #[test]
    fn works_in_single_precision() {
        let d: f32 = distance([0.0, 0.0], [3.0, 4.0]);
        assert!((d - 5.0).abs() < 1e-6);
        assert_eq!(centroid::<f32>(&[[0.0, 0.0], [2.0, 4.0]]), Some([1.0, 2.0]));
        assert_eq!(centroid::<f64>(&[]), None);
    }
}
