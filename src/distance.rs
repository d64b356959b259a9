//! Distance metrics for spatial queries.
//!
//! A metric supplies two measures: the distance between two points, and a lower bound on the
//! distance from a point to anything inside an axis-aligned box. The tree uses the second to skip
//! whole subtrees, so it must never overestimate.
//!
//! The metrics here return *squared* Euclidean distances. Squaring preserves ordering and avoids
//! a square root per candidate, which means radius searches take the squared radius.

use crate::error::{KdTreeError, Result};
use crate::r#type::IndexableNum;

/// A trait for calculating distances between points, and from points to regions.
///
/// All slices handed to a metric by the tree have the tree's dimensionality.
///
/// ```
/// use bucket_kdtree::distance::{DistanceMetric, SquaredEuclidean};
///
/// let metric = SquaredEuclidean;
/// assert_eq!(metric.distance(&[0.0f64, 0.0], &[3.0, 4.0]), 25.0);
/// assert_eq!(metric.distance_to_region(&[0.0f64, 0.0], &[1.0, -1.0], &[2.0, 1.0]), 1.0);
/// ```
pub trait DistanceMetric<N: IndexableNum> {
    /// Distance between two points. Must be symmetric and non-negative. Must be NaN whenever a
    /// coordinate on either side is NaN.
    fn distance(&self, a: &[N], b: &[N]) -> N;

    /// Minimum possible distance from `point` to any point inside the box `[min, max]`.
    fn distance_to_region(&self, point: &[N], min: &[N], max: &[N]) -> N;

    /// The number of dimensions this metric is defined for, or `None` if it works with any.
    ///
    /// Queries against a tree of a different dimensionality fail with
    /// [`InvalidDimension`][KdTreeError::InvalidDimension].
    fn dimensions(&self) -> Option<usize> {
        None
    }
}

impl<N: IndexableNum, M: DistanceMetric<N> + ?Sized> DistanceMetric<N> for &M {
    #[inline]
    fn distance(&self, a: &[N], b: &[N]) -> N {
        (**self).distance(a, b)
    }

    #[inline]
    fn distance_to_region(&self, point: &[N], min: &[N], max: &[N]) -> N {
        (**self).distance_to_region(point, min, max)
    }

    #[inline]
    fn dimensions(&self) -> Option<usize> {
        (**self).dimensions()
    }
}

/// Squared Euclidean distance in any number of dimensions.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquaredEuclidean;

impl<N: IndexableNum> DistanceMetric<N> for SquaredEuclidean {
    #[inline]
    fn distance(&self, a: &[N], b: &[N]) -> N {
        debug_assert_eq!(a.len(), b.len());
        a.iter().zip(b).fold(N::zero(), |acc, (&x, &y)| {
            let d = x - y;
            acc + d * d
        })
    }

    #[inline]
    fn distance_to_region(&self, point: &[N], min: &[N], max: &[N]) -> N {
        debug_assert_eq!(point.len(), min.len());
        debug_assert_eq!(point.len(), max.len());
        let mut sum = N::zero();
        for ((&k, &lo), &hi) in point.iter().zip(min).zip(max) {
            let d = axis_dist(k, lo, hi);
            sum = sum + d * d;
        }
        sum
    }
}

/// Squared Euclidean distance specialized for two dimensions.
///
/// Produces exactly the same values as [`SquaredEuclidean`], without the per-axis loop. Queries
/// with it on trees of any other dimensionality are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquaredEuclidean2D;

impl<N: IndexableNum> DistanceMetric<N> for SquaredEuclidean2D {
    #[inline]
    fn distance(&self, a: &[N], b: &[N]) -> N {
        debug_assert!(a.len() == 2 && b.len() == 2);
        let dx = a[0] - b[0];
        let dy = a[1] - b[1];
        dx * dx + dy * dy
    }

    #[inline]
    fn distance_to_region(&self, point: &[N], min: &[N], max: &[N]) -> N {
        debug_assert!(point.len() == 2 && min.len() == 2 && max.len() == 2);
        let dx = axis_dist(point[0], min[0], max[0]);
        let dy = axis_dist(point[1], min[1], max[1]);
        dx * dx + dy * dy
    }

    fn dimensions(&self) -> Option<usize> {
        Some(2)
    }
}

/// Squared Euclidean distance with a non-negative weight per axis.
///
/// Useful when axes carry different units, e.g. scaling a time axis against two spatial ones.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedSquaredEuclidean<N: IndexableNum> {
    weights: Vec<N>,
}

impl<N: IndexableNum> WeightedSquaredEuclidean<N> {
    /// Create a new weighted metric. The number of weights is the dimensionality of the trees it
    /// can query.
    pub fn new(weights: Vec<N>) -> Result<Self> {
        if let Some(axis) = weights
            .iter()
            .position(|w| !(w.is_finite() && *w >= N::zero()))
        {
            return Err(KdTreeError::InvalidWeight { axis });
        }
        Ok(Self { weights })
    }

    /// The per-axis weights.
    pub fn weights(&self) -> &[N] {
        &self.weights
    }
}

impl<N: IndexableNum> DistanceMetric<N> for WeightedSquaredEuclidean<N> {
    #[inline]
    fn distance(&self, a: &[N], b: &[N]) -> N {
        debug_assert_eq!(a.len(), self.weights.len());
        let mut sum = N::zero();
        for ((&x, &y), &w) in a.iter().zip(b).zip(&self.weights) {
            let d = x - y;
            sum = sum + w * d * d;
        }
        sum
    }

    #[inline]
    fn distance_to_region(&self, point: &[N], min: &[N], max: &[N]) -> N {
        debug_assert_eq!(point.len(), self.weights.len());
        let mut sum = N::zero();
        for (axis, &w) in self.weights.iter().enumerate() {
            let d = axis_dist(point[axis], min[axis], max[axis]);
            sum = sum + w * d * d;
        }
        sum
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.weights.len())
    }
}

/// 1D distance from a value to a range.
///
/// NaN in `k`, or in both ends of the range, yields NaN. An empty range (`min > max`) yields an
/// infinite or positive distance, never zero.
#[inline]
pub fn axis_dist<N: IndexableNum>(k: N, min: N, max: N) -> N {
    if k < min {
        min - k
    } else if k <= max {
        N::zero()
    } else {
        k - max
    }
}
