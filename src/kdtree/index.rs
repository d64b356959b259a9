use std::ops::Range;

use geo_traits::CoordTrait;
use log::{debug, trace};
use tinyvec::TinyVec;

use crate::error::{KdTreeError, Result};
use crate::kdtree::node::{Leaf, NodeKind, Stem};
use crate::kdtree::traversal::{Iter, Node};
use crate::r#type::IndexableNum;

/// The default maximum number of points in a leaf before it is split.
pub const DEFAULT_BUCKET_CAPACITY: usize = 24;

/// Arena position of the root node.
pub(crate) const ROOT: usize = 0;

/// A bucket k-d tree over points of a fixed dimensionality, each carrying an item of type `T`.
///
/// The tree is built by inserting points one at a time. Points accumulate in leaf buckets; once a
/// bucket holds more than [`bucket_capacity`][Self::bucket_capacity] points it is split at the
/// midpoint of its widest axis. There is no rebalancing and no deletion.
///
/// Insertion takes `&mut self` and queries take `&self`, so a built tree can be shared between
/// threads and queried concurrently.
///
/// ```
/// use bucket_kdtree::distance::SquaredEuclidean;
/// use bucket_kdtree::KdTree;
///
/// let mut tree = KdTree::new(2).unwrap();
/// tree.add_point(&[0.0, 0.0], "a").unwrap();
/// tree.add_point(&[3.0, 4.0], "b").unwrap();
///
/// let nearest = tree.nearest_n(&[2.5, 3.0], 1, &SquaredEuclidean).unwrap();
/// assert_eq!(*nearest[0].item, "b");
/// assert_eq!(nearest[0].distance, 1.25);
/// ```
#[derive(Debug, Clone)]
pub struct KdTree<N: IndexableNum, T> {
    pub(crate) dimensions: usize,
    pub(crate) bucket_capacity: usize,

    /// Node arena. The root is always at [`ROOT`], even while the tree is empty.
    pub(crate) nodes: Vec<NodeKind<N>>,

    /// Bounding boxes of the nodes, `2 * dimensions` values per node: all minimums, then all
    /// maximums. Only non-NaN coordinates are included; an axis without any stays `[+∞, -∞]`.
    pub(crate) bounds: Vec<N>,

    /// Items in insertion order.
    pub(crate) items: Vec<T>,
}

impl<N: IndexableNum, T> KdTree<N, T> {
    /// Create an empty tree of the given dimensionality with the default bucket capacity.
    pub fn new(dimensions: usize) -> Result<Self> {
        Self::with_bucket_capacity(dimensions, DEFAULT_BUCKET_CAPACITY)
    }

    /// Create an empty tree of the given dimensionality and bucket capacity.
    pub fn with_bucket_capacity(dimensions: usize, bucket_capacity: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(KdTreeError::ZeroDimensions);
        }
        if bucket_capacity == 0 {
            return Err(KdTreeError::InvalidBucketCapacity(bucket_capacity));
        }

        let mut tree = Self {
            dimensions,
            bucket_capacity,
            nodes: vec![],
            bounds: vec![],
            items: vec![],
        };
        tree.push_leaf();
        Ok(tree)
    }

    /// The number of dimensions of every point in this tree.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// The number of points in a leaf above which it gets split.
    pub fn bucket_capacity(&self) -> usize {
        self.bucket_capacity
    }

    /// The number of points stored in this tree.
    pub fn size(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if no points have been added.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The item added with the given insertion index.
    pub fn item(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// The bounding box `(min, max)` of all non-NaN coordinates, or `None` if the tree is empty.
    pub fn bounds(&self) -> Option<(&[N], &[N])> {
        if self.is_empty() {
            return None;
        }
        Some((self.min_bounds(ROOT), self.max_bounds(ROOT)))
    }

    /// The number of leaves.
    pub fn num_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, NodeKind::Leaf(_)))
            .count()
    }

    /// The number of levels of the tree. A tree that is a single leaf has depth 1.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut stack: TinyVec<[(usize, usize); 33]> = TinyVec::new();
        stack.push((ROOT, 1));
        while let Some((node, level)) = stack.pop() {
            match &self.nodes[node] {
                NodeKind::Leaf(_) => depth = depth.max(level),
                NodeKind::Stem(stem) => {
                    stack.push((stem.left, level + 1));
                    stack.push((stem.right, level + 1));
                }
            }
        }
        depth
    }

    /// Access the root node for manual traversal, or `None` if the tree is empty.
    pub fn root(&self) -> Option<Node<'_, N, T>> {
        if self.is_empty() {
            return None;
        }
        Some(Node::new(self, ROOT))
    }

    /// Iterate over all points as `(insertion index, coordinates, item)`, in tree order.
    pub fn iter(&self) -> Iter<'_, N, T> {
        Iter::new(self, ROOT)
    }

    /// Add a point to the tree.
    ///
    /// `coords` must have exactly [`dimensions`][Self::dimensions] values. NaN coordinates are
    /// accepted, but such a point never compares closer than anything and is never returned by
    /// a query.
    ///
    /// Returns the insertion index of the point.
    pub fn add_point(&mut self, coords: &[N], item: T) -> Result<usize> {
        self.check_dimensions(coords.len())?;

        let index = self.items.len();
        self.items.push(item);

        let mut node = ROOT;
        while let NodeKind::Stem(stem) = &self.nodes[node] {
            let next = if coords[stem.axis] <= stem.split {
                stem.left
            } else {
                stem.right
            };
            // Parent bounds must cover everything below
            self.extend_bounds(node, coords);
            node = next;
        }

        self.append_to_leaf(node, coords, index);
        self.split_if_needed(node);

        Ok(index)
    }

    /// Add a point given as any [`CoordTrait`].
    pub fn add_coord(&mut self, coord: &impl CoordTrait<T = N>, item: T) -> Result<usize> {
        let coords = collect_coord(coord);
        self.add_point(&coords, item)
    }

    /// Add many points from an interleaved coordinate buffer, one item per point.
    ///
    /// Nothing is added unless `coords` holds exactly `items.len()` points.
    ///
    /// Returns the range of insertion indices assigned to the new points.
    pub fn add_interleaved(&mut self, coords: &[N], items: Vec<T>) -> Result<Range<usize>> {
        if coords.len() != items.len() * self.dimensions {
            return Err(KdTreeError::InvalidInterleavedLength {
                dimensions: self.dimensions,
                len: coords.len(),
            });
        }

        let start = self.items.len();
        for (point, item) in coords.chunks_exact(self.dimensions).zip(items) {
            self.add_point(point, item)?;
        }
        Ok(start..self.items.len())
    }

    #[inline]
    pub(crate) fn check_dimensions(&self, actual: usize) -> Result<()> {
        if actual != self.dimensions {
            return Err(KdTreeError::InvalidDimension {
                expected: self.dimensions,
                actual,
            });
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn min_bounds(&self, node: usize) -> &[N] {
        let start = node * 2 * self.dimensions;
        &self.bounds[start..start + self.dimensions]
    }

    #[inline]
    pub(crate) fn max_bounds(&self, node: usize) -> &[N] {
        let start = (node * 2 + 1) * self.dimensions;
        &self.bounds[start..start + self.dimensions]
    }

    fn push_leaf(&mut self) -> usize {
        let node = self.nodes.len();
        self.nodes.push(NodeKind::Leaf(Leaf::new()));
        self.bounds
            .extend(std::iter::repeat(N::infinity()).take(self.dimensions));
        self.bounds
            .extend(std::iter::repeat(N::neg_infinity()).take(self.dimensions));
        node
    }

    fn extend_bounds(&mut self, node: usize, coords: &[N]) {
        let dims = self.dimensions;
        let (min, max) = self.bounds[node * 2 * dims..(node + 1) * 2 * dims].split_at_mut(dims);
        for (axis, &value) in coords.iter().enumerate() {
            // NaN fails both comparisons and is left out
            if value < min[axis] {
                min[axis] = value;
            }
            if value > max[axis] {
                max[axis] = value;
            }
        }
    }

    /// Returns `true` if `coords` differs from the leaf's points on any axis, ignoring NaN.
    ///
    /// Only meaningful while the leaf is singular, when each non-empty axis bound is a single
    /// value.
    fn differs_from_leaf(&self, node: usize, coords: &[N]) -> bool {
        let min = self.min_bounds(node);
        let max = self.max_bounds(node);
        coords
            .iter()
            .zip(min.iter().zip(max))
            .any(|(&value, (&lo, &hi))| !value.is_nan() && lo <= hi && (value != lo || value != hi))
    }

    fn append_to_leaf(&mut self, node: usize, coords: &[N], id: usize) {
        let differs = self.differs_from_leaf(node, coords);
        self.extend_bounds(node, coords);
        if let NodeKind::Leaf(leaf) = &mut self.nodes[node] {
            if differs {
                leaf.singular = false;
            }
            leaf.coords.extend_from_slice(coords);
            leaf.ids.push(id);
        }
    }

    fn split_if_needed(&mut self, node: usize) {
        let NodeKind::Leaf(leaf) = &self.nodes[node] else {
            return;
        };
        if leaf.len() <= self.bucket_capacity {
            return;
        }
        if leaf.singular {
            if leaf.len() == self.bucket_capacity + 1 {
                debug!(
                    "leaf {} holds {} identical points, growing past bucket capacity {}",
                    node,
                    leaf.len(),
                    self.bucket_capacity
                );
            }
            return;
        }
        self.split(node);
    }

    /// Replace an overfull leaf by a stem over two new leaves.
    fn split(&mut self, node: usize) {
        let Some((axis, split)) = self.choose_split(node) else {
            return;
        };

        let NodeKind::Leaf(leaf) = &mut self.nodes[node] else {
            return;
        };
        let coords = std::mem::take(&mut leaf.coords);
        let ids = std::mem::take(&mut leaf.ids);
        trace!(
            "splitting leaf {} of {} points on axis {} at {:?}",
            node,
            ids.len(),
            axis,
            split
        );

        let left = self.push_leaf();
        let right = self.push_leaf();
        for (point, id) in coords.chunks_exact(self.dimensions).zip(ids) {
            let child = if point[axis] <= split { left } else { right };
            self.append_to_leaf(child, point, id);
        }

        self.nodes[node] = NodeKind::Stem(Stem {
            axis,
            split,
            left,
            right,
        });

        // Only possible when the leaf had grown past capacity while singular
        self.split_if_needed(left);
        self.split_if_needed(right);
    }

    /// The widest axis of the node's bounds and the split value along it, or `None` if no axis
    /// has any extent.
    fn choose_split(&self, node: usize) -> Option<(usize, N)> {
        let min = self.min_bounds(node);
        let max = self.max_bounds(node);

        let mut widest: Option<(usize, N)> = None;
        for axis in 0..self.dimensions {
            let range = max[axis] - min[axis];
            // Empty axes give -∞, NaN ranges fail the comparison
            if !(range > N::zero()) {
                continue;
            }
            // Strictly greater, so ties keep the lowest axis
            if widest.map_or(true, |(_, widest_range)| range > widest_range) {
                widest = Some((axis, range));
            }
        }

        widest.map(|(axis, _)| (axis, split_value(min[axis], max[axis])))
    }
}

/// The midpoint of `[lo, hi]`, adjusted so that `lo <= split < hi`.
///
/// Requires `lo < hi`. Points equal to `lo` then always go left and points equal to `hi` go right,
/// so a split never leaves a side empty.
pub(crate) fn split_value<N: IndexableNum>(lo: N, hi: N) -> N {
    let mut mid = (lo + hi).half();
    if !mid.is_finite() {
        // Overflow in the sum
        mid = lo.half() + hi.half();
    }
    // Rounding can land on `hi` when the two are adjacent floats
    if mid >= lo && mid < hi {
        mid
    } else {
        lo
    }
}

/// Gather the values of a coordinate, avoiding a heap allocation for up to four dimensions.
pub(crate) fn collect_coord<N: IndexableNum>(coord: &impl CoordTrait<T = N>) -> TinyVec<[N; 4]> {
    (0..coord.dim().size())
        .map(|n| coord.nth_or_panic(n))
        .collect()
}

impl<'a, N: IndexableNum, T> IntoIterator for &'a KdTree<N, T> {
    type Item = (usize, &'a [N], &'a T);
    type IntoIter = Iter<'a, N, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
