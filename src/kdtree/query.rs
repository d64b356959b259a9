//! Nearest-neighbor, k-nearest-neighbor and range search.
//!
//! Each search is a depth-first descent from the root, driven by an explicit stack so that deep
//! unbalanced trees cannot exhaust the call stack. At a stem, the child whose bounding box is
//! nearer to the query point is visited first, and a child is skipped entirely when the metric's
//! region distance shows it cannot hold anything better than what has already been accepted.
//!
//! Acceptance and pruning are plain `<`/`<=` comparisons, which NaN never satisfies: points with a
//! NaN coordinate, and queries with one, drop out without special handling.

use geo_traits::CoordTrait;
use tinyvec::TinyVec;

use crate::distance::DistanceMetric;
use crate::error::Result;
use crate::heap::BoundedHeap;
use crate::kdtree::index::{collect_coord, ROOT};
use crate::kdtree::node::{Leaf, NodeKind};
use crate::kdtree::KdTree;
use crate::r#type::IndexableNum;

/// A point found by a search.
#[derive(Debug)]
pub struct Neighbour<'a, N: IndexableNum, T> {
    /// Insertion index of the point
    pub index: usize,

    /// Distance from the query point, in the units of the metric used
    pub distance: N,

    /// Coordinates of the point
    pub coords: &'a [N],

    /// The item stored with the point
    pub item: &'a T,
}

impl<N: IndexableNum, T> Clone for Neighbour<'_, N, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N: IndexableNum, T> Copy for Neighbour<'_, N, T> {}

/// The single best candidate of a nearest-neighbor search.
struct Best<N> {
    distance: N,
    found: bool,
}

impl<N: IndexableNum> Best<N> {
    /// Whether a region at this distance may hold a point at least as close as the best.
    #[inline]
    fn may_contain_closer(&self, region: N) -> bool {
        if self.found {
            region < self.distance
        } else {
            !region.is_nan()
        }
    }
}

impl<N: IndexableNum, T> KdTree<N, T> {
    /// Find the distance to the nearest point.
    ///
    /// Returns `0` on an empty tree: check [`size`][Self::size] to tell that apart from an exact
    /// hit. Returns NaN when no point has a comparable distance, e.g. for a query point with a NaN
    /// coordinate.
    pub fn nearest_neighbour<M>(&self, point: &[N], metric: &M) -> Result<N>
    where
        M: DistanceMetric<N>,
    {
        self.nearest_neighbour_with(point, metric, |_| {})
    }

    /// Find the distance to the nearest point, reporting candidates along the way.
    ///
    /// `consumer` is called for every visited point whose distance is at most the best seen so
    /// far, so the last call carries a nearest point. It is never called on an empty tree. The
    /// returned distance does not depend on the consumer.
    pub fn nearest_neighbour_with<'a, M, F>(
        &'a self,
        point: &[N],
        metric: &M,
        mut consumer: F,
    ) -> Result<N>
    where
        M: DistanceMetric<N>,
        F: FnMut(Neighbour<'a, N, T>),
    {
        self.check_query(point, metric)?;
        if self.is_empty() {
            return Ok(N::zero());
        }

        let mut best = Best {
            distance: N::infinity(),
            found: false,
        };

        // Nodes to visit with their region distances. The nearer child is pushed last so it is
        // visited first, and every region is checked against the best when it is popped.
        let mut stack: TinyVec<[(usize, N); 33]> = TinyVec::new();
        stack.push((ROOT, N::zero()));

        while let Some((node, region)) = stack.pop() {
            if !best.may_contain_closer(region) {
                continue;
            }
            match &self.nodes[node] {
                NodeKind::Leaf(leaf) => {
                    for slot in 0..leaf.len() {
                        let distance = metric.distance(point, leaf.point(slot, self.dimensions));
                        if distance <= best.distance {
                            best.distance = distance;
                            best.found = true;
                            consumer(self.neighbour(leaf, slot, distance));
                        }
                    }
                }
                NodeKind::Stem(stem) => {
                    let [near, far] = self.order_children(stem.left, stem.right, point, metric);
                    stack.push(far);
                    stack.push(near);
                }
            }
        }

        if best.found {
            Ok(best.distance)
        } else {
            Ok(N::nan())
        }
    }

    /// Find the `k` nearest points.
    ///
    /// Results are passed to `consumer` once the search is complete: in ascending order of
    /// distance if `sorted`, otherwise in an unspecified order. Both orders hold the same
    /// distances. Among points at equal distance, which ones make the cut is unspecified.
    ///
    /// Returns `false` without calling `consumer` when `k` is 0, the tree is empty, or no point
    /// has a comparable distance.
    pub fn nearest_neighbours<'a, M, F>(
        &'a self,
        point: &[N],
        k: usize,
        sorted: bool,
        metric: &M,
        mut consumer: F,
    ) -> Result<bool>
    where
        M: DistanceMetric<N>,
        F: FnMut(Neighbour<'a, N, T>),
    {
        self.check_query(point, metric)?;
        if k == 0 || self.is_empty() {
            return Ok(false);
        }

        let mut heap = BoundedHeap::new(k);
        let mut stack: TinyVec<[(usize, N); 33]> = TinyVec::new();
        stack.push((ROOT, N::zero()));

        while let Some((node, region)) = stack.pop() {
            if !heap_may_contain_closer(&heap, region) {
                continue;
            }
            match &self.nodes[node] {
                NodeKind::Leaf(leaf) => {
                    for slot in 0..leaf.len() {
                        let distance = metric.distance(point, leaf.point(slot, self.dimensions));
                        heap.add_value(distance, (leaf, slot));
                    }
                }
                NodeKind::Stem(stem) => {
                    let [near, far] = self.order_children(stem.left, stem.right, point, metric);
                    stack.push(far);
                    stack.push(near);
                }
            }
        }

        let results = if sorted {
            heap.into_sorted_vec()
        } else {
            heap.into_vec()
        };
        let found = !results.is_empty();
        for (distance, (leaf, slot)) in results {
            consumer(self.neighbour(leaf, slot, distance));
        }
        Ok(found)
    }

    /// Find all points within `range` of the query point, boundary included.
    ///
    /// `range` is compared directly against the metric's distances: with
    /// [`SquaredEuclidean`][crate::distance::SquaredEuclidean], pass the squared radius.
    ///
    /// Points are passed to `consumer` as they are found, in tree order. Returns `true` if at
    /// least one point was found.
    pub fn find_neighbours<'a, M, F>(
        &'a self,
        point: &[N],
        range: N,
        metric: &M,
        mut consumer: F,
    ) -> Result<bool>
    where
        M: DistanceMetric<N>,
        F: FnMut(Neighbour<'a, N, T>),
    {
        self.check_query(point, metric)?;
        if self.is_empty() {
            return Ok(false);
        }

        let mut found = false;
        let mut stack: TinyVec<[usize; 33]> = TinyVec::new();
        stack.push(ROOT);

        while let Some(node) = stack.pop() {
            match &self.nodes[node] {
                NodeKind::Leaf(leaf) => {
                    for slot in 0..leaf.len() {
                        let distance = metric.distance(point, leaf.point(slot, self.dimensions));
                        if distance <= range {
                            found = true;
                            consumer(self.neighbour(leaf, slot, distance));
                        }
                    }
                }
                NodeKind::Stem(stem) => {
                    // Pushed in reverse so the left side is visited first
                    for child in [stem.right, stem.left] {
                        if self.region_distance(child, point, metric) <= range {
                            stack.push(child);
                        }
                    }
                }
            }
        }

        Ok(found)
    }

    /// Collect the `k` nearest points in ascending order of distance.
    ///
    /// ```
    /// use bucket_kdtree::distance::SquaredEuclidean;
    /// use bucket_kdtree::KdTree;
    ///
    /// let mut tree = KdTree::new(2).unwrap();
    /// for (i, [x, y]) in [[0., 0.], [0., 1.], [1., 0.], [1., 1.]].into_iter().enumerate() {
    ///     tree.add_point(&[x, y], i).unwrap();
    /// }
    ///
    /// let results = tree.nearest_n(&[0., 0.], 2, &SquaredEuclidean).unwrap();
    /// let distances: Vec<f64> = results.iter().map(|n| n.distance).collect();
    /// assert_eq!(distances, vec![0., 1.]);
    /// ```
    pub fn nearest_n<M>(
        &self,
        point: &[N],
        k: usize,
        metric: &M,
    ) -> Result<Vec<Neighbour<'_, N, T>>>
    where
        M: DistanceMetric<N>,
    {
        let mut results = Vec::with_capacity(k.min(self.size()));
        self.nearest_neighbours(point, k, true, metric, |n| results.push(n))?;
        Ok(results)
    }

    /// Collect all points within `range` of the query point, in tree order.
    ///
    /// See [`find_neighbours`][Self::find_neighbours] for the meaning of `range`.
    pub fn within<M>(&self, point: &[N], range: N, metric: &M) -> Result<Vec<Neighbour<'_, N, T>>>
    where
        M: DistanceMetric<N>,
    {
        let mut results = vec![];
        self.find_neighbours(point, range, metric, |n| results.push(n))?;
        Ok(results)
    }

    /// Find the distance to the nearest point from a [`CoordTrait`] query.
    pub fn nearest_neighbour_coord<M>(
        &self,
        coord: &impl CoordTrait<T = N>,
        metric: &M,
    ) -> Result<N>
    where
        M: DistanceMetric<N>,
    {
        self.nearest_neighbour(&collect_coord(coord), metric)
    }

    /// Collect all points within `range` of a [`CoordTrait`] query.
    pub fn within_coord<M>(
        &self,
        coord: &impl CoordTrait<T = N>,
        range: N,
        metric: &M,
    ) -> Result<Vec<Neighbour<'_, N, T>>>
    where
        M: DistanceMetric<N>,
    {
        self.within(&collect_coord(coord), range, metric)
    }

    /// Rejects query points, and metrics bound to a dimensionality, that do not match the tree.
    fn check_query<M>(&self, point: &[N], metric: &M) -> Result<()>
    where
        M: DistanceMetric<N>,
    {
        self.check_dimensions(point.len())?;
        if let Some(dimensions) = metric.dimensions() {
            self.check_dimensions(dimensions)?;
        }
        Ok(())
    }

    #[inline]
    fn region_distance<M>(&self, node: usize, point: &[N], metric: &M) -> N
    where
        M: DistanceMetric<N>,
    {
        metric.distance_to_region(point, self.min_bounds(node), self.max_bounds(node))
    }

    /// The two children with their region distances, nearer one first.
    #[inline]
    fn order_children<M>(
        &self,
        left: usize,
        right: usize,
        point: &[N],
        metric: &M,
    ) -> [(usize, N); 2]
    where
        M: DistanceMetric<N>,
    {
        let left_dist = self.region_distance(left, point, metric);
        let right_dist = self.region_distance(right, point, metric);
        if right_dist < left_dist {
            [(right, right_dist), (left, left_dist)]
        } else {
            [(left, left_dist), (right, right_dist)]
        }
    }

    #[inline]
    fn neighbour<'a>(&'a self, leaf: &'a Leaf<N>, slot: usize, distance: N) -> Neighbour<'a, N, T> {
        let index = leaf.ids[slot];
        Neighbour {
            index,
            distance,
            coords: leaf.point(slot, self.dimensions),
            item: &self.items[index],
        }
    }
}

/// Whether a region at this distance may hold a point that would enter the heap.
///
/// An under-full heap takes anything comparable, so only NaN regions are skipped.
#[inline]
fn heap_may_contain_closer<N: IndexableNum, V>(heap: &BoundedHeap<N, V>, region: N) -> bool {
    if heap.is_full() {
        region < heap.max_distance()
    } else {
        !region.is_nan()
    }
}
