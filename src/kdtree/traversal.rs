//! Utilities to traverse the KdTree structure.

use geo_traits::{
    CoordTrait, Dimensions, GeometryTrait, GeometryType, RectTrait, UnimplementedGeometryCollection,
    UnimplementedLine, UnimplementedLineString, UnimplementedMultiLineString,
    UnimplementedMultiPoint, UnimplementedMultiPolygon, UnimplementedPoint, UnimplementedPolygon,
    UnimplementedTriangle,
};
use tinyvec::TinyVec;

use crate::kdtree::node::{Leaf, NodeKind};
use crate::kdtree::KdTree;
use crate::r#type::IndexableNum;

/// A node in the KdTree.
#[derive(Debug)]
pub struct Node<'a, N: IndexableNum, T> {
    /// The tree that this node is a reference onto
    tree: &'a KdTree<N, T>,

    /// Position in the tree's node arena
    index: usize,
}

impl<'a, N: IndexableNum, T> Node<'a, N, T> {
    pub(crate) fn new(tree: &'a KdTree<N, T>, index: usize) -> Self {
        Self { tree, index }
    }

    /// Returns `true` if this is a leaf node holding points.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self.tree.nodes[self.index], NodeKind::Leaf(_))
    }

    /// Returns `true` if this is an intermediate node with two children.
    #[inline]
    pub fn is_stem(&self) -> bool {
        !self.is_leaf()
    }

    /// The axis this node's children are split over, for stems.
    pub fn split_dimension(&self) -> Option<usize> {
        match &self.tree.nodes[self.index] {
            NodeKind::Stem(stem) => Some(stem.axis),
            NodeKind::Leaf(_) => None,
        }
    }

    /// The split value along [`split_dimension`][Self::split_dimension], for stems. The left
    /// child holds the points at or below it.
    pub fn split_value(&self) -> Option<N> {
        match &self.tree.nodes[self.index] {
            NodeKind::Stem(stem) => Some(stem.split),
            NodeKind::Leaf(_) => None,
        }
    }

    /// The child holding points with a coordinate at or below the split value.
    pub fn left_child(&self) -> Option<Node<'a, N, T>> {
        match &self.tree.nodes[self.index] {
            NodeKind::Stem(stem) => Some(Node::new(self.tree, stem.left)),
            NodeKind::Leaf(_) => None,
        }
    }

    /// The child holding points with a coordinate above the split value, or NaN.
    pub fn right_child(&self) -> Option<Node<'a, N, T>> {
        match &self.tree.nodes[self.index] {
            NodeKind::Stem(stem) => Some(Node::new(self.tree, stem.right)),
            NodeKind::Leaf(_) => None,
        }
    }

    /// Per-axis minimum of the non-NaN coordinates below this node.
    pub fn min_bounds(&self) -> &'a [N] {
        self.tree.min_bounds(self.index)
    }

    /// Per-axis maximum of the non-NaN coordinates below this node.
    pub fn max_bounds(&self) -> &'a [N] {
        self.tree.max_bounds(self.index)
    }

    /// Returns `true` for a leaf whose points all share the same coordinates, ignoring NaN.
    ///
    /// Such leaves are never split and may hold more than the bucket capacity.
    pub fn is_singular(&self) -> bool {
        match &self.tree.nodes[self.index] {
            NodeKind::Leaf(leaf) => leaf.singular,
            NodeKind::Stem(_) => false,
        }
    }

    /// The number of points stored below this node.
    pub fn num_points(&self) -> usize {
        let mut count = 0;
        let mut stack: TinyVec<[usize; 33]> = TinyVec::new();
        stack.push(self.index);
        while let Some(node) = stack.pop() {
            match &self.tree.nodes[node] {
                NodeKind::Leaf(leaf) => count += leaf.len(),
                NodeKind::Stem(stem) => {
                    stack.push(stem.left);
                    stack.push(stem.right);
                }
            }
        }
        count
    }

    /// Iterate over the points stored below this node.
    pub fn points(&self) -> Iter<'a, N, T> {
        Iter::new(self.tree, self.index)
    }
}

impl<N: IndexableNum, T> Clone for Node<'_, N, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N: IndexableNum, T> Copy for Node<'_, N, T> {}

impl<'a, N: IndexableNum, T> GeometryTrait for Node<'a, N, T> {
    type T = N;
    type PointType<'b>
        = UnimplementedPoint<N>
    where
        Self: 'b;
    type LineStringType<'b>
        = UnimplementedLineString<N>
    where
        Self: 'b;
    type PolygonType<'b>
        = UnimplementedPolygon<N>
    where
        Self: 'b;
    type MultiPointType<'b>
        = UnimplementedMultiPoint<N>
    where
        Self: 'b;
    type MultiLineStringType<'b>
        = UnimplementedMultiLineString<N>
    where
        Self: 'b;
    type MultiPolygonType<'b>
        = UnimplementedMultiPolygon<N>
    where
        Self: 'b;
    type GeometryCollectionType<'b>
        = UnimplementedGeometryCollection<N>
    where
        Self: 'b;
    type RectType<'b>
        = Node<'a, N, T>
    where
        Self: 'b;
    type TriangleType<'b>
        = UnimplementedTriangle<N>
    where
        Self: 'b;
    type LineType<'b>
        = UnimplementedLine<N>
    where
        Self: 'b;

    fn dim(&self) -> Dimensions {
        dimensions_of(self.tree.dimensions)
    }

    fn as_type(
        &self,
    ) -> GeometryType<
        '_,
        Self::PointType<'_>,
        Self::LineStringType<'_>,
        Self::PolygonType<'_>,
        Self::MultiPointType<'_>,
        Self::MultiLineStringType<'_>,
        Self::MultiPolygonType<'_>,
        Self::GeometryCollectionType<'_>,
        Self::RectType<'_>,
        Self::TriangleType<'_>,
        Self::LineType<'_>,
    > {
        GeometryType::Rect(self)
    }
}

impl<N: IndexableNum, T> RectTrait for Node<'_, N, T> {
    type CoordType<'b>
        = Corner<'b, N>
    where
        Self: 'b;

    fn min(&self) -> Self::CoordType<'_> {
        Corner {
            coords: self.min_bounds(),
        }
    }

    fn max(&self) -> Self::CoordType<'_> {
        Corner {
            coords: self.max_bounds(),
        }
    }
}

/// A corner of a node's bounding box.
///
/// Used in the implementation of RectTrait for Node.
#[derive(Debug, Clone, Copy)]
pub struct Corner<'a, N: IndexableNum> {
    coords: &'a [N],
}

impl<N: IndexableNum> CoordTrait for Corner<'_, N> {
    type T = N;

    fn dim(&self) -> Dimensions {
        dimensions_of(self.coords.len())
    }

    fn x(&self) -> Self::T {
        self.nth_or_panic(0)
    }

    fn y(&self) -> Self::T {
        self.nth_or_panic(1)
    }

    fn nth_or_panic(&self, n: usize) -> Self::T {
        match self.coords.get(n) {
            Some(value) => *value,
            None => panic!("Invalid index of coord"),
        }
    }
}

fn dimensions_of(size: usize) -> Dimensions {
    match size {
        2 => Dimensions::Xy,
        3 => Dimensions::Xyz,
        n => Dimensions::Unknown(n),
    }
}

/// Iterator over stored points as `(insertion index, coordinates, item)`.
///
/// Created by [`KdTree::iter`] and [`Node::points`].
pub struct Iter<'a, N: IndexableNum, T> {
    tree: &'a KdTree<N, T>,

    // Use TinyVec to avoid heap allocations
    stack: TinyVec<[usize; 32]>,

    leaf: Option<&'a Leaf<N>>,
    slot: usize,
}

impl<'a, N: IndexableNum, T> Iter<'a, N, T> {
    pub(crate) fn new(tree: &'a KdTree<N, T>, start: usize) -> Self {
        let mut stack = TinyVec::new();
        stack.push(start);
        Self {
            tree,
            stack,
            leaf: None,
            slot: 0,
        }
    }
}

impl<'a, N: IndexableNum, T> Iterator for Iter<'a, N, T> {
    type Item = (usize, &'a [N], &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(leaf) = self.leaf {
                if self.slot < leaf.len() {
                    let slot = self.slot;
                    self.slot += 1;
                    let id = leaf.ids[slot];
                    return Some((
                        id,
                        leaf.point(slot, self.tree.dimensions),
                        &self.tree.items[id],
                    ));
                }
                self.leaf = None;
            }

            let node = self.stack.pop()?;
            match &self.tree.nodes[node] {
                NodeKind::Leaf(leaf) => {
                    self.leaf = Some(leaf);
                    self.slot = 0;
                }
                NodeKind::Stem(stem) => {
                    // Note: these are pushed in backwards order to what gets popped
                    self.stack.push(stem.right);
                    self.stack.push(stem.left);
                }
            }
        }
    }
}
