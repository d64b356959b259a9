//! Arena nodes of the tree.

/// A node of the tree. Children are addressed by their position in the tree's node arena.
#[derive(Debug, Clone)]
pub(crate) enum NodeKind<N> {
    Leaf(Leaf<N>),
    Stem(Stem<N>),
}

/// A bucket of points.
#[derive(Debug, Clone)]
pub(crate) struct Leaf<N> {
    /// Interleaved coordinates, `dimensions` values per point.
    pub(crate) coords: Vec<N>,

    /// Insertion index of each point, parallel to `coords`.
    pub(crate) ids: Vec<usize>,

    /// `true` while every stored point has the same coordinates, ignoring NaN.
    pub(crate) singular: bool,
}

impl<N> Leaf<N> {
    pub(crate) fn new() -> Self {
        Self {
            coords: vec![],
            ids: vec![],
            singular: true,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }

    /// Coordinates of the point in the given slot.
    #[inline]
    pub(crate) fn point(&self, slot: usize, dimensions: usize) -> &[N] {
        &self.coords[slot * dimensions..(slot + 1) * dimensions]
    }
}

/// An internal node. Points with `coord[axis] <= split` live under `left`, all others
/// (including NaN) under `right`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Stem<N> {
    pub(crate) axis: usize,
    pub(crate) split: N,
    pub(crate) left: usize,
    pub(crate) right: usize,
}
