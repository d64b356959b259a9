//! A fixed-capacity max-heap keyed by distance, used to collect the `k` closest candidates of a
//! search.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::r#type::IndexableNum;

/// Keeps the `capacity` smallest distances offered to it, together with a value for each.
///
/// The largest kept distance sits at the root, so while the heap is full
/// [`max_distance`][Self::max_distance] is the distance any newcomer has to beat.
///
/// ```
/// use bucket_kdtree::BoundedHeap;
///
/// let mut heap = BoundedHeap::new(2);
/// heap.add_value(3.0, 'a');
/// heap.add_value(1.0, 'b');
/// assert_eq!(heap.max_distance(), 3.0);
///
/// heap.add_value(2.0, 'c');
/// assert_eq!(heap.into_sorted_vec(), vec![(1.0, 'b'), (2.0, 'c')]);
/// ```
#[derive(Debug, Clone)]
pub struct BoundedHeap<N: IndexableNum, V> {
    capacity: usize,
    heap: BinaryHeap<HeapEntry<N, V>>,
}

impl<N: IndexableNum, V> BoundedHeap<N, V> {
    /// Create an empty heap that holds at most `capacity` values.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity),
        }
    }

    /// Offer a value at the given distance.
    ///
    /// While the heap is not full every comparable distance is kept. Once full, the value
    /// replaces the current maximum only if `distance` is strictly smaller, so among equal
    /// distances the one offered first wins. NaN distances are never kept.
    ///
    /// Returns `true` if the value was kept.
    pub fn add_value(&mut self, distance: N, value: V) -> bool {
        if distance.is_nan() {
            return false;
        }

        if self.heap.len() < self.capacity {
            self.heap.push(HeapEntry { distance, value });
            return true;
        }

        match self.heap.peek_mut() {
            Some(mut top) if distance < top.distance => {
                // Sifts down when `top` is dropped
                *top = HeapEntry { distance, value };
                true
            }
            _ => false,
        }
    }

    /// The current worst kept distance.
    ///
    /// This is `+∞` until the heap is full: before `capacity` candidates have been seen nothing
    /// can be ruled out. A zero-capacity heap is always full and reports `-∞`.
    pub fn max_distance(&self) -> N {
        if !self.is_full() {
            return N::infinity();
        }
        self.heap
            .peek()
            .map(|entry| entry.distance)
            .unwrap_or_else(N::neg_infinity)
    }

    /// The maximum number of values this heap keeps.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of values currently kept.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns `true` if no values are kept.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Returns `true` if the heap holds `capacity` values.
    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.capacity
    }

    /// Consume the heap, returning `(distance, value)` pairs in heap order.
    pub fn into_vec(self) -> Vec<(N, V)> {
        self.heap
            .into_vec()
            .into_iter()
            .map(|entry| (entry.distance, entry.value))
            .collect()
    }

    /// Consume the heap, returning `(distance, value)` pairs in ascending order of distance.
    pub fn into_sorted_vec(self) -> Vec<(N, V)> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|entry| (entry.distance, entry.value))
            .collect()
    }
}

/// A value and its distance, ordered by distance only.
#[derive(Debug, Clone)]
struct HeapEntry<N: IndexableNum, V> {
    distance: N,
    value: V,
}

impl<N: IndexableNum, V> PartialEq for HeapEntry<N, V> {
    fn eq(&self, other: &Self) -> bool {
        self.distance == other.distance
    }
}

impl<N: IndexableNum, V> Eq for HeapEntry<N, V> {}

impl<N: IndexableNum, V> Ord for HeapEntry<N, V> {
    fn cmp(&self, other: &Self) -> Ordering {
        // NaN is rejected in `add_value`, so this is a total order
        self.distance
            .partial_cmp(&other.distance)
            .unwrap_or(Ordering::Equal)
    }
}

impl<N: IndexableNum, V> PartialOrd for HeapEntry<N, V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
