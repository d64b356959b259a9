//! Queries for many points at once.
//!
//! With the `rayon` feature the queries are spread over the rayon thread pool; without it they
//! run one after another. Results are in the order of the query points either way.

#[cfg(feature = "rayon")]
use rayon::iter::ParallelIterator;
#[cfg(feature = "rayon")]
use rayon::slice::ParallelSlice;

use crate::distance::DistanceMetric;
use crate::error::{KdTreeError, Result};
use crate::kdtree::query::Neighbour;
use crate::kdtree::KdTree;
use crate::r#type::IndexableNum;

impl<N: IndexableNum, T: Sync> KdTree<N, T> {
    /// Find the distance to the nearest point for each query point of an interleaved buffer.
    ///
    /// See [`nearest_neighbour`][Self::nearest_neighbour] for the meaning of each distance.
    pub fn nearest_neighbour_batch<M>(&self, points: &[N], metric: &M) -> Result<Vec<N>>
    where
        M: DistanceMetric<N> + Sync,
    {
        self.check_interleaved(points)?;

        #[cfg(feature = "rayon")]
        {
            points
                .par_chunks(self.dimensions)
                .map(|point| self.nearest_neighbour(point, metric))
                .collect()
        }

        #[cfg(not(feature = "rayon"))]
        {
            points
                .chunks(self.dimensions)
                .map(|point| self.nearest_neighbour(point, metric))
                .collect()
        }
    }

    /// Collect the `k` nearest points, in ascending order of distance, for each query point of an
    /// interleaved buffer.
    pub fn nearest_n_batch<M>(
        &self,
        points: &[N],
        k: usize,
        metric: &M,
    ) -> Result<Vec<Vec<Neighbour<'_, N, T>>>>
    where
        M: DistanceMetric<N> + Sync,
    {
        self.check_interleaved(points)?;

        #[cfg(feature = "rayon")]
        {
            points
                .par_chunks(self.dimensions)
                .map(|point| self.nearest_n(point, k, metric))
                .collect()
        }

        #[cfg(not(feature = "rayon"))]
        {
            points
                .chunks(self.dimensions)
                .map(|point| self.nearest_n(point, k, metric))
                .collect()
        }
    }

    fn check_interleaved(&self, points: &[N]) -> Result<()> {
        if points.len() % self.dimensions != 0 {
            return Err(KdTreeError::InvalidInterleavedLength {
                dimensions: self.dimensions,
                len: points.len(),
            });
        }
        Ok(())
    }
}
