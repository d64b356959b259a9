use std::fmt::Debug;
use thiserror::Error;

/// Enum with all errors in this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KdTreeError {
    #[error("Expected a coordinate of {expected} dimensions, got {actual}.")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("A tree must have at least one dimension.")]
    ZeroDimensions,

    #[error("Bucket capacity must be at least 1, got {0}.")]
    InvalidBucketCapacity(usize),

    #[error("Interleaved buffer of length {len} does not match the expected number of {dimensions}-dimensional points.")]
    InvalidInterleavedLength { dimensions: usize, len: usize },

    #[error("Weight for axis {axis} must be finite and non-negative.")]
    InvalidWeight { axis: usize },
}

pub type Result<T> = std::result::Result<T, KdTreeError>;
