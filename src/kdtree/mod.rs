//! A bucket k-d tree built by incremental insertion.

#![warn(missing_docs)]

mod batch;
mod index;
mod node;
mod query;
mod traversal;

pub use index::{KdTree, DEFAULT_BUCKET_CAPACITY};
pub use query::Neighbour;
pub use traversal::{Corner, Iter, Node};
