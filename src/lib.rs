#![doc = include_str!("../README.md")]

pub mod distance;
mod error;
mod heap;
pub mod kdtree;
mod r#type;

pub use error::{KdTreeError, Result};
pub use heap::BoundedHeap;
pub use kdtree::{KdTree, Neighbour};
pub use r#type::IndexableNum;

#[cfg(test)]
pub(crate) mod test;
