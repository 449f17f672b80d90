//! Indexing and visualization of the semantic drone dataset.

mod common;
mod index;
mod record;
pub mod visualize;

pub use index::*;
pub use record::*;
