//! In-memory vector index and the content-addressed index cache

mod cache;
mod index;

pub use cache::{CacheStats, IndexCache};
pub use index::{cosine_similarity, VectorIndex};
