//! Vector store module
//!
//! Persistence for record embeddings behind [`VectorStoreAdapter`], with a
//! Qdrant implementation for production, an in-memory one for local runs,
//! and the post-query [`RelevanceFilter`].

mod adapter;
mod config;
mod error;
mod filter;
mod memory;
mod qdrant;

#[cfg(test)]
mod tests;

pub use adapter::{point_id, StoredHit, VectorResult, VectorStoreAdapter};
pub use config::{Distance, StoreBackend, VectorStoreConfig};
pub use error::VectorError;
pub use filter::RelevanceFilter;
pub use memory::MemoryStore;
pub use qdrant::QdrantStore;

#[cfg(test)]
pub(crate) use memory::cosine_similarity;

/// Payload field names for vector points
pub mod payload_fields {
    /// Caller-assigned record id
    pub const RECORD_ID: &str = "record_id";
    /// Record text
    pub const TEXT: &str = "text";
}
