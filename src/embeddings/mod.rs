//! Embedding provider
//!
//! Turns record text into a fixed-dimension vector. The pool only sees the
//! [`EmbeddingProvider`] capability, so tests can substitute deterministic
//! vectors for the remote model.

mod ark;
mod config;
mod error;


pub use ark::ArkEmbedder;
pub use config::EmbeddingConfig;
pub use error::{EmbeddingError, EmbeddingResult};

use async_trait::async_trait;

/// Text to vector capability
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>>;
}
