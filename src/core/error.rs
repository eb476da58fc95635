//! Error types for loveroom
//!
//! Each layer reports its own error enum; [`ServiceError`] gathers them for
//! the pool and service entry points.

use thiserror::Error;

use super::config::ConfigError;
use crate::embeddings::EmbeddingError;
use crate::inference::InferenceError;
use crate::vector::VectorError;

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Main error type
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Vector store error: {0}")]
    Vector(#[from] VectorError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Completion error: {0}")]
    Completion(#[from] InferenceError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ServiceError {
    /// The vector store could not be reached
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, ServiceError::Vector(e) if e.is_unavailable())
    }
}
