//! Error types for the embedding provider

use thiserror::Error;

/// Result type for embedding operations
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Errors that can occur during embedding operations
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// The provider could not be reached or answered with an error status
    #[error("Embedding request failed: {reason}")]
    RequestFailed { reason: String },

    /// The provider answered but the body had no usable vector
    #[error("Invalid embedding response: {reason}")]
    InvalidResponse { reason: String },

    /// HTTP client could not be constructed
    #[error("Failed to build embedding client: {reason}")]
    ClientBuild { reason: String },
}

impl From<reqwest::Error> for EmbeddingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            EmbeddingError::InvalidResponse {
                reason: err.to_string(),
            }
        } else {
            EmbeddingError::RequestFailed {
                reason: err.to_string(),
            }
        }
    }
}
