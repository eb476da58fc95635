//! Error types for the inference module

use thiserror::Error;

/// Completion provider errors
#[derive(Debug, Error)]
pub enum InferenceError {
    /// The chat endpoint could not be reached or rejected the request
    #[error("Completion request failed: {reason}")]
    CompletionFailed { reason: String },

    /// The chat endpoint answered without a usable message
    #[error("Invalid completion response: {reason}")]
    InvalidResponse { reason: String },

    /// HTTP client could not be constructed
    #[error("Failed to build completion client: {reason}")]
    ClientBuild { reason: String },
}

impl From<reqwest::Error> for InferenceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            InferenceError::InvalidResponse {
                reason: err.to_string(),
            }
        } else if err.is_timeout() {
            InferenceError::CompletionFailed {
                reason: format!("Request timed out: {}", err),
            }
        } else if err.is_connect() {
            InferenceError::CompletionFailed {
                reason: format!("Connection failed: {}", err),
            }
        } else {
            InferenceError::CompletionFailed {
                reason: err.to_string(),
            }
        }
    }
}

/// Result type for inference operations
pub type InferenceResult<T> = Result<T, InferenceError>;
