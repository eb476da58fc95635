//! Vector store error types

use thiserror::Error;

/// Vector store specific errors
#[derive(Error, Debug)]
pub enum VectorError {
    /// The backing store could not be reached
    #[error("Vector store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    #[error("Failed to create collection '{name}': {reason}")]
    CollectionCreateFailed { name: String, reason: String },

    #[error("Failed to write vectors: {reason}")]
    WriteFailed { reason: String },

    #[error("Failed to query vectors: {reason}")]
    QueryFailed { reason: String },

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: u64, actual: u64 },
}

impl VectorError {
    /// Transport-level failure, as opposed to a rejected operation.
    ///
    /// The adapter never retries; callers use this to decide whether a retry
    /// is worth attempting.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, VectorError::StoreUnavailable { .. })
    }

    /// Wrap a failure raised while recreating `name`.
    ///
    /// Unavailability is passed through untouched so callers can still tell a
    /// dead store from a rejected request.
    pub fn into_collection_create(self, name: &str) -> Self {
        match self {
            VectorError::StoreUnavailable { .. } | VectorError::CollectionCreateFailed { .. } => {
                self
            }
            other => VectorError::CollectionCreateFailed {
                name: name.to_string(),
                reason: other.to_string(),
            },
        }
    }
}
