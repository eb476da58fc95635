//! Loveroom - semantic memory pool with verified desensitization
//!
//! This crate provides:
//! - An embedding pool over a Qdrant collection (upsert, delete, thresholded search)
//! - Embedding and chat completion clients for OpenAI-compatible endpoints
//! - A generate-then-verify desensitization loop
//! - Hot reload of every binding from a single configuration snapshot

pub mod connector;
pub mod core;
pub mod embeddings;
pub mod inference;
pub mod logging;
pub mod pool;
pub mod service;
pub mod vector;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used items
pub use connector::{Connector, RemoteConnector};
pub use crate::core::config::{ConfigSource, FileConfigSource, ServiceConfig, StaticConfigSource};
pub use crate::core::error::{Result, ServiceError};
pub use inference::{DesensitizeStatus, Desensitized, Desensitizer};
pub use pool::{EmbeddingPool, RetrievalSettings};
pub use service::{LoveroomService, UpdateOutcome};
pub use vector::{Distance, VectorError, VectorStoreConfig};
