//! Vector store configuration

use serde::{Deserialize, Serialize};

/// Distance metric for vector similarity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Distance {
    /// Cosine similarity (normalized dot product)
    #[default]
    Cosine,
    /// Euclidean distance (L2)
    Euclidean,
    /// Dot product (inner product)
    Dot,
}

impl From<Distance> for qdrant_client::qdrant::Distance {
    fn from(distance: Distance) -> Self {
        match distance {
            Distance::Cosine => qdrant_client::qdrant::Distance::Cosine,
            Distance::Euclidean => qdrant_client::qdrant::Distance::Euclid,
            Distance::Dot => qdrant_client::qdrant::Distance::Dot,
        }
    }
}

/// Which store implementation backs the pool
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Remote Qdrant server over gRPC
    #[default]
    Qdrant,
    /// In-process collections, lost on exit
    Memory,
}

/// Connection settings for one collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    /// Store implementation
    pub backend: StoreBackend,

    /// Qdrant host
    pub host: String,

    /// Qdrant gRPC port
    pub port: u16,

    /// Collection the store reads and writes
    pub collection_name: String,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            host: "localhost".to_string(),
            port: 6334,
            collection_name: "loveroom".to_string(),
            timeout_ms: 60_000,
        }
    }
}

impl VectorStoreConfig {
    /// Create a new config with custom collection name
    pub fn with_collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = name.into();
        self
    }

    /// Create a new config with custom backend
    pub fn with_backend(mut self, backend: StoreBackend) -> Self {
        self.backend = backend;
        self
    }

    /// gRPC endpoint for the Qdrant client
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}
