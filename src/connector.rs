//! Builds provider and store bindings from configuration
//!
//! The pool and the desensitizer never construct clients themselves; they ask
//! a [`Connector`] on every reload. Tests plug in deterministic doubles here.

use std::sync::Arc;

use crate::embeddings::{ArkEmbedder, EmbeddingConfig, EmbeddingProvider, EmbeddingResult};
use crate::inference::{ChatClient, CompletionConfig, CompletionProvider, InferenceResult};
use crate::vector::{MemoryStore, QdrantStore, StoreBackend, VectorStoreAdapter, VectorStoreConfig};

/// Factory for the external collaborators
pub trait Connector: Send + Sync {
    /// Store bound to `config.collection_name`
    fn store(&self, config: &VectorStoreConfig) -> Arc<dyn VectorStoreAdapter>;

    fn embedder(&self, config: &EmbeddingConfig) -> EmbeddingResult<Arc<dyn EmbeddingProvider>>;

    fn completion(&self, config: &CompletionConfig)
        -> InferenceResult<Arc<dyn CompletionProvider>>;
}

/// Production connector: Qdrant or in-process store, HTTP providers
#[derive(Debug, Clone)]
pub struct RemoteConnector {
    memory: MemoryStore,
}

impl RemoteConnector {
    pub fn new() -> Self {
        Self {
            memory: MemoryStore::new(String::new()),
        }
    }
}

impl Default for RemoteConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for RemoteConnector {
    fn store(&self, config: &VectorStoreConfig) -> Arc<dyn VectorStoreAdapter> {
        match config.backend {
            StoreBackend::Qdrant => Arc::new(QdrantStore::new(config.clone())),
            // Every handle shares one set of collections so reloads keep data
            StoreBackend::Memory => Arc::new(self.memory.for_collection(&config.collection_name)),
        }
    }

    fn embedder(&self, config: &EmbeddingConfig) -> EmbeddingResult<Arc<dyn EmbeddingProvider>> {
        Ok(Arc::new(ArkEmbedder::new(config.clone())?))
    }

    fn completion(
        &self,
        config: &CompletionConfig,
    ) -> InferenceResult<Arc<dyn CompletionProvider>> {
        Ok(Arc::new(ChatClient::new(config.clone())?))
    }
}
