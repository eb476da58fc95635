//! Embedding Pool
//!
//! Upsert, delete and thresholded semantic search over one collection.
//!
//! Everything a request needs (store handle, embedder, relevance filter,
//! top-k) lives in one immutable [`PoolBindings`] snapshot. `reload` builds a
//! complete replacement and publishes it with a single atomic swap, so a
//! request sees either the old bindings or the new ones, never a mix.


use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{debug, info};

use crate::connector::Connector;
use crate::core::{ConfigSource, Result, ServiceConfig};
use crate::embeddings::EmbeddingProvider;
use crate::vector::{Distance, RelevanceFilter, VectorError, VectorStoreAdapter};

/// Separator between surviving hit texts in a search result
pub const RESULT_SEPARATOR: &str = "\n\n";

/// Retrieval settings of one bindings snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalSettings {
    pub collection_name: String,
    pub similarity_top_k: usize,
    pub similarity_cutoff: f32,
}

/// Immutable working set of the pool.
///
/// A request loads one snapshot and runs to completion against it, even if a
/// reload publishes a replacement meanwhile.
pub struct PoolBindings {
    settings: RetrievalSettings,
    store: Arc<dyn VectorStoreAdapter>,
    embedder: Arc<dyn EmbeddingProvider>,
    filter: RelevanceFilter,
}

impl PoolBindings {
    pub(crate) fn build(config: &ServiceConfig, connector: &dyn Connector) -> Result<Self> {
        let embedder = connector.embedder(&config.embedding_config())?;
        let store = connector.store(&config.store_config());

        Ok(Self {
            settings: RetrievalSettings {
                collection_name: config.collection_name.clone(),
                similarity_top_k: config.similarity_top_k,
                similarity_cutoff: config.similarity_cutoff,
            },
            store,
            embedder,
            filter: RelevanceFilter::new(config.similarity_cutoff),
        })
    }

    pub fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    pub(crate) async fn update(&self, text: &str, id: &str) -> Result<()> {
        info!(id, len = text.len(), collection = %self.settings.collection_name, "update");
        let vector = self.embedder.embed(text).await?;
        self.store
            .upsert(id, vector, text)
            .await
            .map_err(into_write_error)?;
        Ok(())
    }

    pub(crate) async fn delete(&self, id: &str) -> Result<()> {
        info!(id, collection = %self.settings.collection_name, "delete");
        self.store.delete(id).await.map_err(into_write_error)?;
        Ok(())
    }

    pub(crate) async fn search(&self, query: &str) -> Result<String> {
        info!(len = query.len(), collection = %self.settings.collection_name, "search");
        let vector = self.embedder.embed(query).await?;
        let hits = self
            .store
            .query(&vector, self.settings.similarity_top_k)
            .await
            .map_err(into_query_error)?;
        debug!(?hits, "Retrieved candidates");

        let relevant = self.filter.apply(hits);
        debug!(
            kept = relevant.len(),
            cutoff = self.filter.cutoff(),
            "Applied relevance filter"
        );

        Ok(relevant
            .into_iter()
            .map(|hit| hit.text)
            .collect::<Vec<_>>()
            .join(RESULT_SEPARATOR))
    }
}

/// Drop and recreate collection `name` through a store scoped to this call.
///
/// Destructive: any existing collection of that name is lost.
pub(crate) async fn create_collection(
    source: &dyn ConfigSource,
    connector: &dyn Connector,
    name: &str,
    dimension: u64,
    distance: Distance,
) -> Result<()> {
    info!(collection = name, dimension, "create_collection");
    let config = source.load()?;
    let store_config = config.store_config().with_collection_name(name);

    let store = connector.store(&store_config);
    store
        .recreate(name, dimension, distance)
        .await
        .map_err(|e| e.into_collection_create(name))?;
    Ok(())
}

/// Shared pool serving concurrent callers
pub struct EmbeddingPool {
    source: Arc<dyn ConfigSource>,
    connector: Arc<dyn Connector>,
    bindings: ArcSwap<PoolBindings>,
}

impl EmbeddingPool {
    /// Build the pool from the current configuration
    pub fn new(source: Arc<dyn ConfigSource>, connector: Arc<dyn Connector>) -> Result<Self> {
        let config = source.load()?;
        let bindings = PoolBindings::build(&config, connector.as_ref())?;
        info!(
            collection = %bindings.settings.collection_name,
            top_k = bindings.settings.similarity_top_k,
            cutoff = bindings.settings.similarity_cutoff,
            "Embedding pool ready"
        );

        Ok(Self {
            source,
            connector,
            bindings: ArcSwap::from_pointee(bindings),
        })
    }

    /// Rebuild every binding from the current configuration.
    ///
    /// On error the previous bindings stay in place.
    pub fn reload(&self) -> Result<()> {
        info!("reload");
        let config = self.source.load()?;
        let bindings = PoolBindings::build(&config, self.connector.as_ref())?;
        debug!(settings = ?bindings.settings, "Publishing new pool bindings");
        self.bindings.store(Arc::new(bindings));
        Ok(())
    }

    /// Retrieval settings currently in effect
    pub fn settings(&self) -> RetrievalSettings {
        self.bindings.load().settings.clone()
    }

    /// Drop and recreate collection `name`.
    ///
    /// Destructive: any existing collection of that name is lost. The pool
    /// keeps writing to its configured collection.
    pub async fn create_collection(
        &self,
        name: &str,
        dimension: u64,
        distance: Distance,
    ) -> Result<()> {
        create_collection(
            self.source.as_ref(),
            self.connector.as_ref(),
            name,
            dimension,
            distance,
        )
        .await
    }

    /// Embed `text` and upsert it as record `id`
    pub async fn update(&self, text: &str, id: &str) -> Result<()> {
        self.bindings.load_full().update(text, id).await
    }

    /// Remove record `id`; unknown ids are fine
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.bindings.load_full().delete(id).await
    }

    /// Texts of the relevant records for `query`, best first, blank-line separated.
    ///
    /// Top-k candidates are fetched before thresholding, so fewer than k
    /// (possibly zero) texts may come back. Zero survivors yield `""`.
    pub async fn search(&self, query: &str) -> Result<String> {
        self.bindings.load_full().search(query).await
    }
}

/// Write paths report failures as `WriteFailed` unless the store was unreachable
fn into_write_error(err: VectorError) -> VectorError {
    match err {
        VectorError::StoreUnavailable { .. } | VectorError::WriteFailed { .. } => err,
        other => VectorError::WriteFailed {
            reason: other.to_string(),
        },
    }
}

fn into_query_error(err: VectorError) -> VectorError {
    match err {
        VectorError::StoreUnavailable { .. } | VectorError::QueryFailed { .. } => err,
        other => VectorError::QueryFailed {
            reason: other.to_string(),
        },
    }
}
