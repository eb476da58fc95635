//! Service facade
//!
//! Owns the pool bindings and the [`Desensitizer`] and exposes every
//! operation the outer layers consume, including the desensitize-then-store
//! path that guarantees nothing unscrubbed is written through it.
//!
//! Both live in one [`ServiceBindings`] snapshot, so a reload replaces them
//! together and a request never pairs a new desensitizer with old pool
//! bindings.


use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::connector::Connector;
use crate::core::{ConfigSource, Result, ServiceConfig};
use crate::inference::{Desensitized, Desensitizer};
use crate::pool::{self, PoolBindings, RetrievalSettings};
use crate::vector::Distance;

/// Result of [`LoveroomService::update_with_desensitization`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum UpdateOutcome {
    /// Sanitized text was written under `id`
    Stored { id: String, text: String },
    /// Desensitization failed; the store was not touched
    Skipped { id: String, message: String },
}

impl UpdateOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, UpdateOutcome::Stored { .. })
    }
}

/// Everything one request needs, built from a single configuration
struct ServiceBindings {
    pool: PoolBindings,
    desensitizer: Desensitizer,
}

impl ServiceBindings {
    fn build(config: &ServiceConfig, connector: &dyn Connector) -> Result<Self> {
        let provider = connector.completion(&config.completion_config())?;
        Ok(Self {
            pool: PoolBindings::build(config, connector)?,
            desensitizer: Desensitizer::new(provider, config.desensitize_config()),
        })
    }
}

/// Pool plus desensitizer, reloadable as one unit
pub struct LoveroomService {
    source: Arc<dyn ConfigSource>,
    connector: Arc<dyn Connector>,
    bindings: ArcSwap<ServiceBindings>,
}

impl LoveroomService {
    pub fn new(source: Arc<dyn ConfigSource>, connector: Arc<dyn Connector>) -> Result<Self> {
        let config = source.load()?;
        let bindings = ServiceBindings::build(&config, connector.as_ref())?;
        info!(
            collection = %config.collection_name,
            roll_time = config.roll_time,
            "Service ready"
        );

        Ok(Self {
            source,
            connector,
            bindings: ArcSwap::from_pointee(bindings),
        })
    }

    /// Reload pool bindings and desensitizer from one configuration snapshot.
    ///
    /// Published with a single swap; on error the previous bindings stay.
    pub fn reload(&self) -> Result<()> {
        info!("reload");
        let config = self.source.load()?;
        let bindings = ServiceBindings::build(&config, self.connector.as_ref())?;
        debug!(settings = ?bindings.pool.settings(), "Publishing new service bindings");
        self.bindings.store(Arc::new(bindings));
        Ok(())
    }

    pub fn settings(&self) -> RetrievalSettings {
        self.bindings.load().pool.settings().clone()
    }

    pub async fn create_collection(&self, name: &str, dimension: u64) -> Result<()> {
        pool::create_collection(
            self.source.as_ref(),
            self.connector.as_ref(),
            name,
            dimension,
            Distance::Cosine,
        )
        .await
    }

    pub async fn update(&self, text: &str, id: &str) -> Result<()> {
        self.bindings.load_full().pool.update(text, id).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.bindings.load_full().pool.delete(id).await
    }

    pub async fn search(&self, query: &str) -> Result<String> {
        self.bindings.load_full().pool.search(query).await
    }

    pub async fn desensitize(&self, text: &str) -> Result<Desensitized> {
        let bindings = self.bindings.load_full();
        Ok(bindings.desensitizer.desensitize(text).await?)
    }

    /// Desensitize `text`, then store the result under `id`.
    ///
    /// A failed desensitization is a skip, not an error: nothing is written
    /// and any existing record `id` is left as it was. Both steps use the
    /// bindings loaded when the call started.
    pub async fn update_with_desensitization(&self, text: &str, id: &str) -> Result<UpdateOutcome> {
        info!(id, len = text.len(), "update_with_desensitization");
        let bindings = self.bindings.load_full();
        let desensitized = bindings.desensitizer.desensitize(text).await?;

        if !desensitized.is_success() {
            warn!(id, attempts = desensitized.attempts, "Skipping store write");
            return Ok(UpdateOutcome::Skipped {
                id: id.to_string(),
                message: desensitized.text,
            });
        }

        bindings.pool.update(&desensitized.text, id).await?;
        info!(id, "Stored desensitized text");
        Ok(UpdateOutcome::Stored {
            id: id.to_string(),
            text: desensitized.text,
        })
    }
}
