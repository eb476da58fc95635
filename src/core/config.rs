//! Service configuration
//!
//! A single flat [`ServiceConfig`] covers the vector store, both providers,
//! retrieval thresholds and the desensitization prompts. It is read through a
//! [`ConfigSource`] every time the pool or desensitizer is (re)built, so edits
//! to the backing file take effect on the next reload.

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

use crate::embeddings::EmbeddingConfig;
use crate::inference::{CompletionConfig, DesensitizeConfig};
use crate::logging::LoggingConfig;
use crate::vector::{StoreBackend, VectorStoreConfig};

/// Prefix for environment overrides, e.g. `LOVEROOM_SIMILARITY_TOP_K`
pub const ENV_PREFIX: &str = "LOVEROOM";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Main service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Qdrant host
    pub host: String,

    /// Qdrant gRPC port
    pub port: u16,

    /// Collection records are written to and searched in
    pub collection_name: String,

    /// Dimension used when creating the collection
    pub vector_dimension: u64,

    /// Store implementation
    pub store_backend: StoreBackend,

    /// Minimum score a hit needs to survive filtering
    pub similarity_cutoff: f32,

    /// Candidates fetched before filtering
    pub similarity_top_k: usize,

    /// Embedding model
    pub model_name: String,

    /// Provider API key, shared by embeddings and chat
    pub api_key: SecretString,

    /// Embeddings endpoint base URL
    pub embedding_base_url: String,

    /// Chat endpoint base URL
    pub chat_base_url: String,

    /// Chat model used for desensitization
    pub chat_model_name: String,

    /// Desensitization attempt budget
    pub roll_time: u32,

    /// Draft prompt, `{text}` is the input
    #[serde(alias = "Desensitization_prompt")]
    pub desensitization_prompt: String,

    /// Verdict prompt, `{des_result}` is the draft
    #[serde(alias = "Evaluation_prompt")]
    pub evaluation_prompt: String,

    /// Timeout for every remote call
    pub request_timeout_ms: u64,

    /// Read once at startup; reloads do not reinstall the subscriber
    pub logging: LoggingConfig,
}

const ARK_BASE_URL: &str = "https://ark.cn-beijing.volces.com/api/v3";

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6334,
            collection_name: "loveroom".to_string(),
            vector_dimension: 1536,
            store_backend: StoreBackend::Qdrant,
            similarity_cutoff: 0.5,
            similarity_top_k: 2,
            model_name: "doubao-embedding-text-240715".to_string(),
            api_key: SecretString::new(String::new()),
            embedding_base_url: ARK_BASE_URL.to_string(),
            chat_base_url: ARK_BASE_URL.to_string(),
            chat_model_name: String::new(),
            roll_time: 3,
            desensitization_prompt: String::new(),
            evaluation_prompt: String::new(),
            request_timeout_ms: 60_000,
            logging: LoggingConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Reject values the pool cannot work with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.similarity_top_k == 0 {
            return Err(ConfigError::Invalid(
                "similarity_top_k must be at least 1".to_string(),
            ));
        }
        if self.vector_dimension == 0 {
            return Err(ConfigError::Invalid(
                "vector_dimension must be at least 1".to_string(),
            ));
        }
        // Cosine scores span [-1, 1]; NaN fails the range check too
        if !(-1.0..=1.0).contains(&self.similarity_cutoff) {
            return Err(ConfigError::Invalid(format!(
                "similarity_cutoff must be within [-1, 1], got {}",
                self.similarity_cutoff
            )));
        }
        if self.collection_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "collection_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Store settings for the configured collection
    pub fn store_config(&self) -> VectorStoreConfig {
        VectorStoreConfig {
            backend: self.store_backend,
            host: self.host.clone(),
            port: self.port,
            collection_name: self.collection_name.clone(),
            timeout_ms: self.request_timeout_ms,
        }
    }

    pub fn embedding_config(&self) -> EmbeddingConfig {
        EmbeddingConfig {
            base_url: self.embedding_base_url.clone(),
            model_name: self.model_name.clone(),
            api_key: self.api_key.clone(),
            timeout_ms: self.request_timeout_ms,
        }
    }

    pub fn completion_config(&self) -> CompletionConfig {
        CompletionConfig {
            base_url: self.chat_base_url.clone(),
            api_key: self.api_key.clone(),
            model_name: self.chat_model_name.clone(),
            timeout_ms: self.request_timeout_ms,
        }
    }

    pub fn desensitize_config(&self) -> DesensitizeConfig {
        DesensitizeConfig {
            roll_time: self.roll_time,
            desensitization_prompt: self.desensitization_prompt.clone(),
            evaluation_prompt: self.evaluation_prompt.clone(),
        }
    }
}

/// Where the current configuration comes from
pub trait ConfigSource: Send + Sync {
    /// Produce the current, validated configuration
    fn load(&self) -> ConfigResult<ServiceConfig>;
}

/// Configuration file layered under `LOVEROOM_*` environment variables.
///
/// The file format follows its extension (YAML, TOML or JSON). The prompt keys
/// also accept their capitalized spellings. Environment values are kept as
/// text until a field asks for a number. The file is read again on every `load`.
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    path: Option<PathBuf>,
    required: bool,
    env_prefix: String,
}

impl FileConfigSource {
    /// Load from `path`, which must exist
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            required: true,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// Load from `path` if it exists, otherwise from defaults and environment
    pub fn optional(path: impl Into<PathBuf>) -> Self {
        Self {
            required: false,
            ..Self::new(path)
        }
    }

    /// Defaults and environment only
    pub fn env_only() -> Self {
        Self {
            path: None,
            required: false,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// Use a different environment prefix
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl ConfigSource for FileConfigSource {
    fn load(&self) -> ConfigResult<ServiceConfig> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = &self.path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(self.required));
        }

        let settings = builder
            // Values stay strings; numeric fields are parsed during deserialization
            .add_source(::config::Environment::with_prefix(&self.env_prefix))
            .build()?;

        let config: ServiceConfig = settings.try_deserialize()?;
        config.validate()?;

        if config.roll_time > 0 && config.desensitization_prompt.trim().is_empty() {
            tracing::warn!(path = ?self.path, "desensitization_prompt is empty");
        }

        tracing::debug!(
            path = ?self.path,
            collection = %config.collection_name,
            top_k = config.similarity_top_k,
            cutoff = config.similarity_cutoff,
            "Loaded configuration"
        );
        Ok(config)
    }
}

/// In-memory configuration that can be replaced at runtime
#[derive(Debug, Default)]
pub struct StaticConfigSource {
    config: RwLock<ServiceConfig>,
}

impl StaticConfigSource {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }

    /// Replace the whole configuration
    pub fn replace(&self, config: ServiceConfig) {
        *self.config.write() = config;
    }

    /// Edit the configuration in place
    pub fn update(&self, edit: impl FnOnce(&mut ServiceConfig)) {
        edit(&mut self.config.write());
    }
}

impl ConfigSource for StaticConfigSource {
    fn load(&self) -> ConfigResult<ServiceConfig> {
        let config = self.config.read().clone();
        config.validate()?;
        Ok(config)
    }
}
