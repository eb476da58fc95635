//! Configuration for the embedding provider

use secrecy::SecretString;
use serde::Deserialize;

/// Settings for an OpenAI-compatible embeddings endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL; `/embeddings` is appended
    pub base_url: String,

    /// Embedding model identifier
    pub model_name: String,

    /// Bearer token
    pub api_key: SecretString,

    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ark.cn-beijing.volces.com/api/v3".to_string(),
            model_name: "doubao-embedding-text-240715".to_string(),
            api_key: SecretString::new(String::new()),
            timeout_ms: 60_000,
        }
    }
}

impl EmbeddingConfig {
    /// Full URL of the embeddings endpoint
    pub fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url.trim_end_matches('/'))
    }
}
