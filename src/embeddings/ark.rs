//! Embeddings over an OpenAI-compatible HTTP API
//!
//! Defaults target the Volcano Engine Ark endpoint, which speaks the same
//! `/embeddings` wire format as OpenAI.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use super::config::EmbeddingConfig;
use super::error::{EmbeddingError, EmbeddingResult};
use super::EmbeddingProvider;

/// Embeddings API request structure
#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
    encoding_format: &'static str,
}

/// Embeddings API response structure
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Remote embedding provider
pub struct ArkEmbedder {
    client: Client,
    config: EmbeddingConfig,
}

impl ArkEmbedder {
    pub fn new(config: EmbeddingConfig) -> EmbeddingResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| EmbeddingError::ClientBuild {
                reason: e.to_string(),
            })?;

        Ok(Self { client, config })
    }

    /// Get current configuration
    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }
}

#[async_trait]
impl EmbeddingProvider for ArkEmbedder {
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        let request_body = EmbeddingRequest {
            model: &self.config.model_name,
            input: [text],
            encoding_format: "float",
        };

        let response = self
            .client
            .post(self.config.endpoint())
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::RequestFailed {
                reason: format!("HTTP {}: {}", status, body),
            });
        }

        let parsed: EmbeddingResponse = response.json().await?;

        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::InvalidResponse {
                reason: "response contained no embedding".to_string(),
            })?;

        if vector.is_empty() {
            return Err(EmbeddingError::InvalidResponse {
                reason: "embedding was empty".to_string(),
            });
        }

        tracing::debug!(
            model = %self.config.model_name,
            dimension = vector.len(),
            "Embedded text"
        );
        Ok(vector)
    }
}
