//! Chat completion bridge
//!
//! Single-shot calls to an OpenAI-compatible `/chat/completions` endpoint.
//! The prompt is sent as the only (system) message. No retries: a failed call
//! is reported to the caller as is.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::error::{InferenceError, InferenceResult};
use super::CompletionProvider;

/// Chat endpoint configuration
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Base URL; `/chat/completions` is appended
    pub base_url: String,

    /// API key
    pub api_key: SecretString,

    /// Chat model identifier
    pub model_name: String,

    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ark.cn-beijing.volces.com/api/v3".to_string(),
            api_key: SecretString::new(String::new()),
            model_name: String::new(),
            timeout_ms: 60_000,
        }
    }
}

impl CompletionConfig {
    /// Full URL of the chat endpoint
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Chat API request structure
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

/// Chat API message
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Chat API response structure
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Completion provider backed by a remote chat model
pub struct ChatClient {
    client: Client,
    config: CompletionConfig,
}

impl ChatClient {
    pub fn new(config: CompletionConfig) -> InferenceResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| InferenceError::ClientBuild {
                reason: e.to_string(),
            })?;

        Ok(Self { client, config })
    }

    /// Get current configuration
    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }
}

#[async_trait]
impl CompletionProvider for ChatClient {
    async fn complete(&self, prompt: &str) -> InferenceResult<String> {
        let request_body = ChatRequest {
            model: &self.config.model_name,
            messages: [ChatMessage {
                role: "system",
                content: prompt,
            }],
        };

        let start = Instant::now();

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
            return Err(InferenceError::CompletionFailed {
                reason: format!("HTTP {}: {}", status, body),
            });
        }

        let parsed: ChatResponse = response.json().await?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| InferenceError::InvalidResponse {
                reason: "response contained no message content".to_string(),
            })?;

        tracing::debug!(
            model = %self.config.model_name,
            duration_ms = start.elapsed().as_millis() as u64,
            "Chat completion finished"
        );
        Ok(content)
    }
}
