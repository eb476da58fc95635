//! Completion-backed text processing
//!
//! This module provides:
//! - The [`CompletionProvider`] capability and a remote chat implementation
//! - Prompt template rendering
//! - The generate-then-verify [`Desensitizer`]

mod cloud;
mod desensitize;
mod error;
mod prompt;


pub use cloud::{ChatClient, CompletionConfig};
pub use desensitize::{
    is_accepted, DesensitizeConfig, DesensitizeStatus, Desensitized, Desensitizer,
    FAILURE_SENTINEL,
};
pub use error::{InferenceError, InferenceResult};
pub use prompt::render as render_prompt;

use async_trait::async_trait;

/// Prompt to completion capability
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> InferenceResult<String>;
}
