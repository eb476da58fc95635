//! Generate-then-verify desensitization
//!
//! Each attempt drafts a scrubbed version of the input with one prompt and
//! asks the model to judge that draft with a second prompt. The first draft
//! whose verdict contains `"true"` is returned. Once the attempt budget is
//! spent without an accepted draft the call reports [`DesensitizeStatus::Failed`]
//! together with a fixed sentinel, never the last draft.
//!
//! Only rejected verdicts consume the budget. A completion error ends the call
//! immediately.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::error::InferenceResult;
use super::prompt;
use super::CompletionProvider;

/// Text returned in place of a draft when every attempt was rejected
pub const FAILURE_SENTINEL: &str = "desensitization failed";

/// Token a verdict must contain to accept the draft
const ACCEPT_TOKEN: &str = "true";

/// Slot name in the desensitization prompt
const TEXT_SLOT: &str = "text";

/// Slot name in the evaluation prompt
const DRAFT_SLOT: &str = "des_result";

/// Outcome flag of a desensitization call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesensitizeStatus {
    Success,
    Failed,
}

impl fmt::Display for DesensitizeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DesensitizeStatus::Success => write!(f, "success"),
            DesensitizeStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Result of [`Desensitizer::desensitize`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Desensitized {
    pub status: DesensitizeStatus,
    /// Accepted draft, or [`FAILURE_SENTINEL`]
    pub text: String,
    /// Drafts produced before the loop stopped
    pub attempts: u32,
}

impl Desensitized {
    pub fn is_success(&self) -> bool {
        self.status == DesensitizeStatus::Success
    }

    fn accepted(text: String, attempts: u32) -> Self {
        Self {
            status: DesensitizeStatus::Success,
            text,
            attempts,
        }
    }

    fn exhausted(attempts: u32) -> Self {
        Self {
            status: DesensitizeStatus::Failed,
            text: FAILURE_SENTINEL.to_string(),
            attempts,
        }
    }
}

/// Prompts and budget for the loop
#[derive(Debug, Clone)]
pub struct DesensitizeConfig {
    /// Maximum number of drafts
    pub roll_time: u32,

    /// Draft prompt, rendered with `{text}`
    pub desensitization_prompt: String,

    /// Verdict prompt, rendered with `{des_result}`
    pub evaluation_prompt: String,
}

impl Default for DesensitizeConfig {
    fn default() -> Self {
        Self {
            roll_time: 3,
            desensitization_prompt: String::new(),
            evaluation_prompt: String::new(),
        }
    }
}

/// Loop state
#[derive(Debug)]
enum Phase {
    Drafting { attempt: u32 },
    Verifying { attempt: u32, draft: String },
    Retrying { attempt: u32 },
    Accepted { attempt: u32, draft: String },
    Exhausted { attempts: u32 },
}

/// LLM-backed desensitization engine
pub struct Desensitizer {
    provider: Arc<dyn CompletionProvider>,
    config: DesensitizeConfig,
}

impl Desensitizer {
    pub fn new(provider: Arc<dyn CompletionProvider>, config: DesensitizeConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &DesensitizeConfig {
        &self.config
    }

    /// Scrub `text`, verifying each draft before accepting it
    pub async fn desensitize(&self, text: &str) -> InferenceResult<Desensitized> {
        let budget = self.config.roll_time;
        let mut phase = if budget == 0 {
            Phase::Exhausted { attempts: 0 }
        } else {
            Phase::Drafting { attempt: 1 }
        };

        loop {
            phase = match phase {
                Phase::Drafting { attempt } => {
                    debug!(attempt, budget, "Drafting desensitized text");
                    let prompt = prompt::render(&self.config.desensitization_prompt, TEXT_SLOT, text);
                    let draft = self.provider.complete(&prompt).await?;
                    Phase::Verifying { attempt, draft }
                }
                Phase::Verifying { attempt, draft } => {
                    let prompt = prompt::render(&self.config.evaluation_prompt, DRAFT_SLOT, &draft);
                    let verdict = self.provider.complete(&prompt).await?;
                    debug!(attempt, verdict = %verdict, "Received verdict");

                    if is_accepted(&verdict) {
                        Phase::Accepted { attempt, draft }
                    } else {
                        warn!(attempt, budget, "Draft rejected by verifier");
                        Phase::Retrying { attempt }
                    }
                }
                Phase::Retrying { attempt } if attempt < budget => {
                    Phase::Drafting { attempt: attempt + 1 }
                }
                Phase::Retrying { attempt } => Phase::Exhausted { attempts: attempt },
                Phase::Accepted { attempt, draft } => {
                    info!(attempts = attempt, "Desensitization accepted");
                    return Ok(Desensitized::accepted(draft, attempt));
                }
                Phase::Exhausted { attempts } => {
                    warn!(attempts, "Desensitization exhausted its attempt budget");
                    return Ok(Desensitized::exhausted(attempts));
                }
            };
        }
    }
}

/// Literal, case-sensitive substring match on the verdict text
pub fn is_accepted(verdict: &str) -> bool {
    verdict.contains(ACCEPT_TOKEN)
}
