//! Model responses.

use crate::error::ModelError;
use crate::types::AssistantMessage;
use serde::{Deserialize, Serialize};

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of the reply or a stop sequence.
    Stop,
    /// The token limit was reached.
    Length,
    /// The model stopped to call tools.
    ToolCall,
    /// A content filter cut the reply.
    ContentFilter,
}

/// Token counts for one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStats {
    /// Tokens in the prompt.
    pub prompt_tokens: u64,
    /// Tokens in the reply.
    pub response_tokens: u64,
}

impl UsageStats {
    /// Creates usage stats.
    #[must_use]
    pub fn new(prompt_tokens: u64, response_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            response_tokens,
        }
    }

    /// Prompt plus reply tokens.
    #[must_use]
    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens.saturating_add(self.response_tokens)
    }
}

/// One candidate reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseOption {
    /// The generated message.
    pub message: AssistantMessage,
    /// Why generation stopped.
    pub finish_reason: FinishReason,
}

impl ResponseOption {
    /// Returns the message if generation finished normally.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ContentFilter`] or [`ModelError::OutputTooLong`]
    /// for replies that were cut short.
    pub fn ensure_complete(self) -> Result<AssistantMessage, ModelError> {
        match self.finish_reason {
            FinishReason::Stop | FinishReason::ToolCall => Ok(self.message),
            FinishReason::ContentFilter => Err(ModelError::ContentFilter(self.message.content)),
            FinishReason::Length => Err(ModelError::OutputTooLong {
                partial: self.message.content,
            }),
        }
    }
}

/// A model's reply to one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Candidate replies; at least one for a successful request.
    pub response_options: Vec<ResponseOption>,
    /// Token usage.
    pub usage: UsageStats,
}

impl ModelResponse {
    /// Returns the first candidate reply.
    #[must_use]
    pub fn first(&self) -> Option<&ResponseOption> {
        self.response_options.first()
    }

    /// Consumes the response and returns the first candidate reply.
    #[must_use]
    pub fn into_first(self) -> Option<ResponseOption> {
        self.response_options.into_iter().next()
    }
}
