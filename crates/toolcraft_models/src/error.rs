//! Error types for the model boundary.

use core::time::Duration;
use toolcraft_schema::ValidationError;

/// Why a tool call's arguments could not be used.
#[derive(Debug, thiserror::Error)]
pub enum InvalidJsonError {
    /// The argument string is not JSON.
    #[error("malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The arguments are JSON but do not match the tool's schema.
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

/// Errors raised by a model or while interpreting its output.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The API credentials are invalid.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The model produced tool-call arguments that are malformed or invalid.
    #[error("invalid arguments for tool `{tool}`: {source}")]
    InvalidJson {
        /// Name of the tool the arguments were meant for.
        tool: String,
        /// What was wrong with them.
        #[source]
        source: InvalidJsonError,
    },

    /// The model took too long to respond.
    #[error("model timed out")]
    ModelTimeout,

    /// The prompt plus the requested completion exceeds the context window.
    #[error("prompt too long: {0}")]
    PromptTooLong(String),

    /// Rate limited by the provider.
    #[error("rate limited{}", .retry_after.map(|d| format!(", retry after {d:?}")).unwrap_or_default())]
    RateLimit {
        /// Suggested time to wait before retrying.
        retry_after: Option<Duration>,
    },

    /// The provider is down or unreachable.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Generation stopped because a content filter triggered.
    #[error("content filter triggered{}", .0.as_deref().map(|c| format!(": {c}")).unwrap_or_default())]
    ContentFilter(Option<String>),

    /// Generation stopped at the token limit.
    #[error("output too long")]
    OutputTooLong {
        /// The truncated output.
        partial: Option<String>,
    },

    /// Any other provider error.
    #[error("provider error: {message}")]
    Provider {
        /// HTTP status code if available.
        status: Option<u16>,
        /// Error message.
        message: String,
    },
}

impl ModelError {
    /// Creates an [`InvalidJson`](Self::InvalidJson) error.
    pub fn invalid_json(tool: impl Into<String>, source: impl Into<InvalidJsonError>) -> Self {
        Self::InvalidJson {
            tool: tool.into(),
            source: source.into(),
        }
    }

    /// Returns whether retrying the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ModelTimeout | Self::RateLimit { .. } | Self::ServiceUnavailable(_)
        )
    }

    /// Returns the validation issues behind an [`InvalidJson`](Self::InvalidJson) error.
    #[must_use]
    pub fn validation_error(&self) -> Option<&ValidationError> {
        match self {
            Self::InvalidJson {
                source: InvalidJsonError::Validation(err),
                ..
            } => Some(err),
            _ => None,
        }
    }
}
