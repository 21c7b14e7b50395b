//! Error types for tool registration and execution.

use thiserror::Error;
use toolcraft_schema::{ArgumentError, SchemaError, ValidationError};

/// Errors that can occur while registering or running tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The tool's signature could not be turned into a schema.
    #[error("registration error: {0}")]
    Registration(#[from] SchemaError),

    /// A tool with the same name is already registered.
    #[error("tool `{0}` is already registered")]
    DuplicateTool(String),

    /// No tool with the requested name is registered.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// The call arguments do not match the tool's schema.
    #[error("invalid arguments for `{tool}`:\n{source}")]
    Validation {
        /// The tool that was called.
        tool: String,
        /// Every issue found in the arguments.
        #[source]
        source: ValidationError,
    },

    /// An evaluated argument could not be read as the handler's type.
    #[error("argument error: {0}")]
    Argument(#[from] ArgumentError),

    /// Error raised by the tool itself.
    #[error("execution error: {0}")]
    Execution(String),

    /// JSON serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ToolError {
    /// Creates an [`Execution`](Self::Execution) error.
    pub fn execution_error(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Creates a [`Validation`](Self::Validation) error.
    pub fn validation(tool: impl Into<String>, source: ValidationError) -> Self {
        Self::Validation {
            tool: tool.into(),
            source,
        }
    }

    /// Returns the validation issues if the arguments were rejected.
    #[must_use]
    pub fn validation_error(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation { source, .. } => Some(source),
            _ => None,
        }
    }
}
