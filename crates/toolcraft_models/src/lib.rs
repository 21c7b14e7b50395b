//! Model boundary types for toolcraft.
//!
//! Defines what crosses the line between a chat model and the tools it calls,
//! without any provider transport:
//!
//! - [`Message`] and its variants, with a tagged [`Display`](core::fmt::Display)
//!   layout for logs.
//! - [`ToolParams`] and [`GenerationParams`] for requests, [`ModelResponse`] and
//!   [`FinishReason`] for replies.
//! - [`ModelError`], the error taxonomy providers map their failures into.
//! - [`Model`], the async trait provider backends implement.
//! - [`get_wire_schema`] and [`evaluate_tool_call`], the two calls a provider
//!   makes into the schema layer.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use toolcraft_models::{JsonSchemaFlavor, evaluate_tool_call, get_wire_schema};
//! use toolcraft_schema::{Param, SchemaExtractor, Signature};
//!
//! let schema = SchemaExtractor::shared()
//!     .extract(&Signature::new("search").param(Param::of::<String>("query")))
//!     .unwrap();
//!
//! let wire = get_wire_schema(&schema, JsonSchemaFlavor::Anthropic);
//! assert_eq!(wire["input_schema"]["required"], json!(["query"]));
//!
//! assert!(evaluate_tool_call(&schema, &json!({"query": 3})).is_err());
//! ```

mod boundary;
mod error;
mod model;
mod params;
mod response;
mod types;

pub use boundary::{
    decode_arguments, evaluate_tool_call, evaluate_tool_call_with, get_wire_schema,
    parse_invocation,
};
pub use error::{InvalidJsonError, ModelError};
pub use model::Model;
pub use params::{GenerationParams, ToolParams, ToolUseMode};
pub use response::{FinishReason, ModelResponse, ResponseOption, UsageStats};
pub use toolcraft_schema::JsonSchemaFlavor;
pub use types::{
    AssistantMessage, ContentBlock, ImageContent, ImageMediaType, Message, SystemMessage,
    ToolInvocation, ToolMessage, UserMessage,
};
