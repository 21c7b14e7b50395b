//! Tool framework for toolcraft.
//!
//! This crate provides the infrastructure for defining, registering, and
//! executing tools that models can call. Tools are async functions whose
//! signatures become schemas at registration time; every call is evaluated
//! against that schema before the function runs.
//!
//! # Quick Start
//!
//! ```
//! use serde_json::json;
//! use toolcraft_tools::{JsonSchemaFlavor, ToolError, ToolRegistry, tool};
//!
//! /// Search for documents matching a query.
//! #[tool]
//! async fn search(
//!     /// The search query.
//!     query: String,
//!     /// Max results to return.
//!     #[default(10)]
//!     limit: usize,
//! ) -> Result<String, ToolError> {
//!     Ok(format!("{limit} results for: {query}"))
//! }
//!
//! let mut registry = ToolRegistry::new();
//! registry.register(search()).unwrap();
//!
//! let definitions = registry.definitions(JsonSchemaFlavor::OpenAi);
//! assert_eq!(definitions[0]["parameters"]["required"], json!(["query"]));
//! ```
//!
//! # Architecture
//!
//! - [`Tool`]: trait for executable tools described by a [`Signature`]
//! - [`Toolset`]: trait for grouped tools (via `#[toolset]`)
//! - [`ToolRegistry`]: extracts schemas, evaluates arguments and dispatches
//! - [`invoke_tools`]: runs the tool calls of a model reply
//! - [`response_tool`]: the structured-response tool
//! - [`call_and_use_tools`]: the reply loop that feeds tool results and
//!   validation errors back to the model

// Lets `#[tool]`/`#[toolset]` generated code use `toolcraft_tools::` paths inside this crate.
extern crate self as toolcraft_tools;

pub mod error;
pub mod invoke;
pub mod registry;
pub mod response;
pub mod runtime;
pub mod tool;
pub mod toolset;

pub use error::ToolError;
pub use invoke::{InvocationOutcome, invoke_tools};
pub use registry::ToolRegistry;
pub use response::{
    RESPONSE_FIELD_NAME, RESPONSE_TOOL_NAME, RESPONSE_TOOL_PROMPT, response_tool,
    response_tool_for,
};
pub use runtime::{RuntimeError, RuntimeOptions, call_and_use_tools};
pub use tool::{FunctionTool, Tool, ToolFuture};
pub use tool_macros::{tool, toolset};
pub use toolset::Toolset;
pub use toolcraft_schema::{Arguments, JsonSchemaFlavor, Param, Signature};

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
    pub use toolcraft_schema;
}
