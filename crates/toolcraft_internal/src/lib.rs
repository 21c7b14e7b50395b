//! # Toolcraft Internal Library
//!
//! Re-exports the core toolcraft crates for convenience.

/// Schema extraction, emission and argument evaluation.
pub use toolcraft_schema;

/// Model boundary types.
pub use toolcraft_models;

/// Tool definition, registration and dispatch.
pub use toolcraft_tools;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use toolcraft_models::{
        AssistantMessage, GenerationParams, Message, Model, ModelError, ModelResponse,
        ToolInvocation, ToolMessage, ToolParams, ToolUseMode, evaluate_tool_call,
        get_wire_schema,
    };
    pub use toolcraft_schema::{
        Arguments, CallableSchema, Describe, EvalOptions, JsonSchemaFlavor, Param, SchemaExtractor,
        SchemaNode, Signature, UnknownFieldPolicy, ValidationError,
    };
    pub use toolcraft_tools::{
        InvocationOutcome, RuntimeError, RuntimeOptions, Tool, ToolError, ToolRegistry, Toolset,
        call_and_use_tools, invoke_tools, response_tool, tool, toolset,
    };
}
