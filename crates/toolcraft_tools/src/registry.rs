//! Tool registry.
//!
//! The [`ToolRegistry`] extracts each tool's schema when the tool is
//! registered, so an unsupported parameter type fails there rather than on
//! the first call. Dispatch always evaluates the raw arguments against that
//! schema first; handlers never see unvalidated input.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use toolcraft_tools::{ToolRegistry, JsonSchemaFlavor};
//!
//! let mut registry = ToolRegistry::new();
//! registry.register(search())?;
//!
//! // Freeze by sharing, then advertise and dispatch.
//! let registry = Arc::new(registry);
//! let definitions = registry.definitions(JsonSchemaFlavor::OpenAi);
//! let result = registry.execute("search", &args).await?;
//! ```

use crate::error::ToolError;
use crate::tool::{Tool, ToolFuture};
use crate::toolset::Toolset;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;
use toolcraft_models::{ToolParams, ToolUseMode};
use toolcraft_schema::{Arguments, CallableSchema, EvalOptions, JsonSchemaFlavor, SchemaExtractor};

struct RegisteredTool {
    schema: CallableSchema,
    tool: Arc<dyn Tool>,
}

/// Registry of available tools.
///
/// Stores tools by name, in registration order, next to their extracted
/// schemas.
pub struct ToolRegistry {
    extractor: SchemaExtractor,
    eval_options: EvalOptions,
    tools: IndexMap<String, RegisteredTool>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .field("eval_options", &self.eval_options)
            .finish_non_exhaustive()
    }
}

impl ToolRegistry {
    /// Creates an empty registry using the shared default extractor.
    #[must_use]
    pub fn new() -> Self {
        Self::with_extractor(SchemaExtractor::shared().clone())
    }

    /// Creates an empty registry that extracts schemas with `extractor`.
    #[must_use]
    pub fn with_extractor(extractor: SchemaExtractor) -> Self {
        Self {
            extractor,
            eval_options: EvalOptions::default(),
            tools: IndexMap::new(),
        }
    }

    /// Sets the options used to evaluate call arguments.
    #[must_use]
    pub fn with_eval_options(mut self, options: EvalOptions) -> Self {
        self.eval_options = options;
        self
    }

    /// Registers a tool, extracting its schema.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Registration`] if the signature cannot be turned
    /// into a schema and [`ToolError::DuplicateTool`] if the name is taken.
    pub fn register(&mut self, tool: impl Tool) -> Result<(), ToolError> {
        self.insert(Arc::new(tool))
    }

    /// Registers all tools from a toolset.
    ///
    /// Tools before the first failing one stay registered.
    ///
    /// # Errors
    ///
    /// Returns the first registration error.
    pub fn register_toolset(&mut self, toolset: impl Toolset) -> Result<(), ToolError> {
        for tool in toolset.tools() {
            self.insert(Arc::from(tool))?;
        }
        Ok(())
    }

    fn insert(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        let signature = tool.signature();
        if self.tools.contains_key(&signature.name) {
            return Err(ToolError::DuplicateTool(signature.name));
        }
        let schema = self.extractor.extract(&signature)?;
        tracing::debug!(tool = schema.name(), "registered tool");
        self.tools.insert(signature.name, RegisteredTool { schema, tool });
        Ok(())
    }

    /// Evaluates raw arguments against a tool's schema.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownTool`] or [`ToolError::Validation`].
    pub fn evaluate(&self, name: &str, args: &Value) -> Result<Arguments, ToolError> {
        let entry = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        entry
            .schema
            .eval_with(args, &self.eval_options)
            .map_err(|err| {
                tracing::warn!(
                    tool = name,
                    issues = err.issues().len(),
                    "tool call failed validation"
                );
                ToolError::validation(name, err)
            })
    }

    /// Evaluates raw arguments and runs the tool.
    pub fn execute<'a>(&'a self, name: &'a str, args: &Value) -> ToolFuture<'a> {
        let prepared = self.evaluate(name, args).and_then(|arguments| {
            self.tools
                .get(name)
                .map(|entry| (Arc::clone(&entry.tool), arguments))
                .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
        });
        Box::pin(async move {
            let (tool, arguments) = prepared?;
            tracing::debug!(tool = name, "dispatching tool");
            tool.execute(arguments).await
        })
    }

    /// Returns the extracted schema of a tool.
    #[must_use]
    pub fn schema(&self, name: &str) -> Option<&CallableSchema> {
        self.tools.get(name).map(|entry| &entry.schema)
    }

    /// Iterates over all schemas in registration order.
    pub fn schemas(&self) -> impl Iterator<Item = &CallableSchema> {
        self.tools.values().map(|entry| &entry.schema)
    }

    /// Returns tool definitions in the given dialect, long descriptions
    /// included.
    #[must_use]
    pub fn definitions(&self, flavor: JsonSchemaFlavor) -> Vec<Value> {
        self.schemas()
            .map(|schema| schema.json_schema(flavor, true))
            .collect()
    }

    /// Builds request tool parameters offering every registered tool.
    #[must_use]
    pub fn tool_params(&self, mode: ToolUseMode) -> ToolParams {
        ToolParams::new(self.schemas().cloned().collect()).with_mode(mode)
    }

    /// Returns a reference to a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|entry| entry.tool.as_ref())
    }

    /// Returns whether a tool with the given name is registered.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Returns the names of all registered tools.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns whether no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
