//! The schema of one callable.

use crate::emit::emit;
use crate::error::ValidationError;
use crate::eval::{Arguments, EvalOptions};
use crate::flavor::{FlavorStrategy, JsonSchemaFlavor};
use crate::node::{ObjectNode, SchemaNode};
use serde_json::Value;

/// Everything needed to advertise a callable to a model and to check the
/// arguments it sends back.
///
/// The summary lives in the call schema's description; the long description
/// is kept apart so it can be left out of size-constrained requests.
#[derive(Debug, Clone, PartialEq)]
pub struct CallableSchema {
    name: String,
    call_schema: ObjectNode,
    return_schema: Option<SchemaNode>,
    long_description: Option<String>,
}

impl CallableSchema {
    /// Assembles a callable schema.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        call_schema: ObjectNode,
        return_schema: Option<SchemaNode>,
        long_description: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            call_schema,
            return_schema,
            long_description,
        }
    }

    /// The callable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parameter object.
    #[must_use]
    pub fn call_schema(&self) -> &ObjectNode {
        &self.call_schema
    }

    /// The shape of the return value, if declared.
    #[must_use]
    pub fn return_schema(&self) -> Option<&SchemaNode> {
        self.return_schema.as_ref()
    }

    /// The first paragraph of the callable's docs.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.call_schema.description()
    }

    /// The docs after the first paragraph.
    #[must_use]
    pub fn long_description(&self) -> Option<&str> {
        self.long_description.as_deref()
    }

    /// The description sent to the model.
    #[must_use]
    pub fn description(&self, include_long_description: bool) -> Option<String> {
        match (self.summary(), self.long_description()) {
            (Some(summary), Some(long)) if include_long_description => {
                Some(format!("{summary}\n\n{long}"))
            }
            (None, Some(long)) if include_long_description => Some(long.to_string()),
            (summary, _) => summary.map(str::to_string),
        }
    }

    /// The parameters object alone, without the tool envelope.
    #[must_use]
    pub fn parameters_schema(&self, strategy: &dyn FlavorStrategy) -> Value {
        emit(
            &SchemaNode::Object(self.call_schema.without_description()),
            strategy,
        )
    }

    /// The provider tool definition in a built-in dialect.
    #[must_use]
    pub fn json_schema(&self, flavor: JsonSchemaFlavor, include_long_description: bool) -> Value {
        self.json_schema_with(flavor.strategy(), include_long_description)
    }

    /// The provider tool definition for a custom dialect.
    #[must_use]
    pub fn json_schema_with(
        &self,
        strategy: &dyn FlavorStrategy,
        include_long_description: bool,
    ) -> Value {
        let description = self.description(include_long_description);
        strategy.envelope(
            &self.name,
            description.as_deref(),
            self.parameters_schema(strategy),
        )
    }

    /// Validates decoded call arguments with default options.
    ///
    /// # Errors
    ///
    /// Returns every violation found, each tagged with its path.
    pub fn eval(&self, arguments: &Value) -> Result<Arguments, ValidationError> {
        self.eval_with(arguments, &EvalOptions::default())
    }

    /// Validates decoded call arguments.
    ///
    /// # Errors
    ///
    /// Returns every violation found, each tagged with its path.
    pub fn eval_with(
        &self,
        arguments: &Value,
        options: &EvalOptions,
    ) -> Result<Arguments, ValidationError> {
        self.call_schema.eval_arguments(arguments, options)
    }

    /// Validates a return value against the declared return shape.
    ///
    /// Callables without a return schema accept anything.
    ///
    /// # Errors
    ///
    /// Returns every violation found, each tagged with its path.
    pub fn validate_return(&self, value: &Value) -> Result<Value, ValidationError> {
        match &self.return_schema {
            Some(node) => node.eval(value),
            None => Ok(value.clone()),
        }
    }
}
