//! Helpers at the model/tool boundary: emitting tool schemas for a request
//! and evaluating the arguments a model sends back.

use crate::error::ModelError;
use crate::types::ToolInvocation;
use serde_json::Value;
use toolcraft_schema::{Arguments, CallableSchema, EvalOptions, JsonSchemaFlavor};

/// Emits the tool definition for `schema` in the given dialect, long
/// description included.
#[must_use]
pub fn get_wire_schema(schema: &CallableSchema, flavor: JsonSchemaFlavor) -> Value {
    schema.json_schema(flavor, true)
}

/// Evaluates decoded tool-call arguments against `schema`.
///
/// # Errors
///
/// Returns [`ModelError::InvalidJson`] carrying every validation issue.
pub fn evaluate_tool_call(
    schema: &CallableSchema,
    arguments: &Value,
) -> Result<Arguments, ModelError> {
    evaluate_tool_call_with(schema, arguments, &EvalOptions::default())
}

/// Like [`evaluate_tool_call`], with explicit evaluation options.
///
/// # Errors
///
/// Returns [`ModelError::InvalidJson`] carrying every validation issue.
pub fn evaluate_tool_call_with(
    schema: &CallableSchema,
    arguments: &Value,
    options: &EvalOptions,
) -> Result<Arguments, ModelError> {
    schema.eval_with(arguments, options).map_err(|err| {
        tracing::warn!(
            tool = schema.name(),
            issues = err.issues().len(),
            "tool call failed validation"
        );
        ModelError::invalid_json(schema.name(), err)
    })
}

/// Decodes the raw argument string of a tool call.
///
/// Providers that send arguments as a JSON string use this before
/// evaluation. An empty string decodes to an empty object.
///
/// # Errors
///
/// Returns [`ModelError::InvalidJson`] if the string is not JSON.
pub fn decode_arguments(tool: &str, raw: &str) -> Result<Value, ModelError> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_str(raw).map_err(|err| ModelError::invalid_json(tool, err))
}

/// Decodes a raw argument string into a [`ToolInvocation`].
///
/// # Errors
///
/// Returns [`ModelError::InvalidJson`] if the string is not JSON.
pub fn parse_invocation(
    invocation_id: impl Into<String>,
    tool_name: impl Into<String>,
    raw_arguments: &str,
) -> Result<ToolInvocation, ModelError> {
    let tool_name = tool_name.into();
    let tool_args = decode_arguments(&tool_name, raw_arguments)?;
    Ok(ToolInvocation::new(invocation_id, tool_name, tool_args))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use toolcraft_schema::{Param, SchemaExtractor, Signature};

    fn lookup() -> CallableSchema {
        SchemaExtractor::shared()
            .extract(
                &Signature::new("lookup")
                    .with_doc("Look up a user.\n\nSearches by id.")
                    .param(Param::of::<u32>("id"))
                    .param(Param::of::<bool>("verbose").with_default(json!(false))),
            )
            .unwrap()
    }

    #[test]
    fn wire_schema_includes_long_description() {
        let wire = get_wire_schema(&lookup(), JsonSchemaFlavor::OpenAi);
        assert_eq!(wire["description"], json!("Look up a user.\n\nSearches by id."));
    }

    #[test]
    fn invalid_arguments_carry_issues() {
        let err =
            evaluate_tool_call(&lookup(), &json!({"id": -1, "verbose": "no"})).unwrap_err();
        let issues = err.validation_error().unwrap();
        assert_eq!(issues.paths(), vec!["id", "verbose"]);
    }

    #[test]
    fn valid_arguments_get_defaults() {
        let args = evaluate_tool_call(&lookup(), &json!({"id": 7})).unwrap();
        assert!(!args.get::<bool>("verbose").unwrap());
    }

    #[test]
    fn decodes_argument_strings() {
        assert_eq!(decode_arguments("lookup", "").unwrap(), json!({}));
        assert_eq!(decode_arguments("lookup", r#"{"id": 1}"#).unwrap(), json!({"id": 1}));
        assert!(matches!(
            decode_arguments("lookup", "{\"id\":"),
            Err(ModelError::InvalidJson { tool, .. }) if tool == "lookup"
        ));

        let invocation = parse_invocation("call_9", "lookup", r#"{"id": 3}"#).unwrap();
        assert_eq!(invocation.tool_args, json!({"id": 3}));
    }
}
