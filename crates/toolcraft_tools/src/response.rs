//! The structured-response tool.
//!
//! When a caller wants the model's final answer in a given shape, the shape is
//! offered as one more tool, `submit_response`, whose single required
//! `response` parameter carries the answer. A plain string answer needs no
//! tool: the model's text reply is the answer.

use toolcraft_schema::{
    CallableSchema, Describe, Field, ObjectNode, PrimitiveKind, SchemaError, SchemaExtractor,
    SchemaNode,
};

/// Name of the structured-response tool.
pub const RESPONSE_TOOL_NAME: &str = "submit_response";

/// Name of the response tool's single parameter.
pub const RESPONSE_FIELD_NAME: &str = "response";

/// Description of the response tool.
pub const RESPONSE_TOOL_PROMPT: &str = "Call this function to respond to the user.";

/// Builds the response tool for answers shaped like `node`.
///
/// Returns `Ok(None)` for plain unformatted strings.
///
/// # Errors
///
/// Returns a [`SchemaError`] if the parameter object cannot be built.
pub fn response_tool(node: SchemaNode) -> Result<Option<CallableSchema>, SchemaError> {
    if let SchemaNode::Primitive(primitive) = &node
        && primitive.kind() == PrimitiveKind::String
        && primitive.format().is_none()
    {
        return Ok(None);
    }

    let call_schema = ObjectNode::builder()
        .field(RESPONSE_FIELD_NAME, Field::new(node))
        .description(RESPONSE_TOOL_PROMPT)
        .build()?;
    Ok(Some(CallableSchema::new(
        RESPONSE_TOOL_NAME,
        call_schema,
        None,
        None,
    )))
}

/// Builds the response tool for answers of type `T`.
///
/// # Errors
///
/// Returns a [`SchemaError`] if `T` is not supported by the shared extractor.
pub fn response_tool_for<T: Describe + ?Sized>() -> Result<Option<CallableSchema>, SchemaError> {
    response_tool(SchemaExtractor::shared().extract_described::<T>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use toolcraft_schema::JsonSchemaFlavor;

    #[test]
    fn plain_strings_need_no_tool() {
        assert!(response_tool(SchemaNode::string()).unwrap().is_none());
        assert!(response_tool_for::<String>().unwrap().is_none());
    }

    #[test]
    fn structured_answers_get_a_tool() {
        let tool = response_tool_for::<Vec<i64>>().unwrap().unwrap();
        assert_eq!(tool.name(), RESPONSE_TOOL_NAME);
        assert_eq!(tool.summary(), Some(RESPONSE_TOOL_PROMPT));

        let wire = tool.json_schema(JsonSchemaFlavor::OpenAi, false);
        assert_eq!(wire["parameters"]["required"], json!(["response"]));
        assert_eq!(
            wire["parameters"]["properties"]["response"]["type"],
            json!("array")
        );

        let args = tool.eval(&json!({"response": [1, 2.0]})).unwrap();
        assert_eq!(args.value(RESPONSE_FIELD_NAME), Some(&json!([1, 2])));
    }
}
