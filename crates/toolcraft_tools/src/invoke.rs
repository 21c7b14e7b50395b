//! Running the tool calls in a model reply.

use crate::error::ToolError;
use crate::registry::ToolRegistry;
use crate::response::RESPONSE_FIELD_NAME;
use serde_json::Value;
use toolcraft_models::{AssistantMessage, ToolMessage};
use toolcraft_schema::CallableSchema;

/// What came of the tool calls in one reply.
#[derive(Debug)]
pub enum InvocationOutcome {
    /// Results to send back to the model, one per call, in call order.
    Messages {
        /// One tool message per invocation. Failed calls carry the error text.
        messages: Vec<ToolMessage>,
        /// The errors behind failed calls.
        errors: Vec<ToolError>,
    },
    /// The model submitted its final structured answer.
    FinalResponse(Value),
}

impl InvocationOutcome {
    /// Returns the final answer, if the model submitted one.
    #[must_use]
    pub fn final_response(&self) -> Option<&Value> {
        match self {
            Self::FinalResponse(value) => Some(value),
            Self::Messages { .. } => None,
        }
    }
}

/// Evaluates and runs every tool call in `message`.
///
/// Calls run in order. A call whose arguments fail validation is not run;
/// its tool message lists every issue so the model can correct all of them
/// at once. When `response` is given and the model calls it with valid
/// arguments, the evaluated answer is returned immediately and later calls
/// are skipped.
pub async fn invoke_tools(
    registry: &ToolRegistry,
    message: &AssistantMessage,
    response: Option<&CallableSchema>,
) -> InvocationOutcome {
    let mut messages = Vec::with_capacity(message.tool_invocations.len());
    let mut errors = Vec::new();

    for invocation in &message.tool_invocations {
        let result = match response {
            Some(schema) if invocation.tool_name == schema.name() => {
                match schema.eval(&invocation.tool_args) {
                    Ok(args) => {
                        return InvocationOutcome::FinalResponse(
                            args.value(RESPONSE_FIELD_NAME).cloned().unwrap_or_default(),
                        );
                    }
                    Err(err) => Err(ToolError::validation(schema.name(), err)),
                }
            }
            _ => {
                registry
                    .execute(&invocation.tool_name, &invocation.tool_args)
                    .await
            }
        };

        let content = match result {
            Ok(value) => render_result(value),
            Err(err) => {
                let text = err.to_string();
                errors.push(err);
                text
            }
        };
        messages.push(ToolMessage::new(&invocation.invocation_id, content));
    }

    InvocationOutcome::Messages { messages, errors }
}

fn render_result(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}
