//! The call-and-correct loop between a model and a tool registry.
//!
//! [`call_and_use_tools`] sends the conversation to a model, runs the tool
//! calls in each reply and feeds the results back until the model answers.
//! Tool calls that fail validation are returned to the model as tool
//! messages listing every issue, so it can fix them on the next turn; a
//! budget of such corrections bounds the loop.

use crate::error::ToolError;
use crate::invoke::{InvocationOutcome, invoke_tools};
use crate::registry::ToolRegistry;
use serde_json::Value;
use thiserror::Error;
use toolcraft_models::{FinishReason, GenerationParams, Message, Model, ModelError, ToolUseMode};
use toolcraft_schema::CallableSchema;

/// Settings for [`call_and_use_tools`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeOptions {
    /// How many replies with failing tool calls are answered with the errors
    /// before giving up.
    pub max_retries_on_invalid_output: usize,
    /// Whether a reply without tool calls ends the loop with its text.
    pub allow_plain_text_response: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            max_retries_on_invalid_output: 3,
            allow_plain_text_response: true,
        }
    }
}

impl RuntimeOptions {
    /// Sets the correction budget.
    #[must_use]
    pub fn max_retries_on_invalid_output(mut self, retries: usize) -> Self {
        self.max_retries_on_invalid_output = retries;
        self
    }

    /// Sets whether plain text ends the loop.
    #[must_use]
    pub fn allow_plain_text_response(mut self, allow: bool) -> Self {
        self.allow_plain_text_response = allow;
        self
    }
}

/// Why [`call_and_use_tools`] stopped without an answer.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The model failed the request or cut its reply short.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A tool call still failed after the correction budget was spent.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// The model answered with text where a tool call was required.
    #[error("model stopped without calling a tool")]
    NoToolCalls,

    /// The model returned no candidate reply.
    #[error("model returned no response options")]
    EmptyResponse,
}

/// Runs the conversation until the model answers.
///
/// Every registered tool is offered. When `response` is given it is offered
/// too, tool use is forced, and a valid call to it ends the loop with the
/// evaluated answer. Otherwise a reply without tool calls ends the loop with
/// its text, if [`RuntimeOptions::allow_plain_text_response`] permits it.
///
/// # Errors
///
/// - [`RuntimeError::Model`] for provider failures, content filtering and
///   truncated replies.
/// - [`RuntimeError::Tool`] with the first failing call once
///   [`RuntimeOptions::max_retries_on_invalid_output`] replies with failing
///   calls have already been sent back for correction.
/// - [`RuntimeError::NoToolCalls`] for a text reply that is not allowed.
pub async fn call_and_use_tools<M>(
    model: &M,
    mut messages: Vec<Message>,
    registry: &ToolRegistry,
    response: Option<&CallableSchema>,
    params: &GenerationParams,
    options: RuntimeOptions,
) -> Result<Value, RuntimeError>
where
    M: Model + ?Sized,
{
    let mode = if response.is_some() {
        ToolUseMode::Force
    } else {
        ToolUseMode::Auto
    };
    let mut tools = registry.tool_params(mode);
    if let Some(schema) = response {
        tools = tools.with_tool(schema.clone());
    }

    let mut retries_left = options.max_retries_on_invalid_output;
    loop {
        let option = model
            .reply(&messages, &tools, params, 1)
            .await?
            .into_first()
            .ok_or(RuntimeError::EmptyResponse)?;
        let finish_reason = option.finish_reason;
        let message = option.ensure_complete()?;

        if !message.has_tool_invocations() {
            if finish_reason == FinishReason::Stop && options.allow_plain_text_response {
                return Ok(Value::String(message.content.unwrap_or_default()));
            }
            return Err(RuntimeError::NoToolCalls);
        }

        let outcome = invoke_tools(registry, &message, response).await;
        messages.push(message.into());

        let (results, errors) = match outcome {
            InvocationOutcome::FinalResponse(value) => return Ok(value),
            InvocationOutcome::Messages {
                messages: results,
                errors,
            } => (results, errors),
        };
        messages.extend(results.into_iter().map(Message::from));

        if let Some(first) = errors.into_iter().next() {
            if retries_left == 0 {
                return Err(first.into());
            }
            retries_left -= 1;
            tracing::warn!(
                model = model.name(),
                error = %first,
                retries_left,
                "tool call failed, asking the model to correct it"
            );
        }
    }
}
