//! The [`Model`] trait implemented by provider backends.

use crate::error::ModelError;
use crate::params::{GenerationParams, ToolParams};
use crate::response::ModelResponse;
use crate::types::Message;
use async_trait::async_trait;
use toolcraft_schema::JsonSchemaFlavor;

/// Rough number of characters per token used by the default estimate.
const CHARS_PER_TOKEN: usize = 4;

/// A chat model that can call tools.
///
/// Transport, retries and provider-specific encoding live in implementations;
/// this crate only fixes the boundary types.
#[async_trait]
pub trait Model: Send + Sync + 'static {
    /// Name of the model, e.g. `gpt-4o`.
    fn name(&self) -> &str;

    /// Maximum prompt plus completion length in tokens.
    fn context_length(&self) -> usize;

    /// The dialect this model expects tool schemas in.
    fn schema_flavor(&self) -> JsonSchemaFlavor {
        JsonSchemaFlavor::default()
    }

    /// Generates `num_options` candidate replies.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if the provider rejects or fails the request.
    async fn reply(
        &self,
        messages: &[Message],
        tools: &ToolParams,
        params: &GenerationParams,
        num_options: usize,
    ) -> Result<ModelResponse, ModelError>;

    /// Rough estimate of the prompt size in tokens.
    ///
    /// Counts the rendered messages and the emitted tool schemas at about four
    /// characters per token. Implementations with a tokenizer should override
    /// this.
    fn estimate_num_tokens(&self, messages: &[Message], tools: &ToolParams) -> usize {
        let message_chars: usize = messages
            .iter()
            .map(|message| message.to_string().chars().count())
            .sum();
        let tool_chars: usize = tools
            .definitions(self.schema_flavor())
            .iter()
            .map(|definition| definition.to_string().chars().count())
            .sum();
        (message_chars + tool_chars).div_ceil(CHARS_PER_TOKEN)
    }
}
