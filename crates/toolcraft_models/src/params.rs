//! Request parameters: which tools a model may call and how it samples.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use toolcraft_schema::{CallableSchema, JsonSchemaFlavor};

/// Controls whether the model calls tools.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolUseMode {
    /// The model decides whether to call tools or respond with text.
    #[default]
    Auto,
    /// The model must call at least one tool.
    Force,
    /// The model must not call tools.
    Never,
    /// The model must call the named tool.
    Specific(String),
}

/// Tools offered to the model for one request.
#[derive(Debug, Clone, Default)]
pub struct ToolParams {
    /// Tool schemas, in the order they are offered.
    pub tools: Vec<CallableSchema>,
    /// Tool selection mode.
    pub tool_use_mode: ToolUseMode,
    /// Whether the model may emit several calls in one reply.
    pub allow_parallel_calls: bool,
}

impl ToolParams {
    /// Creates parameters offering `tools` in [`ToolUseMode::Auto`].
    #[must_use]
    pub fn new(tools: Vec<CallableSchema>) -> Self {
        Self {
            tools,
            ..Self::default()
        }
    }

    /// Adds a tool.
    #[must_use]
    pub fn with_tool(mut self, tool: CallableSchema) -> Self {
        self.tools.push(tool);
        self
    }

    /// Sets the tool selection mode.
    #[must_use]
    pub fn with_mode(mut self, mode: ToolUseMode) -> Self {
        self.tool_use_mode = mode;
        self
    }

    /// Allows or forbids parallel tool calls.
    #[must_use]
    pub fn with_parallel_calls(mut self, allow: bool) -> Self {
        self.allow_parallel_calls = allow;
        self
    }

    /// Looks up a tool schema by name.
    #[must_use]
    pub fn get_tool(&self, name: &str) -> Option<&CallableSchema> {
        self.tools.iter().find(|tool| tool.name() == name)
    }

    /// Returns whether no tools are offered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Emits every tool schema in the given flavor, long descriptions included.
    #[must_use]
    pub fn definitions(&self, flavor: JsonSchemaFlavor) -> Vec<Value> {
        self.tools
            .iter()
            .map(|tool| tool.json_schema(flavor, true))
            .collect()
    }
}

/// Sampling parameters for a generation request.
///
/// Every field is optional; providers apply their own defaults for unset
/// values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Nucleus sampling mass.
    pub top_p: Option<f32>,
    /// Penalty for frequent tokens.
    pub frequency_penalty: Option<f32>,
    /// Penalty for tokens already present.
    pub presence_penalty: Option<f32>,
    /// Sequences that stop generation.
    pub stop_sequences: Vec<String>,
    /// Seed for deterministic sampling, where supported.
    pub random_seed: Option<u64>,
    /// Asks the model to reply with a JSON object.
    pub force_json: bool,
}

impl GenerationParams {
    /// Sets the maximum number of generated tokens.
    #[must_use]
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the nucleus sampling mass.
    #[must_use]
    pub fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Adds a stop sequence.
    #[must_use]
    pub fn stop_sequence(mut self, sequence: impl Into<String>) -> Self {
        self.stop_sequences.push(sequence.into());
        self
    }

    /// Sets the random seed.
    #[must_use]
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Requests JSON output.
    #[must_use]
    pub fn force_json(mut self) -> Self {
        self.force_json = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use toolcraft_schema::{Param, SchemaExtractor, Signature};

    #[test]
    fn tool_use_mode_serde_names() {
        assert_eq!(serde_json::to_value(ToolUseMode::Force).unwrap(), json!("force"));
        assert_eq!(
            serde_json::to_value(ToolUseMode::Specific("search".into())).unwrap(),
            json!({"specific": "search"})
        );
    }

    #[test]
    fn generation_params_load_partially() {
        let params: GenerationParams =
            serde_json::from_value(json!({"temperature": 0.5, "force_json": true})).unwrap();
        assert_eq!(params, GenerationParams::default().temperature(0.5).force_json());
    }

    #[test]
    fn tool_lookup_and_definitions() {
        let search = SchemaExtractor::shared()
            .extract(&Signature::new("search").param(Param::of::<String>("query")))
            .unwrap();
        let params = ToolParams::new(vec![search]).with_mode(ToolUseMode::Force);

        assert!(params.get_tool("search").is_some());
        assert!(params.get_tool("fetch").is_none());

        let definitions = params.definitions(JsonSchemaFlavor::Anthropic);
        assert_eq!(definitions[0]["name"], json!("search"));
        assert_eq!(definitions[0]["input_schema"]["required"], json!(["query"]));
    }
}
