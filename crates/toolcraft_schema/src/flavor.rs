//! Provider dialects of JSON Schema.
//!
//! A [`FlavorStrategy`] answers a handful of questions the emitter asks while
//! walking a [`SchemaNode`](crate::SchemaNode) tree. The nodes themselves know
//! nothing about providers, so a new dialect is a new strategy and nothing
//! else.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// How a nullable value is spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullableEncoding {
    /// `"type": ["string", "null"]`, or `anyOf` with `{"type": "null"}` for composites.
    TypeArray,
    /// `"nullable": true` next to the inner type.
    NullableFlag,
    /// Nullability is left out; the field is simply not required.
    Omit,
}

/// Decisions that vary between provider dialects.
pub trait FlavorStrategy: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Encoding of nullable nodes.
    fn nullable_encoding(&self) -> NullableEncoding;

    /// Whether every property must be listed in `required`.
    ///
    /// Fields that are not required in the schema are then emitted as nullable.
    fn require_all_fields(&self) -> bool {
        false
    }

    /// Whether objects carry `"additionalProperties": false`.
    fn forbid_additional_properties(&self) -> bool {
        false
    }

    /// Whether field defaults are emitted.
    fn emit_defaults(&self) -> bool {
        true
    }

    /// Whether integer bounds are emitted as `minimum` / `maximum`.
    fn emit_bounds(&self) -> bool {
        true
    }

    /// Whether string formats are emitted.
    fn emit_formats(&self) -> bool {
        true
    }

    /// Wraps the parameters schema in the provider's tool definition.
    fn envelope(&self, name: &str, description: Option<&str>, parameters: Value) -> Value;
}

fn function_envelope(
    name: &str,
    description: Option<&str>,
    schema_key: &str,
    parameters: Value,
) -> Map<String, Value> {
    let mut envelope = Map::new();
    envelope.insert("name".to_string(), json!(name));
    if let Some(description) = description {
        envelope.insert("description".to_string(), json!(description));
    }
    envelope.insert(schema_key.to_string(), parameters);
    envelope
}

/// OpenAI function calling, non-strict.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiStrategy;

impl FlavorStrategy for OpenAiStrategy {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn nullable_encoding(&self) -> NullableEncoding {
        NullableEncoding::TypeArray
    }

    fn envelope(&self, name: &str, description: Option<&str>, parameters: Value) -> Value {
        Value::Object(function_envelope(name, description, "parameters", parameters))
    }
}

/// OpenAI structured outputs (`strict: true`).
///
/// Every property is required, optional ones become nullable, objects are
/// closed, and `default` / `minimum` / `maximum` are not emitted.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiStrictStrategy;

impl FlavorStrategy for OpenAiStrictStrategy {
    fn name(&self) -> &'static str {
        "openai_strict"
    }

    fn nullable_encoding(&self) -> NullableEncoding {
        NullableEncoding::TypeArray
    }

    fn require_all_fields(&self) -> bool {
        true
    }

    fn forbid_additional_properties(&self) -> bool {
        true
    }

    fn emit_defaults(&self) -> bool {
        false
    }

    fn emit_bounds(&self) -> bool {
        false
    }

    fn envelope(&self, name: &str, description: Option<&str>, parameters: Value) -> Value {
        let mut envelope = function_envelope(name, description, "parameters", parameters);
        envelope.insert("strict".to_string(), Value::Bool(true));
        Value::Object(envelope)
    }
}

/// Anthropic tool use.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnthropicStrategy;

impl FlavorStrategy for AnthropicStrategy {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn nullable_encoding(&self) -> NullableEncoding {
        NullableEncoding::Omit
    }

    fn envelope(&self, name: &str, description: Option<&str>, parameters: Value) -> Value {
        Value::Object(function_envelope(
            name,
            description,
            "input_schema",
            parameters,
        ))
    }
}

/// Gemini function declarations (OpenAPI-style `nullable`).
#[derive(Debug, Clone, Copy, Default)]
pub struct GeminiStrategy;

impl FlavorStrategy for GeminiStrategy {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn nullable_encoding(&self) -> NullableEncoding {
        NullableEncoding::NullableFlag
    }

    fn envelope(&self, name: &str, description: Option<&str>, parameters: Value) -> Value {
        Value::Object(function_envelope(name, description, "parameters", parameters))
    }
}

/// Built-in provider dialects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonSchemaFlavor {
    /// [`OpenAiStrategy`].
    #[default]
    OpenAi,
    /// [`OpenAiStrictStrategy`].
    OpenAiStrict,
    /// [`AnthropicStrategy`].
    Anthropic,
    /// [`GeminiStrategy`].
    Gemini,
}

impl JsonSchemaFlavor {
    /// Returns the strategy implementing this dialect.
    #[must_use]
    pub fn strategy(self) -> &'static dyn FlavorStrategy {
        match self {
            Self::OpenAi => &OpenAiStrategy,
            Self::OpenAiStrict => &OpenAiStrictStrategy,
            Self::Anthropic => &AnthropicStrategy,
            Self::Gemini => &GeminiStrategy,
        }
    }
}
