//! JSON Schema emission.
//!
//! [`emit`] is a stateless walk over a node tree. Every dialect decision is
//! delegated to the [`FlavorStrategy`], and output keys keep insertion order
//! so emitted schemas are byte-identical across runs.

use crate::flavor::{FlavorStrategy, JsonSchemaFlavor, NullableEncoding};
use crate::node::{
    EnumNode, Field, LengthBounds, Literal, ObjectNode, PrimitiveKind, PrimitiveNode, SchemaNode,
    UnionNode,
};
use serde_json::{Map, Value, json};

/// Emits the JSON Schema for a node.
#[must_use]
pub fn emit(node: &SchemaNode, strategy: &dyn FlavorStrategy) -> Value {
    Value::Object(emit_node(node, strategy))
}

impl SchemaNode {
    /// Emits the JSON Schema for this node in a built-in dialect.
    #[must_use]
    pub fn emit(&self, flavor: JsonSchemaFlavor) -> Value {
        emit(self, flavor.strategy())
    }
}

fn emit_node(node: &SchemaNode, strategy: &dyn FlavorStrategy) -> Map<String, Value> {
    match node {
        SchemaNode::Primitive(primitive) => emit_primitive(primitive, strategy),
        SchemaNode::Enum(enumeration) => emit_enum(enumeration),
        SchemaNode::Object(object) => {
            with_description(object.description(), emit_object(object, strategy))
        }
        SchemaNode::Array(array) => {
            let mut schema = Map::new();
            schema.insert("type".to_string(), json!("array"));
            schema.insert(
                "items".to_string(),
                Value::Object(emit_node(array.item(), strategy)),
            );
            if strategy.emit_bounds() {
                emit_length(&mut schema, array.length(), "minItems", "maxItems");
            }
            schema
        }
        SchemaNode::Optional(optional) => emit_nullable(optional.inner(), strategy),
        SchemaNode::Union(union) => emit_union(union, strategy),
    }
}

fn emit_primitive(primitive: &PrimitiveNode, strategy: &dyn FlavorStrategy) -> Map<String, Value> {
    let mut schema = Map::new();
    schema.insert("type".to_string(), json!(primitive.kind().type_name()));

    if strategy.emit_formats()
        && let Some(format) = primitive.format()
    {
        schema.insert("format".to_string(), json!(format.as_str()));
    }

    if strategy.emit_bounds()
        && primitive.kind() == PrimitiveKind::Integer
        && let Some(bounds) = primitive.bounds()
    {
        if let Some(min) = bounds.explicit_min() {
            schema.insert("minimum".to_string(), json!(min));
        }
        if let Some(max) = bounds.explicit_max() {
            schema.insert("maximum".to_string(), json!(max));
        }
    }

    if strategy.emit_bounds() && primitive.kind() == PrimitiveKind::String {
        emit_length(&mut schema, primitive.length(), "minLength", "maxLength");
    }

    schema
}

fn emit_length(
    schema: &mut Map<String, Value>,
    length: Option<LengthBounds>,
    min_key: &str,
    max_key: &str,
) {
    let Some(length) = length else {
        return;
    };
    if length.min > 0 {
        schema.insert(min_key.to_string(), json!(length.min));
    }
    if let Some(max) = length.max {
        schema.insert(max_key.to_string(), json!(max));
    }
}

fn emit_enum(enumeration: &EnumNode) -> Map<String, Value> {
    let mut schema = Map::new();
    let types = enumeration.type_names();
    let type_value = match types.as_slice() {
        [single] => json!(single),
        many => json!(many),
    };
    schema.insert("type".to_string(), type_value);
    schema.insert(
        "enum".to_string(),
        Value::Array(enumeration.values().iter().map(Literal::to_value).collect()),
    );
    schema
}

fn emit_union(union: &UnionNode, strategy: &dyn FlavorStrategy) -> Map<String, Value> {
    let mut schema = Map::new();

    if union.is_primitive() {
        let mut types: Vec<&'static str> = Vec::new();
        for option in union.options() {
            if let SchemaNode::Primitive(primitive) = option {
                let name = primitive.kind().type_name();
                if !types.contains(&name) {
                    types.push(name);
                }
            }
        }
        // `number` already admits every integer.
        if types.contains(&"number") {
            types.retain(|name| *name != "integer");
        }
        let type_value = match types.as_slice() {
            [single] => json!(single),
            many => json!(many),
        };
        schema.insert("type".to_string(), type_value);
        return schema;
    }

    schema.insert(
        "anyOf".to_string(),
        Value::Array(
            union
                .options()
                .iter()
                .map(|option| Value::Object(emit_node(option, strategy)))
                .collect(),
        ),
    );
    schema
}

fn emit_nullable(inner: &SchemaNode, strategy: &dyn FlavorStrategy) -> Map<String, Value> {
    let mut schema = emit_node(inner, strategy);

    match strategy.nullable_encoding() {
        NullableEncoding::Omit => schema,
        NullableEncoding::NullableFlag => {
            schema.insert("nullable".to_string(), Value::Bool(true));
            schema
        }
        NullableEncoding::TypeArray => {
            let simple = matches!(
                inner,
                SchemaNode::Primitive(_) | SchemaNode::Enum(_) | SchemaNode::Union(_)
            );
            if simple && add_null_type(&mut schema) {
                if let Some(Value::Array(values)) = schema.get_mut("enum") {
                    values.push(Value::Null);
                }
                return schema;
            }

            let description = schema.remove("description");
            let mut wrapper = Map::new();
            if let Some(description) = description {
                wrapper.insert("description".to_string(), description);
            }
            wrapper.insert(
                "anyOf".to_string(),
                json!([Value::Object(schema), {"type": "null"}]),
            );
            wrapper
        }
    }
}

/// Adds `"null"` to a `type` keyword. Returns false when there is no `type` to extend.
fn add_null_type(schema: &mut Map<String, Value>) -> bool {
    let Some(type_value) = schema.get_mut("type") else {
        return false;
    };
    match type_value {
        Value::String(_) => {
            let name = type_value.take();
            *type_value = json!([name, "null"]);
            true
        }
        Value::Array(names) => {
            names.push(json!("null"));
            true
        }
        _ => false,
    }
}

fn emit_object(object: &ObjectNode, strategy: &dyn FlavorStrategy) -> Map<String, Value> {
    let require_all = strategy.require_all_fields();

    let mut properties = Map::new();
    for (name, field) in object.fields() {
        properties.insert(
            name.to_string(),
            Value::Object(emit_field(field, require_all, strategy)),
        );
    }

    // Without a way to spell null, a nullable field can only be expressed by leaving it out.
    let omit_nullable = strategy.nullable_encoding() == NullableEncoding::Omit;
    let required: Vec<Value> = if require_all {
        object.fields().map(|(name, _)| json!(name)).collect()
    } else {
        object
            .fields()
            .filter(|(_, field)| field.is_required())
            .filter(|(_, field)| !(omit_nullable && field.node().is_nullable()))
            .map(|(name, _)| json!(name))
            .collect()
    };

    let mut schema = Map::new();
    schema.insert("type".to_string(), json!("object"));
    schema.insert("properties".to_string(), Value::Object(properties));
    schema.insert("required".to_string(), Value::Array(required));
    if strategy.forbid_additional_properties() {
        schema.insert("additionalProperties".to_string(), Value::Bool(false));
    }
    schema
}

fn emit_field(field: &Field, require_all: bool, strategy: &dyn FlavorStrategy) -> Map<String, Value> {
    let node = field.node();

    // A nested record's own doc is appended to the field doc.
    let (nested_description, body) = match node {
        SchemaNode::Object(object) => (object.description(), emit_object(object, strategy)),
        _ if require_all && !field.is_required() && !node.is_nullable() => {
            (None, emit_nullable(node, strategy))
        }
        _ => (None, emit_node(node, strategy)),
    };

    let body = match node {
        SchemaNode::Object(_) if require_all && !field.is_required() => {
            nullable_object(body, strategy)
        }
        _ => body,
    };

    let description = match (field.description(), nested_description) {
        (Some(outer), Some(inner)) => Some(format!("{outer}\n\n{inner}")),
        (Some(outer), None) => Some(outer.to_string()),
        (None, Some(inner)) => Some(inner.to_string()),
        (None, None) => None,
    };

    let mut schema = with_description(description.as_deref(), body);
    if strategy.emit_defaults()
        && let Some(default) = field.default()
    {
        schema.insert("default".to_string(), default.clone());
    }
    schema
}

fn nullable_object(body: Map<String, Value>, strategy: &dyn FlavorStrategy) -> Map<String, Value> {
    match strategy.nullable_encoding() {
        NullableEncoding::Omit => body,
        NullableEncoding::NullableFlag => {
            let mut body = body;
            body.insert("nullable".to_string(), Value::Bool(true));
            body
        }
        NullableEncoding::TypeArray => {
            let mut wrapper = Map::new();
            wrapper.insert(
                "anyOf".to_string(),
                json!([Value::Object(body), {"type": "null"}]),
            );
            wrapper
        }
    }
}

fn with_description(description: Option<&str>, body: Map<String, Value>) -> Map<String, Value> {
    let Some(description) = description else {
        return body;
    };
    let mut schema = Map::new();
    schema.insert("description".to_string(), json!(description));
    for (key, value) in body {
        if key != "description" {
            schema.insert(key, value);
        }
    }
    schema
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{IntegerBounds, PrimitiveNode};

    fn optional_field_object() -> SchemaNode {
        ObjectNode::builder()
            .field("name", Field::new(SchemaNode::string()))
            .field(
                "nickname",
                Field::new(SchemaNode::optional(SchemaNode::string())).with_default(Value::Null),
            )
            .build()
            .unwrap()
            .into()
    }

    #[test]
    fn openai_uses_type_array_for_nullable() {
        let schema = optional_field_object().emit(JsonSchemaFlavor::OpenAi);
        assert_eq!(
            schema,
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "nickname": {"type": ["string", "null"], "default": null}
                },
                "required": ["name"]
            })
        );
    }

    #[test]
    fn strict_requires_every_field() {
        let schema = optional_field_object().emit(JsonSchemaFlavor::OpenAiStrict);
        assert_eq!(
            schema,
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "nickname": {"type": ["string", "null"]}
                },
                "required": ["name", "nickname"],
                "additionalProperties": false
            })
        );
    }

    #[test]
    fn strict_wraps_defaulted_fields_as_nullable() {
        let node: SchemaNode = ObjectNode::builder()
            .field(
                "limit",
                Field::new(SchemaNode::integer()).with_default(json!(10)),
            )
            .build()
            .unwrap()
            .into();

        let schema = node.emit(JsonSchemaFlavor::OpenAiStrict);
        assert_eq!(schema["properties"]["limit"], json!({"type": ["integer", "null"]}));
        assert_eq!(schema["required"], json!(["limit"]));
    }

    #[test]
    fn anthropic_and_gemini_nullability() {
        let anthropic = optional_field_object().emit(JsonSchemaFlavor::Anthropic);
        assert_eq!(
            anthropic["properties"]["nickname"],
            json!({"type": "string", "default": null})
        );
        assert_eq!(anthropic["required"], json!(["name"]));

        let gemini = optional_field_object().emit(JsonSchemaFlavor::Gemini);
        assert_eq!(
            gemini["properties"]["nickname"],
            json!({"type": "string", "nullable": true, "default": null})
        );
    }

    #[test]
    fn omitted_nullability_drops_required_nullable_fields() {
        let node: SchemaNode = ObjectNode::builder()
            .field("name", Field::new(SchemaNode::string()))
            .field("nickname", Field::new(SchemaNode::optional(SchemaNode::string())))
            .build()
            .unwrap()
            .into();

        let anthropic = node.emit(JsonSchemaFlavor::Anthropic);
        assert_eq!(anthropic["required"], json!(["name"]));
        assert_eq!(anthropic["properties"]["nickname"], json!({"type": "string"}));

        let openai = node.emit(JsonSchemaFlavor::OpenAi);
        assert_eq!(openai["required"], json!(["name", "nickname"]));
    }

    #[test]
    fn nullable_composite_uses_any_of() {
        let node = SchemaNode::optional(SchemaNode::array(SchemaNode::integer()));
        assert_eq!(
            node.emit(JsonSchemaFlavor::OpenAi),
            json!({"anyOf": [{"type": "array", "items": {"type": "integer"}}, {"type": "null"}]})
        );
    }

    #[test]
    fn nullable_enum_lists_null() {
        let node = SchemaNode::optional(SchemaNode::enumeration(["a", "b"]).unwrap());
        assert_eq!(
            node.emit(JsonSchemaFlavor::OpenAi),
            json!({"type": ["string", "null"], "enum": ["a", "b", null]})
        );
    }

    #[test]
    fn bounds_and_formats() {
        let byte = SchemaNode::Primitive(
            PrimitiveNode::new(PrimitiveKind::Integer).with_bounds(IntegerBounds::new(0, 255)),
        );
        assert_eq!(
            byte.emit(JsonSchemaFlavor::OpenAi),
            json!({"type": "integer", "minimum": 0, "maximum": 255})
        );
        assert_eq!(
            byte.emit(JsonSchemaFlavor::OpenAiStrict),
            json!({"type": "integer"})
        );

        let unsigned = SchemaNode::Primitive(
            PrimitiveNode::new(PrimitiveKind::Integer)
                .with_bounds(IntegerBounds::new(0, u64::MAX)),
        );
        assert_eq!(
            unsigned.emit(JsonSchemaFlavor::OpenAi),
            json!({"type": "integer", "minimum": 0})
        );
    }

    #[test]
    fn length_bounds() {
        let letter = SchemaNode::Primitive(
            PrimitiveNode::new(PrimitiveKind::String).with_length(LengthBounds::exact(1)),
        );
        assert_eq!(
            letter.emit(JsonSchemaFlavor::OpenAi),
            json!({"type": "string", "minLength": 1, "maxLength": 1})
        );
        assert_eq!(letter.emit(JsonSchemaFlavor::OpenAiStrict), json!({"type": "string"}));

        let tags: SchemaNode = crate::node::ArrayNode::new(SchemaNode::string())
            .with_length(LengthBounds::new(0, Some(3)))
            .into();
        assert_eq!(
            tags.emit(JsonSchemaFlavor::Gemini),
            json!({"type": "array", "items": {"type": "string"}, "maxItems": 3})
        );
    }

    #[test]
    fn primitive_union_collapses_to_type_array() {
        let node: SchemaNode = UnionNode::new(vec![
            SchemaNode::integer(),
            SchemaNode::number(),
            SchemaNode::string(),
        ])
        .unwrap()
        .into();

        assert_eq!(
            node.emit(JsonSchemaFlavor::OpenAi),
            json!({"type": ["number", "string"]})
        );
    }

    #[test]
    fn nested_object_descriptions_are_joined() {
        let inner = ObjectNode::builder()
            .description("Retry policy.")
            .field("attempts", Field::new(SchemaNode::integer()))
            .build()
            .unwrap();
        let outer: SchemaNode = ObjectNode::builder()
            .field(
                "retry",
                Field::new(inner).with_description("How to retry failed calls."),
            )
            .build()
            .unwrap()
            .into();

        let schema = outer.emit(JsonSchemaFlavor::OpenAi);
        assert_eq!(
            schema["properties"]["retry"]["description"],
            json!("How to retry failed calls.\n\nRetry policy.")
        );
    }

    #[test]
    fn emission_preserves_field_order() {
        let node: SchemaNode = ObjectNode::builder()
            .field("zeta", Field::new(SchemaNode::string()))
            .field("alpha", Field::new(SchemaNode::string()))
            .build()
            .unwrap()
            .into();

        let text = serde_json::to_string(&node.emit(JsonSchemaFlavor::OpenAi)).unwrap();
        assert!(text.find("zeta").unwrap() < text.find("alpha").unwrap());
    }
}
