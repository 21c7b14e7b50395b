//! Import of JSON Schema documents, mainly those generated by `schemars`.
//!
//! Only the subset that maps onto [`SchemaNode`] is understood: `type`
//! (including nullable type arrays), `properties`, `required`, `default`,
//! `description`, `enum`, `const`, `items`, `anyOf` / `oneOf`, local `$ref`
//! into `$defs` or `definitions`, date and time formats, integer
//! `minimum` / `maximum`, and string and array length limits. Validation
//! keywords outside that subset are dropped with a warning; shapes outside it
//! are an error.

use crate::error::SchemaError;
use crate::node::{
    ArrayNode, EnumNode, Field, IntegerBounds, LengthBounds, Literal, ObjectNode, PrimitiveKind,
    PrimitiveNode, SchemaNode, StringFormat, UnionNode,
};
use crate::registry::{ExtractorRegistry, TypePattern, extractor_fn};
use schemars::JsonSchema;
use serde_json::{Map, Value};

const MAX_DEPTH: usize = 32;

const DROPPED_KEYWORDS: &[&str] = &[
    "pattern",
    "uniqueItems",
    "multipleOf",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "minProperties",
    "maxProperties",
];

impl ExtractorRegistry {
    /// Registers an exact extractor for `T` built from its `schemars` schema.
    ///
    /// `T` must describe itself as [`TypeDescriptor::of::<T>()`](crate::TypeDescriptor::of).
    /// Conversion runs when a signature using `T` is extracted, so an
    /// inexpressible schema fails there.
    #[must_use]
    pub fn with_json_schema<T: JsonSchema + ?Sized + 'static>(self) -> Self {
        self.with(
            TypePattern::of::<T>(),
            extractor_fn(|_, cx| {
                schema_node_for::<T>().map_err(|err| match err {
                    SchemaError::InvalidJsonSchema(reason) => {
                        SchemaError::InvalidJsonSchema(format!("{}: {reason}", cx.path()))
                    }
                    other => other,
                })
            }),
        )
    }
}

/// Converts the `schemars` schema of `T` into a node.
///
/// # Errors
///
/// Returns [`SchemaError::InvalidJsonSchema`] if the schema uses shapes that
/// cannot be expressed.
pub fn schema_node_for<T: JsonSchema + ?Sized>() -> Result<SchemaNode, SchemaError> {
    let schema = schemars::SchemaGenerator::default().into_root_schema_for::<T>();
    let value = serde_json::to_value(schema)
        .map_err(|err| SchemaError::invalid_json_schema(err.to_string()))?;
    from_json_schema(&value)
}

/// Converts a JSON Schema document into a node.
///
/// # Errors
///
/// Returns [`SchemaError::InvalidJsonSchema`] if the schema uses shapes that
/// cannot be expressed.
pub fn from_json_schema(schema: &Value) -> Result<SchemaNode, SchemaError> {
    let defs = schema
        .get("$defs")
        .or_else(|| schema.get("definitions"))
        .and_then(Value::as_object);
    Converter { defs }.convert(schema, 0)
}

struct Converter<'a> {
    defs: Option<&'a Map<String, Value>>,
}

impl Converter<'_> {
    fn convert(&self, schema: &Value, depth: usize) -> Result<SchemaNode, SchemaError> {
        if depth > MAX_DEPTH {
            return Err(SchemaError::invalid_json_schema(format!(
                "nesting deeper than {MAX_DEPTH} levels (recursive `$ref`?)"
            )));
        }
        let Value::Object(map) = schema else {
            return Err(SchemaError::invalid_json_schema(
                "boolean schemas are not supported",
            ));
        };

        if let Some(reference) = map.get("$ref").and_then(Value::as_str) {
            return self.convert(self.resolve_ref(reference)?, depth + 1);
        }

        if let Some(Value::Array(parts)) = map.get("allOf") {
            return match parts.as_slice() {
                [single] => self.convert(single, depth + 1),
                _ => Err(SchemaError::invalid_json_schema(
                    "`allOf` with more than one schema is not supported",
                )),
            };
        }

        for keyword in DROPPED_KEYWORDS {
            if map.contains_key(*keyword) {
                tracing::warn!(keyword = *keyword, "dropped unsupported JSON schema keyword");
            }
        }

        if let Some(value) = map.get("const") {
            return literal_node(std::slice::from_ref(value));
        }
        if let Some(Value::Array(values)) = map.get("enum") {
            return literal_node(values);
        }

        if let Some(Value::Array(options)) = map.get("anyOf").or_else(|| map.get("oneOf")) {
            return self.convert_options(options, depth);
        }

        match map.get("type") {
            Some(Value::String(name)) => self.convert_typed(name, map, depth),
            Some(Value::Array(names)) => {
                let mut nullable = false;
                let mut nodes = Vec::new();
                for name in names {
                    match name.as_str() {
                        Some("null") => nullable = true,
                        Some(name) => nodes.push(self.convert_typed(name, map, depth)?),
                        None => {
                            return Err(SchemaError::invalid_json_schema(
                                "`type` entries must be strings",
                            ));
                        }
                    }
                }
                wrap_nullable(combine(nodes)?, nullable)
            }
            Some(_) => Err(SchemaError::invalid_json_schema(
                "`type` must be a string or an array",
            )),
            None if map.contains_key("properties") => self.convert_typed("object", map, depth),
            None => Err(SchemaError::invalid_json_schema(
                "unconstrained schemas are not supported",
            )),
        }
    }

    fn resolve_ref(&self, reference: &str) -> Result<&Value, SchemaError> {
        let name = reference
            .strip_prefix("#/$defs/")
            .or_else(|| reference.strip_prefix("#/definitions/"))
            .ok_or_else(|| {
                SchemaError::invalid_json_schema(format!("unsupported `$ref` {reference:?}"))
            })?;
        self.defs
            .and_then(|defs| defs.get(name))
            .ok_or_else(|| SchemaError::invalid_json_schema(format!("unresolved `$ref` {reference:?}")))
    }

    fn convert_options(&self, options: &[Value], depth: usize) -> Result<SchemaNode, SchemaError> {
        let mut nullable = false;
        let mut nodes = Vec::new();
        for option in options {
            if is_null_schema(option) {
                nullable = true;
            } else {
                nodes.push(self.convert(option, depth + 1)?);
            }
        }

        // schemars emits documented unit variants as `oneOf` of `const`s.
        let node = if nodes.len() > 1 && nodes.iter().all(|node| matches!(node, SchemaNode::Enum(_))) {
            let literals = nodes.iter().flat_map(|node| match node {
                SchemaNode::Enum(enumeration) => enumeration.values().to_vec(),
                _ => Vec::new(),
            });
            EnumNode::new(literals)?.into()
        } else {
            combine(nodes)?
        };
        wrap_nullable(node, nullable)
    }

    fn convert_typed(
        &self,
        name: &str,
        map: &Map<String, Value>,
        depth: usize,
    ) -> Result<SchemaNode, SchemaError> {
        match name {
            "string" => {
                let format = match map.get("format").and_then(Value::as_str) {
                    Some("date") => Some(StringFormat::Date),
                    Some("date-time") => Some(StringFormat::DateTime),
                    Some("time") => Some(StringFormat::Time),
                    Some(other) => {
                        tracing::warn!(format = other, "dropped unsupported string format");
                        None
                    }
                    None => None,
                };
                let mut node = PrimitiveNode::new(PrimitiveKind::String);
                if let Some(format) = format {
                    node = node.with_format(format);
                }
                if let Some(length) = length_bounds(map, "minLength", "maxLength") {
                    node = node.with_length(length);
                }
                Ok(node.into())
            }
            "integer" => {
                let min = integer_keyword(map, "minimum", Value::as_i64);
                let max = integer_keyword(map, "maximum", Value::as_u64);
                let node = PrimitiveNode::new(PrimitiveKind::Integer);
                Ok(if min.is_some() || max.is_some() {
                    node.with_bounds(IntegerBounds::new(
                        min.unwrap_or(i64::MIN),
                        max.unwrap_or(u64::MAX),
                    ))
                } else {
                    node
                }
                .into())
            }
            "number" => Ok(SchemaNode::number()),
            "boolean" => Ok(SchemaNode::boolean()),
            "array" => {
                let items = map.get("items").ok_or_else(|| {
                    SchemaError::invalid_json_schema("array schema without `items`")
                })?;
                let mut array = ArrayNode::new(self.convert(items, depth + 1)?);
                if let Some(length) = length_bounds(map, "minItems", "maxItems") {
                    array = array.with_length(length);
                }
                Ok(array.into())
            }
            "object" => self.convert_object(map, depth).map(SchemaNode::from),
            other => Err(SchemaError::invalid_json_schema(format!(
                "unsupported type {other:?}"
            ))),
        }
    }

    fn convert_object(
        &self,
        map: &Map<String, Value>,
        depth: usize,
    ) -> Result<ObjectNode, SchemaError> {
        let empty = Map::new();
        let properties = match map.get("properties") {
            Some(Value::Object(properties)) => properties,
            Some(_) => {
                return Err(SchemaError::invalid_json_schema(
                    "`properties` must be an object",
                ));
            }
            None if map.get("additionalProperties").is_some_and(Value::is_object) => {
                return Err(SchemaError::invalid_json_schema(
                    "map schemas are not supported",
                ));
            }
            None => &empty,
        };
        let required: Vec<&str> = map
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let mut builder = ObjectNode::builder().maybe_description(
            map.get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
        );

        for (name, property) in properties {
            let node = self.convert(property, depth + 1)?;
            let mut field = Field::new(node);

            if let Some(default) = property.get("default") {
                let normalized = field.node().eval(default).map_err(|source| {
                    SchemaError::InvalidDefault {
                        path: name.clone(),
                        source,
                    }
                })?;
                field = field.with_default(normalized);
            } else if !required.contains(&name.as_str()) {
                field = field.not_required();
            }

            if let Some(description) = property.get("description").and_then(Value::as_str) {
                field = field.with_description(description);
            }
            builder = builder.field(name.clone(), field);
        }

        builder.build()
    }
}

/// Reads an integer bound, warning when it is present but not representable.
fn integer_keyword<T>(
    map: &Map<String, Value>,
    keyword: &'static str,
    read: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    let value = map.get(keyword)?;
    let bound = read(value);
    if bound.is_none() {
        tracing::warn!(keyword, %value, "dropped integer bound outside the supported range");
    }
    bound
}

fn length_bounds(map: &Map<String, Value>, min_key: &str, max_key: &str) -> Option<LengthBounds> {
    let read = |key: &str| {
        map.get(key)
            .and_then(Value::as_u64)
            .and_then(|len| usize::try_from(len).ok())
    };
    let (min, max) = (read(min_key), read(max_key));
    (min.is_some() || max.is_some()).then(|| LengthBounds::new(min.unwrap_or(0), max))
}

fn is_null_schema(schema: &Value) -> bool {
    schema.get("type").and_then(Value::as_str) == Some("null")
        || schema.get("const").is_some_and(Value::is_null)
}

fn literal_node(values: &[Value]) -> Result<SchemaNode, SchemaError> {
    let mut nullable = false;
    let mut literals = Vec::new();
    for value in values {
        match value {
            Value::Null => nullable = true,
            Value::Bool(value) => literals.push(Literal::Bool(*value)),
            Value::String(value) => literals.push(Literal::Str(value.clone())),
            Value::Number(number) => match number.as_i64() {
                Some(value) => literals.push(Literal::Int(value)),
                None => {
                    return Err(SchemaError::invalid_json_schema(format!(
                        "non-integer enum value {number}"
                    )));
                }
            },
            other => {
                return Err(SchemaError::invalid_json_schema(format!(
                    "unsupported enum value {other}"
                )));
            }
        }
    }
    let node = EnumNode::new(literals)
        .map_err(|_| SchemaError::invalid_json_schema("empty enumeration"))?;
    wrap_nullable(node.into(), nullable)
}

fn combine(mut nodes: Vec<SchemaNode>) -> Result<SchemaNode, SchemaError> {
    match nodes.len() {
        0 => Err(SchemaError::invalid_json_schema("no non-null option")),
        1 => Ok(nodes.remove(0)),
        _ => UnionNode::new(nodes).map(SchemaNode::from),
    }
}

fn wrap_nullable(node: SchemaNode, nullable: bool) -> Result<SchemaNode, SchemaError> {
    Ok(if nullable {
        SchemaNode::optional(node)
    } else {
        node
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IssueKind;
    use serde_json::json;

    #[test]
    fn converts_objects_with_refs() {
        let schema = json!({
            "type": "object",
            "properties": {
                "level": {"$ref": "#/$defs/Level"},
                "count": {"type": "integer", "format": "uint8", "minimum": 0, "maximum": 255},
                "note": {"type": ["string", "null"], "description": "Free text."}
            },
            "required": ["level", "count"],
            "$defs": {
                "Level": {"type": "string", "enum": ["low", "high"]}
            }
        });

        let SchemaNode::Object(object) = from_json_schema(&schema).unwrap() else {
            panic!("expected object");
        };
        assert_eq!(
            object.field("level").unwrap().node(),
            &SchemaNode::enumeration(["low", "high"]).unwrap()
        );
        assert!(object.field("count").unwrap().is_required());

        let note = object.field("note").unwrap();
        assert!(!note.is_required());
        assert_eq!(note.node(), &SchemaNode::optional(SchemaNode::string()));
        assert_eq!(note.description(), Some("Free text."));
    }

    #[test]
    fn any_of_with_null_is_optional() {
        let schema = json!({"anyOf": [{"type": "array", "items": {"type": "boolean"}}, {"type": "null"}]});
        assert_eq!(
            from_json_schema(&schema).unwrap(),
            SchemaNode::optional(SchemaNode::array(SchemaNode::boolean()))
        );
    }

    #[test]
    fn one_of_consts_merge_into_enum() {
        let schema = json!({"oneOf": [
            {"const": "a", "description": "First."},
            {"const": "b", "description": "Second."}
        ]});
        assert_eq!(
            from_json_schema(&schema).unwrap(),
            SchemaNode::enumeration(["a", "b"]).unwrap()
        );
    }

    #[test]
    fn rejects_maps_and_recursion() {
        let map = json!({"type": "object", "additionalProperties": {"type": "string"}});
        assert!(matches!(
            from_json_schema(&map),
            Err(SchemaError::InvalidJsonSchema(_))
        ));

        let recursive = json!({
            "$ref": "#/$defs/Node",
            "$defs": {"Node": {"$ref": "#/$defs/Node"}}
        });
        assert!(matches!(
            from_json_schema(&recursive),
            Err(SchemaError::InvalidJsonSchema(_))
        ));
    }

    #[test]
    fn length_limits_are_imported() {
        let schema = json!({
            "type": "object",
            "properties": {
                "initial": {"type": "string", "minLength": 1, "maxLength": 1},
                "point": {"type": "array", "items": {"type": "number"}, "minItems": 2, "maxItems": 2},
                "tags": {"type": "array", "items": {"type": "string"}, "maxItems": 5}
            },
            "required": ["initial", "point", "tags"]
        });

        let node = from_json_schema(&schema).unwrap();
        assert!(node.eval(&json!({"initial": "a", "point": [1, 2], "tags": []})).is_ok());

        let err = node
            .eval(&json!({"initial": "ab", "point": [1], "tags": ["x"]}))
            .unwrap_err();
        assert_eq!(err.paths(), vec!["initial", "point"]);
        assert!(matches!(
            err.issues()[1].kind,
            IssueKind::LengthOutOfRange { length: 1, .. }
        ));
    }

    #[test]
    fn negative_maximum_is_dropped() {
        let schema = json!({"type": "integer", "minimum": -10, "maximum": -1});
        let SchemaNode::Primitive(node) = from_json_schema(&schema).unwrap() else {
            panic!("expected primitive");
        };
        assert_eq!(node.bounds(), Some(IntegerBounds::new(-10, u64::MAX)));
        assert_eq!(integer_keyword(&Map::new(), "maximum", Value::as_u64), None);
    }

    #[derive(schemars::JsonSchema)]
    #[expect(dead_code, reason = "only the schema is used")]
    struct Pagination {
        /// Page to fetch.
        page: u32,
        size: Option<u16>,
    }

    #[test]
    fn schemars_types_convert() {
        let SchemaNode::Object(object) = schema_node_for::<Pagination>().unwrap() else {
            panic!("expected object");
        };
        let page = object.field("page").unwrap();
        assert!(page.is_required());
        assert_eq!(page.description(), Some("Page to fetch."));
        assert!(object.field("size").unwrap().node().is_nullable());
    }
}
