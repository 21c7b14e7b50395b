//! Evaluation of decoded JSON against schema nodes.
//!
//! Evaluation is a single pass that never stops at the first problem: every
//! violation is collected with its [`FieldPath`] and reported together in one
//! [`ValidationError`]. On success the returned value is normalized, meaning
//! defaults are filled, integral floats are turned into integers, and unknown
//! keys are handled according to [`UnknownFieldPolicy`].

use crate::error::{ArgumentError, FieldPath, IssueKind, ValidationError, ValidationIssue};
use crate::node::{LengthBounds, ObjectNode, PrimitiveKind, PrimitiveNode, SchemaNode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What to do with object keys that the schema does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFieldPolicy {
    /// Record the key in [`Arguments::unknown_fields`] and drop it.
    #[default]
    Ignore,
    /// Record the key and keep its value untouched.
    Preserve,
    /// Report the key as a validation issue.
    Reject,
}

/// Settings for one evaluation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalOptions {
    /// Handling of undeclared object keys.
    pub unknown_fields: UnknownFieldPolicy,
}

impl EvalOptions {
    /// Default options: unknown keys are recorded and dropped.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that reject unknown keys.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            unknown_fields: UnknownFieldPolicy::Reject,
        }
    }

    /// Sets the unknown key policy.
    #[must_use]
    pub fn with_unknown_fields(mut self, policy: UnknownFieldPolicy) -> Self {
        self.unknown_fields = policy;
        self
    }
}

/// Returns the JSON type name of a value, as used in mismatch messages.
#[must_use]
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

struct Evaluator {
    options: EvalOptions,
    issues: Vec<ValidationIssue>,
    unknown: Vec<FieldPath>,
}

impl Evaluator {
    fn new(options: EvalOptions) -> Self {
        Self {
            options,
            issues: Vec::new(),
            unknown: Vec::new(),
        }
    }

    fn issue(&mut self, path: &FieldPath, kind: IssueKind) {
        self.issues.push(ValidationIssue::new(path.clone(), kind));
    }

    fn mismatch(&mut self, path: &FieldPath, node: &SchemaNode, value: &Value) -> Value {
        self.issue(
            path,
            IssueKind::TypeMismatch {
                expected: node.label(),
                found: json_type_name(value),
            },
        );
        Value::Null
    }

    fn finish<T>(self, value: T) -> Result<(T, Vec<FieldPath>), ValidationError> {
        if self.issues.is_empty() {
            Ok((value, self.unknown))
        } else {
            Err(ValidationError::new(self.issues))
        }
    }

    fn eval(&mut self, node: &SchemaNode, value: &Value, path: &FieldPath) -> Value {
        match node {
            SchemaNode::Primitive(primitive) => self.eval_primitive(node, primitive, value, path),
            SchemaNode::Enum(enumeration) => {
                if enumeration.contains(value) {
                    value.clone()
                } else {
                    self.issue(
                        path,
                        IssueKind::UnknownLiteral {
                            value: value.clone(),
                            allowed: enumeration.values().to_vec(),
                        },
                    );
                    Value::Null
                }
            }
            SchemaNode::Object(object) => match value {
                Value::Object(map) => Value::Object(self.eval_object(object, map, path)),
                _ => self.mismatch(path, node, value),
            },
            SchemaNode::Array(array) => match value {
                Value::Array(items) => {
                    self.check_length(path, array.length(), items.len());
                    Value::Array(
                        items
                            .iter()
                            .enumerate()
                            .map(|(i, item)| self.eval(array.item(), item, &path.index(i)))
                            .collect(),
                    )
                }
                _ => self.mismatch(path, node, value),
            },
            SchemaNode::Optional(optional) => match value {
                Value::Null => Value::Null,
                _ => self.eval(optional.inner(), value, path),
            },
            SchemaNode::Union(union) => {
                for option in union.options() {
                    let mut trial = Evaluator::new(self.options);
                    let normalized = trial.eval(option, value, path);
                    if trial.issues.is_empty() {
                        return normalized;
                    }
                }
                self.issue(
                    path,
                    IssueKind::NoMatchingOption {
                        expected: node.label(),
                    },
                );
                Value::Null
            }
        }
    }

    fn eval_primitive(
        &mut self,
        node: &SchemaNode,
        primitive: &PrimitiveNode,
        value: &Value,
        path: &FieldPath,
    ) -> Value {
        match (primitive.kind(), value) {
            (PrimitiveKind::String, Value::String(text)) => {
                self.check_length(path, primitive.length(), text.chars().count());
                if let Some(format) = primitive.format()
                    && !format.accepts(text)
                {
                    self.issue(
                        path,
                        IssueKind::InvalidFormat {
                            format,
                            value: text.clone(),
                        },
                    );
                }
                value.clone()
            }
            (PrimitiveKind::Number, Value::Number(_))
            | (PrimitiveKind::Boolean, Value::Bool(_)) => value.clone(),
            (PrimitiveKind::Integer, Value::Number(number)) => {
                let Some(integer) = integral(number) else {
                    return self.mismatch(path, node, value);
                };
                if let Some(bounds) = primitive.bounds()
                    && let Value::Number(n) = &integer
                    && !bounds.contains(n)
                {
                    self.issue(
                        path,
                        IssueKind::OutOfRange {
                            value: integer.clone(),
                            min: bounds.min,
                            max: bounds.max,
                        },
                    );
                }
                integer
            }
            _ => self.mismatch(path, node, value),
        }
    }

    fn check_length(&mut self, path: &FieldPath, bounds: Option<LengthBounds>, length: usize) {
        if let Some(bounds) = bounds
            && !bounds.contains(length)
        {
            self.issue(path, IssueKind::LengthOutOfRange { length, bounds });
        }
    }

    fn eval_object(
        &mut self,
        object: &ObjectNode,
        map: &Map<String, Value>,
        path: &FieldPath,
    ) -> Map<String, Value> {
        let mut out = Map::new();

        for (name, field) in object.fields() {
            let field_path = path.child(name);
            match (map.get(name), field.default()) {
                // An explicit null for a non-nullable defaulted field means "use the default".
                (Some(Value::Null), Some(default)) if !field.node().is_nullable() => {
                    out.insert(name.to_string(), default.clone());
                }
                // Strict dialects force every field into `required`, so the model sends null.
                (Some(Value::Null), None) if !field.is_required() && !field.node().is_nullable() => {}
                (Some(value), _) => {
                    let normalized = self.eval(field.node(), value, &field_path);
                    out.insert(name.to_string(), normalized);
                }
                (None, Some(default)) => {
                    out.insert(name.to_string(), default.clone());
                }
                // Flavors that cannot spell null leave nullable fields out of `required`.
                (None, None) if field.is_required() && field.node().is_nullable() => {
                    out.insert(name.to_string(), Value::Null);
                }
                (None, None) if field.is_required() => {
                    self.issue(&field_path, IssueKind::MissingField);
                }
                (None, None) => {}
            }
        }

        for (key, value) in map {
            if object.contains(key) {
                continue;
            }
            let key_path = path.child(key);
            match self.options.unknown_fields {
                UnknownFieldPolicy::Ignore => self.unknown.push(key_path),
                UnknownFieldPolicy::Preserve => {
                    self.unknown.push(key_path);
                    out.insert(key.clone(), value.clone());
                }
                UnknownFieldPolicy::Reject => self.issue(&key_path, IssueKind::UnknownField),
            }
        }

        out
    }
}

fn integral(number: &serde_json::Number) -> Option<Value> {
    if number.is_i64() || number.is_u64() {
        return Some(Value::Number(number.clone()));
    }
    let float = number.as_f64()?;
    if float.is_finite()
        && float.fract() == 0.0
        && float >= i64::MIN as f64
        && float < i64::MAX as f64
    {
        return Some(Value::from(float as i64));
    }
    None
}

impl SchemaNode {
    /// Validates a value against this node with default options.
    ///
    /// # Errors
    ///
    /// Returns every violation found, each tagged with its path.
    pub fn eval(&self, value: &Value) -> Result<Value, ValidationError> {
        self.eval_with(value, &EvalOptions::default())
    }

    /// Validates a value against this node.
    ///
    /// # Errors
    ///
    /// Returns every violation found, each tagged with its path.
    pub fn eval_with(&self, value: &Value, options: &EvalOptions) -> Result<Value, ValidationError> {
        let mut evaluator = Evaluator::new(*options);
        let normalized = evaluator.eval(self, value, &FieldPath::root());
        evaluator.finish(normalized).map(|(value, _)| value)
    }
}

impl ObjectNode {
    /// Evaluates a call payload into [`Arguments`].
    ///
    /// A top-level `null` is treated as an empty object, since some providers
    /// send it for calls without arguments.
    ///
    /// # Errors
    ///
    /// Returns every violation found, each tagged with its path.
    pub fn eval_arguments(
        &self,
        value: &Value,
        options: &EvalOptions,
    ) -> Result<Arguments, ValidationError> {
        let empty = Map::new();
        let map = match value {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(ValidationError::new(vec![ValidationIssue::new(
                    FieldPath::root(),
                    IssueKind::TypeMismatch {
                        expected: "object".to_string(),
                        found: json_type_name(other),
                    },
                )]));
            }
        };

        let mut evaluator = Evaluator::new(*options);
        let values = evaluator.eval_object(self, map, &FieldPath::root());
        let (values, unknown_fields) = evaluator.finish(values)?;
        Ok(Arguments {
            values,
            unknown_fields,
        })
    }
}

/// Validated, normalized call arguments in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Map<String, Value>,
    unknown_fields: Vec<FieldPath>,
}

impl Arguments {
    /// Deserializes one argument.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::Missing`] if the argument is absent and
    /// [`ArgumentError::Deserialize`] if it does not fit `T`.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, ArgumentError> {
        let value = self
            .values
            .get(name)
            .ok_or_else(|| ArgumentError::Missing(name.to_string()))?;
        serde_json::from_value(value.clone()).map_err(|source| ArgumentError::Deserialize {
            name: name.to_string(),
            source,
        })
    }

    /// Deserializes an argument that may be absent or `null`.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::Deserialize`] if a present value does not fit `T`.
    pub fn get_optional<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ArgumentError> {
        match self.values.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|source| ArgumentError::Deserialize {
                    name: name.to_string(),
                    source,
                }),
        }
    }

    /// Deserializes the whole argument map into a struct.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::Deserialize`] if the map does not fit `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ArgumentError> {
        serde_json::from_value(Value::Object(self.values.clone())).map_err(|source| {
            ArgumentError::Deserialize {
                name: "$".to_string(),
                source,
            }
        })
    }

    /// Returns the raw normalized value of an argument.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns the argument names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Iterates over name/value pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Returns the number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Paths of undeclared keys seen in the payload, at any depth.
    #[must_use]
    pub fn unknown_fields(&self) -> &[FieldPath] {
        &self.unknown_fields
    }

    /// Returns the arguments as a borrowed JSON map.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Converts the arguments into a JSON object.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.values)
    }
}

impl From<Arguments> for Value {
    fn from(arguments: Arguments) -> Self {
        arguments.into_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Field, IntegerBounds, StringFormat, UnionNode};
    use serde_json::json;

    fn config_node() -> ObjectNode {
        let retry = ObjectNode::builder()
            .field("attempts", Field::new(SchemaNode::integer()))
            .field(
                "backoff",
                Field::new(SchemaNode::number()).with_default(json!(1.5)),
            )
            .build()
            .unwrap();

        ObjectNode::builder()
            .field("name", Field::new(SchemaNode::string()))
            .field("retry", Field::new(retry))
            .field(
                "tags",
                Field::new(SchemaNode::array(SchemaNode::string())).with_default(json!([])),
            )
            .field(
                "note",
                Field::new(SchemaNode::optional(SchemaNode::string())).with_default(Value::Null),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn fills_nested_defaults() {
        let args = config_node()
            .eval_arguments(
                &json!({"name": "job", "retry": {"attempts": 3}}),
                &EvalOptions::default(),
            )
            .unwrap();

        assert_eq!(
            args.into_value(),
            json!({
                "name": "job",
                "retry": {"attempts": 3, "backoff": 1.5},
                "tags": [],
                "note": null
            })
        );
    }

    #[test]
    fn absent_required_nullable_field_is_null() {
        let node = ObjectNode::builder()
            .field("name", Field::new(SchemaNode::string()))
            .field("nickname", Field::new(SchemaNode::optional(SchemaNode::string())))
            .build()
            .unwrap();

        let args = node
            .eval_arguments(&json!({"name": "a"}), &EvalOptions::default())
            .unwrap();
        assert_eq!(args.into_value(), json!({"name": "a", "nickname": null}));

        let err = node
            .eval_arguments(&json!({"nickname": "b"}), &EvalOptions::default())
            .unwrap_err();
        assert_eq!(err.issues()[0].kind, IssueKind::MissingField);
    }

    #[test]
    fn reports_nested_paths() {
        let err = config_node()
            .eval_arguments(
                &json!({"name": 1, "retry": {"attempts": "x"}, "tags": ["a", 2]}),
                &EvalOptions::default(),
            )
            .unwrap_err();

        assert_eq!(err.paths(), vec!["name", "retry.attempts", "tags[1]"]);
        assert_eq!(
            err.issues()[1].to_string(),
            "retry.attempts: expected integer, got string"
        );
    }

    #[test]
    fn integer_accepts_integral_floats_only() {
        let node = SchemaNode::integer();
        assert_eq!(node.eval(&json!(4.0)).unwrap(), json!(4));
        assert!(node.eval(&json!(4.5)).is_err());
        assert!(SchemaNode::number().eval(&json!(4)).is_ok());
    }

    #[test]
    fn length_bounds_are_enforced() {
        let letter = SchemaNode::Primitive(
            PrimitiveNode::new(PrimitiveKind::String).with_length(LengthBounds::exact(1)),
        );
        assert_eq!(letter.eval(&json!("é")).unwrap(), json!("é"));
        let err = letter.eval(&json!("ab")).unwrap_err();
        assert_eq!(err.issues()[0].to_string(), "$: expected length exactly 1, got 2");

        let pair: SchemaNode = crate::node::ArrayNode::new(SchemaNode::integer())
            .with_length(LengthBounds::exact(2))
            .into();
        assert_eq!(pair.eval(&json!([1, 2])).unwrap(), json!([1, 2]));
        let err = pair.eval(&json!([1, "x", 3])).unwrap_err();
        assert_eq!(err.paths(), vec!["$", "[1]"]);
    }

    #[test]
    fn integer_bounds_are_enforced() {
        let node = SchemaNode::Primitive(
            crate::node::PrimitiveNode::new(PrimitiveKind::Integer)
                .with_bounds(IntegerBounds::new(0, 255)),
        );
        assert!(node.eval(&json!(255)).is_ok());
        let err = node.eval(&json!(300)).unwrap_err();
        assert!(matches!(
            err.issues()[0].kind,
            IssueKind::OutOfRange { min: 0, max: 255, .. }
        ));
    }

    #[test]
    fn optional_accepts_null_only_as_absence() {
        let node = SchemaNode::optional(SchemaNode::integer());
        assert_eq!(node.eval(&Value::Null).unwrap(), Value::Null);
        assert_eq!(node.eval(&json!(3)).unwrap(), json!(3));
        assert!(node.eval(&json!("3")).is_err());
    }

    #[test]
    fn null_for_defaulted_field_uses_default() {
        let node = ObjectNode::builder()
            .field(
                "limit",
                Field::new(SchemaNode::integer()).with_default(json!(10)),
            )
            .build()
            .unwrap();

        let args = node
            .eval_arguments(&json!({"limit": null}), &EvalOptions::default())
            .unwrap();
        assert_eq!(args.get::<i64>("limit").unwrap(), 10);
    }

    #[test]
    fn top_level_null_is_empty_object() {
        let node = ObjectNode::builder()
            .field("x", Field::new(SchemaNode::integer()).with_default(json!(1)))
            .build()
            .unwrap();

        let args = node
            .eval_arguments(&Value::Null, &EvalOptions::default())
            .unwrap();
        assert_eq!(args.get::<i64>("x").unwrap(), 1);
    }

    #[test]
    fn unknown_field_policies() {
        let node = ObjectNode::builder()
            .field("x", Field::new(SchemaNode::integer()))
            .build()
            .unwrap();
        let payload = json!({"x": 1, "extra": true});

        let ignored = node
            .eval_arguments(&payload, &EvalOptions::default())
            .unwrap();
        assert_eq!(ignored.len(), 1);
        assert_eq!(ignored.unknown_fields()[0].to_string(), "extra");

        let preserved = node
            .eval_arguments(
                &payload,
                &EvalOptions::new().with_unknown_fields(UnknownFieldPolicy::Preserve),
            )
            .unwrap();
        assert_eq!(preserved.value("extra"), Some(&json!(true)));

        let err = node
            .eval_arguments(&payload, &EvalOptions::strict())
            .unwrap_err();
        assert_eq!(err.to_string(), "extra: unexpected field");
    }

    #[test]
    fn union_picks_first_match() {
        let node: SchemaNode =
            UnionNode::new(vec![SchemaNode::integer(), SchemaNode::string()])
                .unwrap()
                .into();

        assert_eq!(node.eval(&json!(2)).unwrap(), json!(2));
        assert_eq!(node.eval(&json!("two")).unwrap(), json!("two"));

        let err = node.eval(&json!(true)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "$: value does not match any of integer | string"
        );
    }

    #[test]
    fn date_format_is_checked() {
        let node = SchemaNode::Primitive(
            crate::node::PrimitiveNode::new(PrimitiveKind::String).with_format(StringFormat::Date),
        );
        assert!(node.eval(&json!("2024-05-01")).is_ok());
        let err = node.eval(&json!("May 1st")).unwrap_err();
        assert_eq!(err.to_string(), r#"$: invalid date string "May 1st""#);
    }

    #[test]
    fn arguments_accessors() {
        let node = ObjectNode::builder()
            .field("query", Field::new(SchemaNode::string()))
            .field(
                "limit",
                Field::new(SchemaNode::optional(SchemaNode::integer())).with_default(Value::Null),
            )
            .build()
            .unwrap();
        let args = node
            .eval_arguments(&json!({"query": "rust"}), &EvalOptions::default())
            .unwrap();

        assert_eq!(args.get::<String>("query").unwrap(), "rust");
        assert_eq!(args.get_optional::<i64>("limit").unwrap(), None);
        assert!(matches!(
            args.get::<String>("missing"),
            Err(ArgumentError::Missing(_))
        ));
        assert!(matches!(
            args.get::<i64>("query"),
            Err(ArgumentError::Deserialize { .. })
        ));
        assert_eq!(args.names().collect::<Vec<_>>(), vec!["query", "limit"]);
    }
}
