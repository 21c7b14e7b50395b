//! The schema node model.
//!
//! [`SchemaNode`] is a closed set of shapes. Emission and evaluation match
//! over it exhaustively, so adding a variant is a compile error everywhere
//! it still needs handling. Nodes are immutable once built: fields are
//! private and only read-only accessors are exposed.

use crate::error::SchemaError;
use core::fmt;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─────────────────────
// Leaves
// ─────────────────────

/// JSON type of a primitive node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    /// Any JSON string.
    String,
    /// Any JSON number.
    Number,
    /// An integral JSON number.
    Integer,
    /// `true` or `false`.
    Boolean,
}

impl PrimitiveKind {
    /// Returns the JSON Schema type name.
    #[must_use]
    pub fn type_name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
        }
    }
}

/// Structured string formats validated during evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StringFormat {
    /// Calendar date, `2024-05-01`.
    #[serde(rename = "date")]
    Date,
    /// Date and time, RFC 3339 or naive `2024-05-01T10:30:00`.
    #[serde(rename = "date-time")]
    DateTime,
    /// Time of day, `10:30:00`.
    #[serde(rename = "time")]
    Time,
}

impl StringFormat {
    /// Returns the JSON Schema `format` keyword value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::DateTime => "date-time",
            Self::Time => "time",
        }
    }

    /// Returns whether `value` parses in this format.
    #[must_use]
    pub fn accepts(self, value: &str) -> bool {
        match self {
            Self::Date => value.parse::<chrono::NaiveDate>().is_ok(),
            Self::DateTime => {
                chrono::DateTime::parse_from_rfc3339(value).is_ok()
                    || value.parse::<chrono::NaiveDateTime>().is_ok()
            }
            Self::Time => value.parse::<chrono::NaiveTime>().is_ok(),
        }
    }

    /// Returns a representative value in this format.
    #[must_use]
    pub fn example(self) -> &'static str {
        match self {
            Self::Date => "2024-01-01",
            Self::DateTime => "2024-01-01T00:00:00Z",
            Self::Time => "12:00:00",
        }
    }
}

impl fmt::Display for StringFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive range accepted by an integer node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntegerBounds {
    /// Smallest accepted value.
    pub min: i64,
    /// Largest accepted value.
    pub max: u64,
}

impl IntegerBounds {
    /// Creates bounds from an inclusive range.
    #[must_use]
    pub const fn new(min: i64, max: u64) -> Self {
        Self { min, max }
    }

    /// Returns whether an integral JSON number lies within the bounds.
    #[must_use]
    pub fn contains(&self, number: &serde_json::Number) -> bool {
        if let Some(value) = number.as_i64() {
            value >= self.min && (value < 0 || value.unsigned_abs() <= self.max)
        } else if let Some(value) = number.as_u64() {
            value <= self.max && (self.min <= 0 || value >= self.min.unsigned_abs())
        } else {
            false
        }
    }

    /// Returns the lower bound when it is narrower than `i64`.
    #[must_use]
    pub fn explicit_min(&self) -> Option<i64> {
        (self.min != i64::MIN).then_some(self.min)
    }

    /// Returns the upper bound when it is narrower than `u64`.
    #[must_use]
    pub fn explicit_max(&self) -> Option<u64> {
        (self.max != u64::MAX).then_some(self.max)
    }
}

/// Inclusive range on the length of a string (in characters) or an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LengthBounds {
    /// Shortest accepted length.
    pub min: usize,
    /// Longest accepted length, if any.
    pub max: Option<usize>,
}

impl LengthBounds {
    /// Creates length bounds.
    #[must_use]
    pub const fn new(min: usize, max: Option<usize>) -> Self {
        Self { min, max }
    }

    /// Accepts exactly `len`.
    #[must_use]
    pub const fn exact(len: usize) -> Self {
        Self::new(len, Some(len))
    }

    /// Returns whether `len` lies within the bounds.
    #[must_use]
    pub fn contains(&self, len: usize) -> bool {
        len >= self.min && self.max.is_none_or(|max| len <= max)
    }

    /// The accepted length closest to `preferred`.
    #[must_use]
    pub fn nearest(&self, preferred: usize) -> usize {
        let len = preferred.max(self.min);
        self.max.map_or(len, |max| len.min(max))
    }
}

impl fmt::Display for LengthBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "exactly {max}"),
            Some(max) => write!(f, "between {} and {max}", self.min),
            None => write!(f, "at least {}", self.min),
        }
    }
}

/// A string, number, integer or boolean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimitiveNode {
    kind: PrimitiveKind,
    format: Option<StringFormat>,
    bounds: Option<IntegerBounds>,
    length: Option<LengthBounds>,
}

impl PrimitiveNode {
    /// Creates an unconstrained primitive.
    #[must_use]
    pub const fn new(kind: PrimitiveKind) -> Self {
        Self {
            kind,
            format: None,
            bounds: None,
            length: None,
        }
    }

    /// Attaches a string format.
    #[must_use]
    pub fn with_format(mut self, format: StringFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Attaches integer bounds.
    #[must_use]
    pub fn with_bounds(mut self, bounds: IntegerBounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Returns the JSON type.
    #[must_use]
    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    /// Returns the string format, if any.
    #[must_use]
    pub fn format(&self) -> Option<StringFormat> {
        self.format
    }

    /// Attaches string length bounds.
    #[must_use]
    pub fn with_length(mut self, length: LengthBounds) -> Self {
        self.length = Some(length);
        self
    }

    /// Returns the integer bounds, if any.
    #[must_use]
    pub fn bounds(&self) -> Option<IntegerBounds> {
        self.bounds
    }

    /// Returns the string length bounds, if any.
    #[must_use]
    pub fn length(&self) -> Option<LengthBounds> {
        self.length
    }
}

/// A literal value allowed by an [`EnumNode`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    /// A boolean literal.
    Bool(bool),
    /// An integer literal.
    Int(i64),
    /// A string literal.
    Str(String),
}

impl Literal {
    /// Returns whether the JSON value is exactly this literal.
    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Bool(expected), Value::Bool(actual)) => expected == actual,
            (Self::Int(expected), Value::Number(actual)) => actual.as_i64() == Some(*expected),
            (Self::Str(expected), Value::String(actual)) => expected == actual,
            _ => false,
        }
    }

    /// Returns the JSON Schema type name of the literal.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Str(_) => "string",
        }
    }

    /// Converts the literal into a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Bool(value) => Value::Bool(*value),
            Self::Int(value) => Value::from(*value),
            Self::Str(value) => Value::String(value.clone()),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Str(value) => write!(f, "{value:?}"),
        }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// An ordered set of allowed literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumNode {
    values: Vec<Literal>,
}

impl EnumNode {
    /// Creates an enumeration. Repeated literals keep their first position.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::EmptyEnum`] when no literal is given.
    pub fn new<I, L>(values: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = L>,
        L: Into<Literal>,
    {
        let mut unique: Vec<Literal> = Vec::new();
        for value in values {
            let value = value.into();
            if !unique.contains(&value) {
                unique.push(value);
            }
        }
        if unique.is_empty() {
            return Err(SchemaError::EmptyEnum);
        }
        Ok(Self { values: unique })
    }

    /// Returns the literals in declaration order.
    #[must_use]
    pub fn values(&self) -> &[Literal] {
        &self.values
    }

    /// Returns whether the value is one of the literals.
    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        self.values.iter().any(|literal| literal.matches(value))
    }

    /// Returns the distinct literal type names in first-seen order.
    #[must_use]
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        for literal in &self.values {
            let name = literal.type_name();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

// ─────────────────────
// Composites
// ─────────────────────

/// One named entry of an [`ObjectNode`].
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    node: SchemaNode,
    required: bool,
    default: Option<Value>,
    description: Option<String>,
}

impl Field {
    /// Creates a required field.
    #[must_use]
    pub fn new(node: impl Into<SchemaNode>) -> Self {
        Self {
            node: node.into(),
            required: true,
            default: None,
            description: None,
        }
    }

    /// Attaches a default and marks the field as not required.
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.required = false;
        self.default = Some(default);
        self
    }

    /// Marks the field as not required without a default.
    ///
    /// Absent values are left out of the evaluated object.
    #[must_use]
    pub fn not_required(mut self) -> Self {
        self.required = false;
        self
    }

    /// Attaches a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the field's shape.
    #[must_use]
    pub fn node(&self) -> &SchemaNode {
        &self.node
    }

    /// Returns whether the field must be present.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the value used when the field is absent.
    #[must_use]
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Returns the field description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// A record of named fields in insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectNode {
    fields: IndexMap<String, Field>,
    description: Option<String>,
}

impl ObjectNode {
    /// Starts building an object node.
    #[must_use]
    pub fn builder() -> ObjectNodeBuilder {
        ObjectNodeBuilder::default()
    }

    /// Returns the fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    /// Returns a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Returns whether a field with the given name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns whether the object has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the names of required fields in insertion order.
    pub fn required_names(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, field)| field.required)
            .map(|(name, _)| name.as_str())
    }

    /// Returns the object description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns a copy without the object-level description.
    #[must_use]
    pub fn without_description(&self) -> Self {
        Self {
            fields: self.fields.clone(),
            description: None,
        }
    }
}

/// Builder for [`ObjectNode`] that rejects duplicate field names.
#[derive(Debug, Default)]
pub struct ObjectNodeBuilder {
    fields: IndexMap<String, Field>,
    description: Option<String>,
    duplicate: Option<String>,
}

impl ObjectNodeBuilder {
    /// Appends a field. A repeated name fails the final [`build`](Self::build).
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        let name = name.into();
        if self.fields.contains_key(&name) {
            self.duplicate.get_or_insert(name);
        } else {
            self.fields.insert(name, field);
        }
        self
    }

    /// Sets the object description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the object description when one is given.
    #[must_use]
    pub fn maybe_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Finishes the node.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateField`] naming the first repeated field.
    pub fn build(self) -> Result<ObjectNode, SchemaError> {
        if let Some(name) = self.duplicate {
            return Err(SchemaError::DuplicateField(name));
        }
        Ok(ObjectNode {
            fields: self.fields,
            description: self.description,
        })
    }
}

/// A homogeneous sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayNode {
    item: Box<SchemaNode>,
    length: Option<LengthBounds>,
}

impl ArrayNode {
    /// Creates a sequence of `item`.
    #[must_use]
    pub fn new(item: impl Into<SchemaNode>) -> Self {
        Self {
            item: Box::new(item.into()),
            length: None,
        }
    }

    /// Restricts the number of items.
    #[must_use]
    pub fn with_length(mut self, length: LengthBounds) -> Self {
        self.length = Some(length);
        self
    }

    /// Returns the item shape.
    #[must_use]
    pub fn item(&self) -> &SchemaNode {
        &self.item
    }

    /// Returns the item count bounds, if any.
    #[must_use]
    pub fn length(&self) -> Option<LengthBounds> {
        self.length
    }
}

/// A nullable wrapper: accepts `null` or the inner shape.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionalNode {
    inner: Box<SchemaNode>,
}

impl OptionalNode {
    /// Returns the wrapped shape.
    #[must_use]
    pub fn inner(&self) -> &SchemaNode {
        &self.inner
    }
}

/// A shallow union of primitive and enum options.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionNode {
    options: Vec<SchemaNode>,
}

impl UnionNode {
    /// Creates a union.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnsupportedUnion`] when fewer than two options
    /// are given or an option is not a primitive or enum node.
    pub fn new(options: Vec<SchemaNode>) -> Result<Self, SchemaError> {
        if options.len() < 2 {
            return Err(SchemaError::UnsupportedUnion(
                "a union needs at least two options".to_string(),
            ));
        }
        if let Some(option) = options
            .iter()
            .find(|option| !matches!(option, SchemaNode::Primitive(_) | SchemaNode::Enum(_)))
        {
            return Err(SchemaError::UnsupportedUnion(format!(
                "option `{}` is not a primitive or enum",
                option.label()
            )));
        }
        Ok(Self { options })
    }

    /// Returns the options in declaration order.
    #[must_use]
    pub fn options(&self) -> &[SchemaNode] {
        &self.options
    }

    /// Returns whether every option is an unconstrained-shape primitive.
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        self.options
            .iter()
            .all(|option| matches!(option, SchemaNode::Primitive(_)))
    }
}

// ─────────────────────
// SchemaNode
// ─────────────────────

/// The shape of a piece of data.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// String, number, integer or boolean.
    Primitive(PrimitiveNode),
    /// One of a fixed set of literals.
    Enum(EnumNode),
    /// A record with named fields.
    Object(ObjectNode),
    /// A homogeneous sequence.
    Array(ArrayNode),
    /// `null` or the inner shape.
    Optional(OptionalNode),
    /// The first matching of several primitive or enum shapes.
    Union(UnionNode),
}

impl SchemaNode {
    /// A plain string.
    #[must_use]
    pub const fn string() -> Self {
        Self::Primitive(PrimitiveNode::new(PrimitiveKind::String))
    }

    /// Any number.
    #[must_use]
    pub const fn number() -> Self {
        Self::Primitive(PrimitiveNode::new(PrimitiveKind::Number))
    }

    /// An integer.
    #[must_use]
    pub const fn integer() -> Self {
        Self::Primitive(PrimitiveNode::new(PrimitiveKind::Integer))
    }

    /// A boolean.
    #[must_use]
    pub const fn boolean() -> Self {
        Self::Primitive(PrimitiveNode::new(PrimitiveKind::Boolean))
    }

    /// A sequence of `item`.
    #[must_use]
    pub fn array(item: impl Into<SchemaNode>) -> Self {
        Self::Array(ArrayNode::new(item))
    }

    /// `null` or `inner`. Wrapping an optional node again is a no-op.
    #[must_use]
    pub fn optional(inner: impl Into<SchemaNode>) -> Self {
        match inner.into() {
            optional @ Self::Optional(_) => optional,
            inner => Self::Optional(OptionalNode {
                inner: Box::new(inner),
            }),
        }
    }

    /// One of the given literals.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::EmptyEnum`] when no literal is given.
    pub fn enumeration<I, L>(values: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = L>,
        L: Into<Literal>,
    {
        EnumNode::new(values).map(Self::Enum)
    }

    /// Returns whether `null` is accepted.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        matches!(self, Self::Optional(_))
    }

    /// Short human-readable label used in validation messages.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Primitive(node) => match node.format {
                Some(format) => format!("{} ({format})", node.kind.type_name()),
                None => node.kind.type_name().to_string(),
            },
            Self::Enum(node) => format!(
                "one of [{}]",
                node.values
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Self::Object(_) => "object".to_string(),
            Self::Array(node) => format!("array of {}", node.item.label()),
            Self::Optional(node) => format!("{} or null", node.inner.label()),
            Self::Union(node) => node
                .options
                .iter()
                .map(Self::label)
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }

    /// Builds a representative value that this node accepts.
    #[must_use]
    pub fn example_value(&self) -> Value {
        match self {
            Self::Primitive(node) => match node.kind {
                PrimitiveKind::String => match (node.format, node.length) {
                    (Some(format), _) => Value::String(format.example().to_string()),
                    (None, Some(length)) => Value::String("x".repeat(length.nearest(7))),
                    (None, None) => Value::String("example".to_string()),
                },
                PrimitiveKind::Number => Value::from(0.5),
                PrimitiveKind::Integer => match node.bounds {
                    Some(bounds) if bounds.min > 0 => Value::from(bounds.min),
                    _ => Value::from(0),
                },
                PrimitiveKind::Boolean => Value::Bool(true),
            },
            Self::Enum(node) => node.values.first().map_or(Value::Null, Literal::to_value),
            Self::Object(node) => Value::Object(
                node.fields
                    .iter()
                    .map(|(name, field)| (name.clone(), field.node.example_value()))
                    .collect(),
            ),
            Self::Array(node) => {
                let count = node.length.map_or(1, |length| length.nearest(1));
                Value::Array(vec![node.item.example_value(); count])
            }
            Self::Optional(node) => node.inner.example_value(),
            Self::Union(node) => node.options[0].example_value(),
        }
    }
}

impl From<PrimitiveNode> for SchemaNode {
    fn from(node: PrimitiveNode) -> Self {
        Self::Primitive(node)
    }
}

impl From<EnumNode> for SchemaNode {
    fn from(node: EnumNode) -> Self {
        Self::Enum(node)
    }
}

impl From<ObjectNode> for SchemaNode {
    fn from(node: ObjectNode) -> Self {
        Self::Object(node)
    }
}

impl From<ArrayNode> for SchemaNode {
    fn from(node: ArrayNode) -> Self {
        Self::Array(node)
    }
}

impl From<UnionNode> for SchemaNode {
    fn from(node: UnionNode) -> Self {
        Self::Union(node)
    }
}
