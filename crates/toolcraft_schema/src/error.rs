//! Error types for schema construction and argument evaluation.
//!
//! Two families with different lifetimes:
//!
//! - [`SchemaError`] is raised while a callable is being turned into a
//!   [`CallableSchema`](crate::CallableSchema). It signals a programming
//!   mistake and is never expected at evaluation time.
//! - [`ValidationError`] is raised by evaluation and aggregates every
//!   [`ValidationIssue`] found in a payload, each tagged with a [`FieldPath`].

use crate::node::{LengthBounds, Literal, StringFormat};
use core::fmt;
use serde_json::Value;
use thiserror::Error;

/// Errors raised while building schemas.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// No registered extractor can produce a schema for the declared type.
    #[error("unsupported type `{type_name}` for `{path}`")]
    UnsupportedType {
        /// Parameter or field path the type was declared at.
        path: String,
        /// Display name of the declared type.
        type_name: String,
    },

    /// A record contains itself, directly or through other records.
    #[error("recursive type `{type_name}` at `{path}`")]
    RecursiveType {
        /// Field path where the record reappears.
        path: String,
        /// Name of the record.
        type_name: String,
    },

    /// Two parameters of one callable share a name.
    #[error("duplicate parameter `{name}` in `{callable}`")]
    DuplicateParameter {
        /// The callable being extracted.
        callable: String,
        /// The repeated parameter name.
        name: String,
    },

    /// Two fields of one object node share a name.
    #[error("duplicate field `{0}`")]
    DuplicateField(String),

    /// A declared default does not satisfy its own parameter schema.
    #[error("invalid default for `{path}`: {source}")]
    InvalidDefault {
        /// Parameter or field path of the default.
        path: String,
        /// Validation failure of the default value.
        #[source]
        source: ValidationError,
    },

    /// An enumeration has no literals.
    #[error("an enum needs at least one value")]
    EmptyEnum,

    /// A union contains options that cannot be expressed shallowly.
    #[error("unsupported union: {0}")]
    UnsupportedUnion(String),

    /// An imported JSON Schema could not be converted.
    #[error("invalid JSON schema: {0}")]
    InvalidJsonSchema(String),
}

impl SchemaError {
    /// Creates an [`UnsupportedType`](Self::UnsupportedType).
    pub fn unsupported_type(path: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::UnsupportedType {
            path: path.into(),
            type_name: type_name.into(),
        }
    }

    /// Creates an [`InvalidJsonSchema`](Self::InvalidJsonSchema).
    pub fn invalid_json_schema(msg: impl Into<String>) -> Self {
        Self::InvalidJsonSchema(msg.into())
    }
}

/// One step into a JSON payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// An object key.
    Field(String),
    /// An array position.
    Index(usize),
}

/// Location of a value inside an evaluated payload.
///
/// Displays as `config.retries[2].name`; the empty path displays as `$`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// The payload root.
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Returns this path extended by an object key.
    #[must_use]
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Field(name.into()));
        Self(segments)
    }

    /// Returns this path extended by an array index.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    /// Returns whether this is the payload root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the path segments.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("$");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => f.write_str(name)?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// What went wrong at one location of a payload.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IssueKind {
    /// A required field is absent.
    #[error("missing required field")]
    MissingField,

    /// The value has the wrong JSON type.
    #[error("expected {expected}, got {found}")]
    TypeMismatch {
        /// Schema label of the expected shape.
        expected: String,
        /// JSON type of the received value.
        found: &'static str,
    },

    /// The value is not one of the enumerated literals.
    #[error("invalid literal {value}, expected one of [{}]", join_literals(.allowed))]
    UnknownLiteral {
        /// The received value.
        value: Value,
        /// The declared literal set.
        allowed: Vec<Literal>,
    },

    /// An integer lies outside the declared range.
    #[error("{value} is out of range [{min}, {max}]")]
    OutOfRange {
        /// The received value.
        value: Value,
        /// Inclusive lower bound.
        min: i64,
        /// Inclusive upper bound.
        max: u64,
    },

    /// A string or array has a length outside the declared range.
    #[error("expected length {bounds}, got {length}")]
    LengthOutOfRange {
        /// Characters in the string, or items in the array.
        length: usize,
        /// The declared range.
        bounds: LengthBounds,
    },

    /// A string does not parse in its declared format.
    #[error("invalid {format} string {value:?}")]
    InvalidFormat {
        /// The declared format.
        format: StringFormat,
        /// The received string.
        value: String,
    },

    /// No union option accepted the value.
    #[error("value does not match any of {expected}")]
    NoMatchingOption {
        /// Labels of the union options.
        expected: String,
    },

    /// The key is not declared and unknown keys are rejected.
    #[error("unexpected field")]
    UnknownField,
}

fn join_literals(literals: &[Literal]) -> String {
    literals
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A single violation found during evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// Where the violation was found.
    pub path: FieldPath,
    /// What the violation is.
    pub kind: IssueKind,
}

impl ValidationIssue {
    /// Creates an issue at the given path.
    #[must_use]
    pub fn new(path: FieldPath, kind: IssueKind) -> Self {
        Self { path, kind }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.kind)
    }
}

/// Every violation found in one evaluation pass.
///
/// The display form lists one issue per line so it can be sent back to the
/// model verbatim as a correction request.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", render_issues(.issues))]
pub struct ValidationError {
    issues: Vec<ValidationIssue>,
}

fn render_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

impl ValidationError {
    /// Creates an error from a non-empty list of issues.
    #[must_use]
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        debug_assert!(!issues.is_empty(), "validation error without issues");
        Self { issues }
    }

    /// Returns the issues in the order they were found.
    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Returns the display form of every failing path.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.issues
            .iter()
            .map(|issue| issue.path.to_string())
            .collect()
    }

    /// Consumes the error, returning its issues.
    #[must_use]
    pub fn into_issues(self) -> Vec<ValidationIssue> {
        self.issues
    }
}

/// Errors reading evaluated arguments into native types.
#[derive(Debug, Error)]
pub enum ArgumentError {
    /// The argument is not present in the evaluated map.
    #[error("missing argument `{0}`")]
    Missing(String),

    /// The evaluated value does not deserialize into the requested type.
    #[error("failed to deserialize argument `{name}`: {source}")]
    Deserialize {
        /// Argument name, or `$` for the whole argument map.
        name: String,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}
