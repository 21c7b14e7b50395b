//! Schema extraction and argument evaluation for LLM tools.
//!
//! This crate turns a callable's [`Signature`] into a [`CallableSchema`], emits
//! it as JSON Schema in a provider dialect, and evaluates the JSON arguments a
//! model sends back into validated [`Arguments`].
//!
//! # Overview
//!
//! - [`SchemaNode`]: the closed set of shapes (primitives, enums, objects,
//!   arrays, optionals, shallow unions).
//! - [`ExtractorRegistry`]: ordered (pattern, extractor) table mapping
//!   [`TypeDescriptor`]s to nodes.
//! - [`SchemaExtractor`]: builds a [`CallableSchema`] from a [`Signature`] and
//!   its documentation.
//! - [`JsonSchemaFlavor`] / [`FlavorStrategy`]: provider dialects for emission.
//! - [`CallableSchema::eval`]: single-pass validation with every issue reported.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use toolcraft_schema::{JsonSchemaFlavor, Param, SchemaExtractor, Signature};
//!
//! let signature = Signature::new("get_weather")
//!     .with_doc("Get the weather.\n\nArgs:\n    city: City name.")
//!     .param(Param::of::<String>("city"))
//!     .param(Param::of::<bool>("metric").with_default(json!(true)));
//!
//! let schema = SchemaExtractor::shared().extract(&signature).unwrap();
//! let wire = schema.json_schema(JsonSchemaFlavor::OpenAi, false);
//! assert_eq!(wire["parameters"]["required"], json!(["city"]));
//!
//! let args = schema.eval(&json!({"city": "Oslo"})).unwrap();
//! assert_eq!(args.get::<bool>("metric").unwrap(), true);
//! ```

extern crate self as toolcraft_schema;

mod callable;
mod describe;
mod docstring;
mod emit;
mod error;
mod eval;
mod extractor;
mod extractors;
mod flavor;
mod interop;
mod node;
mod registry;

pub use callable::CallableSchema;
pub use describe::{Describe, Param, Signature, TypeDescriptor};
pub use describe_macros::Describe;
pub use docstring::Docstring;
pub use emit::emit;
pub use error::{
    ArgumentError, FieldPath, IssueKind, PathSegment, SchemaError, ValidationError,
    ValidationIssue,
};
pub use eval::{Arguments, EvalOptions, UnknownFieldPolicy, json_type_name};
pub use extractor::SchemaExtractor;
pub use flavor::{
    AnthropicStrategy, FlavorStrategy, GeminiStrategy, JsonSchemaFlavor, NullableEncoding,
    OpenAiStrategy, OpenAiStrictStrategy,
};
pub use interop::{from_json_schema, schema_node_for};
pub use node::{
    ArrayNode, EnumNode, Field, IntegerBounds, LengthBounds, Literal, ObjectNode, ObjectNodeBuilder,
    OptionalNode, PrimitiveKind, PrimitiveNode, SchemaNode, StringFormat, UnionNode,
};
pub use registry::{ExtractContext, Extractor, ExtractorRegistry, TypePattern, extractor_fn};

#[doc(hidden)]
pub mod __private {
    pub use serde_json;

    use crate::describe::TypeDescriptor;
    use std::any::TypeId;
    use std::borrow::Cow;
    use std::cell::RefCell;

    /// Serializes a field default for generated code. A default that does not
    /// serialize becomes `null` and is rejected by default validation.
    pub fn default_value<T: serde::Serialize>(value: T) -> serde_json::Value {
        serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
    }

    thread_local! {
        static DESCRIBING: RefCell<Vec<TypeId>> = const { RefCell::new(Vec::new()) };
    }

    struct Describing;

    impl Drop for Describing {
        fn drop(&mut self) {
            DESCRIBING.with_borrow_mut(|stack| {
                stack.pop();
            });
        }
    }

    /// Describes a derived record, returning [`TypeDescriptor::Recursive`] if
    /// the record is already being described further up the stack.
    pub fn describe_record(
        id: TypeId,
        name: &'static str,
        build: impl FnOnce() -> TypeDescriptor,
    ) -> TypeDescriptor {
        let reentered = DESCRIBING.with_borrow_mut(|stack| {
            if stack.contains(&id) {
                return true;
            }
            stack.push(id);
            false
        });
        if reentered {
            return TypeDescriptor::Recursive(Cow::Borrowed(name));
        }
        let _describing = Describing;
        build()
    }
}
