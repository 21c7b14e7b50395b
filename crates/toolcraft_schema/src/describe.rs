//! Type reflection for schema extraction.
//!
//! Rust has no runtime reflection, so callables and their types are described
//! up front: [`Describe`] maps a type to a [`TypeDescriptor`], and a
//! [`Signature`] lists a callable's parameters with their descriptors,
//! defaults and docs. The `#[tool]` macro and `#[derive(Describe)]` generate
//! both; they can also be written by hand.

use crate::node::Literal;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

/// A declared type, as seen by the extractor registry.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    /// Any JSON value.
    Any,
    /// The unit type.
    Unit,
    /// A concrete type matched by name, such as `i32` or `chrono::NaiveDate`.
    Named(Cow<'static, str>),
    /// A generic container such as `Vec<T>` or `Option<T>`.
    Generic {
        /// Container name, such as `Vec`.
        origin: Cow<'static, str>,
        /// Type arguments in declaration order.
        args: Vec<TypeDescriptor>,
    },
    /// A fixed set of literal values.
    Literal(Vec<Literal>),
    /// One of several types.
    Union(Vec<TypeDescriptor>),
    /// A fixed-length array `[T; N]`.
    FixedArray {
        /// Element type.
        item: Box<TypeDescriptor>,
        /// Number of elements.
        len: usize,
    },
    /// A record with named fields.
    Record(Box<Signature>),
    /// A record reached again while it was still being described. Extraction
    /// rejects it with [`SchemaError::RecursiveType`](crate::SchemaError::RecursiveType).
    Recursive(Cow<'static, str>),
}

impl TypeDescriptor {
    /// A named type.
    #[must_use]
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Named(name.into())
    }

    /// A named type, using the compiler's path for `T`.
    #[must_use]
    pub fn of<T: ?Sized>() -> Self {
        Self::Named(Cow::Borrowed(std::any::type_name::<T>()))
    }

    /// A generic container.
    #[must_use]
    pub fn generic(origin: impl Into<Cow<'static, str>>, args: Vec<TypeDescriptor>) -> Self {
        Self::Generic {
            origin: origin.into(),
            args,
        }
    }

    /// A set of literals.
    #[must_use]
    pub fn literal<I, L>(values: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Literal>,
    {
        Self::Literal(values.into_iter().map(Into::into).collect())
    }

    /// A union of types.
    #[must_use]
    pub fn union(options: Vec<TypeDescriptor>) -> Self {
        Self::Union(options)
    }

    /// A record described by a signature.
    #[must_use]
    pub fn record(signature: Signature) -> Self {
        Self::Record(Box::new(signature))
    }

    /// Human-readable rendering used in error messages.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self {
            Self::Any => "Any".to_string(),
            Self::Unit => "()".to_string(),
            Self::Named(name) => name.to_string(),
            Self::Generic { origin, args } => {
                let args: Vec<_> = args.iter().map(Self::display_name).collect();
                format!("{origin}<{}>", args.join(", "))
            }
            Self::Literal(values) => {
                let values: Vec<_> = values.iter().map(ToString::to_string).collect();
                format!("Literal[{}]", values.join(", "))
            }
            Self::Union(options) => options
                .iter()
                .map(Self::display_name)
                .collect::<Vec<_>>()
                .join(" | "),
            Self::FixedArray { item, len } => format!("[{}; {len}]", item.display_name()),
            Self::Record(signature) => signature.name.clone(),
            Self::Recursive(name) => name.to_string(),
        }
    }
}

/// One parameter of a callable, or one field of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Parameter name as it appears on the wire.
    pub name: String,
    /// Declared type.
    pub ty: TypeDescriptor,
    /// Value used when the argument is absent. A parameter without one is required.
    pub default: Option<Value>,
    /// Inline documentation, preferred over docstring entries.
    pub doc: Option<String>,
}

impl Param {
    /// Creates a required parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
            doc: None,
        }
    }

    /// Creates a required parameter whose type implements [`Describe`].
    #[must_use]
    pub fn of<T: Describe + ?Sized>(name: impl Into<String>) -> Self {
        Self::new(name, T::describe())
    }

    /// Attaches a default value.
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Attaches inline documentation.
    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

/// Description of a callable or record: name, docs, parameters and return type.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    /// Callable or record name.
    pub name: String,
    /// Full documentation block, parsed by [`Docstring`](crate::Docstring).
    pub doc: Option<String>,
    /// Parameters in declaration order.
    pub params: Vec<Param>,
    /// Declared return type, if any.
    pub returns: Option<TypeDescriptor>,
}

impl Signature {
    /// Creates an empty signature.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            params: Vec::new(),
            returns: None,
        }
    }

    /// Attaches the documentation block.
    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Appends a parameter.
    #[must_use]
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Sets the return type.
    #[must_use]
    pub fn returns(mut self, ty: TypeDescriptor) -> Self {
        self.returns = Some(ty);
        self
    }
}

/// Types that can describe their own shape.
///
/// Implemented for the standard library and chrono types the default
/// extractors understand. Records and unit enums derive it with
/// `#[derive(Describe)]`; other types can implement it by hand, typically
/// returning [`TypeDescriptor::of`] and registering an extractor for it.
pub trait Describe {
    /// Returns the type descriptor.
    fn describe() -> TypeDescriptor;
}

macro_rules! impl_describe_named {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl Describe for $ty {
                fn describe() -> TypeDescriptor {
                    TypeDescriptor::Named(Cow::Borrowed($name))
                }
            }
        )*
    };
}

impl_describe_named! {
    bool => "bool",
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    isize => "isize",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
    usize => "usize",
    f32 => "f32",
    f64 => "f64",
    char => "char",
    String => "String",
    str => "str",
    chrono::NaiveDate => "chrono::NaiveDate",
    chrono::NaiveDateTime => "chrono::NaiveDateTime",
    chrono::NaiveTime => "chrono::NaiveTime",
}

impl<Tz: chrono::TimeZone> Describe for chrono::DateTime<Tz> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::Named(Cow::Borrowed("chrono::DateTime"))
    }
}

impl Describe for () {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::Unit
    }
}

impl Describe for Value {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::Any
    }
}

macro_rules! impl_describe_generic {
    ($($origin:literal => $ty:ident),* $(,)?) => {
        $(
            impl<T: Describe> Describe for $ty<T> {
                fn describe() -> TypeDescriptor {
                    TypeDescriptor::generic($origin, vec![T::describe()])
                }
            }
        )*
    };
}

impl_describe_generic! {
    "Option" => Option,
    "Vec" => Vec,
    "VecDeque" => VecDeque,
    "HashSet" => HashSet,
    "BTreeSet" => BTreeSet,
}

macro_rules! impl_describe_pointer {
    ($($origin:literal => $ty:ident),* $(,)?) => {
        $(
            impl<T: Describe + ?Sized> Describe for $ty<T> {
                fn describe() -> TypeDescriptor {
                    TypeDescriptor::generic($origin, vec![T::describe()])
                }
            }
        )*
    };
}

impl_describe_pointer! {
    "Box" => Box,
    "Arc" => Arc,
    "Rc" => Rc,
}

impl<T: Describe + ?Sized> Describe for &T {
    fn describe() -> TypeDescriptor {
        T::describe()
    }
}

impl<T: Describe> Describe for [T] {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::generic("slice", vec![T::describe()])
    }
}

impl<T: Describe, const N: usize> Describe for [T; N] {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::FixedArray {
            item: Box::new(T::describe()),
            len: N,
        }
    }
}

// Maps have no default extractor; they describe themselves so the error names them.
impl<K: Describe, V: Describe, S> Describe for HashMap<K, V, S> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::generic("HashMap", vec![K::describe(), V::describe()])
    }
}

impl<K: Describe, V: Describe> Describe for BTreeMap<K, V> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::generic("BTreeMap", vec![K::describe(), V::describe()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containers_nest() {
        let descriptor = <Option<Vec<u8>>>::describe();
        assert_eq!(
            descriptor,
            TypeDescriptor::generic(
                "Option",
                vec![TypeDescriptor::generic("Vec", vec![TypeDescriptor::named("u8")])]
            )
        );
        assert_eq!(descriptor.display_name(), "Option<Vec<u8>>");
    }

    #[test]
    fn references_are_transparent() {
        assert_eq!(<&str>::describe(), TypeDescriptor::named("str"));
    }

    #[test]
    fn fixed_arrays_keep_their_length() {
        let descriptor = <[u8; 4]>::describe();
        assert_eq!(descriptor.display_name(), "[u8; 4]");
    }

    #[test]
    fn literal_display() {
        let descriptor = TypeDescriptor::literal(["low", "high"]);
        assert_eq!(descriptor.display_name(), r#"Literal["low", "high"]"#);
    }

    #[test]
    fn signature_builder() {
        let signature = Signature::new("search")
            .with_doc("Search documents.")
            .param(Param::of::<String>("query"))
            .param(Param::of::<u32>("limit").with_default(serde_json::json!(10)))
            .returns(<Vec<String>>::describe());

        assert_eq!(signature.params.len(), 2);
        assert_eq!(signature.params[1].default, Some(serde_json::json!(10)));
    }
}
