//! The extractor registry.
//!
//! An ordered table of (pattern, extractor) pairs. Resolution walks the
//! specificity tiers in order (exact name, generic container, custom
//! predicate, structural shape); within a tier the most recently registered
//! entry wins. Registries are plain values: `with` derives a new one and
//! `register` needs `&mut`, so a registry shared behind `&` or `Arc` cannot
//! change under its readers.

use crate::describe::{Signature, TypeDescriptor};
use crate::error::SchemaError;
use crate::extractor::build_object;
use crate::node::{ObjectNode, SchemaNode};
use core::fmt;
use std::borrow::Cow;
use std::sync::Arc;

/// Builds a schema node for a matched type descriptor.
pub trait Extractor: Send + Sync {
    /// Produces the node, resolving nested types through the context.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] if the descriptor or a nested type cannot be
    /// expressed.
    fn extract(
        &self,
        descriptor: &TypeDescriptor,
        cx: &ExtractContext<'_>,
    ) -> Result<SchemaNode, SchemaError>;
}

impl<F> Extractor for F
where
    F: Fn(&TypeDescriptor, &ExtractContext<'_>) -> Result<SchemaNode, SchemaError> + Send + Sync,
{
    fn extract(
        &self,
        descriptor: &TypeDescriptor,
        cx: &ExtractContext<'_>,
    ) -> Result<SchemaNode, SchemaError> {
        self(descriptor, cx)
    }
}

/// Wraps a closure as an [`Extractor`], fixing its argument and return types.
pub fn extractor_fn<F>(f: F) -> F
where
    F: Fn(&TypeDescriptor, &ExtractContext<'_>) -> Result<SchemaNode, SchemaError> + Send + Sync,
{
    f
}

type Predicate = Arc<dyn Fn(&TypeDescriptor) -> bool + Send + Sync>;

/// Which descriptors an extractor applies to.
#[derive(Clone)]
pub enum TypePattern {
    /// A [`TypeDescriptor::Named`] with exactly this name.
    Exact(Cow<'static, str>),
    /// A [`TypeDescriptor::Generic`] with this origin.
    Generic(Cow<'static, str>),
    /// Any descriptor the predicate accepts. The label identifies the pattern
    /// for overrides and debugging.
    Custom {
        /// Identifier of the pattern.
        label: Cow<'static, str>,
        /// Match test.
        predicate: Predicate,
    },
    /// Any [`TypeDescriptor::Literal`].
    Literal,
    /// Any [`TypeDescriptor::Union`].
    Union,
    /// Any [`TypeDescriptor::Record`].
    Record,
}

impl TypePattern {
    /// Matches a named type.
    #[must_use]
    pub fn exact(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Exact(name.into())
    }

    /// Matches `T` by its compiler path, as produced by [`TypeDescriptor::of`].
    #[must_use]
    pub fn of<T: ?Sized>() -> Self {
        Self::Exact(Cow::Borrowed(std::any::type_name::<T>()))
    }

    /// Matches a generic container by origin.
    #[must_use]
    pub fn generic(origin: impl Into<Cow<'static, str>>) -> Self {
        Self::Generic(origin.into())
    }

    /// Matches descriptors accepted by a predicate.
    pub fn custom<P>(label: impl Into<Cow<'static, str>>, predicate: P) -> Self
    where
        P: Fn(&TypeDescriptor) -> bool + Send + Sync + 'static,
    {
        Self::Custom {
            label: label.into(),
            predicate: Arc::new(predicate),
        }
    }

    fn tier(&self) -> u8 {
        match self {
            Self::Exact(_) => 0,
            Self::Generic(_) => 1,
            Self::Custom { .. } => 2,
            Self::Literal | Self::Union | Self::Record => 3,
        }
    }

    /// Returns whether the pattern accepts the descriptor.
    #[must_use]
    pub fn matches(&self, descriptor: &TypeDescriptor) -> bool {
        match (self, descriptor) {
            (Self::Exact(name), TypeDescriptor::Named(actual)) => name == actual,
            (Self::Generic(origin), TypeDescriptor::Generic { origin: actual, .. }) => {
                origin == actual
            }
            (Self::Custom { predicate, .. }, _) => predicate(descriptor),
            (Self::Literal, TypeDescriptor::Literal(_))
            | (Self::Union, TypeDescriptor::Union(_))
            | (Self::Record, TypeDescriptor::Record(_)) => true,
            _ => false,
        }
    }

    /// Returns whether two patterns address the same slot in the registry.
    fn same_slot(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Exact(a), Self::Exact(b)) | (Self::Generic(a), Self::Generic(b)) => a == b,
            (Self::Custom { label: a, .. }, Self::Custom { label: b, .. }) => a == b,
            (Self::Literal, Self::Literal)
            | (Self::Union, Self::Union)
            | (Self::Record, Self::Record) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for TypePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(name) => f.debug_tuple("Exact").field(name).finish(),
            Self::Generic(origin) => f.debug_tuple("Generic").field(origin).finish(),
            Self::Custom { label, .. } => f.debug_struct("Custom").field("label", label).finish(),
            Self::Literal => f.write_str("Literal"),
            Self::Union => f.write_str("Union"),
            Self::Record => f.write_str("Record"),
        }
    }
}

#[derive(Clone)]
struct Entry {
    pattern: TypePattern,
    extractor: Arc<dyn Extractor>,
}

/// Ordered table of extractors.
#[derive(Clone)]
pub struct ExtractorRegistry {
    entries: Vec<Entry>,
}

impl ExtractorRegistry {
    /// A registry with no extractors.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// A registry with the built-in extractors for std and chrono types,
    /// containers, literals, unions and records.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        crate::extractors::register_defaults(&mut registry);
        registry
    }

    /// Adds an extractor, replacing any entry with the same pattern.
    pub fn register(&mut self, pattern: TypePattern, extractor: impl Extractor + 'static) {
        self.entries.retain(|entry| !entry.pattern.same_slot(&pattern));
        self.entries.push(Entry {
            pattern,
            extractor: Arc::new(extractor),
        });
    }

    /// Returns a copy of this registry with an extra extractor.
    #[must_use]
    pub fn with(mut self, pattern: TypePattern, extractor: impl Extractor + 'static) -> Self {
        self.register(pattern, extractor);
        self
    }

    /// Finds the extractor for a descriptor.
    #[must_use]
    pub fn resolve(&self, descriptor: &TypeDescriptor) -> Option<&dyn Extractor> {
        (0..=3).find_map(|tier| {
            self.entries
                .iter()
                .rev()
                .find(|entry| entry.pattern.tier() == tier && entry.pattern.matches(descriptor))
                .map(|entry| entry.extractor.as_ref())
        })
    }

    /// Builds the node for a descriptor declared at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnsupportedType`] naming `path` if no extractor
    /// matches, or the extractor's own error.
    pub fn extract(&self, descriptor: &TypeDescriptor, path: &str) -> Result<SchemaNode, SchemaError> {
        ExtractContext::new(self, path.to_string()).resolve(descriptor)
    }

    /// Returns the registered patterns in registration order.
    pub fn patterns(&self) -> impl Iterator<Item = &TypePattern> {
        self.entries.iter().map(|entry| &entry.pattern)
    }

    /// Returns the number of registered extractors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether no extractor is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.patterns()).finish()
    }
}

/// Resolution state passed to extractors: the registry and the path of the
/// value being extracted.
#[derive(Debug)]
pub struct ExtractContext<'a> {
    registry: &'a ExtractorRegistry,
    path: String,
}

impl<'a> ExtractContext<'a> {
    pub(crate) fn new(registry: &'a ExtractorRegistry, path: String) -> Self {
        Self { registry, path }
    }

    /// The registry being resolved against.
    #[must_use]
    pub fn registry(&self) -> &'a ExtractorRegistry {
        self.registry
    }

    /// Path of the parameter or field being extracted, such as `config.retry`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Resolves a descriptor at the current path.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnsupportedType`] if no extractor matches, or
    /// [`SchemaError::RecursiveType`] for a [`TypeDescriptor::Recursive`].
    pub fn resolve(&self, descriptor: &TypeDescriptor) -> Result<SchemaNode, SchemaError> {
        if let TypeDescriptor::Recursive(name) = descriptor {
            return Err(SchemaError::RecursiveType {
                path: self.path.clone(),
                type_name: name.to_string(),
            });
        }
        let extractor = self
            .registry
            .resolve(descriptor)
            .ok_or_else(|| self.unsupported(descriptor))?;
        extractor.extract(descriptor, self)
    }

    /// Resolves the element type of a sequence.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnsupportedType`] if no extractor matches.
    pub fn item(&self, descriptor: &TypeDescriptor) -> Result<SchemaNode, SchemaError> {
        ExtractContext::new(self.registry, format!("{}[]", self.path)).resolve(descriptor)
    }

    /// Resolves the type of a named field.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnsupportedType`] if no extractor matches.
    pub fn field(&self, name: &str, descriptor: &TypeDescriptor) -> Result<SchemaNode, SchemaError> {
        ExtractContext::new(self.registry, join_path(&self.path, name)).resolve(descriptor)
    }

    /// Builds an object node from a record signature, using its docs for
    /// field descriptions.
    ///
    /// # Errors
    ///
    /// Propagates field extraction, duplicate and default errors.
    pub fn record(&self, signature: &Signature) -> Result<ObjectNode, SchemaError> {
        build_object(self.registry, &self.path, signature)
    }

    /// An [`UnsupportedType`](SchemaError::UnsupportedType) error for the current path.
    #[must_use]
    pub fn unsupported(&self, descriptor: &TypeDescriptor) -> SchemaError {
        SchemaError::unsupported_type(self.path.clone(), descriptor.display_name())
    }
}

pub(crate) fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describe::Describe;
    use crate::node::{PrimitiveKind, StringFormat};

    #[test]
    fn exact_beats_custom_regardless_of_order() {
        let registry = ExtractorRegistry::empty()
            .with(
                TypePattern::exact("i32"),
                extractor_fn(|_, _| Ok(SchemaNode::integer())),
            )
            .with(
                TypePattern::custom("everything", |_| true),
                extractor_fn(|_, _| Ok(SchemaNode::string())),
            );

        let node = registry.extract(&i32::describe(), "x").unwrap();
        assert_eq!(node, SchemaNode::integer());
        let fallback = registry.extract(&bool::describe(), "y").unwrap();
        assert_eq!(fallback, SchemaNode::string());
    }

    #[test]
    fn register_overrides_same_pattern() {
        let mut registry = ExtractorRegistry::with_defaults();
        let before = registry.len();
        registry.register(
            TypePattern::exact("String"),
            extractor_fn(|_, _| {
                Ok(SchemaNode::Primitive(
                    crate::node::PrimitiveNode::new(PrimitiveKind::String)
                        .with_format(StringFormat::Date),
                ))
            }),
        );

        assert_eq!(registry.len(), before);
        let node = registry.extract(&String::describe(), "when").unwrap();
        let SchemaNode::Primitive(primitive) = node else {
            panic!("expected primitive");
        };
        assert_eq!(primitive.format(), Some(StringFormat::Date));
    }

    #[test]
    fn derived_registry_leaves_original_untouched() {
        let base = ExtractorRegistry::empty();
        let derived = base
            .clone()
            .with(
                TypePattern::exact("u8"),
                extractor_fn(|_, _| Ok(SchemaNode::integer())),
            );

        assert!(base.resolve(&u8::describe()).is_none());
        assert!(derived.resolve(&u8::describe()).is_some());
    }

    #[test]
    fn unsupported_type_names_the_path() {
        struct Opaque;
        impl Describe for Opaque {
            fn describe() -> TypeDescriptor {
                TypeDescriptor::of::<Self>()
            }
        }

        let err = ExtractorRegistry::with_defaults()
            .extract(&<Vec<Opaque>>::describe(), "items")
            .unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnsupportedType { ref path, .. } if path == "items[]"
        ));
    }
}
