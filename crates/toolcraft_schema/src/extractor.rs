//! Turning signatures into callable schemas.

use crate::callable::CallableSchema;
use crate::describe::{Describe, Signature, TypeDescriptor};
use crate::docstring::Docstring;
use crate::error::SchemaError;
use crate::node::{Field, ObjectNode, SchemaNode};
use crate::registry::{ExtractContext, Extractor, ExtractorRegistry, TypePattern, join_path};
use std::collections::HashSet;
use std::sync::LazyLock;

static SHARED: LazyLock<SchemaExtractor> = LazyLock::new(SchemaExtractor::default);

/// Builds [`CallableSchema`]s from [`Signature`]s.
///
/// Extraction is a pure function of the signature and the registry. Each
/// extractor owns its registry, so customising one never affects another.
#[derive(Debug, Clone, Default)]
pub struct SchemaExtractor {
    registry: ExtractorRegistry,
}

impl SchemaExtractor {
    /// Creates an extractor over a registry.
    #[must_use]
    pub fn new(registry: ExtractorRegistry) -> Self {
        Self { registry }
    }

    /// The process-wide extractor with the default registry.
    #[must_use]
    pub fn shared() -> &'static Self {
        &SHARED
    }

    /// The registry used for type resolution.
    #[must_use]
    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    /// Returns a new extractor whose registry has one more extractor.
    #[must_use]
    pub fn with_extractor(&self, pattern: TypePattern, extractor: impl Extractor + 'static) -> Self {
        Self {
            registry: self.registry.clone().with(pattern, extractor),
        }
    }

    /// Extracts the schema of a callable.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::UnsupportedType`] if a parameter type has no extractor.
    /// - [`SchemaError::DuplicateParameter`] if two parameters share a name.
    /// - [`SchemaError::InvalidDefault`] if a default fails its own schema.
    pub fn extract(&self, signature: &Signature) -> Result<CallableSchema, SchemaError> {
        tracing::debug!(callable = %signature.name, params = signature.params.len(), "extracting schema");

        let (call_schema, doc) = build_object_with_doc(&self.registry, "", signature)?;

        let return_schema = match &signature.returns {
            None | Some(TypeDescriptor::Unit | TypeDescriptor::Any) => None,
            Some(returns) => Some(self.registry.extract(returns, "return")?),
        };

        Ok(CallableSchema::new(
            signature.name.clone(),
            call_schema,
            return_schema,
            doc.long_description().map(str::to_string),
        ))
    }

    /// Extracts the node for a single type descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnsupportedType`] naming `path` if no extractor matches.
    pub fn extract_type(&self, descriptor: &TypeDescriptor, path: &str) -> Result<SchemaNode, SchemaError> {
        self.registry.extract(descriptor, path)
    }

    /// Extracts the node for a type implementing [`Describe`].
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnsupportedType`] if no extractor matches.
    pub fn extract_described<T: Describe + ?Sized>(&self) -> Result<SchemaNode, SchemaError> {
        self.registry.extract(&T::describe(), "$")
    }
}

pub(crate) fn build_object(
    registry: &ExtractorRegistry,
    path: &str,
    signature: &Signature,
) -> Result<ObjectNode, SchemaError> {
    build_object_with_doc(registry, path, signature).map(|(object, _)| object)
}

fn build_object_with_doc(
    registry: &ExtractorRegistry,
    path: &str,
    signature: &Signature,
) -> Result<(ObjectNode, Docstring), SchemaError> {
    let doc = signature
        .doc
        .as_deref()
        .map(Docstring::parse)
        .unwrap_or_default();

    let mut seen = HashSet::new();
    for param in &signature.params {
        if !seen.insert(param.name.as_str()) {
            return Err(SchemaError::DuplicateParameter {
                callable: signature.name.clone(),
                name: param.name.clone(),
            });
        }
    }

    for (name, _) in doc.params() {
        if !seen.contains(name) {
            tracing::warn!(
                callable = %signature.name,
                param = name,
                "documented parameter does not exist"
            );
        }
    }

    let mut builder = ObjectNode::builder().maybe_description(doc.summary().map(str::to_string));

    for param in &signature.params {
        let param_path = join_path(path, &param.name);
        let node = ExtractContext::new(registry, param_path.clone()).resolve(&param.ty)?;

        let description = param
            .doc
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .or_else(|| doc.param(&param.name));

        let default = match &param.default {
            Some(default) => Some(node.eval(default).map_err(|source| {
                SchemaError::InvalidDefault {
                    path: param_path.clone(),
                    source,
                }
            })?),
            None => None,
        };

        let mut field = Field::new(node);
        if let Some(default) = default {
            field = field.with_default(default);
        }
        if let Some(description) = description {
            field = field.with_description(description);
        }
        builder = builder.field(param.name.clone(), field);
    }

    Ok((builder.build()?, doc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describe::Param;
    use serde_json::json;

    #[test]
    fn inline_docs_win_over_docstring() {
        let signature = Signature::new("greet")
            .with_doc("Greets someone.\n\nArgs:\n    name: From the docstring.\n    ghost: Not a parameter.")
            .param(Param::of::<String>("name").with_doc("Inline doc."));

        let schema = SchemaExtractor::shared().extract(&signature).unwrap();
        let field = schema.call_schema().field("name").unwrap();
        assert_eq!(field.description(), Some("Inline doc."));
        assert_eq!(schema.summary(), Some("Greets someone."));
    }

    #[test]
    fn duplicate_parameters_fail() {
        let signature = Signature::new("f")
            .param(Param::of::<i32>("x"))
            .param(Param::of::<String>("x"));

        assert!(matches!(
            SchemaExtractor::shared().extract(&signature),
            Err(SchemaError::DuplicateParameter { ref name, .. }) if name == "x"
        ));
    }

    #[test]
    fn invalid_default_fails() {
        let signature =
            Signature::new("f").param(Param::of::<u8>("level").with_default(json!("high")));

        let err = SchemaExtractor::shared().extract(&signature).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDefault { ref path, .. } if path == "level"));
    }

    #[test]
    fn unit_and_any_returns_have_no_schema() {
        let unit = Signature::new("f").returns(<()>::describe());
        let any = Signature::new("g").returns(serde_json::Value::describe());
        let typed = Signature::new("h").returns(<Vec<i64>>::describe());

        let extractor = SchemaExtractor::shared();
        assert!(extractor.extract(&unit).unwrap().return_schema().is_none());
        assert!(extractor.extract(&any).unwrap().return_schema().is_none());
        assert_eq!(
            extractor.extract(&typed).unwrap().return_schema(),
            Some(&SchemaNode::array(SchemaNode::integer()))
        );
    }

    #[test]
    fn nested_record_paths_in_errors() {
        struct Opaque;
        impl Describe for Opaque {
            fn describe() -> TypeDescriptor {
                TypeDescriptor::of::<Self>()
            }
        }

        let record = Signature::new("Config").param(Param::of::<Opaque>("handle"));
        let signature = Signature::new("configure").param(Param::new(
            "config",
            TypeDescriptor::record(record),
        ));

        let err = SchemaExtractor::shared().extract(&signature).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnsupportedType { ref path, .. } if path == "config.handle"
        ));
    }
}
