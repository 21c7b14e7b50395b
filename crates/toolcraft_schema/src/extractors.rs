//! Built-in extractors.

use crate::describe::TypeDescriptor;
use crate::error::SchemaError;
use crate::node::{
    ArrayNode, EnumNode, IntegerBounds, LengthBounds, PrimitiveKind, PrimitiveNode, SchemaNode,
    StringFormat, UnionNode,
};
use crate::registry::{ExtractContext, ExtractorRegistry, TypePattern, extractor_fn};

const SEQUENCES: &[&str] = &["Vec", "VecDeque", "HashSet", "BTreeSet", "slice"];
const POINTERS: &[&str] = &["Box", "Arc", "Rc"];

fn integer(min: i64, max: u64) -> SchemaNode {
    SchemaNode::Primitive(
        PrimitiveNode::new(PrimitiveKind::Integer).with_bounds(IntegerBounds::new(min, max)),
    )
}

fn formatted(format: StringFormat) -> SchemaNode {
    SchemaNode::Primitive(PrimitiveNode::new(PrimitiveKind::String).with_format(format))
}

fn register_node(registry: &mut ExtractorRegistry, name: &'static str, node: SchemaNode) {
    registry.register(
        TypePattern::exact(name),
        extractor_fn(move |_, _| Ok(node.clone())),
    );
}

/// Returns the single type argument of a generic descriptor.
fn type_arg<'d>(
    descriptor: &'d TypeDescriptor,
    cx: &ExtractContext<'_>,
) -> Result<&'d TypeDescriptor, SchemaError> {
    match descriptor {
        TypeDescriptor::Generic { args, .. } if args.len() == 1 => Ok(&args[0]),
        _ => Err(cx.unsupported(descriptor)),
    }
}

pub(crate) fn register_defaults(registry: &mut ExtractorRegistry) {
    register_node(registry, "bool", SchemaNode::boolean());

    register_node(registry, "i8", integer(i8::MIN.into(), 127));
    register_node(registry, "i16", integer(i16::MIN.into(), 32_767));
    register_node(registry, "i32", integer(i32::MIN.into(), 2_147_483_647));
    register_node(registry, "i64", SchemaNode::integer());
    register_node(registry, "isize", SchemaNode::integer());
    register_node(registry, "u8", integer(0, u8::MAX.into()));
    register_node(registry, "u16", integer(0, u16::MAX.into()));
    register_node(registry, "u32", integer(0, u32::MAX.into()));
    register_node(registry, "u64", integer(0, u64::MAX));
    register_node(registry, "usize", integer(0, u64::MAX));

    register_node(registry, "f32", SchemaNode::number());
    register_node(registry, "f64", SchemaNode::number());

    register_node(registry, "String", SchemaNode::string());
    register_node(registry, "str", SchemaNode::string());
    register_node(
        registry,
        "char",
        PrimitiveNode::new(PrimitiveKind::String)
            .with_length(LengthBounds::exact(1))
            .into(),
    );

    register_node(registry, "chrono::NaiveDate", formatted(StringFormat::Date));
    register_node(registry, "chrono::NaiveDateTime", formatted(StringFormat::DateTime));
    register_node(registry, "chrono::DateTime", formatted(StringFormat::DateTime));
    register_node(registry, "chrono::NaiveTime", formatted(StringFormat::Time));

    registry.register(
        TypePattern::generic("Option"),
        extractor_fn(|descriptor, cx| {
            let inner = type_arg(descriptor, cx)?;
            Ok(SchemaNode::optional(cx.resolve(inner)?))
        }),
    );

    for origin in SEQUENCES {
        registry.register(
            TypePattern::generic(*origin),
            extractor_fn(|descriptor, cx| {
                let item = type_arg(descriptor, cx)?;
                Ok(SchemaNode::array(cx.item(item)?))
            }),
        );
    }

    registry.register(
        TypePattern::custom("array", |descriptor| {
            matches!(descriptor, TypeDescriptor::FixedArray { .. })
        }),
        extractor_fn(|descriptor, cx| match descriptor {
            TypeDescriptor::FixedArray { item, len } => Ok(ArrayNode::new(cx.item(item)?)
                .with_length(LengthBounds::exact(*len))
                .into()),
            _ => Err(cx.unsupported(descriptor)),
        }),
    );

    for origin in POINTERS {
        registry.register(
            TypePattern::generic(*origin),
            extractor_fn(|descriptor, cx| cx.resolve(type_arg(descriptor, cx)?)),
        );
    }

    registry.register(
        TypePattern::Literal,
        extractor_fn(|descriptor, cx| match descriptor {
            TypeDescriptor::Literal(values) => EnumNode::new(values.iter().cloned())
                .map(SchemaNode::from)
                .map_err(|_| cx.unsupported(descriptor)),
            _ => Err(cx.unsupported(descriptor)),
        }),
    );

    registry.register(
        TypePattern::Union,
        extractor_fn(|descriptor, cx| {
            let TypeDescriptor::Union(options) = descriptor else {
                return Err(cx.unsupported(descriptor));
            };
            let nodes = options
                .iter()
                .map(|option| cx.resolve(option))
                .collect::<Result<Vec<_>, _>>()?;
            UnionNode::new(nodes)
                .map(SchemaNode::from)
                .map_err(|err| match err {
                    SchemaError::UnsupportedUnion(reason) => {
                        SchemaError::UnsupportedUnion(format!("{}: {reason}", cx.path()))
                    }
                    other => other,
                })
        }),
    );

    registry.register(
        TypePattern::Record,
        extractor_fn(|descriptor, cx| match descriptor {
            TypeDescriptor::Record(signature) => Ok(cx.record(signature)?.into()),
            _ => Err(cx.unsupported(descriptor)),
        }),
    );
}
