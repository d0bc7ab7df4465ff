//! Schema node → target validator.
//!
//! One recursive pass, no state besides the read-only input. Every produced
//! validator is `required` unless an optional/nullish wrapper marked it and no
//! enclosing `non_optional`/`non_nullish` suppressed that wrapper.
use indexmap::IndexMap;

use crate::error::{ConvertError, Unsupported};
use crate::metadata;
use crate::node::{Descriptor, NodeKind, SchemaNode, SourceLiteral, TypeTag};
use crate::reduce::{reduce, LiteralPolicy};
use crate::validator::{LiteralValue, Validator};

pub type Result<T> = std::result::Result<T, ConvertError>;

/// Suppression flags set by `non_nullable`, `non_nullish` and `non_optional`.
///
/// Flags follow a chain of wrappers and reset at structural boundaries (array
/// items, object entries, record values, union/variant options).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierContext {
    pub in_non_nullable: bool,
    pub in_non_nullish: bool,
    pub in_non_optional: bool,
}

impl ModifierContext {
    pub fn non_nullable(self) -> Self { Self { in_non_nullable: true, ..self } }
    pub fn non_nullish(self) -> Self { Self { in_non_nullish: true, ..self } }
    pub fn non_optional(self) -> Self { Self { in_non_optional: true, ..self } }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Converter {
    pub literal_policy: LiteralPolicy,
}

/// Convert with the default [`Converter`].
pub fn convert(node: &SchemaNode, ctx: ModifierContext) -> Result<Validator> {
    Converter::default().convert(node, ctx)
}

/// Dispatch on a bare `{ type, expects? }` descriptor.
///
/// Kinds that need a payload the descriptor can't carry fall back to `any`.
pub fn convert_descriptor(descriptor: &Descriptor) -> Result<Validator> {
    match &descriptor.type_tag {
        TypeTag::String => Ok(Validator::string()),
        TypeTag::Number | TypeTag::Nan => Ok(Validator::float64()),
        TypeTag::Boolean => Ok(Validator::boolean()),
        TypeTag::Bigint => Ok(Validator::int64()),
        TypeTag::Null => Ok(Validator::null()),
        TypeTag::Instance => instance(descriptor.expects.as_deref().unwrap_or("undefined")),
        TypeTag::Undefined => Ok(Validator::any().optional()),
        TypeTag::Blob => Err(Unsupported::Blob.into()),
        TypeTag::File => Err(Unsupported::File.into()),
        TypeTag::Date => Err(Unsupported::Date.into()),
        TypeTag::Function => Err(Unsupported::Function.into()),
        TypeTag::Intersect => Err(Unsupported::Intersect.into()),
        TypeTag::Lazy => Err(Unsupported::Lazy.into()),
        TypeTag::Never => Err(Unsupported::Never.into()),
        TypeTag::Promise => Err(Unsupported::Promise.into()),
        TypeTag::Void => Err(Unsupported::Void.into()),
        TypeTag::Literal
        | TypeTag::Array
        | TypeTag::Object
        | TypeTag::StrictObject
        | TypeTag::Record
        | TypeTag::Union
        | TypeTag::Variant
        | TypeTag::Optional
        | TypeTag::Undefinedable
        | TypeTag::NonOptional
        | TypeTag::Nullable
        | TypeTag::NonNullable
        | TypeTag::Nullish
        | TypeTag::NonNullish
        | TypeTag::Enum
        | TypeTag::Picklist
        | TypeTag::ExactOptional
        | TypeTag::Custom
        | TypeTag::Unknown(_) => Ok(Validator::any()),
    }
}

fn instance(expects: &str) -> Result<Validator> {
    if expects == "ArrayBuffer" {
        Ok(Validator::bytes())
    } else {
        Err(Unsupported::Instance { expects: expects.to_owned() }.into())
    }
}

fn literal(literal: &SourceLiteral) -> Result<Validator> {
    match literal {
        SourceLiteral::Value(value) => Ok(Validator::literal(value.clone())),
        SourceLiteral::Symbol { description } => {
            Err(ConvertError::UnsupportedLiteralValue { description: description.clone() })
        }
    }
}

fn literal_union(options: &[LiteralValue]) -> Validator {
    Validator::union(options.iter().cloned().map(Validator::literal).collect())
}

impl Converter {
    pub fn new(literal_policy: LiteralPolicy) -> Self {
        Self { literal_policy }
    }

    pub fn convert(&self, node: &SchemaNode, ctx: ModifierContext) -> Result<Validator> {
        if let Some(tagged) = metadata::resolve(node) {
            return Ok(tagged);
        }

        match &node.kind {
            NodeKind::String => Ok(Validator::string()),
            NodeKind::Number | NodeKind::Nan => Ok(Validator::float64()),
            NodeKind::Boolean => Ok(Validator::boolean()),
            NodeKind::Bigint => Ok(Validator::int64()),
            NodeKind::Literal { literal: lit } => literal(lit),
            NodeKind::Instance { expects } => instance(expects),
            NodeKind::Null => Ok(Validator::null()),

            NodeKind::Array { item } => Ok(Validator::array(self.required(item)?)),
            NodeKind::Object { entries } | NodeKind::StrictObject { entries } => {
                let fields = entries
                    .iter()
                    .map(|(name, entry)| {
                        Ok::<_, ConvertError>((name.clone(), self.convert(entry, ModifierContext::default())?))
                    })
                    .collect::<Result<IndexMap<_, _>>>()?;
                Ok(Validator::object(fields))
            }
            NodeKind::Record { value } => Ok(Validator::record(Validator::string(), self.required(value)?)),
            NodeKind::Union { options } => {
                let members = options.iter().map(|o| self.required(o)).collect::<Result<Vec<_>>>()?;
                Ok(reduce(members, self.literal_policy))
            }
            // Options stay distinct: no kind collapse.
            NodeKind::Variant { options, .. } => {
                let members = options.iter().map(|o| self.required(o)).collect::<Result<Vec<_>>>()?;
                Ok(Validator::union(members))
            }

            NodeKind::Optional { wrapped } | NodeKind::Undefinedable { wrapped } => {
                if ctx.in_non_optional {
                    Ok(self.convert(wrapped, ctx)?.required())
                } else {
                    Ok(self.convert(wrapped, ctx)?.optional())
                }
            }
            NodeKind::NonOptional { wrapped } => self.convert(wrapped, ctx.non_optional()),
            NodeKind::Nullable { wrapped } => {
                let inner = self.convert(wrapped, ctx)?.required();
                if ctx.in_non_nullable {
                    Ok(inner)
                } else {
                    Ok(Validator::union(vec![Validator::null(), inner]))
                }
            }
            NodeKind::NonNullable { wrapped } => self.convert(wrapped, ctx.non_nullable()),
            NodeKind::Nullish { wrapped } => {
                let inner = self.convert(wrapped, ctx)?.required();
                if ctx.in_non_nullish {
                    Ok(inner)
                } else {
                    Ok(Validator::union(vec![Validator::null(), inner]).optional())
                }
            }
            NodeKind::NonNullish { wrapped } => self.convert(wrapped, ctx.non_nullish()),

            NodeKind::Enum { options } | NodeKind::Picklist { options } => Ok(literal_union(options)),
            NodeKind::ExactOptional { .. } => convert_descriptor(&Descriptor::new(node.type_tag())),
            NodeKind::Undefined => Ok(Validator::any().optional()),

            NodeKind::Blob => Err(Unsupported::Blob.into()),
            NodeKind::File => Err(Unsupported::File.into()),
            NodeKind::Date => Err(Unsupported::Date.into()),
            NodeKind::Function => Err(Unsupported::Function.into()),
            NodeKind::Intersect { .. } => Err(Unsupported::Intersect.into()),
            NodeKind::Lazy => Err(Unsupported::Lazy.into()),
            NodeKind::Never => Err(Unsupported::Never.into()),
            NodeKind::Promise => Err(Unsupported::Promise.into()),
            NodeKind::Void => Err(Unsupported::Void.into()),

            NodeKind::Custom | NodeKind::Unknown { .. } => Ok(Validator::any()),
        }
    }

    /// Convert at a structural boundary: fresh context, forced `required`.
    fn required(&self, node: &SchemaNode) -> Result<Validator> {
        Ok(self.convert(node, ModifierContext::default())?.required())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
