//! Schema node tree (the input side).
//!
//! A `SchemaNode` is an already-built schema description: a closed `NodeKind`
//! with its kind-specific payload, plus out-of-band metadata. The converter only
//! reads it. The wire form is the JSON shape a schema library would dump:
//!
//! ```json
//! { "kind": "schema", "type": "optional", "wrapped": { "type": "string" },
//!   "metadata": { "_CV_ID_": "users" } }
//! ```
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::NodeError;
use crate::metadata::{self, Tag};
use crate::validator::{LiteralValue, Validator};

/// Value of the `kind` field on every full schema object.
pub const SCHEMA_SENTINEL: &str = "schema";

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawNode")]
pub struct SchemaNode {
    pub kind: NodeKind,
    /// Lifted from the reserved metadata keys, see [`crate::metadata`].
    pub tag: Option<Tag>,
    /// Everything else attached at authoring time. Carried, never interpreted.
    pub metadata: IndexMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    String,
    Number,
    Nan,
    Boolean,
    Bigint,
    Literal { literal: SourceLiteral },
    Instance { expects: String },
    Null,
    Array { item: Box<SchemaNode> },
    Object { entries: IndexMap<String, SchemaNode> },
    StrictObject { entries: IndexMap<String, SchemaNode> },
    Record { value: Box<SchemaNode> },
    Union { options: Vec<SchemaNode> },
    Variant { key: String, options: Vec<SchemaNode> },
    Optional { wrapped: Box<SchemaNode> },
    Undefinedable { wrapped: Box<SchemaNode> },
    NonOptional { wrapped: Box<SchemaNode> },
    Nullable { wrapped: Box<SchemaNode> },
    NonNullable { wrapped: Box<SchemaNode> },
    Nullish { wrapped: Box<SchemaNode> },
    NonNullish { wrapped: Box<SchemaNode> },
    Enum { options: Vec<LiteralValue> },
    Picklist { options: Vec<LiteralValue> },
    ExactOptional { wrapped: Box<SchemaNode> },
    Blob,
    File,
    Date,
    Function,
    Intersect { options: Vec<SchemaNode> },
    Lazy,
    Never,
    Promise,
    Undefined,
    Void,
    /// User-defined check with no structural payload.
    Custom,
    Unknown { type_name: String },
}

/// Payload-free discriminant of a [`NodeKind`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    String,
    Number,
    Nan,
    Boolean,
    Bigint,
    Literal,
    Instance,
    Null,
    Array,
    Object,
    StrictObject,
    Record,
    Union,
    Variant,
    Optional,
    Undefinedable,
    NonOptional,
    Nullable,
    NonNullable,
    Nullish,
    NonNullish,
    Enum,
    Picklist,
    ExactOptional,
    Blob,
    File,
    Date,
    Function,
    Intersect,
    Lazy,
    Never,
    Promise,
    Undefined,
    Void,
    Custom,
    Unknown(String),
}

/// Literal as the schema library allows it: anything the target accepts, plus symbols.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceLiteral {
    Symbol {
        #[serde(rename = "$symbol")]
        description: String,
    },
    Value(LiteralValue),
}

/// Bare `{ type, expects? }` shape used for direct dispatch without payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    #[serde(rename = "type", with = "type_tag_str")]
    pub type_tag: TypeTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expects: Option<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// TYPE TAGS
// ————————————————————————————————————————————————————————————————————————————

impl TypeTag {
    pub fn parse(s: &str) -> Self {
        match s {
            "string" => TypeTag::String,
            "number" => TypeTag::Number,
            "nan" => TypeTag::Nan,
            "boolean" => TypeTag::Boolean,
            "bigint" => TypeTag::Bigint,
            "literal" => TypeTag::Literal,
            "instance" => TypeTag::Instance,
            "null" => TypeTag::Null,
            "array" => TypeTag::Array,
            "object" => TypeTag::Object,
            "strict_object" => TypeTag::StrictObject,
            "record" => TypeTag::Record,
            "union" => TypeTag::Union,
            "variant" => TypeTag::Variant,
            "optional" => TypeTag::Optional,
            "undefinedable" => TypeTag::Undefinedable,
            "non_optional" => TypeTag::NonOptional,
            "nullable" => TypeTag::Nullable,
            "non_nullable" => TypeTag::NonNullable,
            "nullish" => TypeTag::Nullish,
            "non_nullish" => TypeTag::NonNullish,
            "enum" => TypeTag::Enum,
            "picklist" => TypeTag::Picklist,
            "exact_optional" => TypeTag::ExactOptional,
            "blob" => TypeTag::Blob,
            "file" => TypeTag::File,
            "date" => TypeTag::Date,
            "function" => TypeTag::Function,
            "intersect" => TypeTag::Intersect,
            "lazy" => TypeTag::Lazy,
            "never" => TypeTag::Never,
            "promise" => TypeTag::Promise,
            "undefined" => TypeTag::Undefined,
            "void" => TypeTag::Void,
            "custom" => TypeTag::Custom,
            other => TypeTag::Unknown(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TypeTag::String => "string",
            TypeTag::Number => "number",
            TypeTag::Nan => "nan",
            TypeTag::Boolean => "boolean",
            TypeTag::Bigint => "bigint",
            TypeTag::Literal => "literal",
            TypeTag::Instance => "instance",
            TypeTag::Null => "null",
            TypeTag::Array => "array",
            TypeTag::Object => "object",
            TypeTag::StrictObject => "strict_object",
            TypeTag::Record => "record",
            TypeTag::Union => "union",
            TypeTag::Variant => "variant",
            TypeTag::Optional => "optional",
            TypeTag::Undefinedable => "undefinedable",
            TypeTag::NonOptional => "non_optional",
            TypeTag::Nullable => "nullable",
            TypeTag::NonNullable => "non_nullable",
            TypeTag::Nullish => "nullish",
            TypeTag::NonNullish => "non_nullish",
            TypeTag::Enum => "enum",
            TypeTag::Picklist => "picklist",
            TypeTag::ExactOptional => "exact_optional",
            TypeTag::Blob => "blob",
            TypeTag::File => "file",
            TypeTag::Date => "date",
            TypeTag::Function => "function",
            TypeTag::Intersect => "intersect",
            TypeTag::Lazy => "lazy",
            TypeTag::Never => "never",
            TypeTag::Promise => "promise",
            TypeTag::Undefined => "undefined",
            TypeTag::Void => "void",
            TypeTag::Custom => "custom",
            TypeTag::Unknown(name) => name,
        }
    }
}

impl NodeKind {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            NodeKind::String => TypeTag::String,
            NodeKind::Number => TypeTag::Number,
            NodeKind::Nan => TypeTag::Nan,
            NodeKind::Boolean => TypeTag::Boolean,
            NodeKind::Bigint => TypeTag::Bigint,
            NodeKind::Literal { .. } => TypeTag::Literal,
            NodeKind::Instance { .. } => TypeTag::Instance,
            NodeKind::Null => TypeTag::Null,
            NodeKind::Array { .. } => TypeTag::Array,
            NodeKind::Object { .. } => TypeTag::Object,
            NodeKind::StrictObject { .. } => TypeTag::StrictObject,
            NodeKind::Record { .. } => TypeTag::Record,
            NodeKind::Union { .. } => TypeTag::Union,
            NodeKind::Variant { .. } => TypeTag::Variant,
            NodeKind::Optional { .. } => TypeTag::Optional,
            NodeKind::Undefinedable { .. } => TypeTag::Undefinedable,
            NodeKind::NonOptional { .. } => TypeTag::NonOptional,
            NodeKind::Nullable { .. } => TypeTag::Nullable,
            NodeKind::NonNullable { .. } => TypeTag::NonNullable,
            NodeKind::Nullish { .. } => TypeTag::Nullish,
            NodeKind::NonNullish { .. } => TypeTag::NonNullish,
            NodeKind::Enum { .. } => TypeTag::Enum,
            NodeKind::Picklist { .. } => TypeTag::Picklist,
            NodeKind::ExactOptional { .. } => TypeTag::ExactOptional,
            NodeKind::Blob => TypeTag::Blob,
            NodeKind::File => TypeTag::File,
            NodeKind::Date => TypeTag::Date,
            NodeKind::Function => TypeTag::Function,
            NodeKind::Intersect { .. } => TypeTag::Intersect,
            NodeKind::Lazy => TypeTag::Lazy,
            NodeKind::Never => TypeTag::Never,
            NodeKind::Promise => TypeTag::Promise,
            NodeKind::Undefined => TypeTag::Undefined,
            NodeKind::Void => TypeTag::Void,
            NodeKind::Custom => TypeTag::Custom,
            NodeKind::Unknown { type_name } => TypeTag::Unknown(type_name.clone()),
        }
    }
}

impl Descriptor {
    pub fn new(type_tag: TypeTag) -> Self {
        Self { type_tag, expects: None }
    }
}

mod type_tag_str {
    use super::TypeTag;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(tag: &TypeTag, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(tag.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<TypeTag, D::Error> {
        let s = String::deserialize(d)?;
        Ok(TypeTag::parse(&s))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// BUILDERS
// ————————————————————————————————————————————————————————————————————————————

fn boxed(node: SchemaNode) -> Box<SchemaNode> { Box::new(node) }

fn entries_of<K, I>(entries: I) -> IndexMap<String, SchemaNode>
where
    K: Into<String>,
    I: IntoIterator<Item = (K, SchemaNode)>,
{
    entries.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

impl SchemaNode {
    pub fn of(kind: NodeKind) -> Self {
        Self { kind, tag: None, metadata: IndexMap::new() }
    }

    pub fn string() -> Self { Self::of(NodeKind::String) }
    pub fn number() -> Self { Self::of(NodeKind::Number) }
    pub fn nan() -> Self { Self::of(NodeKind::Nan) }
    pub fn boolean() -> Self { Self::of(NodeKind::Boolean) }
    pub fn bigint() -> Self { Self::of(NodeKind::Bigint) }
    pub fn null() -> Self { Self::of(NodeKind::Null) }
    pub fn blob() -> Self { Self::of(NodeKind::Blob) }
    pub fn file() -> Self { Self::of(NodeKind::File) }
    pub fn date() -> Self { Self::of(NodeKind::Date) }
    pub fn function() -> Self { Self::of(NodeKind::Function) }
    pub fn lazy() -> Self { Self::of(NodeKind::Lazy) }
    pub fn never() -> Self { Self::of(NodeKind::Never) }
    pub fn promise() -> Self { Self::of(NodeKind::Promise) }
    pub fn undefined() -> Self { Self::of(NodeKind::Undefined) }
    pub fn void() -> Self { Self::of(NodeKind::Void) }
    pub fn custom() -> Self { Self::of(NodeKind::Custom) }

    pub fn unknown(type_name: impl Into<String>) -> Self {
        Self::of(NodeKind::Unknown { type_name: type_name.into() })
    }

    pub fn literal(value: impl Into<LiteralValue>) -> Self {
        Self::of(NodeKind::Literal { literal: SourceLiteral::Value(value.into()) })
    }

    pub fn symbol(description: impl Into<String>) -> Self {
        Self::of(NodeKind::Literal {
            literal: SourceLiteral::Symbol { description: description.into() },
        })
    }

    pub fn instance(expects: impl Into<String>) -> Self {
        Self::of(NodeKind::Instance { expects: expects.into() })
    }

    pub fn array(item: SchemaNode) -> Self {
        Self::of(NodeKind::Array { item: boxed(item) })
    }

    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, SchemaNode)>,
    {
        Self::of(NodeKind::Object { entries: entries_of(entries) })
    }

    pub fn strict_object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, SchemaNode)>,
    {
        Self::of(NodeKind::StrictObject { entries: entries_of(entries) })
    }

    pub fn record(value: SchemaNode) -> Self {
        Self::of(NodeKind::Record { value: boxed(value) })
    }

    pub fn union(options: Vec<SchemaNode>) -> Self {
        Self::of(NodeKind::Union { options })
    }

    pub fn variant(key: impl Into<String>, options: Vec<SchemaNode>) -> Self {
        Self::of(NodeKind::Variant { key: key.into(), options })
    }

    pub fn intersect(options: Vec<SchemaNode>) -> Self {
        Self::of(NodeKind::Intersect { options })
    }

    pub fn optional(wrapped: SchemaNode) -> Self {
        Self::of(NodeKind::Optional { wrapped: boxed(wrapped) })
    }

    pub fn undefinedable(wrapped: SchemaNode) -> Self {
        Self::of(NodeKind::Undefinedable { wrapped: boxed(wrapped) })
    }

    pub fn non_optional(wrapped: SchemaNode) -> Self {
        Self::of(NodeKind::NonOptional { wrapped: boxed(wrapped) })
    }

    pub fn nullable(wrapped: SchemaNode) -> Self {
        Self::of(NodeKind::Nullable { wrapped: boxed(wrapped) })
    }

    pub fn non_nullable(wrapped: SchemaNode) -> Self {
        Self::of(NodeKind::NonNullable { wrapped: boxed(wrapped) })
    }

    pub fn nullish(wrapped: SchemaNode) -> Self {
        Self::of(NodeKind::Nullish { wrapped: boxed(wrapped) })
    }

    pub fn non_nullish(wrapped: SchemaNode) -> Self {
        Self::of(NodeKind::NonNullish { wrapped: boxed(wrapped) })
    }

    pub fn exact_optional(wrapped: SchemaNode) -> Self {
        Self::of(NodeKind::ExactOptional { wrapped: boxed(wrapped) })
    }

    pub fn enum_<I, V>(options: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<LiteralValue>,
    {
        Self::of(NodeKind::Enum { options: options.into_iter().map(Into::into).collect() })
    }

    pub fn picklist<I, V>(options: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<LiteralValue>,
    {
        Self::of(NodeKind::Picklist { options: options.into_iter().map(Into::into).collect() })
    }

    /// Identifier of a row in `table_name`.
    pub fn reference(table_name: impl Into<String>) -> Self {
        Self::custom().with_tag(Tag::Reference(table_name.into()))
    }

    /// Attach a pre-built target validator; conversion returns it verbatim.
    pub fn with_validator(self, validator: Validator) -> Self {
        self.with_tag(Tag::Validator(validator))
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn type_tag(&self) -> TypeTag {
        self.kind.type_tag()
    }

    /// Object entries for `object`/`strict_object` nodes.
    pub fn entries(&self) -> Option<&IndexMap<String, SchemaNode>> {
        match &self.kind {
            NodeKind::Object { entries } | NodeKind::StrictObject { entries } => Some(entries),
            _ => None,
        }
    }
}

/// Structural check used to tell a full schema object from a plain field mapping.
///
/// A schema object carries `kind: "schema"` and a string `type`. A field mapping
/// is an object whose values are schema objects, so it never has both.
pub fn is_schema_node(value: &Value) -> bool {
    let Some(map) = value.as_object() else { return false };
    map.get("kind").and_then(Value::as_str) == Some(SCHEMA_SENTINEL)
        && map.get("type").is_some_and(Value::is_string)
}

// ————————————————————————————————————————————————————————————————————————————
// WIRE FORM
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawNode {
    #[serde(default)]
    kind: Option<String>,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    metadata: IndexMap<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    item: Option<Box<SchemaNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    entries: Option<IndexMap<String, SchemaNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Box<SchemaNode>>,
    /// Schema nodes for union/variant/intersect, plain values for enum/picklist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    options: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    wrapped: Option<Box<SchemaNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    literal: Option<SourceLiteral>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expects: Option<String>,
}

impl RawNode {
    fn bare(type_tag: &TypeTag, metadata: IndexMap<String, Value>) -> Self {
        Self {
            kind: Some(SCHEMA_SENTINEL.to_owned()),
            type_name: type_tag.as_str().to_owned(),
            metadata,
            item: None,
            entries: None,
            key: None,
            value: None,
            options: None,
            wrapped: None,
            literal: None,
            expects: None,
        }
    }
}

fn missing(type_name: &str, field: &'static str) -> NodeError {
    NodeError::MissingPayload { type_name: type_name.to_owned(), field }
}

fn decode_options<T: serde::de::DeserializeOwned>(
    type_name: &str,
    options: Option<Vec<Value>>,
) -> Result<Vec<T>, NodeError> {
    options
        .ok_or_else(|| missing(type_name, "options"))?
        .into_iter()
        .enumerate()
        .map(|(index, option)| {
            serde_json::from_value(option).map_err(|error| NodeError::BadOption {
                type_name: type_name.to_owned(),
                index,
                message: error.to_string(),
            })
        })
        .collect()
}

fn encode_options<T: Serialize>(options: Vec<T>) -> Result<Option<Vec<Value>>, serde_json::Error> {
    options.into_iter().map(serde_json::to_value).collect::<Result<_, _>>().map(Some)
}

impl TryFrom<RawNode> for SchemaNode {
    type Error = NodeError;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        if let Some(kind) = raw.kind.as_deref() {
            if kind != SCHEMA_SENTINEL {
                return Err(NodeError::NotASchema { kind: kind.to_owned() });
            }
        }
        let name = raw.type_name.as_str();
        let wrapped = |w: Option<Box<SchemaNode>>| w.ok_or_else(|| missing(name, "wrapped"));
        let kind = match TypeTag::parse(name) {
            TypeTag::String => NodeKind::String,
            TypeTag::Number => NodeKind::Number,
            TypeTag::Nan => NodeKind::Nan,
            TypeTag::Boolean => NodeKind::Boolean,
            TypeTag::Bigint => NodeKind::Bigint,
            TypeTag::Literal => NodeKind::Literal {
                literal: raw.literal.ok_or_else(|| missing(name, "literal"))?,
            },
            TypeTag::Instance => NodeKind::Instance {
                expects: raw.expects.ok_or_else(|| missing(name, "expects"))?,
            },
            TypeTag::Null => NodeKind::Null,
            TypeTag::Array => NodeKind::Array {
                item: raw.item.ok_or_else(|| missing(name, "item"))?,
            },
            TypeTag::Object => NodeKind::Object {
                entries: raw.entries.ok_or_else(|| missing(name, "entries"))?,
            },
            TypeTag::StrictObject => NodeKind::StrictObject {
                entries: raw.entries.ok_or_else(|| missing(name, "entries"))?,
            },
            TypeTag::Record => NodeKind::Record {
                value: raw.value.ok_or_else(|| missing(name, "value"))?,
            },
            TypeTag::Union => NodeKind::Union { options: decode_options(name, raw.options)? },
            TypeTag::Variant => NodeKind::Variant {
                key: raw.key.as_ref().and_then(Value::as_str).unwrap_or_default().to_owned(),
                options: decode_options(name, raw.options)?,
            },
            TypeTag::Intersect => NodeKind::Intersect { options: decode_options(name, raw.options)? },
            TypeTag::Optional => NodeKind::Optional { wrapped: wrapped(raw.wrapped)? },
            TypeTag::Undefinedable => NodeKind::Undefinedable { wrapped: wrapped(raw.wrapped)? },
            TypeTag::NonOptional => NodeKind::NonOptional { wrapped: wrapped(raw.wrapped)? },
            TypeTag::Nullable => NodeKind::Nullable { wrapped: wrapped(raw.wrapped)? },
            TypeTag::NonNullable => NodeKind::NonNullable { wrapped: wrapped(raw.wrapped)? },
            TypeTag::Nullish => NodeKind::Nullish { wrapped: wrapped(raw.wrapped)? },
            TypeTag::NonNullish => NodeKind::NonNullish { wrapped: wrapped(raw.wrapped)? },
            TypeTag::ExactOptional => NodeKind::ExactOptional { wrapped: wrapped(raw.wrapped)? },
            TypeTag::Enum => NodeKind::Enum { options: decode_options(name, raw.options)? },
            TypeTag::Picklist => NodeKind::Picklist { options: decode_options(name, raw.options)? },
            TypeTag::Blob => NodeKind::Blob,
            TypeTag::File => NodeKind::File,
            TypeTag::Date => NodeKind::Date,
            TypeTag::Function => NodeKind::Function,
            TypeTag::Lazy => NodeKind::Lazy,
            TypeTag::Never => NodeKind::Never,
            TypeTag::Promise => NodeKind::Promise,
            TypeTag::Undefined => NodeKind::Undefined,
            TypeTag::Void => NodeKind::Void,
            TypeTag::Custom => NodeKind::Custom,
            TypeTag::Unknown(type_name) => NodeKind::Unknown { type_name },
        };
        let (tag, metadata) = metadata::lift(raw.metadata)?;
        Ok(SchemaNode { kind, tag, metadata })
    }
}

impl Serialize for SchemaNode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::Error;
        RawNode::try_from(self.clone()).map_err(S::Error::custom)?.serialize(serializer)
    }
}

impl TryFrom<SchemaNode> for RawNode {
    type Error = serde_json::Error;

    fn try_from(node: SchemaNode) -> Result<Self, Self::Error> {
        let type_tag = node.kind.type_tag();
        let mut raw = RawNode::bare(&type_tag, metadata::lower(node.tag, node.metadata)?);
        match node.kind {
            NodeKind::Literal { literal } => raw.literal = Some(literal),
            NodeKind::Instance { expects } => raw.expects = Some(expects),
            NodeKind::Array { item } => raw.item = Some(item),
            NodeKind::Object { entries } | NodeKind::StrictObject { entries } => {
                raw.entries = Some(entries)
            }
            NodeKind::Record { value } => raw.value = Some(value),
            NodeKind::Union { options } | NodeKind::Intersect { options } => {
                raw.options = encode_options(options)?
            }
            NodeKind::Variant { key, options } => {
                raw.key = Some(Value::String(key));
                raw.options = encode_options(options)?;
            }
            NodeKind::Optional { wrapped }
            | NodeKind::Undefinedable { wrapped }
            | NodeKind::NonOptional { wrapped }
            | NodeKind::Nullable { wrapped }
            | NodeKind::NonNullable { wrapped }
            | NodeKind::Nullish { wrapped }
            | NodeKind::NonNullish { wrapped }
            | NodeKind::ExactOptional { wrapped } => raw.wrapped = Some(wrapped),
            NodeKind::Enum { options } | NodeKind::Picklist { options } => {
                raw.options = encode_options(options)?
            }
            NodeKind::String
            | NodeKind::Number
            | NodeKind::Nan
            | NodeKind::Boolean
            | NodeKind::Bigint
            | NodeKind::Null
            | NodeKind::Blob
            | NodeKind::File
            | NodeKind::Date
            | NodeKind::Function
            | NodeKind::Lazy
            | NodeKind::Never
            | NodeKind::Promise
            | NodeKind::Undefined
            | NodeKind::Void
            | NodeKind::Custom
            | NodeKind::Unknown { .. } => {}
        }
        Ok(raw)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_nested_schema_with_reference_tag() {
        let src = json!({
            "kind": "schema",
            "type": "object",
            "entries": {
                "author": { "type": "custom", "metadata": { "_CV_ID_": "users" } },
                "title": { "type": "optional", "wrapped": { "type": "string" } },
                "status": { "type": "picklist", "options": ["draft", "live"] }
            }
        });
        let node: SchemaNode = serde_json::from_value(src).unwrap();
        let entries = node.entries().unwrap();
        assert_eq!(entries["author"].tag, Some(Tag::Reference("users".into())));
        assert!(entries["author"].metadata.is_empty());
        assert!(matches!(entries["title"].kind, NodeKind::Optional { .. }));
        match &entries["status"].kind {
            NodeKind::Picklist { options } => {
                assert_eq!(options, &vec![LiteralValue::from("draft"), LiteralValue::from("live")]);
            }
            other => panic!("expected picklist, got {other:?}"),
        }
    }

    #[test]
    fn unknown_type_names_are_kept() {
        let node: SchemaNode = serde_json::from_value(json!({ "type": "tuple" })).unwrap();
        assert_eq!(node.kind, NodeKind::Unknown { type_name: "tuple".into() });
        assert_eq!(node.type_tag().as_str(), "tuple");
    }

    #[test]
    fn missing_payload_is_an_error() {
        let err = serde_json::from_value::<SchemaNode>(json!({ "type": "array" })).unwrap_err();
        assert!(err.to_string().contains("`item`"), "{err}");
    }

    #[test]
    fn foreign_kind_sentinel_is_rejected() {
        let err = serde_json::from_value::<SchemaNode>(json!({ "kind": "action", "type": "trim" }))
            .unwrap_err();
        assert!(err.to_string().contains("action"), "{err}");
    }

    #[test]
    fn symbol_literals_survive_the_wire() {
        let node: SchemaNode = serde_json::from_value(json!({
            "type": "literal",
            "literal": { "$symbol": "marker" }
        }))
        .unwrap();
        assert_eq!(node, SchemaNode::symbol("marker"));
    }

    #[test]
    fn written_form_reads_back() {
        let node = SchemaNode::object([
            ("owner", SchemaNode::reference("users")),
            ("tags", SchemaNode::array(SchemaNode::union(vec![
                SchemaNode::string(),
                SchemaNode::literal(3.0),
            ]))),
        ])
        .with_metadata("title", json!("Post"));
        let text = serde_json::to_string(&node).unwrap();
        let back: SchemaNode = serde_json::from_str(&text).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn non_finite_literals_read_back() {
        let node = SchemaNode::picklist([f64::NAN, f64::INFINITY]);
        let text = serde_json::to_string(&SchemaNode::object([("x", node.clone())])).unwrap();
        assert!(text.contains(r#"{"$number":"NaN"}"#));
        let back: SchemaNode = serde_json::from_str(&text).unwrap();
        assert_eq!(back.entries().unwrap()["x"], node);
        let lit = SchemaNode::literal(f64::NAN);
        let back: SchemaNode = serde_json::from_value(serde_json::to_value(&lit).unwrap()).unwrap();
        assert_eq!(back, lit);
    }

    #[test]
    fn schema_predicate_is_structural() {
        assert!(is_schema_node(&json!({ "kind": "schema", "type": "union", "options": [] })));
        assert!(!is_schema_node(&json!({ "name": { "kind": "schema", "type": "string" } })));
        assert!(!is_schema_node(&json!({ "kind": "schema" })));
        assert!(!is_schema_node(&json!("schema")));
    }

    #[test]
    fn bare_descriptor_parses_type_names() {
        let d: Descriptor = serde_json::from_value(json!({ "type": "instance", "expects": "Map" })).unwrap();
        assert_eq!(d.type_tag, TypeTag::Instance);
        assert_eq!(d.expects.as_deref(), Some("Map"));
    }
}
