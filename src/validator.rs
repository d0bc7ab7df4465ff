//! Target validator tree.
//!
//! This is the storage-side vocabulary: smaller than the schema vocabulary,
//! no wrapper kinds. Optionality is a marker on every node instead of a
//! wrapper, so `optional(string)` is a `string` validator marked `optional`.
use std::fmt;

use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    #[serde(flatten)]
    pub kind: ValidatorKind,
    #[serde(rename = "isOptional", default)]
    pub is_optional: Optionality,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Optionality {
    #[default]
    Required,
    Optional,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ValidatorKind {
    String,
    Float64,
    Boolean,
    Int64,
    Literal { value: LiteralValue },
    Bytes,
    Null,
    Array { element: Box<Validator> },
    Object { fields: IndexMap<String, Validator> },
    Record { key: Box<Validator>, value: Box<Validator> },
    Union { members: Vec<Validator> },
    Id {
        #[serde(rename = "tableName")]
        table_name: String,
    },
    Any,
}

/// Literal payload accepted by the target. Symbols never make it here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Boolean(bool),
    /// Non-finite values are written as `{"$number": "NaN" | "Infinity" | "-Infinity"}`.
    Number(#[serde(with = "number_repr")] OrderedFloat<f64>),
    BigInt {
        #[serde(rename = "$bigint")]
        value: i64,
    },
    String(String),
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTORS
// ————————————————————————————————————————————————————————————————————————————

impl Validator {
    fn of(kind: ValidatorKind) -> Self {
        Self { kind, is_optional: Optionality::Required }
    }

    pub fn string() -> Self { Self::of(ValidatorKind::String) }
    pub fn float64() -> Self { Self::of(ValidatorKind::Float64) }
    pub fn boolean() -> Self { Self::of(ValidatorKind::Boolean) }
    pub fn int64() -> Self { Self::of(ValidatorKind::Int64) }
    pub fn bytes() -> Self { Self::of(ValidatorKind::Bytes) }
    pub fn null() -> Self { Self::of(ValidatorKind::Null) }
    pub fn any() -> Self { Self::of(ValidatorKind::Any) }

    pub fn literal(value: impl Into<LiteralValue>) -> Self {
        Self::of(ValidatorKind::Literal { value: value.into() })
    }

    pub fn array(element: Validator) -> Self {
        Self::of(ValidatorKind::Array { element: Box::new(element) })
    }

    pub fn object(fields: IndexMap<String, Validator>) -> Self {
        Self::of(ValidatorKind::Object { fields })
    }

    pub fn record(key: Validator, value: Validator) -> Self {
        Self::of(ValidatorKind::Record { key: Box::new(key), value: Box::new(value) })
    }

    /// Plain combinator, no de-duplication. See [`crate::reduce`] for the
    /// collapsing form.
    pub fn union(members: Vec<Validator>) -> Self {
        Self::of(ValidatorKind::Union { members })
    }

    pub fn id(table_name: impl Into<String>) -> Self {
        Self::of(ValidatorKind::Id { table_name: table_name.into() })
    }

    /// Re-mark as optional. Payload is untouched.
    pub fn optional(mut self) -> Self {
        self.is_optional = Optionality::Optional;
        self
    }

    /// Re-mark as required. Payload is untouched.
    pub fn required(mut self) -> Self {
        self.is_optional = Optionality::Required;
        self
    }

    pub fn is_optional(&self) -> bool {
        self.is_optional == Optionality::Optional
    }

    /// Wire name of the kind discriminant (`"float64"`, `"id"`, ...).
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            ValidatorKind::String => "string",
            ValidatorKind::Float64 => "float64",
            ValidatorKind::Boolean => "boolean",
            ValidatorKind::Int64 => "int64",
            ValidatorKind::Literal { .. } => "literal",
            ValidatorKind::Bytes => "bytes",
            ValidatorKind::Null => "null",
            ValidatorKind::Array { .. } => "array",
            ValidatorKind::Object { .. } => "object",
            ValidatorKind::Record { .. } => "record",
            ValidatorKind::Union { .. } => "union",
            ValidatorKind::Id { .. } => "id",
            ValidatorKind::Any => "any",
        }
    }

    pub fn members(&self) -> Option<&[Validator]> {
        match &self.kind {
            ValidatorKind::Union { members } => Some(members),
            _ => None,
        }
    }

    pub fn fields(&self) -> Option<&IndexMap<String, Validator>> {
        match &self.kind {
            ValidatorKind::Object { fields } => Some(fields),
            _ => None,
        }
    }

    pub fn element(&self) -> Option<&Validator> {
        match &self.kind {
            ValidatorKind::Array { element } => Some(element),
            _ => None,
        }
    }

    pub fn table_name(&self) -> Option<&str> {
        match &self.kind {
            ValidatorKind::Id { table_name } => Some(table_name),
            _ => None,
        }
    }

    pub fn literal_value(&self) -> Option<&LiteralValue> {
        match &self.kind {
            ValidatorKind::Literal { value } => Some(value),
            _ => None,
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// LITERALS
// ————————————————————————————————————————————————————————————————————————————

impl From<&str> for LiteralValue {
    fn from(value: &str) -> Self { LiteralValue::String(value.to_owned()) }
}

impl From<String> for LiteralValue {
    fn from(value: String) -> Self { LiteralValue::String(value) }
}

impl From<f64> for LiteralValue {
    fn from(value: f64) -> Self { LiteralValue::Number(OrderedFloat(value)) }
}

impl From<bool> for LiteralValue {
    fn from(value: bool) -> Self { LiteralValue::Boolean(value) }
}

impl From<i64> for LiteralValue {
    fn from(value: i64) -> Self { LiteralValue::BigInt { value } }
}

mod number_repr {
    use ordered_float::OrderedFloat;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Finite(f64),
        Special {
            #[serde(rename = "$number")]
            name: String,
        },
    }

    pub fn serialize<S: Serializer>(number: &OrderedFloat<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        let n = number.into_inner();
        let repr = match n {
            n if n.is_finite() => Repr::Finite(n),
            n if n.is_nan() => Repr::Special { name: "NaN".to_owned() },
            n if n > 0.0 => Repr::Special { name: "Infinity".to_owned() },
            _ => Repr::Special { name: "-Infinity".to_owned() },
        };
        repr.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<OrderedFloat<f64>, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Finite(n) => Ok(OrderedFloat(n)),
            Repr::Special { name } => match name.as_str() {
                "NaN" => Ok(OrderedFloat(f64::NAN)),
                "Infinity" => Ok(OrderedFloat(f64::INFINITY)),
                "-Infinity" => Ok(OrderedFloat(f64::NEG_INFINITY)),
                other => Err(D::Error::custom(format!("unknown `$number` value `{other}`"))),
            },
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Boolean(b) => write!(f, "{b}"),
            LiteralValue::Number(n) => write!(f, "{}", n.0),
            LiteralValue::BigInt { value } => write!(f, "{value}n"),
            LiteralValue::String(s) => write!(f, "{s:?}"),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
