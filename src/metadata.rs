//! Out-of-band tags on schema nodes.
//!
//! Two metadata keys are reserved. `_CV_T_` holds a pre-built target validator
//! that replaces conversion outright; `_CV_ID_` holds the name of the collection
//! a reference field points into. Both are lifted into [`Tag`] when a node is
//! read, so the converter never looks at an untyped property bag.
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::NodeError;
use crate::node::SchemaNode;
use crate::validator::Validator;

pub const VALIDATOR_KEY: &str = "_CV_T_";
pub const REFERENCE_KEY: &str = "_CV_ID_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    /// Returned verbatim by the converter.
    Validator(Validator),
    /// Converted to an `id` validator bound to this collection.
    Reference(String),
}

/// Check a node's tag ahead of kind dispatch.
///
/// `Some` short-circuits conversion regardless of the node's kind, including
/// kinds that would otherwise be rejected.
pub fn resolve(node: &SchemaNode) -> Option<Validator> {
    match node.tag.as_ref()? {
        Tag::Validator(validator) => {
            tracing::debug!(kind = validator.kind_name(), "using pre-built validator");
            Some(validator.clone())
        }
        Tag::Reference(table_name) => {
            tracing::debug!(table = %table_name, "reference field");
            Some(Validator::id(table_name.clone()))
        }
    }
}

/// Split reserved keys out of a metadata map.
///
/// The validator key wins when both are present; the losing key stays in the
/// map untouched. A falsy validator key (`null`, `false`, `0`, `""`) counts as
/// absent, and a reference key that is not a non-empty string is ordinary
/// metadata. Both stay in the map as-is.
pub fn lift(
    mut metadata: IndexMap<String, Value>,
) -> Result<(Option<Tag>, IndexMap<String, Value>), NodeError> {
    let tagged = metadata.get(VALIDATOR_KEY).is_some_and(|raw| !is_falsy(raw));
    if let Some(raw) = tagged.then(|| metadata.shift_remove(VALIDATOR_KEY)).flatten() {
        let validator = serde_json::from_value::<Validator>(raw)
            .map_err(|error| NodeError::BadValidatorTag { message: error.to_string() })?;
        return Ok((Some(Tag::Validator(validator)), metadata));
    }
    let table_name = metadata
        .get(REFERENCE_KEY)
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .map(str::to_owned);
    let Some(table_name) = table_name else {
        return Ok((None, metadata));
    };
    metadata.shift_remove(REFERENCE_KEY);
    Ok((Some(Tag::Reference(table_name)), metadata))
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Inverse of [`lift`].
pub fn lower(
    tag: Option<Tag>,
    mut metadata: IndexMap<String, Value>,
) -> Result<IndexMap<String, Value>, serde_json::Error> {
    match tag {
        Some(Tag::Validator(validator)) => {
            metadata.insert(VALIDATOR_KEY.to_owned(), serde_json::to_value(&validator)?);
        }
        Some(Tag::Reference(table_name)) => {
            metadata.insert(REFERENCE_KEY.to_owned(), Value::String(table_name));
        }
        None => {}
    }
    Ok(metadata)
}
