//! Table definitions and per-mutation validators.
//!
//! A table is declared either as a field mapping (`{ "name": <schema>, ... }`)
//! or as a single document schema (an object, or a union/variant of objects).
//! Storage I/O stays with the caller: this module only builds the validators a
//! mutation wrapper checks rows against before writing.
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::convert::{Converter, ModifierContext};
use crate::error::TableError;
use crate::node::{is_schema_node, NodeKind, SchemaNode};
use crate::validator::Validator;

static TABLE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("table name pattern"));

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq)]
pub enum TableSource {
    Fields(IndexMap<String, SchemaNode>),
    Document(SchemaNode),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TableDefinition {
    Fields(IndexMap<String, Validator>),
    Document(Validator),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SchemaDefinition {
    pub tables: IndexMap<String, TableDefinition>,
}

/// Write being validated. Patches carry the keys present in the partial row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Insert,
    Replace,
    Patch { keys: Vec<String> },
}

impl<'de> Deserialize<'de> for TableSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;
        let value = Value::deserialize(deserializer)?;
        if is_schema_node(&value) {
            serde_json::from_value(value).map(TableSource::Document).map_err(D::Error::custom)
        } else {
            serde_json::from_value(value).map(TableSource::Fields).map_err(D::Error::custom)
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DEFINITIONS
// ————————————————————————————————————————————————————————————————————————————

fn is_document_shape(node: &SchemaNode) -> bool {
    matches!(
        node.kind,
        NodeKind::Object { .. }
            | NodeKind::StrictObject { .. }
            | NodeKind::Union { .. }
            | NodeKind::Variant { .. }
    )
}

pub fn define_table(
    table: &str,
    source: &TableSource,
    converter: &Converter,
) -> Result<TableDefinition, TableError> {
    match source {
        TableSource::Fields(fields) => {
            let mut out = IndexMap::with_capacity(fields.len());
            for (field, node) in fields {
                let validator = converter
                    .convert(node, ModifierContext::default())
                    .map_err(|source| TableError::Field {
                        table: table.to_owned(),
                        field: field.clone(),
                        source,
                    })?;
                out.insert(field.clone(), validator);
            }
            tracing::debug!(table, fields = out.len(), "defined table");
            Ok(TableDefinition::Fields(out))
        }
        TableSource::Document(node) => {
            if !is_document_shape(node) {
                return Err(TableError::NotADocument {
                    table: table.to_owned(),
                    found: node.type_tag().as_str().to_owned(),
                });
            }
            let validator = converter
                .convert(node, ModifierContext::default())
                .map_err(|source| TableError::Document { table: table.to_owned(), source })?;
            tracing::debug!(table, kind = validator.kind_name(), "defined document table");
            Ok(TableDefinition::Document(validator))
        }
    }
}

/// Build every table, in declaration order.
pub fn define_schema(
    tables: &IndexMap<String, TableSource>,
    converter: &Converter,
) -> Result<SchemaDefinition, TableError> {
    let mut out = IndexMap::with_capacity(tables.len());
    for (name, source) in tables {
        if !TABLE_NAME.is_match(name) {
            return Err(TableError::InvalidName(name.clone()));
        }
        out.insert(name.clone(), define_table(name, source, converter)?);
    }
    Ok(SchemaDefinition { tables: out })
}

// ————————————————————————————————————————————————————————————————————————————
// MUTATIONS
// ————————————————————————————————————————————————————————————————————————————

impl TableSource {
    /// Validator a row must satisfy before `mutation` reaches storage.
    ///
    /// `None` means there is nothing to check (an empty patch).
    pub fn validator_for(
        &self,
        table: &str,
        mutation: &Mutation,
        converter: &Converter,
    ) -> Result<Option<Validator>, TableError> {
        let convert = |node: &SchemaNode| {
            converter
                .convert(node, ModifierContext::default())
                .map_err(|source| TableError::Document { table: table.to_owned(), source })
        };
        let validator = match (self, mutation) {
            (_, Mutation::Patch { keys }) if keys.is_empty() => return Ok(None),
            (TableSource::Fields(fields), Mutation::Insert | Mutation::Replace) => {
                convert(&SchemaNode::object(fields.clone()))?
            }
            (TableSource::Document(node), Mutation::Insert | Mutation::Replace) => convert(node)?,
            (TableSource::Fields(fields), Mutation::Patch { keys }) => {
                convert(&SchemaNode::object(pick_entries(table, fields, keys)?))?
            }
            (TableSource::Document(node), Mutation::Patch { keys }) => {
                let picked = pick_document(table, node, keys)?
                    .iter()
                    .map(convert)
                    .collect::<Result<Vec<_>, _>>()?;
                match <[Validator; 1]>::try_from(picked) {
                    Ok([only]) => only,
                    Err(picked) => Validator::union(picked),
                }
            }
        };
        Ok(Some(validator))
    }
}

fn pick_entries(
    table: &str,
    entries: &IndexMap<String, SchemaNode>,
    keys: &[String],
) -> Result<IndexMap<String, SchemaNode>, TableError> {
    keys.iter()
        .map(|key| match entries.get(key) {
            Some(node) => Ok((key.clone(), node.clone())),
            None => Err(TableError::UnknownField { table: table.to_owned(), field: key.clone() }),
        })
        .collect()
}

/// Pick `keys` from every object option that has at least one of them.
///
/// A key must exist in at least one option. Each pick is its own object; the
/// caller unions them without kind collapse.
fn pick_document(table: &str, node: &SchemaNode, keys: &[String]) -> Result<Vec<SchemaNode>, TableError> {
    let options: Vec<&SchemaNode> = match &node.kind {
        NodeKind::Union { options } | NodeKind::Variant { options, .. } => options.iter().collect(),
        _ => vec![node],
    };
    if let Some(missing) = keys.iter().find(|key| {
        !options.iter().any(|o| o.entries().is_some_and(|e| e.contains_key(key.as_str())))
    }) {
        return Err(TableError::UnknownField { table: table.to_owned(), field: missing.clone() });
    }
    Ok(options
        .into_iter()
        .filter_map(SchemaNode::entries)
        .filter(|entries| keys.iter().any(|key| entries.contains_key(key)))
        .map(|entries| {
            SchemaNode::object(
                keys.iter()
                    .filter_map(|key| entries.get(key).map(|n| (key.clone(), n.clone()))),
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConvertError, Unsupported};
    use serde_json::json;

    fn posts() -> TableSource {
        serde_json::from_value(json!({
            "title": { "kind": "schema", "type": "string" },
            "author": { "kind": "schema", "type": "custom", "metadata": { "_CV_ID_": "users" } },
            "draft": { "kind": "schema", "type": "optional", "wrapped": { "type": "boolean" } }
        }))
        .unwrap()
    }

    fn shapes() -> TableSource {
        TableSource::Document(SchemaNode::variant("type", vec![
            SchemaNode::object([("type", SchemaNode::literal("circle")), ("radius", SchemaNode::number())]),
            SchemaNode::object([("type", SchemaNode::literal("square")), ("side", SchemaNode::number())]),
        ]))
    }

    #[test]
    fn field_mapping_and_document_are_told_apart() {
        assert!(matches!(posts(), TableSource::Fields(_)));
        let doc: TableSource = serde_json::from_value(json!({
            "kind": "schema", "type": "union", "options": [
                { "type": "object", "entries": { "a": { "type": "string" } } }
            ]
        }))
        .unwrap();
        assert!(matches!(doc, TableSource::Document(_)));
    }

    #[test]
    fn field_tables_convert_each_field() {
        let def = define_table("posts", &posts(), &Converter::default()).unwrap();
        let TableDefinition::Fields(fields) = def else { panic!("expected fields") };
        assert_eq!(fields["author"], Validator::id("users"));
        assert!(fields["draft"].is_optional());
        assert_eq!(fields.keys().collect::<Vec<_>>(), ["title", "author", "draft"]);
    }

    #[test]
    fn field_errors_name_table_and_field() {
        let source = TableSource::Fields(IndexMap::from([("born".to_string(), SchemaNode::date())]));
        let err = define_table("people", &source, &Converter::default()).unwrap_err();
        assert_eq!(
            err,
            TableError::Field {
                table: "people".into(),
                field: "born".into(),
                source: ConvertError::UnsupportedSchemaKind(Unsupported::Date),
            }
        );
    }

    #[test]
    fn document_must_be_object_like() {
        let err = define_table("x", &TableSource::Document(SchemaNode::string()), &Converter::default())
            .unwrap_err();
        assert!(matches!(err, TableError::NotADocument { .. }));
    }

    #[test]
    fn schema_rejects_bad_table_names() {
        let tables = IndexMap::from([("_system".to_string(), posts())]);
        let err = define_schema(&tables, &Converter::default()).unwrap_err();
        assert_eq!(err, TableError::InvalidName("_system".into()));
    }

    #[test]
    fn schema_serializes_in_declaration_order() {
        let tables = IndexMap::from([("posts".to_string(), posts()), ("shapes".to_string(), shapes())]);
        let def = define_schema(&tables, &Converter::default()).unwrap();
        let out = serde_json::to_value(&def).unwrap();
        assert_eq!(out["posts"]["author"]["tableName"], json!("users"));
        assert_eq!(out["shapes"]["kind"], json!("union"));
    }

    #[test]
    fn insert_validates_whole_row() {
        let v = posts()
            .validator_for("posts", &Mutation::Insert, &Converter::default())
            .unwrap()
            .unwrap();
        assert_eq!(v.fields().unwrap().len(), 3);
    }

    #[test]
    fn patch_picks_present_keys() {
        let keys = vec!["draft".to_string()];
        let v = posts()
            .validator_for("posts", &Mutation::Patch { keys }, &Converter::default())
            .unwrap()
            .unwrap();
        let fields = v.fields().unwrap();
        assert_eq!(fields.len(), 1);
        assert!(fields["draft"].is_optional());
    }

    #[test]
    fn empty_patch_has_nothing_to_check() {
        let v = posts()
            .validator_for("posts", &Mutation::Patch { keys: vec![] }, &Converter::default())
            .unwrap();
        assert_eq!(v, None);
    }

    #[test]
    fn patch_rejects_unknown_keys() {
        let err = shapes()
            .validator_for("shapes", &Mutation::Patch { keys: vec!["colour".into()] }, &Converter::default())
            .unwrap_err();
        assert_eq!(err, TableError::UnknownField { table: "shapes".into(), field: "colour".into() });
    }

    #[test]
    fn patch_on_variant_keeps_only_matching_options() {
        let v = shapes()
            .validator_for("shapes", &Mutation::Patch { keys: vec!["radius".into()] }, &Converter::default())
            .unwrap()
            .unwrap();
        let fields = v.fields().unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["radius"], Validator::float64());
    }

    #[test]
    fn patch_on_union_picks_from_every_matching_option() {
        let doc = TableSource::Document(SchemaNode::union(vec![
            SchemaNode::object([("a", SchemaNode::string())]),
            SchemaNode::object([("b", SchemaNode::number())]),
            SchemaNode::object([("a", SchemaNode::boolean()), ("c", SchemaNode::string())]),
        ]));
        let convert = Converter::default();

        let v = doc.validator_for("t", &Mutation::Patch { keys: vec!["a".into()] }, &convert).unwrap().unwrap();
        let members = v.members().unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].fields().unwrap()["a"], Validator::string());
        assert_eq!(members[1].fields().unwrap()["a"], Validator::boolean());

        let v = doc.validator_for("t", &Mutation::Patch { keys: vec!["b".into()] }, &convert).unwrap().unwrap();
        assert_eq!(v.fields().unwrap()["b"], Validator::float64());
    }
}
