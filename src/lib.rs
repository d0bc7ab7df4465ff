//! Convert schema descriptions into storage field validators.
//!
//! The core is [`convert::convert`]: a pure, recursive walk from a
//! [`node::SchemaNode`] tree to a [`validator::Validator`] tree, failing on
//! kinds the storage side cannot represent. [`table`] builds table
//! definitions and per-mutation validators on top of it.
pub mod cli;
pub mod convert;
pub mod error;
pub mod metadata;
pub mod node;
pub mod path_de;
pub mod reduce;
pub mod table;
pub mod validator;

pub use convert::{convert, convert_descriptor, Converter, ModifierContext};
pub use error::{ConvertError, Unsupported};
pub use node::{is_schema_node, SchemaNode};
pub use validator::Validator;
