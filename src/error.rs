use thiserror::Error;

/// Why a schema has no target representation. The message says what to do instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Unsupported {
    #[error("Blob is not supported: store the file in Convex storage.")]
    Blob,
    #[error("File is not supported: store the file in Convex storage.")]
    File,
    #[error("Date is not supported: store it either as a string or as a number.")]
    Date,
    #[error("Function is not supported.")]
    Function,
    #[error("Intersect is not supported: use object merging.")]
    Intersect,
    #[error("Lazy schemas are not supported.")]
    Lazy,
    #[error("Never is not supported.")]
    Never,
    #[error("Promise is not supported.")]
    Promise,
    #[error("Void is not supported.")]
    Void,
    #[error("Unsupported instance type: {expects}")]
    Instance { expects: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("{0}")]
    UnsupportedSchemaKind(Unsupported),
    #[error("Symbols are not supported as literals (symbol {description:?})")]
    UnsupportedLiteralValue { description: String },
}

impl From<Unsupported> for ConvertError {
    fn from(value: Unsupported) -> Self {
        ConvertError::UnsupportedSchemaKind(value)
    }
}

/// Malformed schema wire form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    #[error("expected a schema object, found kind `{kind}`")]
    NotASchema { kind: String },
    #[error("`{type_name}` node is missing `{field}`")]
    MissingPayload { type_name: String, field: &'static str },
    #[error("`{type_name}` option {index} is malformed: {message}")]
    BadOption { type_name: String, index: usize, message: String },
    #[error("metadata `_CV_T_` is not a validator: {message}")]
    BadValidatorTag { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("invalid table name `{0}`: use letters, digits and `_`, not starting with `_`")]
    InvalidName(String),
    #[error("table `{table}`, field `{field}`: {source}")]
    Field {
        table: String,
        field: String,
        #[source]
        source: ConvertError,
    },
    #[error("table `{table}`: {source}")]
    Document {
        table: String,
        #[source]
        source: ConvertError,
    },
    #[error("table `{table}`: document schema must be an object, union or variant, found `{found}`")]
    NotADocument { table: String, found: String },
    #[error("table `{table}` has no field `{field}`")]
    UnknownField { table: String, field: String },
}

/// Failure reading a JSON input, with the JSON path where decoding stopped.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("at JSON path {path} → {message}")]
    Decode { path: String, message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
