//! Search error types.

use thiserror::Error;

/// Value conversion failures raised by [`Field`](crate::field::Field).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    /// No value was given and the field has no default
    #[error("There is no default value for field {field} on {owner}, yet there was no value provided")]
    MissingValue { field: String, owner: String },

    /// Numeric value outside the field's bounds
    #[error("Value {value} for field {field} is outwith {minimum}..={maximum}")]
    Range {
        field: String,
        value: f64,
        minimum: f64,
        maximum: f64,
    },

    /// Value of the wrong shape for the field
    #[error("Field {field} expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },
}

/// Errors raised while declaring a schema or building a document.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error(transparent)]
    Field(#[from] FieldError),

    /// Field name collides with a name the index uses internally
    #[error("Field name {0:?} is reserved")]
    ReservedName(String),

    /// Field declared twice
    #[error("Field {0:?} declared more than once")]
    DuplicateField(String),

    /// Document or meta refers to a field the schema does not declare
    #[error("Unknown field {field:?} on {schema}")]
    UnknownField { schema: String, field: String },

    /// Building a document from a record failed
    #[error("Build error: {0}")]
    Build(String),
}

/// Errors that can occur during index operations.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Tantivy index error
    #[error("Tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    /// Query parse error
    #[error("Query parse error: {0}")]
    QueryParse(#[from] tantivy::query::QueryParserError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Index not found
    #[error("Index not found: {0}")]
    IndexNotFound(String),

    /// Schema mismatch
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Index is locked (another process has it open)
    #[error("Index is locked: {0}")]
    IndexLocked(String),

    /// Query the index cannot answer
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

impl From<FieldError> for SearchError {
    fn from(err: FieldError) -> Self {
        SearchError::Schema(SchemaError::Field(err))
    }
}
