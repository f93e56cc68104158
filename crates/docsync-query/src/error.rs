//! Query error types.

use docsync_search::{FieldError, SchemaError, SearchError};
use docsync_storage::StorageError;
use thiserror::Error;

/// Errors raised while building, translating or running a search query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Relational construct with no index-query equivalent
    #[error("Cannot translate query: {0}")]
    Translation(String),

    #[error("Unknown field {field:?} on {schema}")]
    UnknownField { schema: String, field: String },

    /// Queries over different schemas or indexes combined
    #[error("Incompatible queries: {0}")]
    Incompatible(String),

    /// Record results requested from a query with no record store
    #[error("Query has no record store to load {0} records from")]
    NoRecordStore(String),

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
