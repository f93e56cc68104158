//! Error types for index synchronization.

use docsync_query::QueryError;
use docsync_search::{SchemaError, SearchError};
use docsync_storage::StorageError;
use thiserror::Error;

/// Errors that can occur while binding, syncing or maintaining indexes
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Storage operation failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Index operation failed
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// Document schema or build failure
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// Record type already bound to a different document schema
    #[error("Registration error: {0}")]
    Registration(String),

    /// No binding for the record type (or id)
    #[error("No search binding for {0}")]
    UnknownBinding(String),

    /// Tracing subscriber could not be installed
    #[error("Logging error: {0}")]
    Logging(String),
}
