//! Storage layer error types.

use thiserror::Error;

use crate::listener::ListenerError;

/// Errors that can occur in the storage layer
#[derive(Error, Debug)]
pub enum StorageError {
    /// RocksDB operation failed
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// Column family not found
    #[error("Column family not found: {0}")]
    ColumnFamilyNotFound(String),

    /// Key encoding/decoding error
    #[error("Key error: {0}")]
    Key(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Record type was never registered
    #[error("Unknown record type: {0}")]
    UnknownRecordType(String),

    /// Query references something the store cannot evaluate
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Internal lock poisoned
    #[error("Lock error: {0}")]
    Lock(String),

    /// A save/delete listener failed; the original error is kept for downcasting
    #[error("Listener error: {0}")]
    Listener(ListenerError),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}
