//! Record store for docsync.
//!
//! Provides RocksDB-backed storage with:
//! - Column family isolation for records, primary-key sequences and type declarations
//! - Zero-padded keys so a prefix scan walks one type in primary-key order
//! - Atomic record + sequence writes via WriteBatch
//! - Post-save and pre-delete listener hooks keyed by dispatch uid
//! - A small relational query language evaluated by scan

pub mod column_families;
pub mod db;
pub mod error;
pub mod keys;
pub mod listener;
pub mod query;

pub use db::{Storage, StorageStats};
pub use error::StorageError;
pub use keys::{RecordKey, SequenceKey};
pub use listener::{ListenerError, RecordEvent, RecordListener, Signal};
pub use query::{Condition, Lookup, LookupOp, LookupValue, OrderKey, RecordQuery, RecordResolver};
