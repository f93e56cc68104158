//! # docsync-types
//!
//! Shared domain types for docsync:
//! - [`Value`]: native attribute values held by records and documents
//! - [`Record`] / [`RecordType`]: stored rows and the per-type field registry
//! - [`Settings`]: layered configuration

pub mod config;
pub mod error;
pub mod record;
pub mod value;

pub use config::Settings;
pub use error::TypesError;
pub use record::{FieldKind, PrimaryKey, Record, RecordField, RecordType};
pub use value::Value;
