//! Key encoding and decoding for the record store.
//!
//! Key format: `rec:{record_type}:{pk:020}`
//! - record_type: registered type name, must not contain `:`
//! - pk: primary key zero-padded to 20 digits (the width of `u64::MAX`)
//!
//! This format keeps every record of one type contiguous and in primary-key
//! order, so listing a type is a single prefix scan.

use docsync_types::PrimaryKey;

use crate::error::StorageError;

/// Key for record storage
/// Format: rec:{record_type}:{pk:020}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordKey {
    pub record_type: String,
    pub pk: PrimaryKey,
}

impl RecordKey {
    pub fn new(record_type: impl Into<String>, pk: PrimaryKey) -> Self {
        Self {
            record_type: record_type.into(),
            pk,
        }
    }

    /// Encode key to bytes for storage
    pub fn to_bytes(&self) -> Vec<u8> {
        format!("rec:{}:{:020}", self.record_type, self.pk).into_bytes()
    }

    /// Prefix shared by every record of a type
    pub fn type_prefix(record_type: &str) -> Vec<u8> {
        format!("rec:{}:", record_type).into_bytes()
    }

    /// Decode key from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        let s = std::str::from_utf8(bytes)
            .map_err(|e| StorageError::Key(format!("Invalid UTF-8: {}", e)))?;

        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 || parts[0] != "rec" {
            return Err(StorageError::Key(format!("Invalid record key format: {}", s)));
        }

        let pk: PrimaryKey = parts[2]
            .parse()
            .map_err(|e| StorageError::Key(format!("Invalid primary key: {}", e)))?;

        Ok(Self::new(parts[1], pk))
    }
}

/// Key for a record type's primary key sequence
/// Format: seq:{record_type}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceKey {
    pub record_type: String,
}

impl SequenceKey {
    pub fn new(record_type: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        format!("seq:{}", self.record_type).into_bytes()
    }
}

/// Validate a record type name for use inside keys.
pub fn validate_type_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty() || name.contains(':') {
        return Err(StorageError::Key(format!(
            "Record type name must be non-empty and free of ':': {:?}",
            name
        )));
    }
    Ok(())
}
