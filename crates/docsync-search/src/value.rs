//! Index-side values.
//!
//! [`IndexValue`] is what a document holds per field and what the index
//! service stores. [`IndexedValue`] marks text that has already been through
//! a field's indexer so it is never tokenized twice. [`FieldValue`] is the
//! input side of a conversion: a native value, or text already indexed.

use std::fmt;
use std::ops::Deref;

use chrono::{NaiveDate, NaiveDateTime};
use docsync_types::Value;

/// Text that has already been produced by an indexer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct IndexedValue(String);

impl IndexedValue {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Deref for IndexedValue {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IndexedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A value in the index service's representation.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexValue {
    /// Raw text, stored and matched as-is
    Text(String),
    /// Token text produced by an indexer
    Indexed(IndexedValue),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
}

impl IndexValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            IndexValue::Text(_) => "text",
            IndexValue::Indexed(_) => "indexed text",
            IndexValue::Integer(_) => "integer",
            IndexValue::Float(_) => "float",
            IndexValue::Date(_) => "date",
        }
    }

    /// Text content of either text variant.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            IndexValue::Text(s) => Some(s),
            IndexValue::Indexed(v) => Some(v.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for IndexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexValue::Text(s) => f.write_str(s),
            IndexValue::Indexed(v) => f.write_str(v),
            IndexValue::Integer(i) => write!(f, "{}", i),
            IndexValue::Float(v) => write!(f, "{}", v),
            IndexValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// Input to a field conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Native(Value),
    Indexed(IndexedValue),
}

impl FieldValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Native(v) => v.kind_name(),
            FieldValue::Indexed(_) => "indexed text",
        }
    }
}

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        FieldValue::Native(v)
    }
}

impl From<IndexedValue> for FieldValue {
    fn from(v: IndexedValue) -> Self {
        FieldValue::Indexed(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Native(v.into())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Native(v.into())
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Native(v.into())
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Native(v.into())
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Native(v.into())
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(v: NaiveDate) -> Self {
        FieldValue::Native(v.into())
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(v: NaiveDateTime) -> Self {
        FieldValue::Native(v.into())
    }
}
