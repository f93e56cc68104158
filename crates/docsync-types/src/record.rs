//! Records and the per-type field registry.
//!
//! A [`Record`] is one row of a record type: a primary key plus named
//! attribute values. A [`RecordType`] declares which attributes the type
//! has and what kind each one is, which is what document schemas consult
//! when they infer field types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Primary key of a record within its type.
pub type PrimaryKey = u64;

/// Declared kind of a record attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Integer,
    Float,
    Bool,
    Date,
    DateTime,
    /// Multi-valued text
    List,
    /// Primary key of a record of the named type
    Reference(String),
}

/// A declared attribute of a record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordField {
    pub name: String,
    pub kind: FieldKind,
}

/// Declaration of a record type: its name and attributes, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordType {
    pub name: String,
    pub fields: Vec<RecordField>,
}

impl RecordType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add an attribute declaration.
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(RecordField {
            name: name.into(),
            kind,
        });
        self
    }

    pub fn text(self, name: impl Into<String>) -> Self {
        self.field(name, FieldKind::Text)
    }

    pub fn integer(self, name: impl Into<String>) -> Self {
        self.field(name, FieldKind::Integer)
    }

    pub fn float(self, name: impl Into<String>) -> Self {
        self.field(name, FieldKind::Float)
    }

    pub fn boolean(self, name: impl Into<String>) -> Self {
        self.field(name, FieldKind::Bool)
    }

    pub fn date(self, name: impl Into<String>) -> Self {
        self.field(name, FieldKind::Date)
    }

    pub fn list(self, name: impl Into<String>) -> Self {
        self.field(name, FieldKind::List)
    }

    pub fn reference(self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.field(name, FieldKind::Reference(target.into()))
    }

    /// Look up the declared kind of an attribute.
    pub fn field_kind(&self, name: &str) -> Option<&FieldKind> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.kind)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field_kind(name).is_some()
    }

    /// Names of all declared attributes, in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

/// A stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub record_type: String,
    pub pk: PrimaryKey,
    #[serde(default)]
    pub values: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(record_type: impl Into<String>, pk: PrimaryKey) -> Self {
        Self {
            record_type: record_type.into(),
            pk,
            values: BTreeMap::new(),
        }
    }

    /// Builder-style attribute assignment.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Clear an attribute, leaving it absent.
    pub fn unset(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    /// The primary key as text, which is also the document id of the
    /// record's index document.
    pub fn pk_text(&self) -> String {
        self.pk.to_string()
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }
}
