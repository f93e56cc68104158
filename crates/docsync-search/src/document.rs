//! Document schemas and document instances.
//!
//! A [`DocumentSchema`] is a named set of [`Field`]s plus a build routine
//! that turns a source [`Record`] into a [`Document`]. Schemas are declared
//! either with a custom build closure ([`DocumentSchema::builder`]) or from a
//! declarative [`SearchMeta`](crate::meta::SearchMeta).
//!
//! Documents hold index values; [`Document::get`] converts back to native.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use docsync_types::{Record, Value};

use crate::error::SchemaError;
use crate::field::{Field, IndexKind};
use crate::meta::MetaPlan;
use crate::query::IndexHit;
use crate::value::{FieldValue, IndexValue};

/// Name of the stored document id column.
pub const DOC_ID_FIELD: &str = "doc_id";

/// Name of the catch-all column answering free-text keywords.
pub const ALL_TEXT_FIELD: &str = "all_text";

/// Name of the numeric doc-id ordering column.
pub const DOC_KEY_FIELD: &str = "doc_key";

/// Name of the derived corpus field in meta schemas.
pub const CORPUS_FIELD: &str = "corpus";

/// Custom build routine for a schema.
pub type BuildFn = Arc<dyn Fn(&Record, &mut Document) -> Result<(), SchemaError> + Send + Sync>;

pub(crate) enum Builder {
    Custom(BuildFn),
    Meta(MetaPlan),
}

struct SchemaInner {
    name: String,
    fields: BTreeMap<String, Field>,
    builder: Builder,
}

/// A named collection of fields with a build routine. Cheap to clone.
#[derive(Clone)]
pub struct DocumentSchema {
    inner: Arc<SchemaInner>,
}

impl fmt::Debug for DocumentSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentSchema")
            .field("name", &self.inner.name)
            .field("fields", &self.inner.fields.keys().collect::<Vec<_>>())
            .field("meta", &self.is_meta())
            .finish()
    }
}

/// Reject names the index uses for its own columns or lookups.
pub(crate) fn check_field_name(name: &str) -> Result<(), SchemaError> {
    let reserved = [DOC_ID_FIELD, ALL_TEXT_FIELD, DOC_KEY_FIELD, "pk", "id"];
    if name.is_empty() || reserved.contains(&name) || name.contains("__") {
        return Err(SchemaError::ReservedName(name.to_string()));
    }
    Ok(())
}

impl DocumentSchema {
    /// Start declaring a schema with a custom build routine.
    pub fn builder(name: impl Into<String>) -> DocumentSchemaBuilder {
        DocumentSchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub(crate) fn assemble(
        name: String,
        fields: Vec<(String, Field)>,
        builder: Builder,
    ) -> Result<Self, SchemaError> {
        let mut declared = BTreeMap::new();
        for (field_name, field) in fields {
            check_field_name(&field_name)?;
            if declared.contains_key(&field_name) {
                return Err(SchemaError::DuplicateField(field_name));
            }
            let field = field.bind(&field_name, &name);
            declared.insert(field_name, field);
        }
        Ok(Self {
            inner: Arc::new(SchemaInner {
                name,
                fields: declared,
                builder,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.inner.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.inner.fields.values()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.inner.fields.keys().map(String::as_str)
    }

    /// Storage kind of each field, for creating the index.
    pub fn index_fields(&self) -> Vec<(String, IndexKind)> {
        self.inner
            .fields
            .iter()
            .map(|(name, field)| (name.clone(), field.index_kind()))
            .collect()
    }

    pub fn is_meta(&self) -> bool {
        matches!(self.inner.builder, Builder::Meta(_))
    }

    /// Two handles describe the same schema.
    pub fn same_as(&self, other: &DocumentSchema) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.name == other.inner.name
    }

    /// An empty document with the given id.
    pub fn new_document(&self, doc_id: impl Into<String>) -> Document {
        Document {
            schema: self.clone(),
            doc_id: doc_id.into(),
            values: BTreeMap::new(),
        }
    }

    /// Build a document from a record. The document id is the record's
    /// primary key as text; every field is populated or the build fails.
    pub fn build(&self, record: &Record) -> Result<Document, SchemaError> {
        let mut doc = self.new_document(record.pk_text());
        match &self.inner.builder {
            Builder::Custom(build) => build(record, &mut doc)?,
            Builder::Meta(plan) => plan.build_base(record, &mut doc)?,
        }
        doc.finalize()?;
        Ok(doc)
    }

    /// Rebuild a document from values read back out of the index.
    pub fn from_hit(&self, hit: IndexHit) -> Result<Document, SchemaError> {
        let mut doc = self.new_document(hit.doc_id);
        for (name, value) in hit.values {
            if let Some(field) = self.field(&name) {
                let prepared = field.from_search(value);
                doc.set(&name, prepared)?;
            }
        }
        doc.finalize()?;
        Ok(doc)
    }
}

/// Builder for schemas with a custom build routine.
pub struct DocumentSchemaBuilder {
    name: String,
    fields: Vec<(String, Field)>,
}

impl DocumentSchemaBuilder {
    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.push((name.into(), field));
        self
    }

    /// Finish the schema with the routine that fills a document from a record.
    pub fn build_with<F>(self, build: F) -> Result<DocumentSchema, SchemaError>
    where
        F: Fn(&Record, &mut Document) -> Result<(), SchemaError> + Send + Sync + 'static,
    {
        DocumentSchema::assemble(self.name, self.fields, Builder::Custom(Arc::new(build)))
    }
}

/// One document: an id plus one index value per declared field.
#[derive(Clone)]
pub struct Document {
    schema: DocumentSchema,
    doc_id: String,
    values: BTreeMap<String, IndexValue>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("schema", &self.schema.name())
            .field("doc_id", &self.doc_id)
            .field("values", &self.values)
            .finish()
    }
}

impl Document {
    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    /// Same as [`doc_id`](Self::doc_id): the source record's primary key.
    pub fn pk(&self) -> &str {
        &self.doc_id
    }

    pub fn schema(&self) -> &DocumentSchema {
        &self.schema
    }

    fn declared(&self, name: &str) -> Result<&Field, SchemaError> {
        self.schema
            .field(name)
            .ok_or_else(|| SchemaError::UnknownField {
                schema: self.schema.name().to_string(),
                field: name.to_string(),
            })
    }

    /// Assign a field, converting to its index value.
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<(), SchemaError> {
        let value = value.into();
        let converted = self.declared(name)?.to_index(Some(&value))?;
        self.values.insert(name.to_string(), converted);
        Ok(())
    }

    /// Assign a field that may be absent; `None` takes the field default.
    pub fn set_optional<V: Into<FieldValue>>(
        &mut self,
        name: &str,
        value: Option<V>,
    ) -> Result<(), SchemaError> {
        match value {
            Some(v) => self.set(name, v),
            None => {
                let converted = self.declared(name)?.to_index(None)?;
                self.values.insert(name.to_string(), converted);
                Ok(())
            }
        }
    }

    /// Native value of a field, if assigned.
    pub fn get(&self, name: &str) -> Result<Option<Value>, SchemaError> {
        let field = self.declared(name)?;
        match self.values.get(name) {
            Some(v) => Ok(Some(field.to_native(v)?)),
            None => Ok(None),
        }
    }

    /// Native text of a field, or `None` when unset or not text.
    pub fn get_text(&self, name: &str) -> Option<String> {
        match self.get(name) {
            Ok(Some(Value::Text(s))) => Some(s),
            _ => None,
        }
    }

    pub fn index_value(&self, name: &str) -> Option<&IndexValue> {
        self.values.get(name)
    }

    pub fn values(&self) -> &BTreeMap<String, IndexValue> {
        &self.values
    }

    /// Space-joined corpus tokens, in meta schemas that declare a corpus.
    pub fn corpus(&self) -> Option<&str> {
        self.values.get(CORPUS_FIELD).and_then(IndexValue::as_text)
    }

    /// Every text value joined, for the catch-all keyword column.
    pub fn all_text(&self) -> String {
        self.values
            .values()
            .filter_map(IndexValue::as_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Fill unset fields from their defaults, failing on any without one.
    pub(crate) fn finalize(&mut self) -> Result<(), SchemaError> {
        let missing: Vec<String> = self
            .schema
            .field_names()
            .filter(|name| !self.values.contains_key(*name))
            .map(str::to_string)
            .collect();
        for name in missing {
            self.set_optional::<FieldValue>(&name, None)?;
        }
        Ok(())
    }
}
