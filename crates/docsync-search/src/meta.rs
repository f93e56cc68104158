//! Declarative schemas derived from a record type.
//!
//! [`SearchMeta`] lists which record fields to index, optional type
//! overrides and value mappers per field, and corpus entries whose tokens are
//! unioned into a single `corpus` field. [`DocumentSchema::from_meta`] resolves
//! it once into a plan; building a document then just runs the plan.
//!
//! Field types resolve as: explicit override, else the type inferred from the
//! record field's declared kind, else raw text.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use docsync_types::{FieldKind, Record, RecordType, Value};

use crate::document::{Builder, Document, DocumentSchema, CORPUS_FIELD};
use crate::error::SchemaError;
use crate::field::Field;
use crate::indexers::{indexer, words, Indexer};
use crate::value::IndexedValue;

/// Derives a field value from a whole record.
pub type Mapper = Arc<dyn Fn(&Record) -> Option<Value> + Send + Sync>;

/// Derives corpus text from a whole record.
pub type RecordText = Arc<dyn Fn(&Record) -> Option<String> + Send + Sync>;

/// One indexed field in a meta declaration.
#[derive(Clone)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: Option<Field>,
    pub mapper: Option<Mapper>,
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("mapped", &self.mapper.is_some())
            .finish()
    }
}

impl FieldSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: None,
            mapper: None,
        }
    }

    /// Override the inferred field type.
    pub fn typed(mut self, field: Field) -> Self {
        self.field_type = Some(field);
        self
    }

    /// Compute the value from the record instead of reading the like-named
    /// attribute.
    pub fn mapped<F>(mut self, mapper: F) -> Self
    where
        F: Fn(&Record) -> Option<Value> + Send + Sync + 'static,
    {
        self.mapper = Some(Arc::new(mapper));
        self
    }
}

/// Where a corpus entry takes its text from.
#[derive(Clone)]
pub enum CorpusSource {
    /// The built value of a declared field
    Field(String),
    /// A function of the record
    Record(RecordText),
}

/// One corpus entry: a text source and the indexer producing its tokens.
#[derive(Clone)]
pub struct CorpusSpec {
    pub source: CorpusSource,
    pub indexer: Indexer,
}

impl fmt::Debug for CorpusSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            CorpusSource::Field(name) => name.as_str(),
            CorpusSource::Record(_) => "<record>",
        };
        f.debug_struct("CorpusSpec").field("source", &source).finish()
    }
}

impl CorpusSpec {
    pub fn field<F>(name: impl Into<String>, indexer_fn: F) -> Self
    where
        F: Fn(&str) -> Vec<String> + Send + Sync + 'static,
    {
        Self {
            source: CorpusSource::Field(name.into()),
            indexer: indexer(indexer_fn),
        }
    }

    pub fn record<R, F>(text: R, indexer_fn: F) -> Self
    where
        R: Fn(&Record) -> Option<String> + Send + Sync + 'static,
        F: Fn(&str) -> Vec<String> + Send + Sync + 'static,
    {
        Self {
            source: CorpusSource::Record(Arc::new(text)),
            indexer: indexer(indexer_fn),
        }
    }
}

/// Declarative schema configuration.
#[derive(Debug, Clone, Default)]
pub struct SearchMeta {
    pub fields: Vec<FieldSpec>,
    pub corpus: Vec<CorpusSpec>,
}

impl SearchMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Index record fields by name with inferred types.
    pub fn fields(mut self, names: &[&str]) -> Self {
        self.fields.extend(names.iter().map(|n| FieldSpec::new(*n)));
        self
    }

    pub fn corpus(mut self, spec: CorpusSpec) -> Self {
        self.corpus.push(spec);
        self
    }
}

/// Resolved build plan for a meta schema.
pub(crate) struct MetaPlan {
    mappers: Vec<(String, Option<Mapper>)>,
    corpus: Vec<CorpusSpec>,
}

impl MetaPlan {
    /// Derive every field value from the record, then the corpus.
    pub(crate) fn build_base(&self, record: &Record, doc: &mut Document) -> Result<(), SchemaError> {
        for (name, mapper) in &self.mappers {
            let value = match mapper {
                Some(mapper) => mapper(record),
                None => record.get(name).cloned(),
            };
            doc.set_optional(name, value)?;
        }

        if self.corpus.is_empty() {
            return Ok(());
        }

        let mut seen = HashSet::new();
        let mut tokens = Vec::new();
        for spec in &self.corpus {
            let text = match &spec.source {
                CorpusSource::Field(name) => doc.get(name)?.map(|v| v.to_text()),
                CorpusSource::Record(f) => f(record),
            };
            let Some(text) = text else { continue };
            for token in (spec.indexer)(&text) {
                if seen.insert(token.clone()) {
                    tokens.push(token);
                }
            }
        }
        doc.set(CORPUS_FIELD, IndexedValue::new(tokens.join(" ")))
    }
}

/// Name given to schemas derived from a record type: `foo_bar` becomes
/// `FooBarDocument`.
pub fn schema_name_for(record_type: &str) -> String {
    let mut name: String = record_type
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect();
    name.push_str("Document");
    name
}

/// Field type inferred from a record field's declared kind.
pub fn infer_field(kind: Option<&FieldKind>) -> Field {
    match kind {
        Some(FieldKind::Integer) => Field::integer(),
        Some(FieldKind::Float) => Field::float(),
        Some(FieldKind::Bool) => Field::boolean(),
        Some(FieldKind::Date) | Some(FieldKind::DateTime) => Field::date(),
        Some(FieldKind::Text) | Some(FieldKind::List) | Some(FieldKind::Reference(_)) | None => {
            Field::text()
        }
    }
}

impl DocumentSchema {
    /// Resolve a meta declaration against a record type.
    ///
    /// With no fields listed, every declared record field is indexed.
    pub fn from_meta(record_type: &RecordType, meta: SearchMeta) -> Result<Self, SchemaError> {
        let name = schema_name_for(&record_type.name);

        let specs: Vec<FieldSpec> = if meta.fields.is_empty() {
            record_type.field_names().map(FieldSpec::new).collect()
        } else {
            meta.fields
        };

        let mut fields = Vec::with_capacity(specs.len() + 1);
        let mut mappers = Vec::with_capacity(specs.len());
        for spec in specs {
            let field = match spec.field_type {
                Some(field) => field,
                None => infer_field(record_type.field_kind(&spec.name)),
            };
            fields.push((spec.name.clone(), field));
            mappers.push((spec.name, spec.mapper));
        }

        for entry in &meta.corpus {
            if let CorpusSource::Field(source) = &entry.source {
                if !mappers.iter().any(|(n, _)| n == source) {
                    return Err(SchemaError::UnknownField {
                        schema: name,
                        field: source.clone(),
                    });
                }
            }
        }

        if !meta.corpus.is_empty() {
            fields.push((
                CORPUS_FIELD.to_string(),
                Field::text().with_indexer(indexer(words)),
            ));
        }

        let plan = MetaPlan {
            mappers,
            corpus: meta.corpus,
        };
        DocumentSchema::assemble(name, fields, Builder::Meta(plan))
    }
}
