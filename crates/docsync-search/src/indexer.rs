//! Search indexer for adding documents to the Tantivy index.
//!
//! The indexer wraps IndexWriter with shared access via Arc<Mutex>.
//! Documents are not visible until commit() is called.

use std::sync::{Arc, Mutex};

use chrono::NaiveTime;
use tantivy::{DateTime, IndexWriter, TantivyDocument, Term};
use tracing::{debug, info, warn};

use crate::document::Document;
use crate::error::SearchError;
use crate::field::IndexKind;
use crate::index::SearchIndex;
use crate::rank::{ascii_rank, prefix_rank};
use crate::schema::IndexSchema;
use crate::value::IndexValue;

/// Numeric ordering key for a document id: the id itself when numeric,
/// otherwise its prefix rank.
pub fn doc_key(doc_id: &str) -> u64 {
    doc_id.parse::<u64>().unwrap_or_else(|_| prefix_rank(doc_id))
}

/// Convert a document into its Tantivy representation.
pub fn to_tantivy(schema: &IndexSchema, doc: &Document) -> Result<TantivyDocument, SearchError> {
    let mut out = TantivyDocument::default();
    out.add_text(schema.doc_id, doc.doc_id());
    out.add_u64(schema.doc_key, doc_key(doc.doc_id()));
    out.add_text(schema.all_text, doc.all_text());

    for (name, value) in doc.values() {
        let handle = schema.field(name).ok_or_else(|| {
            SearchError::SchemaMismatch(format!("field {} missing from the index", name))
        })?;

        match (handle.kind, value) {
            (IndexKind::RawText, v) => {
                let text = v.to_string();
                if let Some(rank) = handle.rank {
                    out.add_text(rank, ascii_rank(&text));
                }
                out.add_text(handle.field, &text);
            }
            (IndexKind::TokenText, v) => out.add_text(handle.field, v.to_string()),
            (IndexKind::I64, IndexValue::Integer(i)) => out.add_i64(handle.field, *i),
            (IndexKind::F64, IndexValue::Float(f)) => out.add_f64(handle.field, *f),
            (IndexKind::F64, IndexValue::Integer(i)) => out.add_f64(handle.field, *i as f64),
            (IndexKind::Date, IndexValue::Date(d)) => {
                out.add_date(handle.field, date_to_tantivy(*d))
            }
            (kind, other) => {
                return Err(SearchError::SchemaMismatch(format!(
                    "field {} is {:?} in the index, got {} value",
                    name,
                    kind,
                    other.kind_name()
                )))
            }
        }
    }

    Ok(out)
}

/// Dates are stored as midnight UTC.
pub(crate) fn date_to_tantivy(date: chrono::NaiveDate) -> DateTime {
    DateTime::from_timestamp_secs(date.and_time(NaiveTime::MIN).and_utc().timestamp())
}

/// Manages document indexing operations.
///
/// Wraps IndexWriter for shared access across components.
/// Commit batches documents for visibility.
pub struct SearchIndexer {
    writer: Arc<Mutex<IndexWriter>>,
    schema: IndexSchema,
}

impl SearchIndexer {
    /// Create a new indexer from a SearchIndex.
    pub fn new(index: &SearchIndex) -> Result<Self, SearchError> {
        let writer = index.writer()?;
        let schema = index.schema().clone();

        Ok(Self {
            writer: Arc::new(Mutex::new(writer)),
            schema,
        })
    }

    /// Index a document.
    ///
    /// If a document with the same doc_id exists, it will be replaced.
    pub fn put_document(&self, doc: &Document) -> Result<(), SearchError> {
        let tantivy_doc = to_tantivy(&self.schema, doc)?;

        let writer = self
            .writer
            .lock()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))?;

        // Delete existing document with same ID (for update)
        let term = Term::from_field_text(self.schema.doc_id, doc.doc_id());
        writer.delete_term(term);

        writer.add_document(tantivy_doc)?;

        debug!(doc_id = %doc.doc_id(), schema = %doc.schema().name(), "Indexed document");
        Ok(())
    }

    /// Index multiple documents in batch.
    pub fn put_documents(&self, docs: &[Document]) -> Result<usize, SearchError> {
        let converted = docs
            .iter()
            .map(|doc| to_tantivy(&self.schema, doc).map(|d| (doc.doc_id(), d)))
            .collect::<Result<Vec<_>, _>>()?;

        let writer = self
            .writer
            .lock()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))?;

        let mut count = 0;
        for (doc_id, tantivy_doc) in converted {
            writer.delete_term(Term::from_field_text(self.schema.doc_id, doc_id));
            writer.add_document(tantivy_doc)?;
            count += 1;
        }

        debug!(count, "Indexed documents batch");
        Ok(count)
    }

    /// Delete documents by ID. Absent ids are ignored.
    pub fn delete_documents(&self, doc_ids: &[String]) -> Result<(), SearchError> {
        let writer = self
            .writer
            .lock()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))?;

        for doc_id in doc_ids {
            writer.delete_term(Term::from_field_text(self.schema.doc_id, doc_id));
        }

        debug!(count = doc_ids.len(), "Deleted documents");
        Ok(())
    }

    /// Commit pending changes to make them searchable.
    pub fn commit(&self) -> Result<u64, SearchError> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))?;

        let opstamp = writer.commit()?;
        debug!(opstamp, "Committed index changes");
        Ok(opstamp)
    }

    /// Rollback uncommitted changes.
    pub fn rollback(&self) -> Result<u64, SearchError> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))?;

        let opstamp = writer.rollback()?;
        warn!(opstamp, "Rolled back index changes");
        Ok(opstamp)
    }

    /// Remove every document.
    pub fn clear(&self) -> Result<(), SearchError> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))?;

        writer.delete_all_documents()?;
        writer.commit()?;
        info!("Cleared index");
        Ok(())
    }
}
