//! # docsync-search
//!
//! Document schemas and the Tantivy index service for docsync.
//!
//! This crate turns stored records into searchable documents and keeps them
//! in named Tantivy indexes.
//!
//! ## Features
//! - Typed fields with bidirectional value conversion and range checks
//! - Indexer functions (words, prefixes, substrings) for token fields
//! - Document schemas declared by closure or by [`SearchMeta`]
//! - Embedded Tantivy indexes with MmapDirectory persistence
//! - Filter trees, relevance or field ordering, and paging

pub mod document;
pub mod error;
pub mod field;
pub mod index;
pub mod indexer;
pub mod indexers;
pub mod meta;
pub mod query;
pub mod rank;
pub mod schema;
pub mod searcher;
pub mod service;
pub mod value;

pub use document::{Document, DocumentSchema, DocumentSchemaBuilder, CORPUS_FIELD, DOC_ID_FIELD};
pub use error::{FieldError, SchemaError, SearchError};
pub use field::{Field, FieldKind, IndexKind};
pub use index::{SearchIndex, SearchIndexConfig};
pub use indexer::SearchIndexer;
pub use indexers::{contains, indexer, startswith, words, Indexer};
pub use meta::{CorpusSpec, FieldSpec, SearchMeta};
pub use query::{IndexFilter, IndexHit, IndexQuery, IndexSort};
pub use rank::{ascii_rank, prefix_rank};
pub use schema::IndexSchema;
pub use searcher::DocumentSearcher;
pub use service::{IndexService, IndexServiceConfig, TantivyIndexService};
pub use value::{FieldValue, IndexValue, IndexedValue};
