//! Named document indexes behind one service handle.
//!
//! [`IndexService`] is the seam between the synchronization layer and the
//! search backend. [`TantivyIndexService`] keeps one Tantivy index per name
//! under a root directory; each write commits and reloads the reader so it
//! is visible to the next query.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use docsync_types::Settings;
use tracing::{debug, info};

use crate::document::{Document, DocumentSchema};
use crate::error::SearchError;
use crate::index::{SearchIndex, SearchIndexConfig, DEFAULT_WRITER_MEMORY_MB};
use crate::indexer::SearchIndexer;
use crate::query::{IndexHit, IndexQuery};
use crate::searcher::DocumentSearcher;

/// Operations the synchronization layer needs from a search backend.
pub trait IndexService: Send + Sync {
    /// Create the named index for `schema` if it does not exist yet.
    fn ensure_index(&self, name: &str, schema: &DocumentSchema) -> Result<(), SearchError>;

    /// Insert or replace a document, keyed by its id.
    fn put(&self, name: &str, doc: &Document) -> Result<(), SearchError>;

    /// Insert or replace several documents with one commit.
    fn put_many(&self, name: &str, docs: &[Document]) -> Result<usize, SearchError>;

    /// Remove documents by id; returns how many were present.
    fn delete(&self, name: &str, doc_ids: &[String]) -> Result<usize, SearchError>;

    fn search(&self, name: &str, query: &IndexQuery) -> Result<Vec<IndexHit>, SearchError>;

    fn count(&self, name: &str, query: &IndexQuery) -> Result<usize, SearchError>;

    /// Page through document ids in id order.
    fn list_ids(
        &self,
        name: &str,
        start_after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<String>, SearchError>;

    /// Remove every document from the named index.
    fn clear(&self, name: &str) -> Result<(), SearchError>;
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct IndexServiceConfig {
    /// Directory holding one subdirectory per index
    pub root: PathBuf,
    /// Memory budget for each index writer in MB
    pub writer_memory_mb: usize,
}

impl IndexServiceConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            writer_memory_mb: DEFAULT_WRITER_MEMORY_MB,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            root: settings.index_path(),
            writer_memory_mb: settings.writer_memory_mb,
        }
    }

    fn index_config(&self, name: &str) -> SearchIndexConfig {
        SearchIndexConfig::new(self.root.join(name)).with_memory_mb(self.writer_memory_mb)
    }
}

struct OpenIndex {
    indexer: SearchIndexer,
    searcher: DocumentSearcher,
}

impl OpenIndex {
    fn new(index: SearchIndex) -> Result<Self, SearchError> {
        Ok(Self {
            indexer: SearchIndexer::new(&index)?,
            searcher: DocumentSearcher::new(&index)?,
        })
    }

    fn commit(&self) -> Result<(), SearchError> {
        self.indexer.commit()?;
        self.searcher.reload()
    }
}

/// Tantivy-backed [`IndexService`].
pub struct TantivyIndexService {
    config: IndexServiceConfig,
    indexes: RwLock<HashMap<String, Arc<OpenIndex>>>,
}

impl TantivyIndexService {
    pub fn new(config: IndexServiceConfig) -> Self {
        info!(root = ?config.root, "Index service ready");
        Self {
            config,
            indexes: RwLock::new(HashMap::new()),
        }
    }

    /// Names of the indexes opened so far.
    pub fn open_indexes(&self) -> Result<Vec<String>, SearchError> {
        let indexes = self
            .indexes
            .read()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))?;
        let mut names: Vec<String> = indexes.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn cached(&self, name: &str) -> Result<Option<Arc<OpenIndex>>, SearchError> {
        let indexes = self
            .indexes
            .read()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))?;
        Ok(indexes.get(name).cloned())
    }

    /// Look up an index, opening it from disk if it exists there.
    fn get(&self, name: &str) -> Result<Arc<OpenIndex>, SearchError> {
        if let Some(open) = self.cached(name)? {
            return Ok(open);
        }

        let mut indexes = self
            .indexes
            .write()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))?;
        if let Some(open) = indexes.get(name) {
            return Ok(open.clone());
        }

        let index = SearchIndex::open(self.config.index_config(name)).map_err(|e| match e {
            SearchError::IndexNotFound(_) => SearchError::IndexNotFound(name.to_string()),
            other => other,
        })?;
        let open = Arc::new(OpenIndex::new(index)?);
        indexes.insert(name.to_string(), open.clone());
        Ok(open)
    }

    fn get_or_create(&self, name: &str, schema: &DocumentSchema) -> Result<Arc<OpenIndex>, SearchError> {
        if let Some(open) = self.cached(name)? {
            return Ok(open);
        }

        let mut indexes = self
            .indexes
            .write()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))?;
        if let Some(open) = indexes.get(name) {
            return Ok(open.clone());
        }

        let index =
            SearchIndex::open_or_create(self.config.index_config(name), &schema.index_fields())?;
        let open = Arc::new(OpenIndex::new(index)?);
        indexes.insert(name.to_string(), open.clone());
        debug!(index = name, schema = schema.name(), "Index opened");
        Ok(open)
    }
}

impl IndexService for TantivyIndexService {
    fn ensure_index(&self, name: &str, schema: &DocumentSchema) -> Result<(), SearchError> {
        self.get_or_create(name, schema).map(|_| ())
    }

    fn put(&self, name: &str, doc: &Document) -> Result<(), SearchError> {
        let open = self.get_or_create(name, doc.schema())?;
        open.indexer.put_document(doc)?;
        open.commit()
    }

    fn put_many(&self, name: &str, docs: &[Document]) -> Result<usize, SearchError> {
        let Some(first) = docs.first() else {
            return Ok(0);
        };
        let open = self.get_or_create(name, first.schema())?;
        let count = open.indexer.put_documents(docs)?;
        open.commit()?;
        Ok(count)
    }

    fn delete(&self, name: &str, doc_ids: &[String]) -> Result<usize, SearchError> {
        if doc_ids.is_empty() {
            return Ok(0);
        }
        let open = self.get(name)?;
        let before = open.searcher.num_docs();
        open.indexer.delete_documents(doc_ids)?;
        open.commit()?;
        let removed = before.saturating_sub(open.searcher.num_docs()) as usize;
        debug!(index = name, requested = doc_ids.len(), removed, "Deleted documents");
        Ok(removed)
    }

    fn search(&self, name: &str, query: &IndexQuery) -> Result<Vec<IndexHit>, SearchError> {
        self.get(name)?.searcher.search(query)
    }

    fn count(&self, name: &str, query: &IndexQuery) -> Result<usize, SearchError> {
        self.get(name)?.searcher.count(query)
    }

    fn list_ids(
        &self,
        name: &str,
        start_after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<String>, SearchError> {
        self.get(name)?.searcher.list_ids(start_after, limit)
    }

    fn clear(&self, name: &str) -> Result<(), SearchError> {
        let open = self.get(name)?;
        open.indexer.clear()?;
        open.searcher.reload()
    }
}
