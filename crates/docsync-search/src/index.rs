//! Tantivy index management.
//!
//! Handles index creation, opening, and tokenizer registration.

use std::path::{Path, PathBuf};

use tantivy::tokenizer::{LowerCaser, TextAnalyzer, WhitespaceTokenizer};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy};
use tracing::{debug, info};

use crate::error::SearchError;
use crate::field::IndexKind;
use crate::schema::{build_index_schema, IndexSchema, TOKENS_TOKENIZER};

/// Default memory budget for IndexWriter (50MB)
pub const DEFAULT_WRITER_MEMORY_MB: usize = 50;

/// Search index configuration
#[derive(Debug, Clone)]
pub struct SearchIndexConfig {
    /// Path to index directory
    pub index_path: PathBuf,
    /// Memory budget for writer in MB
    pub writer_memory_mb: usize,
}

impl SearchIndexConfig {
    pub fn new(index_path: impl Into<PathBuf>) -> Self {
        Self {
            index_path: index_path.into(),
            writer_memory_mb: DEFAULT_WRITER_MEMORY_MB,
        }
    }

    pub fn with_memory_mb(mut self, mb: usize) -> Self {
        self.writer_memory_mb = mb;
        self
    }
}

/// Wrapper for Tantivy index with schema access.
pub struct SearchIndex {
    index: Index,
    schema: IndexSchema,
    config: SearchIndexConfig,
}

impl SearchIndex {
    /// Open the index at the configured path, creating it with `fields` if
    /// absent. An existing index must agree with `fields`.
    pub fn open_or_create(
        config: SearchIndexConfig,
        fields: &[(String, IndexKind)],
    ) -> Result<Self, SearchError> {
        let index = if config.index_path.join("meta.json").exists() {
            debug!(path = ?config.index_path, "Opening existing index");
            Index::open_in_dir(&config.index_path)?
        } else {
            info!(path = ?config.index_path, "Creating new index");
            std::fs::create_dir_all(&config.index_path)?;
            let schema = build_index_schema(fields);
            Index::create_in_dir(&config.index_path, schema.schema().clone())?
        };

        let schema = IndexSchema::from_schema(index.schema())?;
        schema.check_compatible(fields)?;
        Ok(Self::wrap(index, schema, config))
    }

    /// Open an index that must already exist; the field set is read from disk.
    pub fn open(config: SearchIndexConfig) -> Result<Self, SearchError> {
        if !config.index_path.join("meta.json").exists() {
            return Err(SearchError::IndexNotFound(
                config.index_path.display().to_string(),
            ));
        }
        let index = Index::open_in_dir(&config.index_path)?;
        let schema = IndexSchema::from_schema(index.schema())?;
        Ok(Self::wrap(index, schema, config))
    }

    fn wrap(index: Index, schema: IndexSchema, config: SearchIndexConfig) -> Self {
        index.tokenizers().register(
            TOKENS_TOKENIZER,
            TextAnalyzer::builder(WhitespaceTokenizer::default())
                .filter(LowerCaser)
                .build(),
        );
        info!(path = ?config.index_path, fields = schema.fields().count(), "Opened search index");
        Self {
            index,
            schema,
            config,
        }
    }

    /// Get the index schema
    pub fn schema(&self) -> &IndexSchema {
        &self.schema
    }

    /// Get the underlying Tantivy index
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Create an IndexWriter with configured memory budget
    pub fn writer(&self) -> Result<IndexWriter, SearchError> {
        let memory_budget = self.config.writer_memory_mb * 1024 * 1024;
        let writer = self.index.writer_with_num_threads(1, memory_budget)?;
        debug!(
            memory_mb = self.config.writer_memory_mb,
            "Created index writer"
        );
        Ok(writer)
    }

    /// Create an IndexReader that reloads only when asked, so a write is
    /// visible exactly when the writer says it is.
    pub fn reader(&self) -> Result<IndexReader, SearchError> {
        let reader = self
            .index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        debug!("Created index reader");
        Ok(reader)
    }

    /// Get the index path
    pub fn path(&self) -> &Path {
        &self.config.index_path
    }

    /// Check if index exists at the configured path
    pub fn exists(&self) -> bool {
        self.config.index_path.join("meta.json").exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fields() -> Vec<(String, IndexKind)> {
        vec![
            ("name".to_string(), IndexKind::RawText),
            ("age".to_string(), IndexKind::I64),
        ]
    }

    #[test]
    fn test_create_new_index() {
        let temp_dir = TempDir::new().unwrap();
        let config = SearchIndexConfig::new(temp_dir.path());

        let index = SearchIndex::open_or_create(config, &fields()).unwrap();
        assert!(index.exists());
        assert!(index.schema().field("name").is_some());
    }

    #[test]
    fn test_reopen_existing_index() {
        let temp_dir = TempDir::new().unwrap();
        let config = SearchIndexConfig::new(temp_dir.path());

        let index1 = SearchIndex::open_or_create(config.clone(), &fields()).unwrap();
        drop(index1);

        let index2 = SearchIndex::open(config).unwrap();
        assert_eq!(index2.schema().field("age").unwrap().kind, IndexKind::I64);
    }

    #[test]
    fn test_reopen_with_different_fields_fails() {
        let temp_dir = TempDir::new().unwrap();
        let config = SearchIndexConfig::new(temp_dir.path());
        drop(SearchIndex::open_or_create(config.clone(), &fields()).unwrap());

        let changed = vec![("name".to_string(), IndexKind::TokenText)];
        let result = SearchIndex::open_or_create(config, &changed);
        assert!(matches!(result, Err(SearchError::SchemaMismatch(_))));
    }

    #[test]
    fn test_open_missing_index() {
        let temp_dir = TempDir::new().unwrap();
        let config = SearchIndexConfig::new(temp_dir.path().join("nope"));
        assert!(matches!(
            SearchIndex::open(config),
            Err(SearchError::IndexNotFound(_))
        ));
    }

    #[test]
    fn test_create_writer_and_reader() {
        let temp_dir = TempDir::new().unwrap();
        let config = SearchIndexConfig::new(temp_dir.path());
        let index = SearchIndex::open_or_create(config, &fields()).unwrap();

        let _writer = index.writer().unwrap();
        let _reader = index.reader().unwrap();
    }

    #[test]
    fn test_config_with_memory() {
        let config = SearchIndexConfig::new("/tmp/test").with_memory_mb(100);
        assert_eq!(config.writer_memory_mb, 100);
    }
}
