//! Synchronization binder.
//!
//! Attaching a record type to a document schema connects one post-save and
//! one pre-delete listener under the binding's id. From then on every save
//! upserts the record's document and every delete removes it, unless the
//! binder's [`IndexingContext`] is suspended. Index failures surface from
//! the triggering store call as [`StorageError::Listener`](docsync_storage::StorageError::Listener).

use std::sync::Arc;

use docsync_query::SearchQuery;
use docsync_search::{DocumentSchema, IndexService, SearchMeta};
use docsync_storage::{Signal, Storage, StorageError};
use tracing::info;

use crate::error::IndexingError;
use crate::listener::{IndexListener, UnindexListener};
use crate::registry::{default_index_name, Binding, BindingRegistry};
use crate::suspend::{IndexingContext, SuspendGuard};

/// Wires record stores to index services.
pub struct Binder {
    storage: Arc<Storage>,
    service: Arc<dyn IndexService>,
    registry: BindingRegistry,
    context: IndexingContext,
}

impl Binder {
    pub fn new(storage: Arc<Storage>, service: Arc<dyn IndexService>) -> Self {
        Self {
            storage,
            service,
            registry: BindingRegistry::new(),
            context: IndexingContext::new(),
        }
    }

    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    pub fn service(&self) -> &Arc<dyn IndexService> {
        &self.service
    }

    pub fn registry(&self) -> &BindingRegistry {
        &self.registry
    }

    pub fn context(&self) -> &IndexingContext {
        &self.context
    }

    /// Suspend index updates until the guard is dropped. Nests.
    pub fn suspend(&self) -> SuspendGuard {
        self.context.suspend()
    }

    /// Bind `record_type` to `schema` in `index_name` (default: the
    /// lowercased record type). Attaching the same triple again returns
    /// the existing binding without connecting more listeners.
    pub fn attach(
        &self,
        record_type: &str,
        schema: DocumentSchema,
        index_name: Option<&str>,
    ) -> Result<Binding, IndexingError> {
        if self.storage.record_type(record_type).is_none() {
            return Err(StorageError::UnknownRecordType(record_type.to_string()).into());
        }

        let index_name = index_name
            .map(str::to_string)
            .unwrap_or_else(|| default_index_name(record_type));
        let (binding, created) = self
            .registry
            .register(Binding::new(record_type, schema, &index_name))?;
        if !created {
            return Ok(binding);
        }

        if let Err(e) = self.connect(&binding) {
            self.registry.unregister(binding.id())?;
            return Err(e);
        }

        info!(
            binding = %binding.id(),
            record_type,
            index = %binding.index_name(),
            schema = %binding.schema().name(),
            "Attached search binding"
        );
        Ok(binding)
    }

    /// Bind `record_type` to a schema derived from its declaration and `meta`.
    pub fn attach_meta(
        &self,
        record_type: &str,
        meta: SearchMeta,
        index_name: Option<&str>,
    ) -> Result<Binding, IndexingError> {
        let declaration = self
            .storage
            .record_type(record_type)
            .ok_or_else(|| StorageError::UnknownRecordType(record_type.to_string()))?;
        let schema = DocumentSchema::from_meta(&declaration, meta)?;
        self.attach(record_type, schema, index_name)
    }

    fn connect(&self, binding: &Binding) -> Result<(), IndexingError> {
        self.service
            .ensure_index(binding.index_name(), binding.schema())?;

        let index = Arc::new(IndexListener::new(
            binding.schema().clone(),
            binding.index_name(),
            self.service.clone(),
            self.context.clone(),
        ));
        let unindex = Arc::new(UnindexListener::new(
            binding.index_name(),
            self.service.clone(),
            self.context.clone(),
        ));

        self.storage
            .connect(Signal::PostSave, binding.record_type(), binding.id(), index)?;
        self.storage
            .connect(Signal::PreDelete, binding.record_type(), binding.id(), unindex)?;
        Ok(())
    }

    /// Disconnect a binding's listeners and forget it. Indexed documents
    /// are left in place.
    pub fn detach(&self, binding: &Binding) -> Result<bool, IndexingError> {
        let Some(removed) = self.registry.unregister(binding.id())? else {
            return Ok(false);
        };
        self.storage
            .disconnect(Signal::PostSave, removed.record_type(), removed.id())?;
        self.storage
            .disconnect(Signal::PreDelete, removed.record_type(), removed.id())?;
        info!(binding = %removed.id(), "Detached search binding");
        Ok(true)
    }

    /// A query over every document of `record_type` in its default index.
    pub fn search_query(&self, record_type: &str) -> Result<SearchQuery, IndexingError> {
        self.search_query_in(record_type, &default_index_name(record_type))
    }

    /// A query over every document of `record_type` in `index_name`.
    pub fn search_query_in(
        &self,
        record_type: &str,
        index_name: &str,
    ) -> Result<SearchQuery, IndexingError> {
        let schema = self
            .registry
            .schema_for(record_type)
            .ok_or_else(|| IndexingError::UnknownBinding(record_type.to_string()))?;

        Ok(SearchQuery::new(self.service.clone(), record_type, index_name, schema)
            .with_storage(self.storage.clone()))
    }
}
