//! Record listeners that mirror saves and deletes into an index.

use std::sync::Arc;

use docsync_search::{DocumentSchema, IndexService};
use docsync_storage::{ListenerError, RecordEvent, RecordListener};
use tracing::debug;

use crate::suspend::IndexingContext;

/// Builds and upserts a document after each save.
pub struct IndexListener {
    schema: DocumentSchema,
    index_name: String,
    service: Arc<dyn IndexService>,
    context: IndexingContext,
}

impl IndexListener {
    pub fn new(
        schema: DocumentSchema,
        index_name: impl Into<String>,
        service: Arc<dyn IndexService>,
        context: IndexingContext,
    ) -> Self {
        Self {
            schema,
            index_name: index_name.into(),
            service,
            context,
        }
    }
}

impl RecordListener for IndexListener {
    fn notify(&self, event: &RecordEvent<'_>) -> Result<(), ListenerError> {
        if !self.context.is_enabled() {
            debug!(pk = event.record.pk, index = %self.index_name, "Indexing suspended, skipping put");
            return Ok(());
        }

        let doc = self.schema.build(event.record)?;
        self.service.put(&self.index_name, &doc)?;
        debug!(
            pk = event.record.pk,
            index = %self.index_name,
            created = event.created,
            "Indexed record"
        );
        Ok(())
    }
}

/// Removes a record's document before the record is deleted.
pub struct UnindexListener {
    index_name: String,
    service: Arc<dyn IndexService>,
    context: IndexingContext,
}

impl UnindexListener {
    pub fn new(
        index_name: impl Into<String>,
        service: Arc<dyn IndexService>,
        context: IndexingContext,
    ) -> Self {
        Self {
            index_name: index_name.into(),
            service,
            context,
        }
    }
}

impl RecordListener for UnindexListener {
    fn notify(&self, event: &RecordEvent<'_>) -> Result<(), ListenerError> {
        if !self.context.is_enabled() {
            debug!(pk = event.record.pk, index = %self.index_name, "Indexing suspended, skipping delete");
            return Ok(());
        }

        self.service
            .delete(&self.index_name, &[event.record.pk_text()])?;
        debug!(pk = event.record.pk, index = %self.index_name, "Unindexed record");
        Ok(())
    }
}
