//! Index maintenance: rebuild, purge and orphan cleanup.
//!
//! These run synchronously over a [`Binding`] and report what they did.
//! Batch sizes come from [`MaintenanceConfig`], normally built from
//! [`Settings`].

use std::collections::HashSet;
use std::time::Instant;

use docsync_types::{PrimaryKey, Settings};
use tracing::{debug, info, warn};

use crate::binder::Binder;
use crate::error::IndexingError;
use crate::registry::Binding;

/// Configuration for maintenance operations.
#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    /// Records (or index ids) handled per batch
    pub batch_size: usize,
    /// Document ids removed per delete call
    pub delete_batch_size: usize,
    /// Whether reindexing skips records whose document fails to build
    pub continue_on_error: bool,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            batch_size: 500,
            delete_batch_size: 200,
            continue_on_error: true,
        }
    }
}

impl MaintenanceConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            batch_size: settings.batch_size,
            delete_batch_size: settings.delete_batch_size,
            ..Default::default()
        }
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_delete_batch_size(mut self, size: usize) -> Self {
        self.delete_batch_size = size;
        self
    }

    /// Set whether to continue on errors.
    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    fn batch(&self) -> usize {
        self.batch_size.max(1)
    }

    fn delete_batch(&self) -> usize {
        self.delete_batch_size.max(1)
    }
}

/// Outcome of a maintenance run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    /// Records or documents examined
    pub processed: u64,
    /// Documents written
    pub indexed: u64,
    /// Documents removed
    pub deleted: u64,
    /// Records whose document failed to build
    pub errors: u64,
    /// Batches handled
    pub batches: u64,
    pub elapsed_ms: u64,
}

impl MaintenanceReport {
    fn finish(mut self, started: Instant) -> Self {
        self.elapsed_ms = started.elapsed().as_millis() as u64;
        self
    }
}

/// Rebuild every document of the binding from the stored records.
pub fn reindex(
    binder: &Binder,
    binding: &Binding,
    config: &MaintenanceConfig,
) -> Result<MaintenanceReport, IndexingError> {
    let started = Instant::now();
    let mut report = MaintenanceReport::default();
    let records = binder.storage().all(binding.record_type())?;

    for chunk in records.chunks(config.batch()) {
        let mut docs = Vec::with_capacity(chunk.len());
        for record in chunk {
            report.processed += 1;
            match binding.schema().build(record) {
                Ok(doc) => docs.push(doc),
                Err(e) if config.continue_on_error => {
                    report.errors += 1;
                    warn!(binding = %binding.id(), pk = record.pk, error = %e, "Skipping record that failed to build");
                }
                Err(e) => return Err(e.into()),
            }
        }

        report.indexed += binder.service().put_many(binding.index_name(), &docs)? as u64;
        report.batches += 1;
        debug!(
            binding = %binding.id(),
            processed = report.processed,
            indexed = report.indexed,
            "Reindex progress"
        );
    }

    let report = report.finish(started);
    info!(
        binding = %binding.id(),
        indexed = report.indexed,
        errors = report.errors,
        elapsed_ms = report.elapsed_ms,
        "Reindex complete"
    );
    Ok(report)
}

/// Delete every document in the binding's index.
pub fn purge_index(
    binder: &Binder,
    binding: &Binding,
    config: &MaintenanceConfig,
) -> Result<MaintenanceReport, IndexingError> {
    let started = Instant::now();
    let mut report = MaintenanceReport::default();
    let service = binder.service();

    loop {
        let ids = service.list_ids(binding.index_name(), None, config.batch())?;
        if ids.is_empty() {
            break;
        }
        report.processed += ids.len() as u64;

        let mut removed = 0;
        for chunk in ids.chunks(config.delete_batch()) {
            removed += service.delete(binding.index_name(), chunk)?;
        }
        report.deleted += removed as u64;
        report.batches += 1;
        debug!(index = %binding.index_name(), removed, "Purged batch");

        if removed == 0 {
            warn!(index = %binding.index_name(), "Purge made no progress, stopping");
            break;
        }
    }

    let report = report.finish(started);
    info!(
        index = %binding.index_name(),
        deleted = report.deleted,
        elapsed_ms = report.elapsed_ms,
        "Purge index complete"
    );
    Ok(report)
}

/// Delete documents whose record no longer exists.
pub fn remove_orphaned_documents(
    binder: &Binder,
    binding: &Binding,
    config: &MaintenanceConfig,
) -> Result<MaintenanceReport, IndexingError> {
    let started = Instant::now();
    let mut report = MaintenanceReport::default();
    let service = binder.service();
    let mut cursor: Option<String> = None;

    loop {
        let ids = service.list_ids(binding.index_name(), cursor.as_deref(), config.batch())?;
        let Some(last) = ids.last() else {
            break;
        };
        cursor = Some(last.clone());
        report.processed += ids.len() as u64;

        let pks: Vec<PrimaryKey> = ids.iter().filter_map(|id| id.parse().ok()).collect();
        let existing: HashSet<String> = binder
            .storage()
            .get_many(binding.record_type(), &pks)?
            .iter()
            .map(|record| record.pk_text())
            .collect();

        let orphans: Vec<String> = ids
            .into_iter()
            .filter(|id| !existing.contains(id))
            .collect();
        for chunk in orphans.chunks(config.delete_batch()) {
            report.deleted += service.delete(binding.index_name(), chunk)? as u64;
        }
        report.batches += 1;
        if !orphans.is_empty() {
            debug!(index = %binding.index_name(), orphans = orphans.len(), "Removed orphaned documents");
        }
    }

    let report = report.finish(started);
    info!(
        index = %binding.index_name(),
        examined = report.processed,
        deleted = report.deleted,
        elapsed_ms = report.elapsed_ms,
        "Orphan cleanup complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use docsync_search::{
        DocumentSchema, Field, IndexQuery, IndexServiceConfig, TantivyIndexService,
    };
    use docsync_storage::Storage;
    use docsync_types::{RecordType, Value};
    use tempfile::TempDir;

    struct Fixture {
        _temp_dir: TempDir,
        binder: Binder,
        binding: Binding,
    }

    fn fixture(count: usize) -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let storage = Arc::new(Storage::open(&temp_dir.path().join("db")).unwrap());
        storage
            .register_type(RecordType::new("note").text("body").integer("stars"))
            .unwrap();
        let service = Arc::new(TantivyIndexService::new(IndexServiceConfig::new(
            temp_dir.path().join("index"),
        )));
        let binder = Binder::new(storage, service);

        let schema = DocumentSchema::builder("NoteDocument")
            .field("body", Field::text())
            .field("stars", Field::integer())
            .build_with(|record, doc| {
                doc.set_optional("body", record.get("body").cloned())?;
                doc.set_optional("stars", record.get("stars").cloned())?;
                Ok(())
            })
            .unwrap();
        let binding = binder.attach("note", schema, None).unwrap();

        for i in 0..count {
            let values = BTreeMap::from([
                ("body".to_string(), Value::from(format!("note {}", i))),
                ("stars".to_string(), Value::from(i as i64)),
            ]);
            binder.storage().create("note", values).unwrap();
        }

        Fixture {
            _temp_dir: temp_dir,
            binder,
            binding,
        }
    }

    fn indexed(f: &Fixture) -> usize {
        f.binder
            .service()
            .count(f.binding.index_name(), &IndexQuery::all())
            .unwrap()
    }

    fn small_batches() -> MaintenanceConfig {
        MaintenanceConfig::default()
            .with_batch_size(3)
            .with_delete_batch_size(2)
    }

    #[test]
    fn test_reindex_after_suspended_writes() {
        let f = fixture(0);
        {
            let _guard = f.binder.suspend();
            for i in 0..7 {
                let values = BTreeMap::from([
                    ("body".to_string(), Value::from("quiet")),
                    ("stars".to_string(), Value::from(i as i64)),
                ]);
                f.binder.storage().create("note", values).unwrap();
            }
        }
        assert_eq!(indexed(&f), 0);

        let report = reindex(&f.binder, &f.binding, &small_batches()).unwrap();
        assert_eq!(report.processed, 7);
        assert_eq!(report.indexed, 7);
        assert_eq!(report.batches, 3);
        assert_eq!(indexed(&f), 7);
    }

    #[test]
    fn test_reindex_skips_unbuildable_records() {
        let f = fixture(2);
        {
            let _guard = f.binder.suspend();
            let values = BTreeMap::from([("body".to_string(), Value::from("no stars"))]);
            f.binder.storage().create("note", values).unwrap();
        }

        let report = reindex(&f.binder, &f.binding, &small_batches()).unwrap();
        assert_eq!(report.errors, 1);
        assert_eq!(report.indexed, 2);

        let strict = small_batches().with_continue_on_error(false);
        assert!(matches!(
            reindex(&f.binder, &f.binding, &strict),
            Err(IndexingError::Schema(_))
        ));
    }

    #[test]
    fn test_purge_index() {
        let f = fixture(8);
        assert_eq!(indexed(&f), 8);

        let report = purge_index(&f.binder, &f.binding, &small_batches()).unwrap();
        assert_eq!(report.deleted, 8);
        assert_eq!(report.batches, 3);
        assert_eq!(indexed(&f), 0);
        assert_eq!(f.binder.storage().count("note").unwrap(), 8);
    }

    #[test]
    fn test_remove_orphaned_documents() {
        let f = fixture(6);
        {
            let _guard = f.binder.suspend();
            f.binder.storage().delete("note", 2).unwrap();
            f.binder.storage().delete("note", 5).unwrap();
        }
        assert_eq!(indexed(&f), 6);

        let report = remove_orphaned_documents(&f.binder, &f.binding, &small_batches()).unwrap();
        assert_eq!(report.processed, 6);
        assert_eq!(report.deleted, 2);
        assert_eq!(indexed(&f), 4);
        assert_eq!(
            f.binder
                .service()
                .list_ids(f.binding.index_name(), None, 10)
                .unwrap(),
            vec!["1", "3", "4", "6"]
        );
    }

    #[test]
    fn test_config_from_settings() {
        let settings = Settings {
            batch_size: 50,
            delete_batch_size: 20,
            ..Settings::default()
        };
        let config = MaintenanceConfig::from_settings(&settings);
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.delete_batch_size, 20);
    }
}
