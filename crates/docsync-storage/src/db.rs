//! RocksDB wrapper for the docsync record store.
//!
//! Provides:
//! - Database open with column family setup
//! - Record type registration (persisted, reloaded on open)
//! - Atomic record + sequence writes
//! - Single, multi and per-type reads
//! - Post-save / pre-delete listener dispatch
//! - Relational query evaluation

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

use rocksdb::{Direction, IteratorMode, Options, WriteBatch, DB};
use tracing::{debug, info};

use docsync_types::{PrimaryKey, Record, RecordType, Value};

use crate::column_families::{
    build_cf_descriptors, ALL_CF_NAMES, CF_RECORDS, CF_RECORD_TYPES, CF_SEQUENCES,
};
use crate::error::StorageError;
use crate::keys::{validate_type_name, RecordKey, SequenceKey};
use crate::listener::{RecordEvent, RecordListener, Signal};
use crate::query::{RecordQuery, RecordResolver};

type ListenerMap = HashMap<(Signal, String), Vec<(String, Arc<dyn RecordListener>)>>;

/// Main storage interface for records
pub struct Storage {
    db: DB,
    record_types: RwLock<HashMap<String, RecordType>>,
    /// Next primary key per record type
    sequences: Mutex<HashMap<String, PrimaryKey>>,
    listeners: RwLock<ListenerMap>,
}

/// Storage statistics
#[derive(Debug, Clone, Default)]
pub struct StorageStats {
    pub record_types: usize,
    pub record_count: u64,
}

impl Storage {
    /// Open storage at the given path, creating if necessary
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        info!("Opening storage at {:?}", path);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_background_jobs(4);

        let cf_descriptors = build_cf_descriptors();
        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        let record_types = Self::load_record_types(&db)?;
        debug!(count = record_types.len(), "Loaded record types");

        Ok(Self {
            db,
            record_types: RwLock::new(record_types),
            sequences: Mutex::new(HashMap::new()),
            listeners: RwLock::new(HashMap::new()),
        })
    }

    fn load_record_types(db: &DB) -> Result<HashMap<String, RecordType>, StorageError> {
        let cf = db
            .cf_handle(CF_RECORD_TYPES)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(CF_RECORD_TYPES.to_string()))?;

        let mut types = HashMap::new();
        for item in db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item?;
            let record_type: RecordType = serde_json::from_slice(&value)?;
            types.insert(record_type.name.clone(), record_type);
        }
        Ok(types)
    }

    // ==================== Record Types ====================

    /// Register (or re-declare) a record type.
    pub fn register_type(&self, record_type: RecordType) -> Result<(), StorageError> {
        validate_type_name(&record_type.name)?;

        let cf = self
            .db
            .cf_handle(CF_RECORD_TYPES)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(CF_RECORD_TYPES.to_string()))?;
        let bytes = serde_json::to_vec(&record_type)?;
        self.db.put_cf(&cf, record_type.name.as_bytes(), bytes)?;

        debug!(record_type = %record_type.name, fields = record_type.fields.len(), "Registered record type");
        self.record_types
            .write()
            .map_err(|e| StorageError::Lock(e.to_string()))?
            .insert(record_type.name.clone(), record_type);
        Ok(())
    }

    /// Look up a registered record type.
    pub fn record_type(&self, name: &str) -> Option<RecordType> {
        self.record_types
            .read()
            .ok()
            .and_then(|types| types.get(name).cloned())
    }

    fn require_type(&self, name: &str) -> Result<RecordType, StorageError> {
        self.record_type(name)
            .ok_or_else(|| StorageError::UnknownRecordType(name.to_string()))
    }

    // ==================== Sequences ====================

    /// Read the persisted next primary key, or recover it from the highest
    /// stored key when the sequence entry is missing.
    fn load_sequence(&self, record_type: &str) -> Result<PrimaryKey, StorageError> {
        let seq_cf = self
            .db
            .cf_handle(CF_SEQUENCES)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(CF_SEQUENCES.to_string()))?;

        if let Some(bytes) = self.db.get_cf(&seq_cf, SequenceKey::new(record_type).to_bytes())? {
            let arr: [u8; 8] = bytes
                .as_slice()
                .try_into()
                .map_err(|_| StorageError::Key(format!("Corrupt sequence for {}", record_type)))?;
            return Ok(u64::from_be_bytes(arr));
        }

        let highest = self
            .scan_type(record_type)?
            .last()
            .map(|r| r.pk + 1)
            .unwrap_or(1);
        Ok(highest)
    }

    // ==================== Records ====================

    /// Insert a new record, assigning the next primary key of its type.
    pub fn create(
        &self,
        record_type: &str,
        values: BTreeMap<String, Value>,
    ) -> Result<Record, StorageError> {
        self.require_type(record_type)?;

        let pk = {
            let mut sequences = self
                .sequences
                .lock()
                .map_err(|e| StorageError::Lock(e.to_string()))?;
            let next = match sequences.get(record_type) {
                Some(next) => *next,
                None => self.load_sequence(record_type)?,
            };
            sequences.insert(record_type.to_string(), next + 1);
            next
        };

        let record = Record {
            record_type: record_type.to_string(),
            pk,
            values,
        };
        self.write_record(&record)?;
        debug!(record_type, pk, "Created record");

        self.dispatch(Signal::PostSave, &record, true)?;
        Ok(record)
    }

    /// Insert or update a record under its own primary key.
    pub fn save(&self, record: &Record) -> Result<(), StorageError> {
        self.require_type(&record.record_type)?;

        let created = self.get(&record.record_type, record.pk)?.is_none();

        {
            let mut sequences = self
                .sequences
                .lock()
                .map_err(|e| StorageError::Lock(e.to_string()))?;
            let next = match sequences.get(&record.record_type) {
                Some(next) => *next,
                None => self.load_sequence(&record.record_type)?,
            };
            sequences.insert(record.record_type.clone(), next.max(record.pk + 1));
        }

        self.write_record(record)?;
        debug!(record_type = %record.record_type, pk = record.pk, created, "Saved record");

        self.dispatch(Signal::PostSave, record, created)
    }

    /// Write a record and its type's sequence atomically.
    fn write_record(&self, record: &Record) -> Result<(), StorageError> {
        let records_cf = self
            .db
            .cf_handle(CF_RECORDS)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(CF_RECORDS.to_string()))?;
        let seq_cf = self
            .db
            .cf_handle(CF_SEQUENCES)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(CF_SEQUENCES.to_string()))?;

        let next = self
            .sequences
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))?
            .get(&record.record_type)
            .copied()
            .unwrap_or(record.pk + 1);

        let key = RecordKey::new(&record.record_type, record.pk);
        let bytes = serde_json::to_vec(record)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&records_cf, key.to_bytes(), bytes);
        batch.put_cf(
            &seq_cf,
            SequenceKey::new(&record.record_type).to_bytes(),
            next.to_be_bytes(),
        );
        self.db.write(batch)?;
        Ok(())
    }

    /// Delete a record. Pre-delete listeners run first; if one fails the
    /// record is left in place and the error is returned.
    ///
    /// Returns false when no such record exists.
    pub fn delete(&self, record_type: &str, pk: PrimaryKey) -> Result<bool, StorageError> {
        let Some(record) = self.get(record_type, pk)? else {
            debug!(record_type, pk, "Delete of missing record ignored");
            return Ok(false);
        };

        self.dispatch(Signal::PreDelete, &record, false)?;

        let cf = self
            .db
            .cf_handle(CF_RECORDS)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(CF_RECORDS.to_string()))?;
        self.db.delete_cf(&cf, RecordKey::new(record_type, pk).to_bytes())?;
        debug!(record_type, pk, "Deleted record");
        Ok(true)
    }

    /// Get a record by type and primary key
    pub fn get(&self, record_type: &str, pk: PrimaryKey) -> Result<Option<Record>, StorageError> {
        let cf = self
            .db
            .cf_handle(CF_RECORDS)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(CF_RECORDS.to_string()))?;

        match self.db.get_cf(&cf, RecordKey::new(record_type, pk).to_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Get several records by primary key.
    ///
    /// Missing keys are skipped; the result follows `pks` order.
    pub fn get_many(
        &self,
        record_type: &str,
        pks: &[PrimaryKey],
    ) -> Result<Vec<Record>, StorageError> {
        let mut records = Vec::with_capacity(pks.len());
        for pk in pks {
            if let Some(record) = self.get(record_type, *pk)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// All records of a type, in primary-key order.
    pub fn all(&self, record_type: &str) -> Result<Vec<Record>, StorageError> {
        self.require_type(record_type)?;
        self.scan_type(record_type)
    }

    /// Number of stored records of a type.
    pub fn count(&self, record_type: &str) -> Result<usize, StorageError> {
        Ok(self.all(record_type)?.len())
    }

    fn scan_type(&self, record_type: &str) -> Result<Vec<Record>, StorageError> {
        let cf = self
            .db
            .cf_handle(CF_RECORDS)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(CF_RECORDS.to_string()))?;

        let prefix = RecordKey::type_prefix(record_type);
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&prefix, Direction::Forward));

        let mut records = Vec::new();
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            records.push(serde_json::from_slice(&value)?);
        }
        Ok(records)
    }

    /// Evaluate a relational query: scan, filter, then order.
    pub fn query(&self, query: &RecordQuery) -> Result<Vec<Record>, StorageError> {
        let mut matched = Vec::new();
        for record in self.all(&query.record_type)? {
            if query.matches(&record, self)? {
                matched.push(record);
            }
        }
        query.sort(&mut matched);
        Ok(matched)
    }

    // ==================== Listeners ====================

    /// Connect a listener to a signal of a record type.
    ///
    /// Returns false (and leaves the existing listener in place) when
    /// `dispatch_uid` is already connected for that signal and type.
    pub fn connect(
        &self,
        signal: Signal,
        record_type: &str,
        dispatch_uid: &str,
        listener: Arc<dyn RecordListener>,
    ) -> Result<bool, StorageError> {
        let mut listeners = self
            .listeners
            .write()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        let receivers = listeners
            .entry((signal, record_type.to_string()))
            .or_default();

        if receivers.iter().any(|(uid, _)| uid == dispatch_uid) {
            debug!(?signal, record_type, dispatch_uid, "Listener already connected");
            return Ok(false);
        }
        receivers.push((dispatch_uid.to_string(), listener));
        debug!(?signal, record_type, dispatch_uid, "Connected listener");
        Ok(true)
    }

    /// Disconnect a listener. Returns true if one was removed.
    pub fn disconnect(
        &self,
        signal: Signal,
        record_type: &str,
        dispatch_uid: &str,
    ) -> Result<bool, StorageError> {
        let mut listeners = self
            .listeners
            .write()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        let Some(receivers) = listeners.get_mut(&(signal, record_type.to_string())) else {
            return Ok(false);
        };
        let before = receivers.len();
        receivers.retain(|(uid, _)| uid != dispatch_uid);
        Ok(receivers.len() != before)
    }

    /// Number of listeners connected under `dispatch_uid`.
    pub fn listener_count(&self, signal: Signal, record_type: &str, dispatch_uid: &str) -> usize {
        self.listeners
            .read()
            .ok()
            .and_then(|listeners| {
                listeners
                    .get(&(signal, record_type.to_string()))
                    .map(|r| r.iter().filter(|(uid, _)| uid == dispatch_uid).count())
            })
            .unwrap_or(0)
    }

    fn dispatch(&self, signal: Signal, record: &Record, created: bool) -> Result<(), StorageError> {
        // Snapshot so listeners may call back into the store.
        let receivers: Vec<Arc<dyn RecordListener>> = self
            .listeners
            .read()
            .map_err(|e| StorageError::Lock(e.to_string()))?
            .get(&(signal, record.record_type.clone()))
            .map(|r| r.iter().map(|(_, l)| l.clone()).collect())
            .unwrap_or_default();

        let event = RecordEvent {
            signal,
            record,
            created,
        };
        for listener in receivers {
            listener.notify(&event).map_err(StorageError::Listener)?;
        }
        Ok(())
    }

    // ==================== Maintenance ====================

    /// Flush all column families to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        for cf_name in ALL_CF_NAMES {
            if let Some(cf) = self.db.cf_handle(cf_name) {
                self.db.flush_cf(&cf)?;
            }
        }
        Ok(())
    }

    /// Get storage statistics
    pub fn get_stats(&self) -> Result<StorageStats, StorageError> {
        let names: Vec<String> = self
            .record_types
            .read()
            .map_err(|e| StorageError::Lock(e.to_string()))?
            .keys()
            .cloned()
            .collect();

        let mut stats = StorageStats {
            record_types: names.len(),
            record_count: 0,
        };
        for name in names {
            stats.record_count += self.scan_type(&name)?.len() as u64;
        }
        Ok(stats)
    }
}

impl RecordResolver for Storage {
    fn record_type(&self, name: &str) -> Option<RecordType> {
        Storage::record_type(self, name)
    }

    fn resolve(&self, record_type: &str, pk: PrimaryKey) -> Result<Option<Record>, StorageError> {
        self.get(record_type, pk)
    }
}
