//! End-to-end test infrastructure for docsync.
//!
//! Provides a shared TestHarness and the record types used across the
//! E2E tests, which cover the full save-to-search path.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use docsync_indexing::Binder;
use docsync_search::{
    contains, startswith, CorpusSpec, DocumentSchema, Field, FieldSpec, IndexServiceConfig,
    SearchMeta, TantivyIndexService,
};
use docsync_storage::Storage;
use docsync_types::{Record, RecordType, Value};

/// Shared test harness for E2E tests.
///
/// Provides storage, an index service and a binder wired to both.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Shared storage instance
    pub storage: Arc<Storage>,
    /// Index service rooted under the temp dir
    pub service: Arc<TantivyIndexService>,
    /// Binder connecting the two
    pub binder: Binder,
    /// Root of all index directories
    pub index_root: PathBuf,
}

impl TestHarness {
    /// Create a new harness with `related`, `foo` and `foo_with_meta`
    /// record types declared.
    pub fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let storage = Arc::new(
            Storage::open(&temp_dir.path().join("db")).expect("Failed to open test storage"),
        );

        let index_root = temp_dir.path().join("index");
        std::fs::create_dir_all(&index_root).expect("Failed to create index dir");
        let service = Arc::new(TantivyIndexService::new(IndexServiceConfig::new(&index_root)));
        let binder = Binder::new(storage.clone(), service.clone());

        storage
            .register_type(RecordType::new("related").text("name"))
            .expect("Failed to register related");
        for name in ["foo", "foo_with_meta"] {
            storage
                .register_type(foo_type(name))
                .expect("Failed to register foo type");
        }

        Self {
            _temp_dir: temp_dir,
            storage,
            service,
            binder,
            index_root,
        }
    }

    /// Insert a record built from `(name, value)` pairs.
    pub fn create(&self, record_type: &str, values: &[(&str, Value)]) -> Record {
        let values: BTreeMap<String, Value> = values
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        self.storage
            .create(record_type, values)
            .expect("Failed to create record")
    }

    /// Insert a `related` record.
    pub fn create_related(&self, name: &str) -> Record {
        self.create("related", &[("name", name.into())])
    }

    /// Insert a `foo`-shaped record of `record_type`.
    pub fn create_foo(
        &self,
        record_type: &str,
        name: &str,
        relation: Option<&Record>,
        tags: &[&str],
    ) -> Record {
        let mut values = vec![
            ("name", Value::from(name)),
            ("is_good", Value::Bool(false)),
            ("tags", Value::from(tags.to_vec())),
        ];
        if let Some(related) = relation {
            values.push(("relation", Value::from(related.pk)));
        }
        self.create(record_type, &values)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

fn foo_type(name: &str) -> RecordType {
    RecordType::new(name)
        .text("name")
        .boolean("is_good")
        .list("tags")
        .reference("relation", "related")
}

/// Hand-written schema for `foo`: name, relation id, flag and
/// `|`-joined tags.
pub fn foo_document() -> DocumentSchema {
    DocumentSchema::builder("FooDocument")
        .field("name", Field::text())
        .field("relation", Field::text())
        .field("is_good", Field::boolean())
        .field("tags", Field::text())
        .build_with(|record, doc| {
            doc.set_optional("name", record.get("name").cloned())?;
            let relation = record
                .get("relation")
                .map(|v| v.to_text())
                .unwrap_or_else(|| "None".to_string());
            doc.set("relation", relation)?;
            doc.set_optional("is_good", record.get("is_good").cloned())?;
            let tags = match record.get("tags") {
                Some(Value::List(tags)) => tags.join("|"),
                _ => String::new(),
            };
            doc.set("tags", tags)?;
            Ok(())
        })
        .expect("Failed to build FooDocument schema")
}

/// Meta declaration for `foo_with_meta`. The relation maps to the
/// related record's name, looked up in `storage`.
pub fn foo_with_meta(storage: Arc<Storage>) -> SearchMeta {
    let related_name = move |record: &Record| -> Option<Value> {
        let pk = record.get("relation")?.as_i64()?;
        let related = storage.get("related", pk as u64).ok()??;
        related.get("name").cloned()
    };

    SearchMeta::new()
        .field(FieldSpec::new("name").typed(Field::text()))
        .field(
            FieldSpec::new("name_lower")
                .typed(Field::text())
                .mapped(|r| r.get_text("name").map(|n| Value::from(n.to_lowercase()))),
        )
        .field(FieldSpec::new("is_good"))
        .field(FieldSpec::new("tags").mapped(|r| match r.get("tags") {
            Some(Value::List(tags)) => Some(Value::from(tags.join("|"))),
            _ => None,
        }))
        .field(
            FieldSpec::new("relation")
                .typed(Field::text())
                .mapped(related_name),
        )
        .corpus(CorpusSpec::field("name", startswith))
        .corpus(CorpusSpec::field("relation", contains))
}
