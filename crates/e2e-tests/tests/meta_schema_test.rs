//! Meta schema E2E tests for docsync.
//!
//! Validates schemas derived from a record type plus a declarative meta
//! block: field type resolution, mapped values and the corpus union.

use std::collections::HashSet;

use pretty_assertions::assert_eq;

use docsync_search::{contains, startswith, FieldKind, CORPUS_FIELD};
use docsync_storage::Signal;
use docsync_types::Value;
use e2e_tests::{foo_with_meta, TestHarness};

#[test]
fn test_meta_attach_side_effects() {
    let harness = TestHarness::new();
    let binding = harness
        .binder
        .attach_meta("foo_with_meta", foo_with_meta(harness.storage.clone()), None)
        .expect("Failed to attach meta schema");

    assert_eq!(binding.id(), "foo_with_meta:FooWithMetaDocument:foo_with_meta");
    assert_eq!(
        harness
            .storage
            .listener_count(Signal::PostSave, "foo_with_meta", binding.id()),
        1
    );
    assert_eq!(
        harness
            .storage
            .listener_count(Signal::PreDelete, "foo_with_meta", binding.id()),
        1
    );
    assert!(harness.binder.search_query("foo_with_meta").is_ok());
}

#[test]
fn test_field_types() {
    let harness = TestHarness::new();
    let binding = harness
        .binder
        .attach_meta("foo_with_meta", foo_with_meta(harness.storage.clone()), None)
        .unwrap();
    let schema = binding.schema();

    assert!(schema.is_meta());
    assert!(matches!(
        schema.field("name").map(|f| f.kind()),
        Some(FieldKind::Text { .. })
    ));
    assert!(matches!(
        schema.field("is_good").map(|f| f.kind()),
        Some(FieldKind::Boolean)
    ));
    assert!(schema.field(CORPUS_FIELD).is_some());
}

#[test]
fn test_build_document() {
    let harness = TestHarness::new();
    let binding = harness
        .binder
        .attach_meta("foo_with_meta", foo_with_meta(harness.storage.clone()), None)
        .unwrap();

    let related = harness.create_related("Boôk");
    let thing = harness.create_foo("foo_with_meta", "Big Box", Some(&related), &["various", "things"]);

    let doc = binding.schema().build(&thing).expect("Failed to build document");
    assert_eq!(doc.doc_id(), thing.pk_text());
    assert_eq!(doc.get_text("name").as_deref(), Some("Big Box"));
    assert_eq!(doc.get_text("name_lower").as_deref(), Some("big box"));
    assert_eq!(doc.get("is_good").unwrap(), Some(Value::Bool(false)));
    assert_eq!(
        doc.get_text("tags").unwrap().split('|').collect::<Vec<_>>(),
        vec!["various", "things"]
    );
    assert_eq!(doc.get_text("relation").as_deref(), Some("Boôk"));

    let mut expected: HashSet<String> = startswith("Big Box").into_iter().collect();
    expected.extend(contains("Boôk"));
    let corpus = doc.corpus().expect("Expected a corpus");
    let actual: HashSet<String> = corpus.split(' ').map(str::to_string).collect();
    assert_eq!(actual, expected);
    assert!(corpus.contains("Big"));
    assert!(corpus.contains("Boôk"));
}

/// Corpus matching: `__contains` matches any token, exact needs every word.
#[test]
fn test_corpus_search() {
    let harness = TestHarness::new();
    harness
        .binder
        .attach_meta("foo_with_meta", foo_with_meta(harness.storage.clone()), None)
        .unwrap();
    harness.create_foo("foo_with_meta", "Donald Duck", None, &[]);
    harness.create_foo("foo_with_meta", "Duck", None, &[]);

    let base = harness.binder.search_query("foo_with_meta").unwrap();
    let by_prefix = base.filter("corpus__contains", "don").unwrap();
    assert_eq!(by_prefix.count().unwrap(), 1);

    let exact = base.filter("corpus", "donald duck").unwrap();
    assert_eq!(exact.count().unwrap(), 1);

    let duck = base.filter("corpus__contains", "duck").unwrap();
    assert_eq!(duck.count().unwrap(), 2);
}
