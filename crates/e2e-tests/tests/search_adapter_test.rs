//! Search adapter E2E tests for docsync.
//!
//! Validates that relational queries translated onto the index return the
//! same records the record store itself returns, and that ordering and
//! record materialization line up.

use std::collections::BTreeSet;

use pretty_assertions::assert_eq;

use docsync_query::{filter_search, record_query_to_search, QueryError, SearchQuery};
use docsync_storage::RecordQuery;
use docsync_types::PrimaryKey;
use e2e_tests::{foo_document, foo_with_meta, TestHarness};

fn pks_from_search(query: &SearchQuery) -> Vec<PrimaryKey> {
    query
        .into_iter()
        .map(|item| {
            item.expect("Search failed")
                .pk()
                .parse()
                .expect("Non-numeric pk")
        })
        .collect()
}

/// Run `query` against both the store and the index and compare pk sets.
fn assert_search_has_same_result(harness: &TestHarness, query: &RecordQuery) -> SearchQuery {
    let base = harness.binder.search_query(&query.record_type).unwrap();
    let search = record_query_to_search(query, &base).expect("Translation failed");

    let expected: BTreeSet<PrimaryKey> = harness
        .storage
        .query(query)
        .unwrap()
        .iter()
        .map(|r| r.pk)
        .collect();
    let actual: BTreeSet<PrimaryKey> = pks_from_search(&search).into_iter().collect();
    assert_eq!(actual, expected);
    search
}

fn foo_harness() -> TestHarness {
    let harness = TestHarness::new();
    harness.binder.attach("foo", foo_document(), None).unwrap();
    harness
}

fn meta_harness() -> TestHarness {
    let harness = TestHarness::new();
    harness
        .binder
        .attach_meta("foo_with_meta", foo_with_meta(harness.storage.clone()), None)
        .unwrap();
    harness
}

#[test]
fn test_single_filter() {
    let harness = foo_harness();
    harness.create_foo("foo", "David", None, &[]);
    harness.create_foo("foo", "Bill", None, &[]);

    let search =
        assert_search_has_same_result(&harness, &RecordQuery::new("foo").filter("name", "David"));
    assert_eq!(search.count().unwrap(), 1);
}

#[test]
fn test_or() {
    let harness = foo_harness();
    for name in ["Tom", "John", "Joan"] {
        harness.create_foo("foo", name, None, &[]);
    }

    let query = RecordQuery::new("foo")
        .filter("name", "Tom")
        .or(RecordQuery::new("foo").filter("name", "Joan"));
    let search = assert_search_has_same_result(&harness, &query);
    assert_eq!(search.count().unwrap(), 2);
}

#[test]
fn test_contains_and_pk_filters() {
    let harness = foo_harness();
    let carla = harness.create_foo("foo", "Carla", None, &[]);
    harness.create_foo("foo", "Angus", None, &[]);
    harness.create_foo("foo", "Barbara", None, &[]);

    let search = assert_search_has_same_result(
        &harness,
        &RecordQuery::new("foo").filter("name__contains", "ar"),
    );
    assert_eq!(search.count().unwrap(), 2);

    assert_search_has_same_result(&harness, &RecordQuery::new("foo").filter("pk", carla.pk as i64));
}

#[test]
fn test_range_lookup_is_rejected() {
    let harness = foo_harness();
    let base = harness.binder.search_query("foo").unwrap();
    let err = record_query_to_search(&RecordQuery::new("foo").filter("name__gt", "B"), &base)
        .expect_err("Range lookups have no search equivalent");
    assert!(matches!(err, QueryError::Translation(_)), "Unexpected error: {err}");
}

#[test]
fn test_order() {
    let harness = meta_harness();
    for name in ["Carla", "Angus", "Barbara"] {
        harness.create_foo("foo_with_meta", name, None, &[]);
    }

    let query = RecordQuery::new("foo_with_meta").order_by(&["-name"]);
    let expected = harness.storage.query(&query).unwrap();

    let base = harness.binder.search_query("foo_with_meta").unwrap();
    let search = base.order_by("-name").unwrap();
    let records = search.as_model_objects().records().unwrap();

    let names: Vec<_> = records
        .iter()
        .map(|r| r.get_text("name").unwrap_or_default().to_string())
        .collect();
    assert_eq!(names, vec!["Carla", "Barbara", "Angus"]);
    assert_eq!(
        records.iter().map(|r| r.pk).collect::<Vec<_>>(),
        expected.iter().map(|r| r.pk).collect::<Vec<_>>()
    );

    let translated = record_query_to_search(&query, &base).unwrap();
    assert_eq!(
        pks_from_search(&translated.as_model_objects()),
        expected.iter().map(|r| r.pk).collect::<Vec<_>>()
    );
}

#[test]
fn test_search_box_input() {
    let harness = meta_harness();
    harness.create_foo("foo_with_meta", "Donald Duck", None, &[]);
    harness.create_foo("foo_with_meta", "Duck", None, &[]);

    let base = harness.binder.search_query("foo_with_meta").unwrap();
    assert_eq!(filter_search(&base, "don!").unwrap().count().unwrap(), 1);
    assert_eq!(filter_search(&base, "\"donald duck\"").unwrap().count().unwrap(), 1);
    assert_eq!(filter_search(&base, "duck OR").unwrap().count().unwrap(), 2);
    assert_eq!(filter_search(&base, "   ").unwrap().count().unwrap(), 2);
}

#[test]
fn test_slicing_and_missing_records() {
    let harness = meta_harness();
    let names = ["Carla", "Angus", "Barbara"];
    let records: Vec<_> = names
        .iter()
        .map(|n| harness.create_foo("foo_with_meta", n, None, &[]))
        .collect();

    let base = harness
        .binder
        .search_query("foo_with_meta")
        .unwrap()
        .order_by("name")
        .unwrap();
    let window = base.slice(1, Some(3));
    assert_eq!(window.count().unwrap(), 2);
    let first = window.first().unwrap().expect("Expected an item");
    assert_eq!(first.pk(), records[2].pk_text());

    {
        let _guard = harness.binder.suspend();
        harness.storage.delete("foo_with_meta", records[0].pk).unwrap();
    }
    let found = base.as_model_objects().records().unwrap();
    assert_eq!(
        found.iter().map(|r| r.pk).collect::<Vec<_>>(),
        vec![records[1].pk, records[2].pk]
    );
}
