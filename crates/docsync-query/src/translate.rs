//! Relational query → search query translation.
//!
//! A [`RecordQuery`] filter tree maps term-for-term onto search predicates.
//! Anything without a faithful search equivalent (range comparisons, joins,
//! negation, multi-key ordering) fails with [`QueryError::Translation`]
//! instead of being dropped, since dropping a condition would widen the
//! result set.

use docsync_search::FieldValue;
use docsync_storage::{Condition, Lookup, LookupOp, LookupValue, RecordQuery};
use crate::error::QueryError;
use crate::predicate::Predicate;
use crate::search_query::SearchQuery;

/// Apply a relational query's conditions and ordering to `base`.
pub fn record_query_to_search(
    query: &RecordQuery,
    base: &SearchQuery,
) -> Result<SearchQuery, QueryError> {
    if query.record_type != base.record_type() {
        return Err(QueryError::Incompatible(format!(
            "{} query cannot run against the {} search",
            query.record_type,
            base.record_type()
        )));
    }

    let mut translated = match &query.condition {
        Some(condition) => base.where_predicate(condition_to_predicate(condition, base)?),
        None => base.clone(),
    };

    match query.ordering.as_slice() {
        [] => {}
        [key] => {
            let name = if key.descending {
                format!("-{}", key.field)
            } else {
                key.field.clone()
            };
            translated = translated.order_by(&name)?;
        }
        keys => {
            return Err(QueryError::Translation(format!(
                "search results order by a single key, got {}",
                keys.len()
            )))
        }
    }

    Ok(translated)
}

fn condition_to_predicate(
    condition: &Condition,
    base: &SearchQuery,
) -> Result<Predicate, QueryError> {
    match condition {
        Condition::Lookup(lookup) => lookup_to_predicate(lookup, base),
        Condition::And(children) => Ok(Predicate::And(
            children
                .iter()
                .map(|c| condition_to_predicate(c, base))
                .collect::<Result<_, _>>()?,
        )),
        Condition::Or(children) => Ok(Predicate::Or(
            children
                .iter()
                .map(|c| condition_to_predicate(c, base))
                .collect::<Result<_, _>>()?,
        )),
        Condition::Not(_) => Err(QueryError::Translation(
            "negated conditions are not supported by search".into(),
        )),
    }
}

fn lookup_to_predicate(lookup: &Lookup, base: &SearchQuery) -> Result<Predicate, QueryError> {
    if lookup.is_join() {
        return Err(QueryError::Translation(format!(
            "lookup {:?} crosses a reference and has no search equivalent",
            lookup.key()
        )));
    }

    match (lookup.op, &lookup.value) {
        (LookupOp::Exact, value) => base.term(&lookup.field, &scalar(lookup, value)?),
        (LookupOp::Contains, value) => base.term(
            &format!("{}__contains", lookup.field),
            &scalar(lookup, value)?,
        ),
        (LookupOp::In, LookupValue::Many(values)) => Ok(Predicate::Or(
            values
                .iter()
                .map(|v| base.term(&lookup.field, &FieldValue::Native(v.clone())))
                .collect::<Result<_, _>>()?,
        )),
        (LookupOp::In, _) => Err(QueryError::Translation(format!(
            "lookup {:?} expects a list of values",
            lookup.key()
        ))),
        (op, _) => Err(QueryError::Translation(format!(
            "lookup {:?} uses {:?}, which search cannot express",
            lookup.key(),
            op
        ))),
    }
}

/// The single value a lookup compares against; records stand for their
/// primary key.
fn scalar(lookup: &Lookup, value: &LookupValue) -> Result<FieldValue, QueryError> {
    value
        .resolved()
        .map(FieldValue::Native)
        .ok_or_else(|| {
            QueryError::Translation(format!(
                "lookup {:?} expects a single value",
                lookup.key()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use docsync_search::{
        indexer, words, DocumentSchema, Field, IndexServiceConfig, TantivyIndexService,
    };
    use docsync_types::{Record, Value};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn base(temp_dir: &TempDir) -> SearchQuery {
        let schema = DocumentSchema::builder("BookDocument")
            .field("title", Field::text())
            .field("author", Field::text())
            .field("blurb", Field::text().with_indexer(indexer(words)))
            .build_with(|_, _| Ok(()))
            .unwrap();
        let service = Arc::new(TantivyIndexService::new(IndexServiceConfig::new(
            temp_dir.path(),
        )));
        SearchQuery::new(service, "book", "book", schema)
    }

    fn eq(field: &str, value: &str) -> Predicate {
        Predicate::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    #[test]
    fn test_exact_and_or() {
        let temp_dir = TempDir::new().unwrap();
        let base = base(&temp_dir);
        let query = RecordQuery::new("book")
            .filter("title", "Dune")
            .or(RecordQuery::new("book").filter("title__exact", "Emma"));

        let translated = record_query_to_search(&query, &base).unwrap();
        assert_eq!(
            translated.predicate().unwrap(),
            &Predicate::Or(vec![eq("title", "Dune"), eq("title", "Emma")])
        );
    }

    #[test]
    fn test_contains_and_in() {
        let temp_dir = TempDir::new().unwrap();
        let base = base(&temp_dir);
        let query = RecordQuery::new("book")
            .filter("blurb__contains", "sand")
            .filter(
                "author__in",
                vec![Value::from("Herbert"), Value::from("Austen")],
            );

        let translated = record_query_to_search(&query, &base).unwrap();
        assert_eq!(
            translated.predicate().unwrap(),
            &Predicate::And(vec![
                Predicate::Contains {
                    field: "blurb".into(),
                    value: "sand".into()
                },
                Predicate::Or(vec![eq("author", "Herbert"), eq("author", "Austen")]),
            ])
        );
    }

    #[test]
    fn test_record_values_resolve_to_pk() {
        let temp_dir = TempDir::new().unwrap();
        let base = base(&temp_dir);
        let author = Record::new("author", 7);
        let query = RecordQuery::new("book").filter("author", &author);

        let translated = record_query_to_search(&query, &base).unwrap();
        assert_eq!(translated.predicate().unwrap(), &eq("author", "7"));
    }

    #[test]
    fn test_pk_lookup_and_ordering() {
        let temp_dir = TempDir::new().unwrap();
        let base = base(&temp_dir);
        let query = RecordQuery::new("book").filter("pk", 3i64).order_by(&["-title"]);

        let translated = record_query_to_search(&query, &base).unwrap();
        assert_eq!(translated.predicate().unwrap(), &eq("doc_id", "3"));
        let sort = translated.sort().unwrap();
        assert_eq!(sort.field, "title");
        assert!(sort.descending);
    }

    #[test]
    fn test_unsupported_constructs_fail() {
        let temp_dir = TempDir::new().unwrap();
        let base = base(&temp_dir);

        let cases = vec![
            RecordQuery::new("book").filter("title__gte", "A"),
            RecordQuery::new("book").filter("author__name", "Herbert"),
            RecordQuery::new("book").exclude("title", "Dune"),
            RecordQuery::new("book").order_by(&["title", "author"]),
            RecordQuery::new("book").order_by(&["blurb"]),
        ];
        for query in cases {
            assert!(
                matches!(
                    record_query_to_search(&query, &base),
                    Err(QueryError::Translation(_))
                ),
                "{:?}",
                query
            );
        }
    }

    #[test]
    fn test_other_record_type_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let base = base(&temp_dir);
        assert!(matches!(
            record_query_to_search(&RecordQuery::new("author"), &base),
            Err(QueryError::Incompatible(_))
        ));
    }

    #[test]
    fn test_unconditioned_query_keeps_base() {
        let temp_dir = TempDir::new().unwrap();
        let base = base(&temp_dir).filter("title", "Dune").unwrap();
        let translated = record_query_to_search(&RecordQuery::new("book"), &base).unwrap();
        assert_eq!(translated.predicate(), base.predicate());
    }
}
