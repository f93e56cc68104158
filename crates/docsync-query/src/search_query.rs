//! Immutable search queries bound to one document schema and index.
//!
//! Every builder call returns a new [`SearchQuery`]; nothing touches the
//! index until [`count`](SearchQuery::count), [`fetch`](SearchQuery::fetch)
//! or one of their variants runs. Results come back either as documents or,
//! after [`as_model_objects`](SearchQuery::as_model_objects), as the stored
//! records they were built from, in search order.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use docsync_search::{
    Document, DocumentSchema, FieldValue, IndexKind, IndexQuery, IndexService, IndexSort,
    DOC_ID_FIELD,
};
use docsync_storage::Storage;
use docsync_types::{PrimaryKey, Record};
use tracing::{debug, warn};

use crate::error::QueryError;
use crate::predicate::Predicate;

/// What a query yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultMode {
    Documents,
    Records,
}

/// One search result.
#[derive(Debug, Clone)]
pub enum SearchItem {
    Document(Document),
    Record(Record),
}

impl SearchItem {
    /// Primary key of the source record, as text.
    pub fn pk(&self) -> String {
        match self {
            SearchItem::Document(doc) => doc.pk().to_string(),
            SearchItem::Record(record) => record.pk_text(),
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            SearchItem::Document(doc) => Some(doc),
            SearchItem::Record(_) => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            SearchItem::Record(record) => Some(record),
            SearchItem::Document(_) => None,
        }
    }
}

/// Field names accepted as aliases for the document id.
pub(crate) fn is_pk_alias(name: &str) -> bool {
    matches!(name, "pk" | "id" | DOC_ID_FIELD)
}

fn literal_text(value: &FieldValue) -> String {
    match value {
        FieldValue::Native(v) => v.to_text(),
        FieldValue::Indexed(v) => v.as_str().to_string(),
    }
}

/// A lazily evaluated query over one index.
#[derive(Clone)]
pub struct SearchQuery {
    service: Arc<dyn IndexService>,
    storage: Option<Arc<Storage>>,
    record_type: String,
    index_name: String,
    schema: DocumentSchema,
    predicate: Option<Predicate>,
    sort: Option<IndexSort>,
    offset: usize,
    limit: Option<usize>,
    mode: ResultMode,
    is_none: bool,
}

impl fmt::Debug for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchQuery")
            .field("record_type", &self.record_type)
            .field("index_name", &self.index_name)
            .field("schema", &self.schema.name())
            .field("predicate", &self.predicate)
            .field("sort", &self.sort)
            .field("offset", &self.offset)
            .field("limit", &self.limit)
            .field("mode", &self.mode)
            .field("is_none", &self.is_none)
            .finish()
    }
}

impl SearchQuery {
    /// A query matching every document in `index_name`.
    pub fn new(
        service: Arc<dyn IndexService>,
        record_type: impl Into<String>,
        index_name: impl Into<String>,
        schema: DocumentSchema,
    ) -> Self {
        Self {
            service,
            storage: None,
            record_type: record_type.into(),
            index_name: index_name.into(),
            schema,
            predicate: None,
            sort: None,
            offset: 0,
            limit: None,
            mode: ResultMode::Documents,
            is_none: false,
        }
    }

    /// Attach the record store used by [`as_model_objects`](Self::as_model_objects).
    pub fn with_storage(mut self, storage: Arc<Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn schema(&self) -> &DocumentSchema {
        &self.schema
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    pub fn sort(&self) -> Option<&IndexSort> {
        self.sort.as_ref()
    }

    pub fn mode(&self) -> ResultMode {
        self.mode
    }

    pub fn is_none(&self) -> bool {
        self.is_none
    }

    fn and(&self, predicate: Predicate) -> Self {
        let mut next = self.clone();
        next.predicate = Some(match next.predicate.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        next
    }

    /// Build the predicate for one `field[__contains|__exact]=value` term.
    pub(crate) fn term(&self, key: &str, value: &FieldValue) -> Result<Predicate, QueryError> {
        let (name, contains) = match key.split_once("__") {
            None => (key, false),
            Some((name, "exact")) => (name, false),
            Some((name, "contains")) => (name, true),
            Some((_, rest)) => {
                return Err(QueryError::Translation(format!(
                    "lookup {:?} has no search equivalent (unsupported {:?})",
                    key, rest
                )))
            }
        };

        if is_pk_alias(name) {
            if contains {
                return Err(QueryError::Translation(
                    "primary key lookups only support equality".into(),
                ));
            }
            return Ok(Predicate::Equals {
                field: DOC_ID_FIELD.to_string(),
                value: literal_text(value),
            });
        }

        let field = self.schema.field(name).ok_or_else(|| QueryError::UnknownField {
            schema: self.schema.name().to_string(),
            field: name.to_string(),
        })?;
        let literal = field.to_filter(Some(value))?;

        Ok(if contains {
            Predicate::Contains {
                field: name.to_string(),
                value: literal,
            }
        } else {
            Predicate::Equals {
                field: name.to_string(),
                value: literal,
            }
        })
    }

    /// AND a `field=value` or `field__contains=value` term onto the query.
    pub fn filter(&self, key: &str, value: impl Into<FieldValue>) -> Result<Self, QueryError> {
        let predicate = self.term(key, &value.into())?;
        Ok(self.and(predicate))
    }

    /// AND an arbitrary predicate onto the query.
    pub fn where_predicate(&self, predicate: Predicate) -> Self {
        self.and(predicate)
    }

    /// AND free text matched against every text value of the document.
    pub fn keywords(&self, text: &str) -> Self {
        self.and(Predicate::FreeText(text.to_string()))
    }

    /// Order by one field; a leading `-` sorts descending. Replaces any
    /// previous ordering.
    pub fn order_by(&self, name: &str) -> Result<Self, QueryError> {
        let (field, descending) = match name.strip_prefix('-') {
            Some(field) => (field, true),
            None => (name, false),
        };

        let sort_field = if is_pk_alias(field) {
            DOC_ID_FIELD.to_string()
        } else {
            let declared = self.schema.field(field).ok_or_else(|| QueryError::UnknownField {
                schema: self.schema.name().to_string(),
                field: field.to_string(),
            })?;
            if declared.index_kind() == IndexKind::TokenText {
                return Err(QueryError::Translation(format!(
                    "cannot order by indexed text field {}",
                    field
                )));
            }
            field.to_string()
        };

        let mut next = self.clone();
        next.sort = Some(IndexSort {
            field: sort_field,
            descending,
        });
        Ok(next)
    }

    /// Union with another query over the same schema and index. A side
    /// without a predicate matches everything, so the union does too.
    /// Sliced queries cannot be combined.
    pub fn or(&self, other: &SearchQuery) -> Result<Self, QueryError> {
        if !self.schema.same_as(&other.schema) || self.index_name != other.index_name {
            return Err(QueryError::Incompatible(format!(
                "{} on {} cannot be combined with {} on {}",
                self.schema.name(),
                self.index_name,
                other.schema.name(),
                other.index_name
            )));
        }
        if self.is_sliced() || other.is_sliced() {
            return Err(QueryError::Incompatible(
                "cannot combine a sliced query".to_string(),
            ));
        }
        if other.is_none {
            return Ok(self.clone());
        }
        if self.is_none {
            let mut next = other.clone();
            next.sort = self.sort.clone();
            return Ok(next);
        }

        let mut next = self.clone();
        next.predicate = match (self.predicate.clone(), other.predicate.clone()) {
            (Some(a), Some(b)) => Some(a.or(b)),
            _ => None,
        };
        Ok(next)
    }

    fn is_sliced(&self) -> bool {
        self.offset != 0 || self.limit.is_some()
    }

    /// Restrict to results `start..end` of the current window.
    pub fn slice(&self, start: usize, end: Option<usize>) -> Self {
        let mut next = self.clone();
        next.offset = self.offset + start;

        let requested = end.map(|e| e.saturating_sub(start));
        next.limit = match (self.limit, requested) {
            (Some(current), Some(r)) => Some(current.saturating_sub(start).min(r)),
            (Some(current), None) => Some(current.saturating_sub(start)),
            (None, r) => r,
        };
        next
    }

    /// A query that matches nothing and never touches the index.
    pub fn none(&self) -> Self {
        let mut next = self.clone();
        next.is_none = true;
        next
    }

    /// Yield stored records instead of documents.
    pub fn as_model_objects(&self) -> Self {
        let mut next = self.clone();
        next.mode = ResultMode::Records;
        next
    }

    /// The index query this search compiles to.
    pub fn compile(&self) -> IndexQuery {
        IndexQuery {
            filter: self
                .predicate
                .as_ref()
                .map(Predicate::to_filter)
                .unwrap_or(docsync_search::IndexFilter::All),
            sort: self.sort.clone(),
            offset: self.offset,
            limit: self.limit,
        }
    }

    /// Number of results this query yields, honouring any slice.
    pub fn count(&self) -> Result<usize, QueryError> {
        if self.is_none {
            return Ok(0);
        }
        let total = self.service.count(&self.index_name, &self.compile())?;
        let remaining = total.saturating_sub(self.offset);
        Ok(match self.limit {
            Some(limit) => remaining.min(limit),
            None => remaining,
        })
    }

    /// Matching documents in search order.
    pub fn documents(&self) -> Result<Vec<Document>, QueryError> {
        if self.is_none {
            return Ok(Vec::new());
        }
        let query = self.compile();
        let hits = self.service.search(&self.index_name, &query)?;
        debug!(index = %self.index_name, hits = hits.len(), "Search executed");

        hits.into_iter()
            .map(|hit| self.schema.from_hit(hit).map_err(QueryError::from))
            .collect()
    }

    /// The stored records behind the matching documents, in search order.
    /// Documents whose record no longer exists are skipped with a warning.
    pub fn records(&self) -> Result<Vec<Record>, QueryError> {
        let storage = self
            .storage
            .as_ref()
            .ok_or_else(|| QueryError::NoRecordStore(self.record_type.clone()))?;

        let mut pks: Vec<PrimaryKey> = Vec::new();
        for doc in self.documents()? {
            match doc.pk().parse::<PrimaryKey>() {
                Ok(pk) => pks.push(pk),
                Err(_) => warn!(
                    record_type = %self.record_type,
                    doc_id = %doc.pk(),
                    "Search returned a document id that is not a primary key"
                ),
            }
        }

        let mut by_pk: HashMap<PrimaryKey, Record> = storage
            .get_many(&self.record_type, &pks)?
            .into_iter()
            .map(|record| (record.pk, record))
            .collect();

        let mut records = Vec::with_capacity(pks.len());
        for pk in pks {
            match by_pk.remove(&pk) {
                Some(record) => records.push(record),
                None => warn!(
                    record_type = %self.record_type,
                    pk,
                    "{} with PK {} doesn't exist, but search returned it!",
                    self.record_type,
                    pk
                ),
            }
        }
        Ok(records)
    }

    /// Run the query in its result mode.
    pub fn fetch(&self) -> Result<Vec<SearchItem>, QueryError> {
        match self.mode {
            ResultMode::Documents => Ok(self
                .documents()?
                .into_iter()
                .map(SearchItem::Document)
                .collect()),
            ResultMode::Records => Ok(self
                .records()?
                .into_iter()
                .map(SearchItem::Record)
                .collect()),
        }
    }

    /// The result at position `index`, if any.
    pub fn get(&self, index: usize) -> Result<Option<SearchItem>, QueryError> {
        Ok(self.slice(index, Some(index + 1)).fetch()?.into_iter().next())
    }

    pub fn first(&self) -> Result<Option<SearchItem>, QueryError> {
        self.get(0)
    }
}

impl IntoIterator for &SearchQuery {
    type Item = Result<SearchItem, QueryError>;
    type IntoIter = std::vec::IntoIter<Result<SearchItem, QueryError>>;

    /// Runs the query; an execution failure is yielded as the only item.
    fn into_iter(self) -> Self::IntoIter {
        match self.fetch() {
            Ok(items) => items.into_iter().map(Ok).collect::<Vec<_>>().into_iter(),
            Err(e) => vec![Err(e)].into_iter(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsync_search::{
        indexer, startswith, Field, IndexFilter, IndexServiceConfig, TantivyIndexService,
    };
    use docsync_types::RecordType;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    struct Fixture {
        _temp_dir: TempDir,
        storage: Arc<Storage>,
        base: SearchQuery,
    }

    fn person_schema() -> DocumentSchema {
        DocumentSchema::builder("PersonDocument")
            .field("name", Field::text())
            .field("nick", Field::text().with_indexer(indexer(startswith)))
            .field("age", Field::integer())
            .build_with(|record, doc| {
                doc.set_optional("name", record.get("name").cloned())?;
                doc.set("nick", record.get_text("name").unwrap_or_default())?;
                doc.set_optional("age", record.get("age").cloned())?;
                Ok(())
            })
            .unwrap()
    }

    fn fixture(people: &[(&str, i64)]) -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let storage = Arc::new(Storage::open(&temp_dir.path().join("db")).unwrap());
        storage
            .register_type(RecordType::new("person").text("name").integer("age"))
            .unwrap();

        let service = Arc::new(TantivyIndexService::new(IndexServiceConfig::new(
            temp_dir.path().join("index"),
        )));
        let schema = person_schema();
        service.ensure_index("person", &schema).unwrap();

        for (i, (name, age)) in people.iter().enumerate() {
            let record = Record::new("person", i as u64 + 1)
                .with("name", *name)
                .with("age", *age);
            storage.save(&record).unwrap();
            service.put("person", &schema.build(&record).unwrap()).unwrap();
        }

        let base = SearchQuery::new(service, "person", "person", schema).with_storage(storage.clone());
        Fixture {
            _temp_dir: temp_dir,
            storage,
            base,
        }
    }

    fn names(query: &SearchQuery) -> Vec<String> {
        query
            .documents()
            .unwrap()
            .iter()
            .map(|d| d.get_text("name").unwrap())
            .collect()
    }

    #[test]
    fn test_filter_single_field() {
        let f = fixture(&[("David", 30), ("Bill", 40)]);
        let q = f.base.filter("name", "David").unwrap();
        assert_eq!(q.count().unwrap(), 1);
        assert_eq!(names(&q), vec!["David"]);
        assert_eq!(f.base.count().unwrap(), 2);
    }

    #[test]
    fn test_filters_are_immutable() {
        let f = fixture(&[("David", 30), ("Bill", 40)]);
        let narrowed = f.base.filter("name", "Bill").unwrap();
        assert!(f.base.predicate().is_none());
        assert!(narrowed.predicate().is_some());
    }

    #[test]
    fn test_or_is_union() {
        let f = fixture(&[("Tom", 1), ("Joan", 2), ("Mary", 3)]);
        let q = f
            .base
            .filter("name", "Tom")
            .unwrap()
            .or(&f.base.filter("name", "Joan").unwrap())
            .unwrap();
        assert_eq!(q.count().unwrap(), 2);
        assert_eq!(names(&q), vec!["Tom", "Joan"]);
    }

    #[test]
    fn test_or_with_unfiltered_side_matches_all() {
        let f = fixture(&[("Tom", 1), ("Joan", 2)]);
        let q = f.base.filter("name", "Tom").unwrap().or(&f.base).unwrap();
        assert_eq!(q.count().unwrap(), 2);
    }

    #[test]
    fn test_or_rejects_sliced_queries() {
        let f = fixture(&[("Tom", 1), ("Joan", 2)]);
        let window = f.base.slice(0, Some(1));
        assert!(matches!(f.base.or(&window), Err(QueryError::Incompatible(_))));
        assert!(matches!(window.or(&f.base), Err(QueryError::Incompatible(_))));
        assert!(matches!(
            f.base.slice(1, None).or(&f.base),
            Err(QueryError::Incompatible(_))
        ));
    }

    #[test]
    fn test_contains_on_indexed_field() {
        let f = fixture(&[("Donald", 1), ("Daisy", 2)]);
        let q = f.base.filter("nick__contains", "Don").unwrap();
        assert_eq!(names(&q), vec!["Donald"]);
    }

    #[test]
    fn test_filter_by_pk() {
        let f = fixture(&[("A", 1), ("B", 2)]);
        let q = f.base.filter("pk", 2i64).unwrap();
        assert_eq!(names(&q), vec!["B"]);
        assert!(matches!(
            f.base.filter("pk__contains", 2i64),
            Err(QueryError::Translation(_))
        ));
    }

    #[test]
    fn test_unknown_field_and_lookup() {
        let f = fixture(&[]);
        assert!(matches!(
            f.base.filter("colour", "red"),
            Err(QueryError::UnknownField { .. })
        ));
        assert!(matches!(
            f.base.filter("age__gte", 3i64),
            Err(QueryError::Translation(_))
        ));
    }

    #[test]
    fn test_order_by_descending() {
        let f = fixture(&[("Carla", 1), ("Angus", 2), ("Barbara", 3)]);
        let q = f.base.order_by("-name").unwrap();
        assert_eq!(names(&q), vec!["Carla", "Barbara", "Angus"]);

        let records: Vec<String> = q
            .as_model_objects()
            .records()
            .unwrap()
            .iter()
            .map(|r| r.get_text("name").unwrap().to_string())
            .collect();
        assert_eq!(records, vec!["Carla", "Barbara", "Angus"]);
    }

    #[test]
    fn test_order_by_name_with_long_shared_prefix() {
        let f = fixture(&[("Alexandra Zed", 1), ("Alexandra Amy", 2), ("Alexandra Bo", 3)]);
        let q = f.base.order_by("name").unwrap();
        assert_eq!(names(&q), vec!["Alexandra Amy", "Alexandra Bo", "Alexandra Zed"]);

        let q = f.base.order_by("-name").unwrap().slice(0, Some(2));
        assert_eq!(names(&q), vec!["Alexandra Zed", "Alexandra Bo"]);
    }

    #[test]
    fn test_order_by_token_field_rejected() {
        let f = fixture(&[]);
        assert!(matches!(
            f.base.order_by("nick"),
            Err(QueryError::Translation(_))
        ));
        assert!(f.base.order_by("-pk").is_ok());
    }

    #[test]
    fn test_keywords() {
        let f = fixture(&[("Big Box", 1), ("Small Tin", 2)]);
        let q = f.base.keywords("box");
        assert_eq!(q.count().unwrap(), 1);
        assert_eq!(q.first().unwrap().unwrap().pk(), "1");
    }

    #[test]
    fn test_slice_and_get() {
        let f = fixture(&[("A", 1), ("B", 2), ("C", 3), ("D", 4)]);
        let q = f.base.order_by("name").unwrap();

        let window = q.slice(1, Some(3));
        assert_eq!(names(&window), vec!["B", "C"]);
        assert_eq!(window.count().unwrap(), 2);

        let nested = window.slice(1, None);
        assert_eq!(names(&nested), vec!["C"]);

        assert_eq!(q.get(3).unwrap().unwrap().pk(), "4");
        assert!(q.get(4).unwrap().is_none());
    }

    #[test]
    fn test_none_counts_zero() {
        let f = fixture(&[("A", 1)]);
        let q = f.base.none();
        assert_eq!(q.count().unwrap(), 0);
        assert!(q.fetch().unwrap().is_empty());

        let union = q.or(&f.base.filter("name", "A").unwrap()).unwrap();
        assert_eq!(union.count().unwrap(), 1);
    }

    #[test]
    fn test_as_model_objects_skips_missing_records() {
        let f = fixture(&[("A", 1), ("B", 2)]);
        f.storage.delete("person", 1).unwrap();

        let items = f.base.as_model_objects().fetch().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_record().unwrap().pk, 2);
    }

    #[test]
    fn test_records_require_storage() {
        let f = fixture(&[("A", 1)]);
        let detached = SearchQuery::new(
            f.base.service.clone(),
            "person",
            "person",
            person_schema(),
        );
        assert!(matches!(
            detached.records(),
            Err(QueryError::NoRecordStore(_))
        ));
    }

    #[test]
    fn test_compile() {
        let f = fixture(&[]);
        let q = f.base.filter("age", 30i64).unwrap().order_by("-age").unwrap();
        let compiled = q.compile();
        assert_eq!(
            compiled.filter,
            IndexFilter::Term {
                field: "age".into(),
                value: "30".into()
            }
        );
        assert_eq!(compiled.sort.unwrap().descending, true);
    }

    #[test]
    fn test_iterate() {
        let f = fixture(&[("A", 1), ("B", 2)]);
        let pks: Vec<String> = (&f.base).into_iter().map(|item| item.unwrap().pk()).collect();
        assert_eq!(pks, vec!["1", "2"]);
    }
}
