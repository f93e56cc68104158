//! Query execution against a document index.
//!
//! Compiles [`IndexQuery`] filter trees to Tantivy queries, applies the sort
//! key and result window, and reads stored values back as [`IndexHit`]s.

use std::collections::BTreeMap;
use std::ops::Bound::{self, Excluded, Unbounded};

use chrono::{DateTime as ChronoDateTime, NaiveDate};
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{
    AllQuery, BooleanQuery, EmptyQuery, Occur, Query, QueryParser, RangeQuery, RegexQuery, TermQuery,
};
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::{DocAddress, IndexReader, Order, Searcher, TantivyDocument, Term};
use tracing::debug;

use crate::document::{DOC_ID_FIELD, DOC_KEY_FIELD};
use crate::error::SearchError;
use crate::field::IndexKind;
use crate::index::SearchIndex;
use crate::indexer::{date_to_tantivy, doc_key};
use crate::query::{IndexFilter, IndexHit, IndexQuery, IndexSort};
use crate::schema::{rank_field_name, IndexSchema, SchemaField};
use crate::value::IndexValue;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Fast column a query is ordered by.
enum SortColumn {
    Score,
    /// Ascii-rank string column of a raw text field
    Text(String, Order),
    U64(String, Order),
    I64(String, Order),
    F64(String, Order),
    Date(String, Order),
}

/// Executes queries against one index.
pub struct DocumentSearcher {
    reader: IndexReader,
    schema: IndexSchema,
    query_parser: QueryParser,
}

impl DocumentSearcher {
    /// Create a new searcher from a SearchIndex.
    pub fn new(index: &SearchIndex) -> Result<Self, SearchError> {
        let reader = index.reader()?;
        let schema = index.schema().clone();

        let mut query_parser = QueryParser::for_index(index.index(), vec![schema.all_text]);
        query_parser.set_conjunction_by_default();

        Ok(Self {
            reader,
            schema,
            query_parser,
        })
    }

    /// Reload the reader to see recent commits.
    pub fn reload(&self) -> Result<(), SearchError> {
        self.reader.reload()?;
        debug!("Reloaded search reader");
        Ok(())
    }

    /// Number of live documents.
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    /// Run a query and return the stored documents in result order.
    pub fn search(&self, query: &IndexQuery) -> Result<Vec<IndexHit>, SearchError> {
        let searcher = self.reader.searcher();
        let compiled = self.compile(&query.filter)?;
        let addresses = self.collect(&searcher, compiled.as_ref(), query)?;

        let mut hits = Vec::with_capacity(addresses.len());
        for address in addresses {
            let doc: TantivyDocument = searcher.doc(address)?;
            hits.push(self.read_hit(&doc));
        }

        debug!(hits = hits.len(), offset = query.offset, "Search complete");
        Ok(hits)
    }

    /// Count every match of the query's filter, ignoring the result window.
    pub fn count(&self, query: &IndexQuery) -> Result<usize, SearchError> {
        let searcher = self.reader.searcher();
        let compiled = self.compile(&query.filter)?;
        Ok(searcher.search(compiled.as_ref(), &Count)?)
    }

    /// Document ids in id order, strictly after `start_after`, at most `limit`.
    ///
    /// Ids are ordered by `(doc_key, id)`. Only one page of stored documents
    /// is read, plus any documents sharing the cursor's or the page's last key.
    pub fn list_ids(&self, start_after: Option<&str>, limit: usize) -> Result<Vec<String>, SearchError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let searcher = self.reader.searcher();

        let mut keyed = Vec::new();
        let lower = match start_after {
            Some(id) => {
                let cursor = (doc_key(id), id.to_string());
                keyed.extend(
                    self.ids_with_key(&searcher, cursor.0)?
                        .into_iter()
                        .filter(|entry| *entry > cursor),
                );
                Excluded(Term::from_field_u64(self.schema.doc_key, cursor.0))
            }
            None => Unbounded,
        };

        let mut page = self.ids_after(&searcher, lower, limit)?;
        // The page may have cut a group of equal keys short.
        if page.len() == limit {
            if let Some(&(last, _)) = page.last() {
                page.retain(|(key, _)| *key != last);
                page.extend(self.ids_with_key(&searcher, last)?);
            }
        }

        keyed.extend(page);
        keyed.sort();
        keyed.truncate(limit);
        Ok(keyed.into_iter().map(|(_, id)| id).collect())
    }

    fn ids_after(
        &self,
        searcher: &Searcher,
        lower: Bound<Term>,
        limit: usize,
    ) -> Result<Vec<(u64, String)>, SearchError> {
        let query: Box<dyn Query> = match lower {
            Unbounded => Box::new(AllQuery),
            bound => Box::new(RangeQuery::new(bound, Unbounded)),
        };
        let top = searcher.search(
            query.as_ref(),
            &TopDocs::with_limit(limit).order_by_fast_field::<u64>(DOC_KEY_FIELD, Order::Asc),
        )?;
        self.read_ids(searcher, top)
    }

    fn ids_with_key(&self, searcher: &Searcher, key: u64) -> Result<Vec<(u64, String)>, SearchError> {
        let query = TermQuery::new(
            Term::from_field_u64(self.schema.doc_key, key),
            IndexRecordOption::Basic,
        );
        let matches = searcher.search(&query, &Count)?;
        if matches == 0 {
            return Ok(Vec::new());
        }
        let top = searcher.search(&query, &TopDocs::with_limit(matches))?;
        self.read_ids(searcher, top.into_iter().map(|(_, address)| (key, address)).collect())
    }

    fn read_ids(
        &self,
        searcher: &Searcher,
        keyed: Vec<(u64, DocAddress)>,
    ) -> Result<Vec<(u64, String)>, SearchError> {
        let mut ids = Vec::with_capacity(keyed.len());
        for (key, address) in keyed {
            let doc: TantivyDocument = searcher.doc(address)?;
            if let Some(id) = doc.get_first(self.schema.doc_id).and_then(|v| v.as_str()) {
                ids.push((key, id.to_string()));
            }
        }
        Ok(ids)
    }

    fn field(&self, name: &str) -> Result<&SchemaField, SearchError> {
        self.schema
            .field(name)
            .ok_or_else(|| SearchError::InvalidQuery(format!("unknown field {}", name)))
    }

    /// Compile a filter tree to a Tantivy query.
    pub fn compile(&self, filter: &IndexFilter) -> Result<Box<dyn Query>, SearchError> {
        match filter {
            IndexFilter::All => Ok(Box::new(AllQuery)),
            IndexFilter::Keywords(text) => {
                if text.trim().is_empty() {
                    return Ok(Box::new(AllQuery));
                }
                let (query, errors) = self.query_parser.parse_query_lenient(text);
                if !errors.is_empty() {
                    debug!(keywords = %text, errors = errors.len(), "Lenient keyword parse");
                }
                Ok(query)
            }
            IndexFilter::Term { field, value } => self.term_query(field, value),
            IndexFilter::Contains { field, value } => self.contains_query(field, value),
            IndexFilter::And(children) => {
                if children.is_empty() {
                    return Ok(Box::new(AllQuery));
                }
                let clauses = children
                    .iter()
                    .map(|c| self.compile(c).map(|q| (Occur::Must, q)))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Box::new(BooleanQuery::new(clauses)))
            }
            IndexFilter::Or(children) => {
                if children.is_empty() {
                    return Ok(Box::new(EmptyQuery));
                }
                let clauses = children
                    .iter()
                    .map(|c| self.compile(c).map(|q| (Occur::Should, q)))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Box::new(BooleanQuery::new(clauses)))
            }
        }
    }

    fn term_query(&self, name: &str, value: &str) -> Result<Box<dyn Query>, SearchError> {
        if name == DOC_ID_FIELD {
            let term = Term::from_field_text(self.schema.doc_id, value);
            return Ok(Box::new(TermQuery::new(term, IndexRecordOption::Basic)));
        }

        let handle = self.field(name)?;
        let term = match handle.kind {
            IndexKind::RawText => Term::from_field_text(handle.field, value),
            IndexKind::TokenText => return Ok(self.tokens_query(handle, value)),
            IndexKind::I64 => {
                let parsed = value.trim().parse::<i64>().map_err(|_| {
                    SearchError::InvalidQuery(format!("{} expects an integer, got {:?}", name, value))
                })?;
                Term::from_field_i64(handle.field, parsed)
            }
            IndexKind::F64 => {
                let parsed = value.trim().parse::<f64>().map_err(|_| {
                    SearchError::InvalidQuery(format!("{} expects a number, got {:?}", name, value))
                })?;
                Term::from_field_f64(handle.field, parsed)
            }
            IndexKind::Date => {
                let parsed = NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
                    SearchError::InvalidQuery(format!("{} expects YYYY-MM-DD, got {:?}", name, value))
                })?;
                Term::from_field_date(handle.field, date_to_tantivy(parsed))
            }
        };
        Ok(Box::new(TermQuery::new(term, IndexRecordOption::Basic)))
    }

    fn contains_query(&self, name: &str, value: &str) -> Result<Box<dyn Query>, SearchError> {
        if name == DOC_ID_FIELD {
            return Err(SearchError::InvalidQuery("doc_id does not support contains".into()));
        }

        let handle = self.field(name)?;
        match handle.kind {
            IndexKind::RawText => {
                let pattern = format!(".*{}.*", regex::escape(value));
                Ok(Box::new(RegexQuery::from_pattern(&pattern, handle.field)?))
            }
            IndexKind::TokenText => Ok(self.tokens_query(handle, value)),
            kind => Err(SearchError::InvalidQuery(format!(
                "{} is {:?} and does not support contains",
                name, kind
            ))),
        }
    }

    /// Every whitespace token of `value` present in a token field.
    fn tokens_query(&self, handle: &SchemaField, value: &str) -> Box<dyn Query> {
        let clauses: Vec<(Occur, Box<dyn Query>)> = value
            .split_whitespace()
            .map(|token| {
                let term = Term::from_field_text(handle.field, &token.to_lowercase());
                let query: Box<dyn Query> = Box::new(TermQuery::new(term, IndexRecordOption::Basic));
                (Occur::Must, query)
            })
            .collect();
        if clauses.is_empty() {
            Box::new(EmptyQuery)
        } else {
            Box::new(BooleanQuery::new(clauses))
        }
    }

    fn sort_column(&self, query: &IndexQuery) -> Result<SortColumn, SearchError> {
        let Some(IndexSort { field, descending }) = &query.sort else {
            if query.filter.has_keywords() {
                return Ok(SortColumn::Score);
            }
            return Ok(SortColumn::U64(DOC_KEY_FIELD.to_string(), Order::Asc));
        };

        let order = if *descending { Order::Desc } else { Order::Asc };
        if field == DOC_ID_FIELD {
            return Ok(SortColumn::U64(DOC_KEY_FIELD.to_string(), order));
        }

        let handle = self.field(field)?;
        match handle.kind {
            IndexKind::RawText => Ok(SortColumn::Text(rank_field_name(field), order)),
            IndexKind::I64 => Ok(SortColumn::I64(field.clone(), order)),
            IndexKind::F64 => Ok(SortColumn::F64(field.clone(), order)),
            IndexKind::Date => Ok(SortColumn::Date(field.clone(), order)),
            IndexKind::TokenText => Err(SearchError::InvalidQuery(format!(
                "cannot order by token field {}",
                field
            ))),
        }
    }

    fn collect(
        &self,
        searcher: &Searcher,
        query: &dyn Query,
        request: &IndexQuery,
    ) -> Result<Vec<DocAddress>, SearchError> {
        let limit = match request.limit {
            Some(0) => return Ok(Vec::new()),
            Some(n) => n,
            None => (searcher.num_docs() as usize).max(1),
        };
        let top = TopDocs::with_limit(limit).and_offset(request.offset);

        let addresses = match self.sort_column(request)? {
            SortColumn::Score => addresses(searcher.search(query, &top)?),
            SortColumn::Text(name, order) => {
                addresses(searcher.search(query, &top.order_by_string_fast_field(name, order))?)
            }
            SortColumn::U64(name, order) => {
                addresses(searcher.search(query, &top.order_by_fast_field::<u64>(name, order))?)
            }
            SortColumn::I64(name, order) => {
                addresses(searcher.search(query, &top.order_by_fast_field::<i64>(name, order))?)
            }
            SortColumn::F64(name, order) => {
                addresses(searcher.search(query, &top.order_by_fast_field::<f64>(name, order))?)
            }
            SortColumn::Date(name, order) => addresses(
                searcher.search(query, &top.order_by_fast_field::<tantivy::DateTime>(name, order))?,
            ),
        };
        Ok(addresses)
    }

    fn read_hit(&self, doc: &TantivyDocument) -> IndexHit {
        let doc_id = doc
            .get_first(self.schema.doc_id)
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        let mut values = BTreeMap::new();
        for (name, handle) in self.schema.fields() {
            let Some(stored) = doc.get_first(handle.field) else {
                continue;
            };
            let value = match handle.kind {
                IndexKind::RawText | IndexKind::TokenText => {
                    stored.as_str().map(|s| IndexValue::Text(s.to_string()))
                }
                IndexKind::I64 => stored.as_i64().map(IndexValue::Integer),
                IndexKind::F64 => stored.as_f64().map(IndexValue::Float),
                IndexKind::Date => stored
                    .as_datetime()
                    .and_then(|dt| ChronoDateTime::from_timestamp(dt.into_timestamp_secs(), 0))
                    .map(|dt| IndexValue::Date(dt.date_naive())),
            };
            if let Some(value) = value {
                values.insert(name.clone(), value);
            }
        }

        IndexHit { doc_id, values }
    }
}

fn addresses<T>(top: Vec<(T, DocAddress)>) -> Vec<DocAddress> {
    top.into_iter().map(|(_, address)| address).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, DocumentSchema};
    use crate::field::Field;
    use crate::index::SearchIndexConfig;
    use crate::indexer::SearchIndexer;
    use crate::indexers::{indexer, startswith};
    use tempfile::TempDir;

    fn person_schema() -> DocumentSchema {
        DocumentSchema::builder("PersonDocument")
            .field("name", Field::text())
            .field("nick", Field::text().with_indexer(indexer(startswith)))
            .field("age", Field::integer())
            .field("score", Field::float())
            .field("born", Field::date())
            .build_with(|_, _| Ok(()))
            .unwrap()
    }

    struct Fixture {
        _temp_dir: TempDir,
        searcher: DocumentSearcher,
    }

    fn fixture() -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let schema = person_schema();
        let config = SearchIndexConfig::new(temp_dir.path());
        let index = SearchIndex::open_or_create(config, &schema.index_fields()).unwrap();
        let indexer = SearchIndexer::new(&index).unwrap();

        let people = [
            ("1", "Carla", "Big Box", 30, 1.5, (1990, 1, 1)),
            ("2", "Angus", "Small Tin", 25, 9.0, (1995, 6, 15)),
            ("3", "Barbara", "Box Kite", 41, 4.25, (1980, 3, 1)),
        ];
        let docs: Vec<Document> = people
            .iter()
            .map(|(id, name, nick, age, score, (y, m, d))| {
                let mut doc = schema.new_document(*id);
                doc.set("name", *name).unwrap();
                doc.set("nick", *nick).unwrap();
                doc.set("age", *age as i64).unwrap();
                doc.set("score", *score).unwrap();
                doc.set("born", NaiveDate::from_ymd_opt(*y, *m, *d).unwrap())
                    .unwrap();
                doc
            })
            .collect();
        indexer.put_documents(&docs).unwrap();
        indexer.commit().unwrap();

        let searcher = DocumentSearcher::new(&index).unwrap();
        Fixture {
            _temp_dir: temp_dir,
            searcher,
        }
    }

    /// An index holding only a raw `name` field.
    fn names_fixture(rows: &[(&str, &str)]) -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let schema = DocumentSchema::builder("NameDocument")
            .field("name", Field::text())
            .build_with(|_, _| Ok(()))
            .unwrap();
        let index =
            SearchIndex::open_or_create(SearchIndexConfig::new(temp_dir.path()), &schema.index_fields())
                .unwrap();
        let indexer = SearchIndexer::new(&index).unwrap();
        for (id, name) in rows {
            let mut doc = schema.new_document(*id);
            doc.set("name", *name).unwrap();
            indexer.put_document(&doc).unwrap();
        }
        indexer.commit().unwrap();

        Fixture {
            _temp_dir: temp_dir,
            searcher: DocumentSearcher::new(&index).unwrap(),
        }
    }

    fn ids(hits: &[IndexHit]) -> Vec<&str> {
        hits.iter().map(|h| h.doc_id.as_str()).collect()
    }

    fn term(field: &str, value: &str) -> IndexFilter {
        IndexFilter::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    #[test]
    fn test_default_order_is_doc_id() {
        let f = fixture();
        let hits = f.searcher.search(&IndexQuery::all()).unwrap();
        assert_eq!(ids(&hits), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_term_on_raw_text_is_exact() {
        let f = fixture();
        let q = IndexQuery::all().with_filter(term("name", "Angus"));
        assert_eq!(ids(&f.searcher.search(&q).unwrap()), vec!["2"]);

        let q = IndexQuery::all().with_filter(term("name", "angus"));
        assert_eq!(f.searcher.count(&q).unwrap(), 0);
    }

    #[test]
    fn test_contains_on_raw_text() {
        let f = fixture();
        let q = IndexQuery::all().with_filter(IndexFilter::Contains {
            field: "name".into(),
            value: "ar".into(),
        });
        assert_eq!(ids(&f.searcher.search(&q).unwrap()), vec!["1", "3"]);
    }

    #[test]
    fn test_token_field_matches_tokens() {
        let f = fixture();
        let q = IndexQuery::all().with_filter(IndexFilter::Contains {
            field: "nick".into(),
            value: "bo".into(),
        });
        assert_eq!(ids(&f.searcher.search(&q).unwrap()), vec!["1", "3"]);

        let q = IndexQuery::all().with_filter(term("nick", "Big Box"));
        assert_eq!(ids(&f.searcher.search(&q).unwrap()), vec!["1"]);
    }

    #[test]
    fn test_numeric_and_date_terms() {
        let f = fixture();
        let q = IndexQuery::all().with_filter(term("age", "41"));
        assert_eq!(ids(&f.searcher.search(&q).unwrap()), vec!["3"]);

        let q = IndexQuery::all().with_filter(term("score", "9"));
        assert_eq!(ids(&f.searcher.search(&q).unwrap()), vec!["2"]);

        let q = IndexQuery::all().with_filter(term("born", "1990-01-01"));
        assert_eq!(ids(&f.searcher.search(&q).unwrap()), vec!["1"]);

        let q = IndexQuery::all().with_filter(term("age", "old"));
        assert!(matches!(f.searcher.search(&q), Err(SearchError::InvalidQuery(_))));
    }

    #[test]
    fn test_or_and_and() {
        let f = fixture();
        let q = IndexQuery::all().with_filter(IndexFilter::Or(vec![
            term("name", "Carla"),
            term("name", "Angus"),
        ]));
        assert_eq!(f.searcher.count(&q).unwrap(), 2);

        let q = IndexQuery::all().with_filter(IndexFilter::And(vec![
            term("name", "Carla"),
            term("age", "25"),
        ]));
        assert_eq!(f.searcher.count(&q).unwrap(), 0);

        let q = IndexQuery::all().with_filter(IndexFilter::Or(vec![]));
        assert_eq!(f.searcher.count(&q).unwrap(), 0);
    }

    #[test]
    fn test_keywords() {
        let f = fixture();
        let q = IndexQuery::all().with_filter(IndexFilter::Keywords("kite".into()));
        assert_eq!(ids(&f.searcher.search(&q).unwrap()), vec!["3"]);

        let q = IndexQuery::all().with_filter(IndexFilter::Keywords("big carla".into()));
        assert_eq!(ids(&f.searcher.search(&q).unwrap()), vec!["1"]);
    }

    #[test]
    fn test_sort_by_name_descending() {
        let f = fixture();
        let q = IndexQuery::all().with_sort("name", true);
        assert_eq!(ids(&f.searcher.search(&q).unwrap()), vec!["1", "3", "2"]);

        let q = IndexQuery::all().with_sort("name", false);
        assert_eq!(ids(&f.searcher.search(&q).unwrap()), vec!["2", "3", "1"]);
    }

    #[test]
    fn test_sort_by_name_beyond_shared_prefix() {
        let f = names_fixture(&[
            ("1", "Alexandra Zed"),
            ("2", "Alexandra Amy"),
            ("3", "Ålexandra Bo"),
        ]);
        let q = IndexQuery::all().with_sort("name", false);
        assert_eq!(ids(&f.searcher.search(&q).unwrap()), vec!["2", "3", "1"]);

        let q = IndexQuery::all().with_sort("name", true).with_limit(2);
        assert_eq!(ids(&f.searcher.search(&q).unwrap()), vec!["1", "3"]);
    }

    #[test]
    fn test_sort_numeric_and_date() {
        let f = fixture();
        let q = IndexQuery::all().with_sort("age", false);
        assert_eq!(ids(&f.searcher.search(&q).unwrap()), vec!["2", "1", "3"]);

        let q = IndexQuery::all().with_sort("score", true);
        assert_eq!(ids(&f.searcher.search(&q).unwrap()), vec!["2", "3", "1"]);

        let q = IndexQuery::all().with_sort("born", false);
        assert_eq!(ids(&f.searcher.search(&q).unwrap()), vec!["3", "1", "2"]);

        let q = IndexQuery::all().with_sort("doc_id", true);
        assert_eq!(ids(&f.searcher.search(&q).unwrap()), vec!["3", "2", "1"]);
    }

    #[test]
    fn test_sort_on_token_field_rejected() {
        let f = fixture();
        let q = IndexQuery::all().with_sort("nick", false);
        assert!(matches!(f.searcher.search(&q), Err(SearchError::InvalidQuery(_))));
    }

    #[test]
    fn test_window() {
        let f = fixture();
        let q = IndexQuery::all().with_offset(1).with_limit(1);
        assert_eq!(ids(&f.searcher.search(&q).unwrap()), vec!["2"]);
        assert_eq!(f.searcher.count(&q).unwrap(), 3);

        let q = IndexQuery::all().with_limit(0);
        assert!(f.searcher.search(&q).unwrap().is_empty());

        let q = IndexQuery::all().with_offset(10);
        assert!(f.searcher.search(&q).unwrap().is_empty());
    }

    #[test]
    fn test_hit_values() {
        let f = fixture();
        let q = IndexQuery::all().with_filter(term("doc_id", "2"));
        let hits = f.searcher.search(&q).unwrap();
        assert_eq!(hits.len(), 1);
        let values = &hits[0].values;
        assert_eq!(values["name"], IndexValue::Text("Angus".into()));
        assert_eq!(values["age"], IndexValue::Integer(25));
        assert_eq!(values["score"], IndexValue::Float(9.0));
        assert_eq!(
            values["born"],
            IndexValue::Date(NaiveDate::from_ymd_opt(1995, 6, 15).unwrap())
        );
        assert!(values["nick"].as_text().unwrap().contains("Sm"));
    }

    #[test]
    fn test_list_ids() {
        let f = fixture();
        assert_eq!(f.searcher.list_ids(None, 10).unwrap(), vec!["1", "2", "3"]);
        assert_eq!(f.searcher.list_ids(Some("1"), 1).unwrap(), vec!["2"]);
        assert!(f.searcher.list_ids(Some("3"), 10).unwrap().is_empty());
    }

    #[test]
    fn test_list_ids_pages_through_equal_keys() {
        let f = names_fixture(&[
            ("record-000001-b", "b"),
            ("record-000001-a", "a"),
            ("7", "seven"),
            ("record-000001-c", "c"),
        ]);
        assert_eq!(doc_key("record-000001-a"), doc_key("record-000001-c"));

        assert_eq!(f.searcher.list_ids(None, 1).unwrap(), vec!["7"]);
        assert_eq!(
            f.searcher.list_ids(Some("7"), 2).unwrap(),
            vec!["record-000001-a", "record-000001-b"]
        );
        assert_eq!(
            f.searcher.list_ids(Some("record-000001-b"), 2).unwrap(),
            vec!["record-000001-c"]
        );
        assert!(f.searcher.list_ids(Some("record-000001-c"), 2).unwrap().is_empty());
    }
}
