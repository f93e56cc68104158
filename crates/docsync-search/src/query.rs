//! Index query language.
//!
//! What the index service executes: a filter tree over field literals, an
//! optional sort key and a result window. Literals are strings produced by
//! [`Field::to_filter`](crate::field::Field::to_filter); the service parses
//! them according to each field's stored kind.

use std::collections::BTreeMap;

use crate::value::IndexValue;

/// Filter tree.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexFilter {
    /// Every document
    All,
    /// Field equals the literal (token fields: every literal token present)
    Term { field: String, value: String },
    /// Field contains the literal (raw text: substring; token fields: tokens present)
    Contains { field: String, value: String },
    /// Free text against the catch-all column
    Keywords(String),
    And(Vec<IndexFilter>),
    Or(Vec<IndexFilter>),
}

impl IndexFilter {
    pub fn has_keywords(&self) -> bool {
        match self {
            IndexFilter::Keywords(_) => true,
            IndexFilter::And(children) | IndexFilter::Or(children) => {
                children.iter().any(IndexFilter::has_keywords)
            }
            _ => false,
        }
    }
}

/// Sort key. `field` may be `doc_id` to order by document id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSort {
    pub field: String,
    pub descending: bool,
}

/// A complete index query.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexQuery {
    pub filter: IndexFilter,
    /// `None` orders by relevance when keywords are present, else by doc id
    pub sort: Option<IndexSort>,
    pub offset: usize,
    /// `None` returns every match
    pub limit: Option<usize>,
}

impl Default for IndexQuery {
    fn default() -> Self {
        Self {
            filter: IndexFilter::All,
            sort: None,
            offset: 0,
            limit: None,
        }
    }
}

impl IndexQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: IndexFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_sort(mut self, field: impl Into<String>, descending: bool) -> Self {
        self.sort = Some(IndexSort {
            field: field.into(),
            descending,
        });
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// One stored document returned by a search.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    pub doc_id: String,
    pub values: BTreeMap<String, IndexValue>,
}
