//! Predicate trees carried by a [`SearchQuery`](crate::SearchQuery).
//!
//! Values are filter literals already prepared by the field they compare
//! against, so compiling to an [`IndexFilter`] is a plain structural walk.

use docsync_search::IndexFilter;

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equals { field: String, value: String },
    Contains { field: String, value: String },
    FreeText(String),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Conjunction, flattening nested `And`s.
    pub fn and(self, other: Predicate) -> Self {
        match (self, other) {
            (Predicate::And(mut a), Predicate::And(b)) => {
                a.extend(b);
                Predicate::And(a)
            }
            (Predicate::And(mut a), b) => {
                a.push(b);
                Predicate::And(a)
            }
            (a, Predicate::And(mut b)) => {
                b.insert(0, a);
                Predicate::And(b)
            }
            (a, b) => Predicate::And(vec![a, b]),
        }
    }

    /// Disjunction, flattening nested `Or`s.
    pub fn or(self, other: Predicate) -> Self {
        match (self, other) {
            (Predicate::Or(mut a), Predicate::Or(b)) => {
                a.extend(b);
                Predicate::Or(a)
            }
            (Predicate::Or(mut a), b) => {
                a.push(b);
                Predicate::Or(a)
            }
            (a, Predicate::Or(mut b)) => {
                b.insert(0, a);
                Predicate::Or(b)
            }
            (a, b) => Predicate::Or(vec![a, b]),
        }
    }

    pub fn to_filter(&self) -> IndexFilter {
        match self {
            Predicate::Equals { field, value } => IndexFilter::Term {
                field: field.clone(),
                value: value.clone(),
            },
            Predicate::Contains { field, value } => IndexFilter::Contains {
                field: field.clone(),
                value: value.clone(),
            },
            Predicate::FreeText(text) => IndexFilter::Keywords(text.clone()),
            Predicate::And(children) => {
                IndexFilter::And(children.iter().map(Predicate::to_filter).collect())
            }
            Predicate::Or(children) => {
                IndexFilter::Or(children.iter().map(Predicate::to_filter).collect())
            }
        }
    }
}
