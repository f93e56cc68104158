//! Relational queries over stored records.
//!
//! A [`RecordQuery`] names a record type, an optional [`Condition`] tree and
//! an ordering. Lookups use the `field__op` convention: `name="Tom"`,
//! `name__contains="o"`, `age__gte=21`. Extra `__` segments before the
//! operator walk reference fields (`relation__name="Book"`), which the store
//! evaluates by loading the referenced record.

use std::cmp::Ordering;

use chrono::NaiveDate;
use docsync_types::{FieldKind, PrimaryKey, Record, RecordType, Value};

use crate::error::StorageError;

/// Comparison applied by a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupOp {
    Exact,
    Contains,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl LookupOp {
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "exact" => Some(LookupOp::Exact),
            "contains" => Some(LookupOp::Contains),
            "gt" => Some(LookupOp::Gt),
            "gte" => Some(LookupOp::Gte),
            "lt" => Some(LookupOp::Lt),
            "lte" => Some(LookupOp::Lte),
            "in" => Some(LookupOp::In),
            _ => None,
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            LookupOp::Exact => "exact",
            LookupOp::Contains => "contains",
            LookupOp::Gt => "gt",
            LookupOp::Gte => "gte",
            LookupOp::Lt => "lt",
            LookupOp::Lte => "lte",
            LookupOp::In => "in",
        }
    }
}

/// Right-hand side of a lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupValue {
    Value(Value),
    Many(Vec<Value>),
    /// A record used as a filter value stands for its primary key
    Record {
        record_type: String,
        pk: PrimaryKey,
    },
}

impl LookupValue {
    /// The scalar this lookup compares against, with records reduced to
    /// their primary key. `None` for multi-valued lookups.
    pub fn resolved(&self) -> Option<Value> {
        match self {
            LookupValue::Value(v) => Some(v.clone()),
            LookupValue::Record { pk, .. } => Some(Value::Integer(*pk as i64)),
            LookupValue::Many(_) => None,
        }
    }
}

impl From<Value> for LookupValue {
    fn from(v: Value) -> Self {
        LookupValue::Value(v)
    }
}

impl From<&str> for LookupValue {
    fn from(v: &str) -> Self {
        LookupValue::Value(v.into())
    }
}

impl From<String> for LookupValue {
    fn from(v: String) -> Self {
        LookupValue::Value(v.into())
    }
}

impl From<i64> for LookupValue {
    fn from(v: i64) -> Self {
        LookupValue::Value(v.into())
    }
}

impl From<f64> for LookupValue {
    fn from(v: f64) -> Self {
        LookupValue::Value(v.into())
    }
}

impl From<bool> for LookupValue {
    fn from(v: bool) -> Self {
        LookupValue::Value(v.into())
    }
}

impl From<NaiveDate> for LookupValue {
    fn from(v: NaiveDate) -> Self {
        LookupValue::Value(v.into())
    }
}

impl From<Vec<Value>> for LookupValue {
    fn from(v: Vec<Value>) -> Self {
        LookupValue::Many(v)
    }
}

impl From<&Record> for LookupValue {
    fn from(r: &Record) -> Self {
        LookupValue::Record {
            record_type: r.record_type.clone(),
            pk: r.pk,
        }
    }
}

/// A single `field__op=value` term.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub field: String,
    /// Reference hops after `field`, outermost first
    pub related: Vec<String>,
    pub op: LookupOp,
    pub value: LookupValue,
}

impl Lookup {
    /// Parse a `field[__related...][__op]` key.
    pub fn parse(key: &str, value: impl Into<LookupValue>) -> Self {
        let mut parts: Vec<&str> = key.split("__").collect();
        let op = match parts.last() {
            Some(last) if parts.len() > 1 => match LookupOp::from_suffix(last) {
                Some(op) => {
                    parts.pop();
                    op
                }
                None => LookupOp::Exact,
            },
            _ => LookupOp::Exact,
        };

        let field = parts.first().map(|s| s.to_string()).unwrap_or_default();
        let related = parts.iter().skip(1).map(|s| s.to_string()).collect();

        Self {
            field,
            related,
            op,
            value: value.into(),
        }
    }

    /// True when the lookup crosses a reference field.
    pub fn is_join(&self) -> bool {
        !self.related.is_empty()
    }

    /// The `field__op` key this lookup was parsed from (with `__exact` implied).
    pub fn key(&self) -> String {
        let mut parts = vec![self.field.as_str()];
        parts.extend(self.related.iter().map(String::as_str));
        let path = parts.join("__");
        match self.op {
            LookupOp::Exact => path,
            op => format!("{}__{}", path, op.suffix()),
        }
    }

    fn matches(&self, record: &Record, resolver: &dyn RecordResolver) -> Result<bool, StorageError> {
        if let Some((next, rest)) = self.related.split_first() {
            let record_type = resolver
                .record_type(&record.record_type)
                .ok_or_else(|| StorageError::UnknownRecordType(record.record_type.clone()))?;
            let target = match record_type.field_kind(&self.field) {
                Some(FieldKind::Reference(target)) => target.clone(),
                _ => {
                    return Err(StorageError::InvalidQuery(format!(
                        "{}.{} is not a reference field",
                        record.record_type, self.field
                    )))
                }
            };
            let Some(pk) = record.get(&self.field).and_then(Value::as_i64) else {
                return Ok(false);
            };
            let Some(related) = resolver.resolve(&target, pk as PrimaryKey)? else {
                return Ok(false);
            };
            let inner = Lookup {
                field: next.clone(),
                related: rest.to_vec(),
                op: self.op,
                value: self.value.clone(),
            };
            return inner.matches(&related, resolver);
        }

        let Some(actual) = field_value(record, &self.field) else {
            return Ok(false);
        };

        let matched = match (&self.op, &self.value) {
            (LookupOp::In, LookupValue::Many(candidates)) => {
                candidates.iter().any(|c| values_equal(&actual, c))
            }
            (LookupOp::In, single) => single
                .resolved()
                .map(|v| values_equal(&actual, &v))
                .unwrap_or(false),
            (op, value) => {
                let Some(expected) = value.resolved() else {
                    return Err(StorageError::InvalidQuery(format!(
                        "{} does not accept a list value",
                        self.key()
                    )));
                };
                match op {
                    LookupOp::Exact => values_equal(&actual, &expected),
                    LookupOp::Contains => contains(&actual, &expected),
                    LookupOp::Gt => actual.partial_cmp(&expected) == Some(Ordering::Greater),
                    LookupOp::Gte => matches!(
                        actual.partial_cmp(&expected),
                        Some(Ordering::Greater | Ordering::Equal)
                    ),
                    LookupOp::Lt => actual.partial_cmp(&expected) == Some(Ordering::Less),
                    LookupOp::Lte => matches!(
                        actual.partial_cmp(&expected),
                        Some(Ordering::Less | Ordering::Equal)
                    ),
                    LookupOp::In => false,
                }
            }
        };
        Ok(matched)
    }
}

/// Read a field off a record; `pk` and `id` name the primary key.
pub fn field_value(record: &Record, name: &str) -> Option<Value> {
    match name {
        "pk" | "id" => Some(Value::Integer(record.pk as i64)),
        _ => record.get(name).cloned(),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    a.partial_cmp(b) == Some(Ordering::Equal)
}

fn contains(haystack: &Value, needle: &Value) -> bool {
    match (haystack, needle) {
        (Value::Text(h), Value::Text(n)) => h.contains(n.as_str()),
        (Value::List(items), Value::Text(n)) => items.iter().any(|i| i == n),
        _ => false,
    }
}

/// Boolean filter tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Lookup(Lookup),
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    pub fn lookup(key: &str, value: impl Into<LookupValue>) -> Self {
        Condition::Lookup(Lookup::parse(key, value))
    }

    /// Conjunction, flattening nested `And`s.
    pub fn and(self, other: Condition) -> Self {
        match (self, other) {
            (Condition::And(mut a), Condition::And(b)) => {
                a.extend(b);
                Condition::And(a)
            }
            (Condition::And(mut a), b) => {
                a.push(b);
                Condition::And(a)
            }
            (a, Condition::And(mut b)) => {
                b.insert(0, a);
                Condition::And(b)
            }
            (a, b) => Condition::And(vec![a, b]),
        }
    }

    /// Disjunction, flattening nested `Or`s.
    pub fn or(self, other: Condition) -> Self {
        match (self, other) {
            (Condition::Or(mut a), Condition::Or(b)) => {
                a.extend(b);
                Condition::Or(a)
            }
            (Condition::Or(mut a), b) => {
                a.push(b);
                Condition::Or(a)
            }
            (a, Condition::Or(mut b)) => {
                b.insert(0, a);
                Condition::Or(b)
            }
            (a, b) => Condition::Or(vec![a, b]),
        }
    }

    pub fn negate(self) -> Self {
        Condition::Not(Box::new(self))
    }

    pub fn matches(
        &self,
        record: &Record,
        resolver: &dyn RecordResolver,
    ) -> Result<bool, StorageError> {
        match self {
            Condition::Lookup(lookup) => lookup.matches(record, resolver),
            Condition::And(children) => {
                for child in children {
                    if !child.matches(record, resolver)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Condition::Or(children) => {
                for child in children {
                    if child.matches(record, resolver)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Condition::Not(inner) => Ok(!inner.matches(record, resolver)?),
        }
    }
}

/// Source of type declarations and referenced records while evaluating joins.
pub trait RecordResolver {
    fn record_type(&self, name: &str) -> Option<RecordType>;
    fn resolve(&self, record_type: &str, pk: PrimaryKey) -> Result<Option<Record>, StorageError>;
}

/// One ordering term; a leading `-` in the parsed name means descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderKey {
    pub field: String,
    pub descending: bool,
}

impl OrderKey {
    pub fn parse(name: &str) -> Self {
        match name.strip_prefix('-') {
            Some(field) => Self {
                field: field.to_string(),
                descending: true,
            },
            None => Self {
                field: name.to_string(),
                descending: false,
            },
        }
    }
}

/// A relational query over one record type.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordQuery {
    pub record_type: String,
    /// `None` matches every record
    pub condition: Option<Condition>,
    pub ordering: Vec<OrderKey>,
}

impl RecordQuery {
    /// Query matching every record of the type.
    pub fn new(record_type: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            condition: None,
            ordering: Vec::new(),
        }
    }

    /// AND a lookup onto the query.
    pub fn filter(self, key: &str, value: impl Into<LookupValue>) -> Self {
        self.where_condition(Condition::lookup(key, value))
    }

    /// AND a negated lookup onto the query.
    pub fn exclude(self, key: &str, value: impl Into<LookupValue>) -> Self {
        self.where_condition(Condition::lookup(key, value).negate())
    }

    /// AND an arbitrary condition onto the query.
    pub fn where_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(match self.condition.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    /// Union of two queries. An unconditioned side matches everything, so
    /// the union does too. Ordering is taken from `self`.
    pub fn or(mut self, other: RecordQuery) -> Self {
        self.condition = match (self.condition.take(), other.condition) {
            (Some(a), Some(b)) => Some(a.or(b)),
            _ => None,
        };
        self
    }

    /// Replace the ordering.
    pub fn order_by(mut self, fields: &[&str]) -> Self {
        self.ordering = fields.iter().map(|f| OrderKey::parse(f)).collect();
        self
    }

    pub fn matches(
        &self,
        record: &Record,
        resolver: &dyn RecordResolver,
    ) -> Result<bool, StorageError> {
        match &self.condition {
            Some(condition) => condition.matches(record, resolver),
            None => Ok(true),
        }
    }

    /// Sort records by the query's ordering, primary key breaking ties.
    /// Absent values sort before present ones.
    pub fn sort(&self, records: &mut [Record]) {
        records.sort_by(|a, b| {
            for key in &self.ordering {
                let ord = match (field_value(a, &key.field), field_value(b, &key.field)) {
                    (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                    (None, Some(_)) => Ordering::Less,
                    (Some(_), None) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                let ord = if key.descending { ord.reverse() } else { ord };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            a.pk.cmp(&b.pk)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapResolver {
        types: HashMap<String, RecordType>,
        records: Vec<Record>,
    }

    impl RecordResolver for MapResolver {
        fn record_type(&self, name: &str) -> Option<RecordType> {
            self.types.get(name).cloned()
        }

        fn resolve(
            &self,
            record_type: &str,
            pk: PrimaryKey,
        ) -> Result<Option<Record>, StorageError> {
            Ok(self
                .records
                .iter()
                .find(|r| r.record_type == record_type && r.pk == pk)
                .cloned())
        }
    }

    fn resolver() -> MapResolver {
        let mut types = HashMap::new();
        types.insert(
            "foo".to_string(),
            RecordType::new("foo")
                .text("name")
                .integer("age")
                .list("tags")
                .reference("relation", "related"),
        );
        types.insert("related".to_string(), RecordType::new("related").text("name"));
        MapResolver {
            types,
            records: vec![Record::new("related", 1).with("name", "Book")],
        }
    }

    fn tom() -> Record {
        Record::new("foo", 7)
            .with("name", "Tom")
            .with("age", 30i64)
            .with("tags", vec!["a", "b"])
            .with("relation", 1i64)
    }

    #[test]
    fn test_parse_lookup_keys() {
        let l = Lookup::parse("name", "Tom");
        assert_eq!(l.field, "name");
        assert_eq!(l.op, LookupOp::Exact);
        assert!(!l.is_join());

        let l = Lookup::parse("name__contains", "o");
        assert_eq!(l.op, LookupOp::Contains);
        assert_eq!(l.key(), "name__contains");

        let l = Lookup::parse("relation__name", "Book");
        assert_eq!(l.field, "relation");
        assert_eq!(l.related, vec!["name".to_string()]);
        assert!(l.is_join());
    }

    #[test]
    fn test_exact_and_contains() {
        let r = resolver();
        assert!(Condition::lookup("name", "Tom").matches(&tom(), &r).unwrap());
        assert!(!Condition::lookup("name", "tom").matches(&tom(), &r).unwrap());
        assert!(Condition::lookup("name__contains", "om").matches(&tom(), &r).unwrap());
        assert!(Condition::lookup("tags__contains", "b").matches(&tom(), &r).unwrap());
        assert!(Condition::lookup("pk", 7i64).matches(&tom(), &r).unwrap());
    }

    #[test]
    fn test_ranges_and_in() {
        let r = resolver();
        assert!(Condition::lookup("age__gte", 30i64).matches(&tom(), &r).unwrap());
        assert!(!Condition::lookup("age__gt", 30i64).matches(&tom(), &r).unwrap());
        assert!(Condition::lookup("age__lt", 30.5).matches(&tom(), &r).unwrap());
        let in_values = vec![Value::Integer(1), Value::Integer(30)];
        assert!(Condition::lookup("age__in", in_values).matches(&tom(), &r).unwrap());
    }

    #[test]
    fn test_record_value_means_pk() {
        let r = resolver();
        let related = Record::new("related", 1);
        assert!(Condition::lookup("relation", &related).matches(&tom(), &r).unwrap());
    }

    #[test]
    fn test_join_follows_reference() {
        let r = resolver();
        assert!(Condition::lookup("relation__name", "Book").matches(&tom(), &r).unwrap());
        assert!(!Condition::lookup("relation__name", "Pen").matches(&tom(), &r).unwrap());
        assert!(Condition::lookup("name__first", "T").matches(&tom(), &r).is_err());
    }

    #[test]
    fn test_boolean_composition() {
        let r = resolver();
        let cond = Condition::lookup("name", "Bill").or(Condition::lookup("name", "Tom"));
        assert!(cond.matches(&tom(), &r).unwrap());
        assert!(!cond.clone().negate().matches(&tom(), &r).unwrap());

        let cond = Condition::lookup("name", "Tom")
            .and(Condition::lookup("age", 30i64))
            .and(Condition::lookup("age__lt", 10i64));
        match &cond {
            Condition::And(children) => assert_eq!(children.len(), 3),
            other => panic!("expected flattened And, got {:?}", other),
        }
        assert!(!cond.matches(&tom(), &r).unwrap());
    }

    #[test]
    fn test_or_with_unfiltered_side_matches_all() {
        let q = RecordQuery::new("foo")
            .filter("name", "Bill")
            .or(RecordQuery::new("foo"));
        assert!(q.condition.is_none());
    }

    #[test]
    fn test_sort_descending_with_pk_tiebreak() {
        let mut records = vec![
            Record::new("foo", 1).with("name", "Carla"),
            Record::new("foo", 2).with("name", "Angus"),
            Record::new("foo", 3).with("name", "Barbara"),
            Record::new("foo", 4).with("name", "Angus"),
        ];
        RecordQuery::new("foo").order_by(&["-name"]).sort(&mut records);
        let pks: Vec<_> = records.iter().map(|r| r.pk).collect();
        assert_eq!(pks, vec![1, 3, 2, 4]);
    }
}
