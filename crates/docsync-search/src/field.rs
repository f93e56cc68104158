//! Field conversion policies.
//!
//! A [`Field`] converts one attribute between three representations:
//! - native ([`Value`]) as records and callers see it
//! - index ([`IndexValue`]) as the index service stores it
//! - filter (a literal string) as the index query language compares it
//!
//! The three directions are deliberately separate: dates are stored as dates
//! but filtered as `YYYY-MM-DD` strings, and indexed text is filtered with the
//! literal the caller gave rather than tokenized a second time.

use std::fmt;

use chrono::NaiveDate;
use docsync_types::Value;
use unicode_normalization::UnicodeNormalization;

use crate::error::FieldError;
use crate::indexers::Indexer;
use crate::value::{FieldValue, IndexValue, IndexedValue};

/// Largest magnitude the index accepts for float fields (2^64).
pub const MAX_SEARCH_NUMBER: f64 = 18_446_744_073_709_551_616.0;

const DATE_FORMAT: &str = "%Y-%m-%d";

// i64 covers [-2^63, 2^63); the upper end is exclusive.
const I64_FLOOR: f64 = -9_223_372_036_854_775_808.0;
const I64_CEIL: f64 = 9_223_372_036_854_775_808.0;

/// How the index stores a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// Exact-match text with an ascii-rank sort column
    RawText,
    /// Whitespace-tokenized, lowercased text
    TokenText,
    I64,
    F64,
    Date,
}

/// Field variants and their per-variant settings.
#[derive(Clone)]
pub enum FieldKind {
    Text { indexer: Option<Indexer> },
    Float { minimum: Option<f64>, maximum: Option<f64> },
    Integer { minimum: Option<f64>, maximum: Option<f64> },
    Boolean,
    Date,
}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Text { indexer } => f
                .debug_struct("Text")
                .field("indexed", &indexer.is_some())
                .finish(),
            FieldKind::Float { minimum, maximum } => f
                .debug_struct("Float")
                .field("minimum", minimum)
                .field("maximum", maximum)
                .finish(),
            FieldKind::Integer { minimum, maximum } => f
                .debug_struct("Integer")
                .field("minimum", minimum)
                .field("maximum", maximum)
                .finish(),
            FieldKind::Boolean => f.write_str("Boolean"),
            FieldKind::Date => f.write_str("Date"),
        }
    }
}

/// A declared document field.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    owner: String,
    default: Option<Value>,
    kind: FieldKind,
}

impl Field {
    fn with_kind(kind: FieldKind, default: Option<Value>) -> Self {
        Self {
            name: String::new(),
            owner: String::new(),
            default,
            kind,
        }
    }

    /// Raw text field, defaulting to the empty string.
    pub fn text() -> Self {
        Self::with_kind(FieldKind::Text { indexer: None }, Some(Value::Text(String::new())))
    }

    pub fn float() -> Self {
        Self::with_kind(
            FieldKind::Float {
                minimum: None,
                maximum: None,
            },
            None,
        )
    }

    pub fn integer() -> Self {
        Self::with_kind(
            FieldKind::Integer {
                minimum: None,
                maximum: None,
            },
            None,
        )
    }

    pub fn boolean() -> Self {
        Self::with_kind(FieldKind::Boolean, None)
    }

    pub fn date() -> Self {
        Self::with_kind(FieldKind::Date, None)
    }

    /// Run text through `indexer` before storing; the field becomes token text.
    pub fn with_indexer(mut self, indexer: Indexer) -> Self {
        if let FieldKind::Text { indexer: slot } = &mut self.kind {
            *slot = Some(indexer);
        }
        self
    }

    /// Numeric bounds (inclusive). Ignored on non-numeric fields.
    pub fn with_bounds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        match &mut self.kind {
            FieldKind::Float { minimum, maximum } | FieldKind::Integer { minimum, maximum } => {
                *minimum = min;
                *maximum = max;
            }
            _ => {}
        }
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Remove any default so a missing value is an error.
    pub fn required(mut self) -> Self {
        self.default = None;
        self
    }

    /// Record the field's declared name and owning schema.
    pub(crate) fn bind(mut self, name: &str, owner: &str) -> Self {
        self.name = name.to_string();
        self.owner = owner.to_string();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_indexed_text(&self) -> bool {
        matches!(self.kind, FieldKind::Text { indexer: Some(_) })
    }

    pub fn index_kind(&self) -> IndexKind {
        match &self.kind {
            FieldKind::Text { indexer: None } => IndexKind::RawText,
            FieldKind::Text { indexer: Some(_) } => IndexKind::TokenText,
            FieldKind::Float { .. } => IndexKind::F64,
            FieldKind::Integer { .. } | FieldKind::Boolean => IndexKind::I64,
            FieldKind::Date => IndexKind::Date,
        }
    }

    fn mismatch(&self, expected: &str, found: &str) -> FieldError {
        FieldError::TypeMismatch {
            field: self.name.clone(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    fn bounds(&self) -> (f64, f64) {
        let (minimum, maximum, floor, ceil) = match &self.kind {
            FieldKind::Float { minimum, maximum } => {
                (*minimum, *maximum, -MAX_SEARCH_NUMBER, MAX_SEARCH_NUMBER)
            }
            FieldKind::Integer { minimum, maximum } => {
                (*minimum, *maximum, i64::MIN as f64, i64::MAX as f64)
            }
            _ => (None, None, f64::MIN, f64::MAX),
        };
        (minimum.unwrap_or(floor), maximum.unwrap_or(ceil))
    }

    fn check_range(&self, value: f64, minimum: f64, maximum: f64) -> Result<(), FieldError> {
        if !value.is_finite() || value < minimum || value > maximum {
            return Err(FieldError::Range {
                field: self.name.clone(),
                value,
                minimum,
                maximum,
            });
        }
        Ok(())
    }

    fn native_number(&self, value: &Value) -> Result<f64, FieldError> {
        match value {
            Value::Integer(i) => Ok(*i as f64),
            Value::Float(f) => Ok(*f),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| self.mismatch("a number", &format!("text {:?}", s))),
            other => Err(self.mismatch("a number", other.kind_name())),
        }
    }

    /// Convert a value to the index representation.
    ///
    /// `None` falls back to the default, which goes through the same
    /// coercion; without a default this is [`FieldError::MissingValue`].
    pub fn to_index(&self, value: Option<&FieldValue>) -> Result<IndexValue, FieldError> {
        let value = match value {
            Some(v) => v.clone(),
            None => match &self.default {
                Some(default) => FieldValue::Native(default.clone()),
                None => {
                    return Err(FieldError::MissingValue {
                        field: self.name.clone(),
                        owner: self.owner.clone(),
                    })
                }
            },
        };

        match &self.kind {
            FieldKind::Text { indexer } => {
                let text = match value {
                    FieldValue::Indexed(v) => return Ok(IndexValue::Indexed(v)),
                    FieldValue::Native(v) => normalize_text(&v),
                };
                Ok(match indexer {
                    Some(indexer) => {
                        IndexValue::Indexed(IndexedValue::new(indexer(&text).join(" ")))
                    }
                    None => IndexValue::Text(text),
                })
            }
            FieldKind::Float { .. } => {
                let FieldValue::Native(native) = &value else {
                    return Err(self.mismatch("a number", value.kind_name()));
                };
                let number = self.native_number(native)?;
                let (minimum, maximum) = self.bounds();
                self.check_range(number, minimum, maximum)?;
                Ok(IndexValue::Float(number))
            }
            FieldKind::Integer { .. } => {
                let FieldValue::Native(native) = &value else {
                    return Err(self.mismatch("a number", value.kind_name()));
                };
                let (minimum, maximum) = self.bounds();
                let (minimum, maximum) = (round_half_up(minimum), round_half_up(maximum));
                if let Value::Integer(i) = native {
                    self.check_range(*i as f64, minimum, maximum)?;
                    return Ok(IndexValue::Integer(*i));
                }
                let number = self.native_number(native)?;
                let rounded = round_half_up(number);
                if !(I64_FLOOR..I64_CEIL).contains(&rounded) {
                    return Err(FieldError::Range {
                        field: self.name.clone(),
                        value: number,
                        minimum,
                        maximum,
                    });
                }
                self.check_range(rounded, minimum, maximum)?;
                Ok(IndexValue::Integer(rounded as i64))
            }
            FieldKind::Boolean => match &value {
                FieldValue::Native(Value::Bool(b)) => Ok(IndexValue::Integer(i64::from(*b))),
                FieldValue::Native(Value::Integer(i @ (0 | 1))) => Ok(IndexValue::Integer(*i)),
                FieldValue::Native(Value::Text(s)) => match s.trim() {
                    "true" | "True" | "1" => Ok(IndexValue::Integer(1)),
                    "false" | "False" | "0" => Ok(IndexValue::Integer(0)),
                    _ => Err(self.mismatch("a boolean", &format!("text {:?}", s))),
                },
                other => Err(self.mismatch("a boolean", other.kind_name())),
            },
            FieldKind::Date => match &value {
                FieldValue::Native(Value::Date(d)) => Ok(IndexValue::Date(*d)),
                FieldValue::Native(Value::DateTime(dt)) => Ok(IndexValue::Date(dt.date())),
                FieldValue::Native(Value::Text(s)) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
                    .map(IndexValue::Date)
                    .map_err(|_| self.mismatch("a date in YYYY-MM-DD form", &format!("text {:?}", s))),
                other => Err(self.mismatch("a date", other.kind_name())),
            },
        }
    }

    /// Convert an index value back to its native form. Bounds are not
    /// re-checked.
    pub fn to_native(&self, value: &IndexValue) -> Result<Value, FieldError> {
        match (&self.kind, value) {
            (FieldKind::Text { .. }, v) => match v.as_text() {
                Some(text) => Ok(Value::Text(text.to_string())),
                None => Ok(Value::Text(v.to_string())),
            },
            (FieldKind::Float { .. }, IndexValue::Float(f)) => Ok(Value::Float(*f)),
            (FieldKind::Float { .. }, IndexValue::Integer(i)) => Ok(Value::Float(*i as f64)),
            (FieldKind::Integer { .. }, IndexValue::Integer(i)) => Ok(Value::Integer(*i)),
            (FieldKind::Integer { .. }, IndexValue::Float(f)) => Ok(Value::Integer(f.trunc() as i64)),
            (FieldKind::Boolean, IndexValue::Integer(i)) => Ok(Value::Bool(*i != 0)),
            (FieldKind::Date, IndexValue::Date(d)) => Ok(Value::Date(*d)),
            (FieldKind::Date, IndexValue::Text(s)) => NaiveDate::parse_from_str(s, DATE_FORMAT)
                .map(Value::Date)
                .map_err(|_| self.mismatch("a date in YYYY-MM-DD form", &format!("text {:?}", s))),
            (kind, other) => Err(self.mismatch(&format!("{:?} index value", kind), other.kind_name())),
        }
    }

    /// Prepare a value read back from the index for re-conversion. Text on an
    /// indexed field is marked as already indexed.
    pub fn from_search(&self, value: IndexValue) -> FieldValue {
        match (&self.kind, value) {
            (FieldKind::Text { indexer: Some(_) }, IndexValue::Text(s)) => {
                FieldValue::Indexed(IndexedValue::new(s))
            }
            (FieldKind::Text { indexer: Some(_) }, IndexValue::Indexed(v)) => FieldValue::Indexed(v),
            (_, IndexValue::Text(s)) => FieldValue::Native(Value::Text(s)),
            (_, IndexValue::Indexed(v)) => FieldValue::Native(Value::Text(v.into_inner())),
            (_, IndexValue::Integer(i)) => FieldValue::Native(Value::Integer(i)),
            (_, IndexValue::Float(f)) => FieldValue::Native(Value::Float(f)),
            (_, IndexValue::Date(d)) => FieldValue::Native(Value::Date(d)),
        }
    }

    /// Literal used to compare against this field in an index filter.
    pub fn to_filter(&self, value: Option<&FieldValue>) -> Result<String, FieldError> {
        let Some(value) = value else {
            return Err(self.mismatch("a value to filter by", "nothing"));
        };

        match &self.kind {
            // Filter literals are never run through the indexer.
            FieldKind::Text { .. } => {
                let literal = match value {
                    FieldValue::Indexed(v) => v.clone(),
                    FieldValue::Native(v) => IndexedValue::new(normalize_text(v)),
                };
                Ok(self.to_index(Some(&FieldValue::Indexed(literal)))?.to_string())
            }
            _ => Ok(self.to_index(Some(value))?.to_string()),
        }
    }
}

/// Float-to-integer rounding: add one half, then truncate toward zero.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).trunc()
}

fn normalize_text(value: &Value) -> String {
    value.to_text().nfc().collect()
}
