//! Predicate builder
//!
//! Turns a field declaration and a user-supplied query value into an
//! inclusion test. Predicates are cheap to clone and combine with AND.

use crate::core::error::QueryError;
use crate::core::field::{FieldSpec, FieldValue, MatchMode, ValueType};
use crate::core::record::Record;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Value the user asked a field to match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum QueryValue {
    /// Raw text, interpreted with the field's text mode
    Text(String),
    /// Exact typed value
    Exact(FieldValue),
    /// Inclusive bounds, either side optional
    Range {
        min: Option<FieldValue>,
        max: Option<FieldValue>,
    },
    /// Membership in a set
    OneOf(Vec<FieldValue>),
    /// No restriction
    Any,
}

impl QueryValue {
    pub fn text(text: impl Into<String>) -> Self {
        QueryValue::Text(text.into())
    }

    pub fn exact(value: impl Into<FieldValue>) -> Self {
        QueryValue::Exact(value.into())
    }

    pub fn between(min: impl Into<FieldValue>, max: impl Into<FieldValue>) -> Self {
        QueryValue::Range {
            min: Some(min.into()),
            max: Some(max.into()),
        }
    }

    pub fn at_least(min: impl Into<FieldValue>) -> Self {
        QueryValue::Range {
            min: Some(min.into()),
            max: None,
        }
    }

    pub fn at_most(max: impl Into<FieldValue>) -> Self {
        QueryValue::Range {
            min: None,
            max: Some(max.into()),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(text: &str) -> Self {
        QueryValue::Text(text.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(text: String) -> Self {
        QueryValue::Text(text)
    }
}

type Test = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

/// A pure inclusion test applied to a record
#[derive(Clone)]
pub struct Predicate {
    field: Option<String>,
    test: Option<Test>,
}

impl Predicate {
    /// Build a predicate from a closure
    pub fn new<F>(field: impl Into<String>, test: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        Self {
            field: Some(field.into()),
            test: Some(Arc::new(test)),
        }
    }

    /// Predicate accepting every record
    pub fn always() -> Self {
        Self {
            field: None,
            test: None,
        }
    }

    /// Whether this predicate accepts every record
    pub fn is_identity(&self) -> bool {
        self.test.is_none()
    }

    /// Field this predicate was built for, if any
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.test.as_ref().is_none_or(|test| test(record))
    }

    /// Logical AND of two predicates
    pub fn and(self, other: Predicate) -> Predicate {
        match (self.test, other.test) {
            (None, None) => Predicate::always(),
            (Some(test), None) => Predicate {
                field: self.field,
                test: Some(test),
            },
            (None, Some(test)) => Predicate {
                field: other.field,
                test: Some(test),
            },
            (Some(a), Some(b)) => Predicate {
                field: None,
                test: Some(Arc::new(move |r: &Record| a(r) && b(r))),
            },
        }
    }

    /// Logical OR of two predicates
    pub fn or(self, other: Predicate) -> Predicate {
        match (self.test, other.test) {
            (Some(a), Some(b)) => Predicate {
                field: None,
                test: Some(Arc::new(move |r: &Record| a(r) || b(r))),
            },
            _ => Predicate::always(),
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("field", &self.field)
            .field("identity", &self.is_identity())
            .finish()
    }
}

/// Whether a text value is the "match everything" sentinel of select boxes
pub fn is_all_sentinel(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case("all")
}

/// Build the predicate for one field
///
/// # Errors
/// - [`QueryError::TypeMismatch`] when the value does not fit the declared type
/// - [`QueryError::UnsupportedMode`] when the mode cannot apply to the type
/// - [`QueryError::InvalidRange`] when the lower bound exceeds the upper bound
pub fn build_predicate(spec: &FieldSpec, value: &QueryValue) -> Result<Predicate, QueryError> {
    match value {
        QueryValue::Any => Ok(Predicate::always()),
        QueryValue::Text(text) => build_text(spec, text),
        QueryValue::Exact(value) => {
            if value.as_str().is_some_and(is_all_sentinel) {
                return Ok(Predicate::always());
            }
            spec.require_mode(MatchMode::Equals)?;
            let expected = spec.accept(value.clone())?;
            Ok(equals(spec, expected))
        }
        QueryValue::Range { min, max } => build_range(spec, min.as_ref(), max.as_ref()),
        QueryValue::OneOf(values) => {
            spec.require_mode(MatchMode::OneOf)?;
            if values.is_empty() {
                return Ok(Predicate::always());
            }
            let accepted = values
                .iter()
                .map(|v| spec.accept(v.clone()))
                .collect::<Result<Vec<_>, _>>()?;
            let value_type = spec.value_type;
            Ok(Predicate::new(spec.name.clone(), {
                let field = spec.name.clone();
                move |record: &Record| {
                    record
                        .get(&field)
                        .is_some_and(|v| accepted.iter().any(|a| values_equal(value_type, v, a)))
                }
            }))
        }
    }
}

/// Search predicate: matches when ANY of the fields contains the text
///
/// Empty text accepts every record.
pub fn build_search_predicate(fields: &[FieldSpec], text: &str) -> Result<Predicate, QueryError> {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() || fields.is_empty() {
        return Ok(Predicate::always());
    }
    for spec in fields {
        spec.require_mode(MatchMode::Contains)?;
    }
    let names: Vec<String> = fields.iter().map(|f| f.name.clone()).collect();
    Ok(Predicate::new("search", move |record: &Record| {
        names.iter().any(|name| contains(record, name, &needle))
    }))
}

fn build_text(spec: &FieldSpec, text: &str) -> Result<Predicate, QueryError> {
    let mode = spec.text_mode();
    spec.require_mode(mode)?;
    if text.trim().is_empty() || (mode != MatchMode::Contains && is_all_sentinel(text)) {
        return Ok(Predicate::always());
    }
    match mode {
        MatchMode::Contains => {
            let needle = text.trim().to_lowercase();
            let field = spec.name.clone();
            Ok(Predicate::new(spec.name.clone(), move |record: &Record| {
                contains(record, &field, &needle)
            }))
        }
        MatchMode::Equals | MatchMode::Range | MatchMode::OneOf => {
            let expected = spec.parse_text(text)?;
            Ok(equals(spec, expected))
        }
    }
}

fn build_range(
    spec: &FieldSpec,
    min: Option<&FieldValue>,
    max: Option<&FieldValue>,
) -> Result<Predicate, QueryError> {
    spec.require_mode(MatchMode::Range)?;
    let min = bound(spec, min)?;
    let max = upper_bound(spec, max)?;

    if let (Some(lo), Some(hi)) = (&min, &max) {
        if compare_same(lo, hi) == Some(Ordering::Greater) {
            return Err(QueryError::InvalidRange {
                field: spec.name.clone(),
                min: lo.to_string(),
                max: hi.to_string(),
            });
        }
    }
    if min.is_none() && max.is_none() {
        return Ok(Predicate::always());
    }

    let field = spec.name.clone();
    Ok(Predicate::new(spec.name.clone(), move |record: &Record| {
        let Some(value) = record.get(&field) else {
            return false;
        };
        let above = min.as_ref().is_none_or(|lo| {
            matches!(
                compare_same(value, lo),
                Some(Ordering::Greater | Ordering::Equal)
            )
        });
        let below = max.as_ref().is_none_or(|hi| {
            matches!(
                compare_same(value, hi),
                Some(Ordering::Less | Ordering::Equal)
            )
        });
        above && below
    }))
}

/// Bounds may be given as text and are parsed with the field's type
fn bound(spec: &FieldSpec, value: Option<&FieldValue>) -> Result<Option<FieldValue>, QueryError> {
    match value {
        None | Some(FieldValue::Null) => Ok(None),
        Some(FieldValue::String(text)) if text.trim().is_empty() => Ok(None),
        Some(FieldValue::String(text)) => spec.parse_text(text).map(Some),
        Some(other) => spec.accept(other.clone()).map(Some),
    }
}

/// Upper bound; a date-only upper bound covers that whole day
fn upper_bound(
    spec: &FieldSpec,
    value: Option<&FieldValue>,
) -> Result<Option<FieldValue>, QueryError> {
    if let (ValueType::Date, Some(FieldValue::String(text))) = (spec.value_type, value) {
        if let Ok(day) = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d") {
            if let Some(end) = day.and_hms_nano_opt(23, 59, 59, 999_999_999) {
                return Ok(Some(FieldValue::Date(end.and_utc())));
            }
        }
    }
    bound(spec, value)
}

fn equals(spec: &FieldSpec, expected: FieldValue) -> Predicate {
    let field = spec.name.clone();
    let value_type = spec.value_type;
    Predicate::new(spec.name.clone(), move |record: &Record| {
        record
            .get(&field)
            .is_some_and(|v| values_equal(value_type, v, &expected))
    })
}

fn contains(record: &Record, field: &str, needle: &str) -> bool {
    record
        .get(field)
        .and_then(FieldValue::as_str)
        .is_some_and(|hay| hay.to_lowercase().contains(needle))
}

fn values_equal(value_type: ValueType, actual: &FieldValue, expected: &FieldValue) -> bool {
    match (value_type, actual, expected) {
        (ValueType::Enum, a, e) => match (a.as_str(), e.as_str()) {
            (Some(a), Some(e)) => a.eq_ignore_ascii_case(e),
            _ => false,
        },
        (_, a, e) => a == e,
    }
}

/// Order two values of the same kind, `None` when the kinds differ
fn compare_same(a: &FieldValue, b: &FieldValue) -> Option<Ordering> {
    match (a, b) {
        (FieldValue::Number(a), FieldValue::Number(b)) => Some(a.total_cmp(b)),
        (FieldValue::Date(a), FieldValue::Date(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
