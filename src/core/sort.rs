//! Sort engine
//!
//! Single-column, stable, typed by the field declaration. Descending order is
//! the exact mirror of ascending; ties keep their input order in both.

use crate::core::field::{FieldSpec, FieldValue, ValueType};
use crate::core::record::Record;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    #[serde(alias = "asc")]
    Ascending,
    #[serde(alias = "desc")]
    Descending,
}

impl SortDirection {
    /// The other direction
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    /// Parse `asc`/`desc` (and the long forms)
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(SortDirection::Ascending),
            "desc" | "descending" => Some(SortDirection::Descending),
            _ => None,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Ascending => f.write_str("asc"),
            SortDirection::Descending => f.write_str("desc"),
        }
    }
}

/// Active sort column and direction
#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    pub field: FieldSpec,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(field: FieldSpec) -> Self {
        Self {
            field,
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: FieldSpec) -> Self {
        Self {
            field,
            direction: SortDirection::Descending,
        }
    }

    /// Compare two records by the sort field and direction
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let name = &self.field.name;
        let ordering = compare_values(&self.field, a.get(name), b.get(name));
        self.direction.apply(ordering)
    }
}

/// Ascending comparison of two optional values of a field
///
/// Missing values sort after present ones.
pub fn compare_values(
    spec: &FieldSpec,
    a: Option<&FieldValue>,
    b: Option<&FieldValue>,
) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (Some(a), Some(b)) => compare_present(spec, a, b),
    }
}

fn compare_present(spec: &FieldSpec, a: &FieldValue, b: &FieldValue) -> Ordering {
    match (spec.value_type, a, b) {
        (_, FieldValue::Number(a), FieldValue::Number(b)) => a.total_cmp(b),
        (_, FieldValue::Date(a), FieldValue::Date(b)) => a.cmp(b),
        (_, FieldValue::Boolean(a), FieldValue::Boolean(b)) => a.cmp(b),
        (ValueType::Enum, a, b) if !spec.variants.is_empty() => {
            let position = |v: &FieldValue| {
                v.as_str()
                    .and_then(|s| spec.variants.iter().position(|var| var.eq_ignore_ascii_case(s)))
                    .unwrap_or(usize::MAX)
            };
            position(a)
                .cmp(&position(b))
                .then_with(|| compare_text(a.as_str(), b.as_str()))
        }
        (_, a, b) => compare_text(a.as_str(), b.as_str()),
    }
}

/// Collation-style string order: case-insensitive first, then by code point
fn compare_text(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a
            .to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b)),
        _ => Ordering::Equal,
    }
}

/// Return a sorted copy of the records; `None` returns them unchanged
pub fn sort(records: &[Record], spec: Option<&SortSpec>) -> Vec<Record> {
    let mut sorted = records.to_vec();
    if let Some(spec) = spec {
        sorted.sort_by(|a, b| spec.compare(a, b));
    }
    sorted
}
