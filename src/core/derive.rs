//! Derived status fields
//!
//! Statuses such as "Active"/"Expired" or "Graded"/"Pending" are computed
//! once when records enter a view and stored as enum fields, so filtering,
//! sorting and aggregation treat them like any other declared field.

use crate::core::field::{FieldSpec, FieldValue, ValueType};
use crate::core::record::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Source of the current time for deadline derivations
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a given instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub type SharedClock = Arc<dyn Clock>;

/// A field computed from another field of the same record
///
/// # Example
/// ```yaml
/// derived:
///   - kind: deadline_status
///     source: due_date
///     target: status
///     before: Active
///     after: Expired
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DerivedField {
    /// `before` while the source date is now or later, `after` once it has passed
    DeadlineStatus {
        source: String,
        target: String,
        before: String,
        after: String,
    },

    /// `pass` when the source number is at least `at_least`, `fail` below it,
    /// `missing` (or null) when there is no number
    Threshold {
        source: String,
        target: String,
        at_least: f64,
        pass: String,
        fail: String,
        #[serde(default)]
        missing: Option<String>,
    },

    /// `present` when the source field has a value, `missing` otherwise
    Presence {
        source: String,
        target: String,
        present: String,
        missing: String,
    },
}

impl DerivedField {
    pub fn source(&self) -> &str {
        match self {
            DerivedField::DeadlineStatus { source, .. }
            | DerivedField::Threshold { source, .. }
            | DerivedField::Presence { source, .. } => source,
        }
    }

    pub fn target(&self) -> &str {
        match self {
            DerivedField::DeadlineStatus { target, .. }
            | DerivedField::Threshold { target, .. }
            | DerivedField::Presence { target, .. } => target,
        }
    }

    /// Type the source field must be declared with, `None` for any type
    pub fn source_type(&self) -> Option<ValueType> {
        match self {
            DerivedField::DeadlineStatus { .. } => Some(ValueType::Date),
            DerivedField::Threshold { .. } => Some(ValueType::Number),
            DerivedField::Presence { .. } => None,
        }
    }

    /// Declaration of the target field, an enum over the produced labels
    pub fn spec(&self) -> FieldSpec {
        let variants: Vec<String> = match self {
            DerivedField::DeadlineStatus { before, after, .. } => {
                vec![before.clone(), after.clone()]
            }
            DerivedField::Threshold {
                pass, fail, missing, ..
            } => std::iter::once(pass.clone())
                .chain(std::iter::once(fail.clone()))
                .chain(missing.clone())
                .collect(),
            DerivedField::Presence {
                present, missing, ..
            } => vec![present.clone(), missing.clone()],
        };
        FieldSpec::enumeration(self.target(), variants)
    }

    /// Compute the target field on a record
    pub fn apply(&self, record: &mut Record, now: DateTime<Utc>) {
        let value = match self {
            DerivedField::DeadlineStatus {
                source,
                before,
                after,
                ..
            } => record.get(source).and_then(FieldValue::as_date).map(|due| {
                if due >= now { before.clone() } else { after.clone() }
            }),
            DerivedField::Threshold {
                source,
                at_least,
                pass,
                fail,
                missing,
                ..
            } => match record.get(source).and_then(FieldValue::as_number) {
                Some(n) if n >= *at_least => Some(pass.clone()),
                Some(_) => Some(fail.clone()),
                None => missing.clone(),
            },
            DerivedField::Presence {
                source,
                present,
                missing,
                ..
            } => Some(if record.get(source).is_some() {
                present.clone()
            } else {
                missing.clone()
            }),
        };
        record.set(self.target(), value.map(FieldValue::Enum));
    }
}
