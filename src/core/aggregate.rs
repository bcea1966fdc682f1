//! Aggregator
//!
//! Summary statistics over an already filtered collection. The aggregator
//! never reorders or filters further.
//!
//! Empty collections are not an error: count, average, sum and percentages
//! are 0, while min and max report [`Extremum::NoData`] because 0 would read
//! as a real value.

use crate::core::predicate::Predicate;
use crate::core::record::Record;
use indexmap::IndexMap;
use serde::Serialize;

/// Minimum or maximum of a numeric field
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Extremum {
    Value(f64),
    NoData,
}

impl Extremum {
    pub fn value(&self) -> Option<f64> {
        match self {
            Extremum::Value(v) => Some(*v),
            Extremum::NoData => None,
        }
    }
}

/// One requested statistic
#[derive(Debug, Clone)]
pub enum AggregateSpec {
    Average { field: String },
    Sum { field: String },
    Min { field: String },
    Max { field: String },
    /// Share of records satisfying a predicate, 0–100
    PercentageMatching { label: String, predicate: Predicate },
    /// Number of records per distinct value of a field
    GroupCounts { field: String },
}

impl AggregateSpec {
    pub fn average(field: impl Into<String>) -> Self {
        AggregateSpec::Average { field: field.into() }
    }

    pub fn sum(field: impl Into<String>) -> Self {
        AggregateSpec::Sum { field: field.into() }
    }

    pub fn min(field: impl Into<String>) -> Self {
        AggregateSpec::Min { field: field.into() }
    }

    pub fn max(field: impl Into<String>) -> Self {
        AggregateSpec::Max { field: field.into() }
    }

    pub fn percentage(label: impl Into<String>, predicate: Predicate) -> Self {
        AggregateSpec::PercentageMatching {
            label: label.into(),
            predicate,
        }
    }

    pub fn group_counts(field: impl Into<String>) -> Self {
        AggregateSpec::GroupCounts { field: field.into() }
    }

    /// Key under which the statistic is stored in an [`Aggregate`]
    pub fn label(&self) -> String {
        match self {
            AggregateSpec::Average { field } => format!("average:{}", field),
            AggregateSpec::Sum { field } => format!("sum:{}", field),
            AggregateSpec::Min { field } => format!("min:{}", field),
            AggregateSpec::Max { field } => format!("max:{}", field),
            AggregateSpec::PercentageMatching { label, .. } => format!("percentage:{}", label),
            AggregateSpec::GroupCounts { field } => format!("groups:{}", field),
        }
    }

    fn compute(&self, records: &[Record]) -> Statistic {
        match self {
            AggregateSpec::Average { field } => Statistic::Number(average(records, field)),
            AggregateSpec::Sum { field } => Statistic::Number(sum(records, field)),
            AggregateSpec::Min { field } => Statistic::Extremum(min(records, field)),
            AggregateSpec::Max { field } => Statistic::Extremum(max(records, field)),
            AggregateSpec::PercentageMatching { predicate, .. } => {
                Statistic::Percentage(percentage_matching(records, predicate))
            }
            AggregateSpec::GroupCounts { field } => Statistic::Groups(group_counts(records, field)),
        }
    }
}

/// Computed value of one statistic
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Statistic {
    Number(f64),
    Extremum(Extremum),
    Percentage(u32),
    Groups(IndexMap<String, usize>),
}

/// Read-only snapshot of summary statistics
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Aggregate {
    count: usize,
    statistics: IndexMap<String, Statistic>,
}

impl Aggregate {
    pub fn count(&self) -> usize {
        self.count
    }

    /// Statistic stored under a label (see [`AggregateSpec::label`])
    pub fn statistic(&self, label: &str) -> Option<&Statistic> {
        self.statistics.get(label)
    }

    /// Average of a field, `None` when it was not requested
    pub fn average(&self, field: &str) -> Option<f64> {
        self.number(&format!("average:{}", field))
    }

    /// Sum of a field, `None` when it was not requested
    pub fn sum(&self, field: &str) -> Option<f64> {
        self.number(&format!("sum:{}", field))
    }

    /// Minimum of a field, `None` when it was not requested
    pub fn min(&self, field: &str) -> Option<Extremum> {
        self.extremum(&format!("min:{}", field))
    }

    /// Maximum of a field, `None` when it was not requested
    pub fn max(&self, field: &str) -> Option<Extremum> {
        self.extremum(&format!("max:{}", field))
    }

    pub fn percentage(&self, label: &str) -> Option<u32> {
        match self.statistics.get(&format!("percentage:{}", label)) {
            Some(Statistic::Percentage(p)) => Some(*p),
            _ => None,
        }
    }

    pub fn groups(&self, field: &str) -> Option<&IndexMap<String, usize>> {
        match self.statistics.get(&format!("groups:{}", field)) {
            Some(Statistic::Groups(g)) => Some(g),
            _ => None,
        }
    }

    fn number(&self, label: &str) -> Option<f64> {
        match self.statistics.get(label) {
            Some(Statistic::Number(n)) => Some(*n),
            _ => None,
        }
    }

    fn extremum(&self, label: &str) -> Option<Extremum> {
        match self.statistics.get(label) {
            Some(Statistic::Extremum(e)) => Some(*e),
            _ => None,
        }
    }
}

/// Compute the requested statistics over the records
pub fn aggregate(records: &[Record], specs: &[AggregateSpec]) -> Aggregate {
    Aggregate {
        count: records.len(),
        statistics: specs
            .iter()
            .map(|spec| (spec.label(), spec.compute(records)))
            .collect(),
    }
}

fn numbers<'a>(records: &'a [Record], field: &'a str) -> impl Iterator<Item = f64> + 'a {
    records
        .iter()
        .filter_map(move |r| r.get(field).and_then(|v| v.as_number()))
}

/// Arithmetic mean over records carrying a number; 0 when there are none
pub fn average(records: &[Record], field: &str) -> f64 {
    let (total, n) = numbers(records, field).fold((0.0, 0usize), |(t, n), v| (t + v, n + 1));
    if n == 0 { 0.0 } else { total / n as f64 }
}

pub fn sum(records: &[Record], field: &str) -> f64 {
    numbers(records, field).sum()
}

pub fn min(records: &[Record], field: &str) -> Extremum {
    numbers(records, field)
        .reduce(f64::min)
        .map_or(Extremum::NoData, Extremum::Value)
}

pub fn max(records: &[Record], field: &str) -> Extremum {
    numbers(records, field)
        .reduce(f64::max)
        .map_or(Extremum::NoData, Extremum::Value)
}

/// Share of records satisfying the predicate, rounded to the nearest integer
pub fn percentage_matching(records: &[Record], predicate: &Predicate) -> u32 {
    if records.is_empty() {
        return 0;
    }
    let matching = records.iter().filter(|r| predicate.matches(r)).count();
    (matching as f64 * 100.0 / records.len() as f64).round() as u32
}

/// Records per distinct value, in first-seen order; missing values are skipped
pub fn group_counts(records: &[Record], field: &str) -> IndexMap<String, usize> {
    let mut groups = IndexMap::new();
    for value in records.iter().filter_map(|r| r.get(field)) {
        *groups.entry(value.to_string()).or_insert(0) += 1;
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::FieldSpec;
    use crate::core::predicate::{QueryValue, build_predicate};
    use serde_json::json;

    fn grades() -> Vec<Record> {
        vec![
            Record::new("1").with("grade", 85).with("status", "Graded"),
            Record::new("2").with("grade", 60).with("status", "Graded"),
            Record::new("3").with("status", "Pending"),
            Record::new("4").with("grade", 90).with("status", "Graded"),
        ]
    }

    fn passing() -> Predicate {
        build_predicate(&FieldSpec::number("grade"), &QueryValue::at_least(70)).unwrap()
    }

    #[test]
    fn test_average_skips_missing_values() {
        assert_eq!(average(&grades(), "grade"), 235.0 / 3.0);
    }

    #[test]
    fn test_min_max_sum() {
        let records = grades();
        assert_eq!(min(&records, "grade"), Extremum::Value(60.0));
        assert_eq!(max(&records, "grade"), Extremum::Value(90.0));
        assert_eq!(sum(&records, "grade"), 235.0);
    }

    #[test]
    fn test_empty_collection_is_safe() {
        let empty: Vec<Record> = Vec::new();
        assert_eq!(average(&empty, "grade"), 0.0);
        assert_eq!(sum(&empty, "grade"), 0.0);
        assert_eq!(min(&empty, "grade"), Extremum::NoData);
        assert_eq!(max(&empty, "grade"), Extremum::NoData);
        assert_eq!(percentage_matching(&empty, &passing()), 0);
        assert!(group_counts(&empty, "status").is_empty());
    }

    #[test]
    fn test_percentage_rounds_to_nearest() {
        // 2 of 3 graded records pass: 66.67 -> 67
        let graded: Vec<Record> = grades()
            .into_iter()
            .filter(|r| r.get("grade").is_some())
            .collect();
        assert_eq!(percentage_matching(&graded, &passing()), 67);
        // 2 of 4 -> 50
        assert_eq!(percentage_matching(&grades(), &passing()), 50);
    }

    #[test]
    fn test_group_counts_first_seen_order() {
        let groups = group_counts(&grades(), "status");
        let pairs: Vec<(&str, usize)> = groups.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        assert_eq!(pairs, vec![("Graded", 3), ("Pending", 1)]);
    }

    #[test]
    fn test_aggregate_snapshot() {
        let specs = vec![
            AggregateSpec::average("grade"),
            AggregateSpec::min("grade"),
            AggregateSpec::max("missing"),
            AggregateSpec::percentage("passing", passing()),
            AggregateSpec::group_counts("status"),
        ];
        let agg = aggregate(&grades(), &specs);
        assert_eq!(agg.count(), 4);
        assert_eq!(agg.average("grade"), Some(235.0 / 3.0));
        assert_eq!(agg.min("grade"), Some(Extremum::Value(60.0)));
        assert_eq!(agg.max("missing"), Some(Extremum::NoData));
        assert_eq!(agg.percentage("passing"), Some(50));
        assert_eq!(agg.groups("status").map(|g| g.len()), Some(2));
        // not requested
        assert_eq!(agg.sum("grade"), None);
    }

    #[test]
    fn test_empty_aggregate_serializes_no_data_as_null() {
        let agg = aggregate(&[], &[AggregateSpec::average("grade"), AggregateSpec::min("grade")]);
        assert_eq!(
            serde_json::to_value(&agg).unwrap(),
            json!({"count": 0, "statistics": {"average:grade": 0.0, "min:grade": null}})
        );
    }
}
