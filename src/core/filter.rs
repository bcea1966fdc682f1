//! Filter engine

use crate::core::predicate::Predicate;
use crate::core::record::Record;

/// Whether a record satisfies every predicate
pub fn matches_all(record: &Record, predicates: &[Predicate]) -> bool {
    predicates.iter().all(|p| p.matches(record))
}

/// Keep the records satisfying every predicate, in their original order
///
/// An empty predicate set returns the input unchanged.
pub fn filter(records: &[Record], predicates: &[Predicate]) -> Vec<Record> {
    let active: Vec<&Predicate> = predicates.iter().filter(|p| !p.is_identity()).collect();
    if active.is_empty() {
        return records.to_vec();
    }

    records
        .iter()
        .filter(|record| active.iter().all(|p| p.matches(record)))
        .cloned()
        .collect()
}

/// Fold a predicate set into a single AND predicate
pub fn all_of<I>(predicates: I) -> Predicate
where
    I: IntoIterator<Item = Predicate>,
{
    predicates
        .into_iter()
        .fold(Predicate::always(), |acc, p| acc.and(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::{FieldSpec, MatchMode};
    use crate::core::predicate::{QueryValue, build_predicate};

    fn grades() -> Vec<Record> {
        vec![
            Record::new("1").with("name", "A").with("course", "X").with("grade", 85),
            Record::new("2").with("name", "B").with("course", "Y").with("grade", 60),
            Record::new("3").with("name", "C").with("course", "X").with("grade", 90),
        ]
    }

    fn course_is(value: &str) -> Predicate {
        let spec = FieldSpec::string("course").with_mode(MatchMode::Equals);
        build_predicate(&spec, &QueryValue::text(value)).unwrap()
    }

    fn grade_at_least(min: i32) -> Predicate {
        build_predicate(&FieldSpec::number("grade"), &QueryValue::at_least(min)).unwrap()
    }

    #[test]
    fn test_filter_identity() {
        let records = grades();
        assert_eq!(filter(&records, &[]), records);
        assert_eq!(filter(&records, &[Predicate::always()]), records);
    }

    #[test]
    fn test_filter_preserves_order() {
        let result = filter(&grades(), &[course_is("X")]);
        let keys: Vec<&str> = result.iter().map(Record::key).collect();
        assert_eq!(keys, vec!["1", "3"]);
    }

    #[test]
    fn test_filter_is_conjunction() {
        let result = filter(&grades(), &[course_is("X"), grade_at_least(88)]);
        let keys: Vec<&str> = result.iter().map(Record::key).collect();
        assert_eq!(keys, vec!["3"]);
    }

    #[test]
    fn test_filter_idempotent() {
        let predicates = vec![course_is("X"), grade_at_least(80)];
        let once = filter(&grades(), &predicates);
        let twice = filter(&once, &predicates);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_filter_does_not_touch_input() {
        let records = grades();
        let before = records.clone();
        let _ = filter(&records, &[course_is("Y")]);
        assert_eq!(records, before);
    }

    #[test]
    fn test_all_of_matches_filter() {
        let predicates = vec![course_is("X"), grade_at_least(88)];
        let combined = all_of(predicates.clone());
        for record in grades() {
            assert_eq!(combined.matches(&record), matches_all(&record, &predicates));
        }
        assert!(all_of(Vec::new()).is_identity());
    }
}
