//! Tests for the view controller
//!
//! These tests verify that:
//! - Filter, sort and page mutations update the visible records
//! - Statistics only follow the filtered records
//! - Reset restores the mount-time state
//! - Loading, failure and "no matches" stay distinct states

use listview::prelude::*;

// =============================================================================
// Fixtures
// =============================================================================

fn grades_schema() -> Schema {
    Schema::new("id")
        .with_field(FieldSpec::string("name"))
        .with_field(FieldSpec::string("course").with_mode(MatchMode::Equals))
        .with_field(FieldSpec::number("grade"))
}

fn grade_records() -> Vec<Record> {
    vec![
        Record::new("1").with("name", "A").with("course", "X").with("grade", 85),
        Record::new("2").with("name", "B").with("course", "Y").with("grade", 60),
        Record::new("3").with("name", "C").with("course", "X").with("grade", 90),
    ]
}

fn grades_view() -> ViewController {
    let mut view = ViewController::new("grades", grades_schema())
        .with_search_fields(["name", "course"])
        .expect("search fields are strings")
        .with_aggregate(AggregateSpec::average("grade"))
        .with_aggregate(AggregateSpec::min("grade"))
        .with_aggregate(AggregateSpec::max("grade"));
    view.set_records(grade_records()).expect("records match schema");
    view
}

fn courses_view() -> ViewController {
    let schema = Schema::new("id")
        .with_field(FieldSpec::string("title"))
        .with_field(FieldSpec::enumeration("level", ["Beginner", "Advanced"]));
    let mut view = ViewController::new("courses", schema)
        .with_search_fields(["title"])
        .expect("title is a string")
        .with_default_sort("title", SortDirection::Ascending)
        .expect("title is declared");
    view.set_records(vec![
        Record::new("js").with("title", "JavaScript Basics").with("level", "Beginner"),
        Record::new("py").with("title", "Python 101").with("level", "Beginner"),
        Record::new("java").with("title", "Advanced Java").with("level", "Advanced"),
    ])
    .expect("records match schema");
    view
}

fn keys(records: &[Record]) -> Vec<&str> {
    records.iter().map(Record::key).collect()
}

// =============================================================================
// Scenarios
// =============================================================================

mod scenario_tests {
    use super::*;

    #[test]
    fn test_grade_filtering() {
        let mut view = grades_view();
        view.set_filter_value("course", "X").unwrap();

        let visible: Vec<(&str, f64)> = view
            .visible_records()
            .iter()
            .map(|r| {
                (
                    r.get("name").and_then(FieldValue::as_str).unwrap(),
                    r.get("grade").and_then(FieldValue::as_number).unwrap(),
                )
            })
            .collect();
        assert_eq!(visible, vec![("A", 85.0), ("C", 90.0)]);
        assert_eq!(view.aggregate().average("grade"), Some(87.5));
        assert_eq!(view.aggregate().count(), 2);
    }

    #[test]
    fn test_search_then_reset() {
        let mut view = courses_view();
        view.set_search_text("java").unwrap();

        let mut titles: Vec<&str> = view
            .visible_records()
            .iter()
            .filter_map(|r| r.get("title").and_then(FieldValue::as_str))
            .collect();
        titles.sort();
        assert_eq!(titles, vec!["Advanced Java", "JavaScript Basics"]);

        view.reset_filters();
        assert_eq!(view.visible_records().len(), 3);
        assert_eq!(view.query_state().search_text(), "");
        assert!(!view.query_state().is_filtered());
    }

    #[test]
    fn test_pagination_boundary() {
        let schema = Schema::new("id").with_field(FieldSpec::number("position"));
        let mut view = ViewController::new("schedule", schema).with_page_size(10);
        view.set_records(
            (1..=25)
                .map(|i| Record::new(i.to_string()).with("position", i))
                .collect(),
        )
        .unwrap();

        view.set_page(1);
        assert_eq!(view.visible_records().len(), 10);
        assert_eq!(view.visible_records()[0].key(), "1");
        assert_eq!(view.visible_records()[9].key(), "10");

        view.set_page(3);
        assert_eq!(keys(view.visible_records()), vec!["21", "22", "23", "24", "25"]);

        view.set_page(4);
        assert!(view.visible_records().is_empty());
        assert_eq!(view.pagination().total_pages, 3);
        assert_eq!(view.status(), ViewStatus::Ready);
    }
}

// =============================================================================
// Sort Toggle
// =============================================================================

mod sort_tests {
    use super::*;

    fn current(view: &ViewController) -> (String, SortDirection) {
        let sort = view.query_state().sort().expect("sort is set");
        (sort.field.name.clone(), sort.direction)
    }

    #[test]
    fn test_same_field_flips_new_field_resets() {
        let mut view = grades_view();
        view.set_sort("grade").unwrap();
        assert_eq!(current(&view), ("grade".to_string(), SortDirection::Ascending));

        view.set_sort("grade").unwrap();
        assert_eq!(current(&view), ("grade".to_string(), SortDirection::Descending));

        view.set_sort("name").unwrap();
        assert_eq!(current(&view), ("name".to_string(), SortDirection::Ascending));
    }

    #[test]
    fn test_descending_grade_order() {
        let mut view = grades_view();
        view.set_sort("grade").unwrap();
        view.set_sort("grade").unwrap();
        assert_eq!(keys(view.visible_records()), vec!["3", "1", "2"]);
    }

    #[test]
    fn test_unknown_sort_field_keeps_sort() {
        let mut view = grades_view();
        view.set_sort("grade").unwrap();
        let err = view.set_sort("instructor").unwrap_err();
        assert!(matches!(err, QueryError::UnknownField { .. }));
        assert_eq!(current(&view), ("grade".to_string(), SortDirection::Ascending));
    }

    #[test]
    fn test_reset_restores_default_sort() {
        let mut view = courses_view();
        view.set_sort("title").unwrap();
        assert_eq!(current(&view).1, SortDirection::Descending);
        view.set_page(2);

        view.reset_filters();
        assert_eq!(current(&view), ("title".to_string(), SortDirection::Ascending));
        assert_eq!(view.query_state().page(), 1);
        assert_eq!(keys(view.visible_records()), vec!["java", "js", "py"]);
    }
}

// =============================================================================
// Statistics
// =============================================================================

mod aggregate_tests {
    use super::*;

    #[test]
    fn test_sorting_and_paging_do_not_change_statistics() {
        let mut view = grades_view();
        view.set_filter_value("grade", QueryValue::at_least(80)).unwrap();
        let before = view.aggregate().clone();

        view.set_sort("name").unwrap();
        view.set_sort("name").unwrap();
        view.set_page_size(1);
        view.set_page(2);

        assert_eq!(view.aggregate(), &before);
        assert_eq!(view.aggregate().count(), view.filtered_records().len());
    }

    #[test]
    fn test_no_matches_reports_no_data() {
        let mut view = grades_view();
        view.set_filter_value("course", "Z").unwrap();
        assert_eq!(view.status(), ViewStatus::NoMatches);
        assert_eq!(view.aggregate().count(), 0);
        assert_eq!(view.aggregate().average("grade"), Some(0.0));
        assert_eq!(view.aggregate().min("grade"), Some(Extremum::NoData));
        assert_eq!(view.aggregate().max("grade"), Some(Extremum::NoData));
    }

    #[test]
    fn test_search_and_filter_combine_with_and() {
        let mut view = grades_view();
        view.set_search_text("x").unwrap();
        assert_eq!(keys(view.visible_records()), vec!["1", "3"]);

        view.set_filter_value("grade", QueryValue::at_most(86)).unwrap();
        assert_eq!(keys(view.visible_records()), vec!["1"]);
        assert_eq!(view.aggregate().min("grade"), Some(Extremum::Value(85.0)));
    }
}

// =============================================================================
// Query Restore
// =============================================================================

mod apply_query_tests {
    use super::*;

    #[test]
    fn test_apply_query_sets_everything() {
        let mut view = grades_view();
        let query: ViewQuery = serde_json::from_str(
            r#"{"filters": {"course": {"kind": "text", "value": "X"}},
                "sort": "grade:desc", "page": 1, "limit": 1}"#,
        )
        .unwrap();
        view.apply_query(&query).unwrap();

        assert_eq!(view.page_size(), 1);
        assert_eq!(keys(view.visible_records()), vec!["3"]);
        assert_eq!(view.aggregate().count(), 2);
    }

    #[test]
    fn test_invalid_query_changes_nothing() {
        let mut view = grades_view();
        view.set_filter_value("course", "Y").unwrap();

        let mut query = ViewQuery::default();
        query.filters.insert("course".to_string(), QueryValue::text("X"));
        query
            .filters
            .insert("grade".to_string(), QueryValue::text("excellent"));
        let err = view.apply_query(&query).unwrap_err();
        assert_eq!(err.error_code(), "TYPE_MISMATCH");

        assert_eq!(keys(view.visible_records()), vec!["2"]);
    }
}

// =============================================================================
// Data Lifecycle
// =============================================================================

mod load_tests {
    use super::*;

    #[tokio::test]
    async fn test_load_from_source() {
        let source = InMemoryRecordSource::new(grade_records());
        let mut view = ViewController::new("grades", grades_schema());
        assert_eq!(view.status(), ViewStatus::Loading);

        assert!(view.load_from(&source).await);
        assert_eq!(view.status(), ViewStatus::Ready);
        assert_eq!(view.all_records().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_empty_result() {
        let source = InMemoryRecordSource::failing(FetchError::Status {
            status: 502,
            url: "http://backend/grades".to_string(),
        });
        let mut view = ViewController::new("grades", grades_schema());
        view.load_from(&source).await;

        assert!(matches!(
            view.status(),
            ViewStatus::Failed(FetchError::Status { status: 502, .. })
        ));
        assert_ne!(view.status(), ViewStatus::NoMatches);
        assert_ne!(view.status(), ViewStatus::NoRecords);
    }

    #[tokio::test]
    async fn test_filters_survive_reload() {
        let source = InMemoryRecordSource::new(grade_records());
        let mut view = grades_view();
        view.set_filter_value("course", "X").unwrap();

        source
            .replace(vec![
                Record::new("4").with("name", "D").with("course", "X").with("grade", 70),
                Record::new("5").with("name", "E").with("course", "Y").with("grade", 95),
            ])
            .unwrap();
        view.load_from(&source).await;

        assert_eq!(keys(view.visible_records()), vec!["4"]);
        assert_eq!(view.aggregate().average("grade"), Some(70.0));
    }

    #[test]
    fn test_last_request_wins() {
        let mut view = grades_view();
        let slow = view.begin_load();
        let fast = view.begin_load();

        assert!(view.finish_load(fast, Ok(vec![Record::new("new").with("grade", 50)])));
        assert!(!view.finish_load(slow, Err(FetchError::Transport {
            message: "timed out".to_string(),
        })));

        assert_eq!(view.status(), ViewStatus::Ready);
        assert_eq!(keys(view.all_records()), vec!["new"]);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut view = grades_view();
        view.set_filter_value("course", "X").unwrap();
        view.set_sort("grade").unwrap();

        let json = serde_json::to_value(view.snapshot()).unwrap();
        assert_eq!(json["view"], "grades");
        assert_eq!(json["status"]["state"], "ready");
        assert_eq!(json["pagination"]["total"], 2);
        assert_eq!(json["sort"]["field"], "grade");
        assert_eq!(json["sort"]["direction"], "ascending");
        assert_eq!(json["records"][0]["key"], "1");
        assert_eq!(json["aggregate"]["statistics"]["average:grade"], 87.5);
        assert_eq!(json["filters"]["course"]["kind"], "text");
    }
}
