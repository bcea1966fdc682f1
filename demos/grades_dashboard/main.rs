//! Grades dashboard example
//!
//! This example demonstrates:
//! - Describing a view in YAML (fields, search, default sort, statistics)
//! - Loading records from an in-memory source
//! - Filtering by course and watching the statistics follow
//! - Click-to-toggle sorting and pagination

use anyhow::Result;
use listview::prelude::*;
use serde_json::json;
use tracing_subscriber::EnvFilter;

const GRADES_VIEW: &str = r#"
name: grades
fields:
  - name: student
    type: string
  - name: course
    type: string
    mode: equals
  - name: grade
    type: number
search_fields: [student, course]
default_sort:
  field: student
page_size: 3
derived:
  - kind: threshold
    source: grade
    target: result
    at_least: 70
    pass: Passed
    fail: Failed
    missing: Pending
aggregates:
  - kind: average
    field: grade
  - kind: min
    field: grade
  - kind: max
    field: grade
  - kind: percentage
    field: result
    label: passed
    value: { kind: text, value: Passed }
"#;

fn print_view(title: &str, view: &ViewController) {
    let pagination = view.pagination();
    println!(
        "\n📋 {} ({} of {} records, page {}/{})",
        title,
        view.visible_records().len(),
        pagination.total,
        pagination.page,
        pagination.total_pages.max(1)
    );
    for record in view.visible_records() {
        let field = |name: &str| {
            record
                .get(name)
                .map(ToString::to_string)
                .unwrap_or_else(|| "-".to_string())
        };
        println!(
            "   {:<8} {:<12} {:>6} {}",
            field("student"),
            field("course"),
            field("grade"),
            field("result")
        );
    }

    let stats = view.aggregate();
    let show = |e: Option<Extremum>| match e.and_then(|e| e.value()) {
        Some(v) => v.to_string(),
        None => "no data".to_string(),
    };
    println!(
        "   average: {:.1}  min: {}  max: {}  passed: {}%",
        stats.average("grade").unwrap_or_default(),
        show(stats.min("grade")),
        show(stats.max("grade")),
        stats.percentage("passed").unwrap_or_default()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("listview=info".parse()?))
        .init();

    println!("🎓 Grades Dashboard Example");
    println!("===========================");

    let config = ViewConfig::from_yaml_str(GRADES_VIEW)?;
    let mut view = ViewController::from_config(config)?;

    let source = InMemoryRecordSource::from_json(json!([
        {"id": 1, "student": "Alice", "course": "Algebra", "grade": 85},
        {"id": 2, "student": "Bruno", "course": "Biology", "grade": 60},
        {"id": 3, "student": "Chen", "course": "Algebra", "grade": 90},
        {"id": 4, "student": "Dana", "course": "History", "grade": null},
        {"id": 5, "student": "Emil", "course": "Biology", "grade": 77},
        {"id": 6, "student": "Fatou", "course": "History", "grade": 68}
    ]));
    view.load_from(&source).await;
    print_view("All grades", &view);

    view.set_page(2);
    print_view("Second page", &view);

    view.set_filter_value("course", "Algebra")?;
    print_view("Algebra only", &view);

    view.set_sort("grade")?;
    view.set_sort("grade")?;
    print_view("Algebra, best first", &view);

    view.set_filter_value("course", "Chemistry")?;
    println!("\n🔎 Chemistry: {}", view.status().as_str());

    if let Err(err) = view.set_filter_value("grade", "excellent") {
        println!("⚠️  Rejected filter: {} ({})", err, err.error_code());
    }

    view.reset_filters();
    view.set_search_text("bio")?;
    print_view("Search \"bio\"", &view);

    view.reset_filters();
    view.set_filter_value("grade", QueryValue::between(70, 100))?;
    print_view("Grades 70 to 100", &view);

    println!("\n📦 Snapshot:");
    println!("{}", serde_json::to_string_pretty(&view.snapshot())?);

    Ok(())
}
