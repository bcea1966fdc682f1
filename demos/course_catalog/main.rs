//! Course catalog example
//!
//! This example demonstrates:
//! - Building a view in code instead of YAML
//! - Enum fields with an "All" option
//! - Restoring a whole query at once (e.g. from a URL)
//! - Handling a failed fetch as its own state
//! - Fetching from a REST endpoint when built with `--features http`

use anyhow::Result;
use listview::prelude::*;
use tracing_subscriber::EnvFilter;

fn catalog_schema() -> Schema {
    Schema::new("id")
        .with_field(FieldSpec::string("title").with_label("Course"))
        .with_field(FieldSpec::string("instructor"))
        .with_field(FieldSpec::enumeration("level", ["Beginner", "Intermediate", "Advanced"]))
        .with_field(FieldSpec::number("enrolled"))
        .with_field(FieldSpec::boolean("published"))
}

fn catalog() -> Vec<Record> {
    vec![
        Record::new("js")
            .with("title", "JavaScript Basics")
            .with("instructor", "R. Osei")
            .with("level", "Beginner")
            .with("enrolled", 120)
            .with("published", true),
        Record::new("py")
            .with("title", "Python 101")
            .with("instructor", "M. Laurent")
            .with("level", "Beginner")
            .with("enrolled", 240)
            .with("published", true),
        Record::new("java")
            .with("title", "Advanced Java")
            .with("instructor", "K. Tanaka")
            .with("level", "Advanced")
            .with("enrolled", 45)
            .with("published", true),
        Record::new("db")
            .with("title", "Database Design")
            .with("instructor", "R. Osei")
            .with("level", "Intermediate")
            .with("enrolled", 80)
            .with("published", false),
    ]
}

fn print_titles(label: &str, view: &ViewController) {
    let titles: Vec<String> = view
        .visible_records()
        .iter()
        .filter_map(|r| r.get("title").map(ToString::to_string))
        .collect();
    println!("{:<28} {:?}", label, titles);
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("listview=info".parse()?))
        .init();

    println!("📚 Course Catalog Example");
    println!("=========================\n");

    let schema = catalog_schema();
    let published = build_predicate(schema.field("published")?, &QueryValue::exact(true))?;

    let mut view = ViewController::new("courses", schema)
        .with_search_fields(["title", "instructor"])?
        .with_default_sort("title", SortDirection::Ascending)?
        .with_aggregate(AggregateSpec::sum("enrolled"))
        .with_aggregate(AggregateSpec::group_counts("level"))
        .with_aggregate(AggregateSpec::percentage("published", published));

    let source = InMemoryRecordSource::new(catalog());
    view.load_from(&source).await;
    print_titles("All courses:", &view);

    view.set_search_text("java")?;
    print_titles("Search \"java\":", &view);

    view.set_search_text("")?;
    view.set_filter_value("level", "beginner")?;
    print_titles("Beginner:", &view);

    view.set_filter_value("level", "All")?;
    print_titles("Level = All:", &view);

    view.set_filter_value("level", QueryValue::OneOf(vec!["Beginner".into(), "Advanced".into()]))?;
    print_titles("Beginner or Advanced:", &view);

    println!(
        "\nEnrolled: {}  published: {}%  by level: {:?}",
        view.aggregate().sum("enrolled").unwrap_or_default(),
        view.aggregate().percentage("published").unwrap_or_default(),
        view.aggregate().groups("level")
    );

    // query restored from a bookmarked URL
    let query: ViewQuery = serde_json::from_str(
        r#"{"search": "osei", "sort": "enrolled:desc", "limit": 1, "page": 2}"#,
    )?;
    view.apply_query(&query)?;
    print_titles("\nRestored query, page 2:", &view);
    println!("Pagination: {:?}", view.pagination());

    source.fail_with(FetchError::Status {
        status: 503,
        url: "https://lms.example.org/api/courses".to_string(),
    })?;
    view.load_from(&source).await;
    match view.status() {
        ViewStatus::Failed(err) => println!("\n❌ Load failed: {} ({})", err, err.error_code()),
        other => println!("\nUnexpected state: {}", other.as_str()),
    }

    #[cfg(feature = "http")]
    load_remote(&mut view).await?;

    Ok(())
}

/// Load the catalog from `COURSES_URL`, forwarding `COURSES_TOKEN` if set
#[cfg(feature = "http")]
async fn load_remote(view: &mut ViewController) -> Result<()> {
    let Ok(url) = std::env::var("COURSES_URL") else {
        return Ok(());
    };
    let mut source = HttpRecordSource::new(url)?;
    if let Ok(token) = std::env::var("COURSES_TOKEN") {
        source = source.with_bearer_token(token);
    }
    view.load_from(&source).await;
    println!("\n🌐 Remote catalog: {}", view.status().as_str());
    print_titles("Remote courses:", view);
    Ok(())
}
