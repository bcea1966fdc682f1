//! Tests for the HTTP record source against a local axum server

#![cfg(feature = "http")]

use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode},
    routing::get,
};
use listview::prelude::*;
use serde_json::{Value, json};

// =============================================================================
// Test Server
// =============================================================================

async fn courses() -> Json<Value> {
    Json(json!([
        {"id": "js", "title": "JavaScript Basics", "credits": 3},
        {"id": "py", "title": "Python 101", "credits": 4}
    ]))
}

async fn broken() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn not_a_list() -> Json<Value> {
    Json(json!({"data": []}))
}

async fn private(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some("Bearer session-token") => Ok(Json(json!([{"id": "n1", "title": "Welcome"}]))),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

async fn spawn_server() -> String {
    let app = Router::new()
        .route("/courses", get(courses))
        .route("/broken", get(broken))
        .route("/object", get(not_a_list))
        .route("/private", get(private));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn schema() -> Schema {
    Schema::new("id")
        .with_field(FieldSpec::string("title"))
        .with_field(FieldSpec::number("credits"))
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_fetch_json_array() {
    let base = spawn_server().await;
    let source = HttpRecordSource::new(format!("{}/courses", base)).unwrap();

    let records = source.fetch(&schema()).await.unwrap();
    let keys: Vec<&str> = records.iter().map(Record::key).collect();
    assert_eq!(keys, vec!["js", "py"]);
    assert_eq!(
        records[1].get("credits").and_then(FieldValue::as_number),
        Some(4.0)
    );
}

#[tokio::test]
async fn test_error_status_is_surfaced() {
    let base = spawn_server().await;
    let url = format!("{}/broken", base);
    let source = HttpRecordSource::new(url.clone()).unwrap();

    let err = source.fetch(&schema()).await.unwrap_err();
    assert_eq!(err, FetchError::Status { status: 500, url });
}

#[tokio::test]
async fn test_non_array_body_is_decode_error() {
    let base = spawn_server().await;
    let source = HttpRecordSource::new(format!("{}/object", base)).unwrap();

    let err = source.fetch(&schema()).await.unwrap_err();
    assert_eq!(err.error_code(), "FETCH_DECODE");
}

#[tokio::test]
async fn test_bearer_token_is_forwarded() {
    let base = spawn_server().await;
    let url = format!("{}/private", base);

    let anonymous = HttpRecordSource::new(url.clone()).unwrap();
    let err = anonymous.fetch(&schema()).await.unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 401, .. }));

    let signed_in = HttpRecordSource::new(url)
        .unwrap()
        .with_bearer_token("session-token");
    assert_eq!(signed_in.fetch(&schema()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_view_reports_failed_fetch() {
    let base = spawn_server().await;
    let source = HttpRecordSource::new(format!("{}/broken", base)).unwrap();
    let mut view = ViewController::new("courses", schema());

    view.load_from(&source).await;
    assert!(matches!(
        view.status(),
        ViewStatus::Failed(FetchError::Status { status: 500, .. })
    ));
    assert_eq!(view.snapshot().status.state, "failed");
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let source = HttpRecordSource::new(format!("http://{}/courses", addr)).unwrap();
    let err = source.fetch(&schema()).await.unwrap_err();
    assert_eq!(err.error_code(), "FETCH_TRANSPORT");
}
