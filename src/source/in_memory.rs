//! In-memory record source for testing and development

use crate::core::error::FetchError;
use crate::core::record::Record;
use crate::core::schema::Schema;
use crate::source::{RecordSource, records_from_json};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone)]
enum Contents {
    Records(Vec<Record>),
    Json(serde_json::Value),
    Failure(FetchError),
}

/// In-memory record source
///
/// Holds sample data the way dashboard pages hold mock arrays. Uses RwLock
/// so the contents can be swapped while views hold the source.
#[derive(Clone)]
pub struct InMemoryRecordSource {
    contents: Arc<RwLock<Contents>>,
}

impl InMemoryRecordSource {
    /// Create a source serving the given records
    pub fn new(records: Vec<Record>) -> Self {
        Self::with_contents(Contents::Records(records))
    }

    /// Create a source serving a JSON payload, converted with the view schema
    pub fn from_json(payload: serde_json::Value) -> Self {
        Self::with_contents(Contents::Json(payload))
    }

    /// Create a source that always fails
    pub fn failing(error: FetchError) -> Self {
        Self::with_contents(Contents::Failure(error))
    }

    fn with_contents(contents: Contents) -> Self {
        Self {
            contents: Arc::new(RwLock::new(contents)),
        }
    }

    /// Replace the served records
    pub fn replace(&self, records: Vec<Record>) -> Result<(), FetchError> {
        self.set(Contents::Records(records))
    }

    /// Make every following fetch fail
    pub fn fail_with(&self, error: FetchError) -> Result<(), FetchError> {
        self.set(Contents::Failure(error))
    }

    fn set(&self, contents: Contents) -> Result<(), FetchError> {
        let mut guard = self.contents.write().map_err(|e| FetchError::Transport {
            message: format!("Failed to acquire write lock: {}", e),
        })?;
        *guard = contents;
        Ok(())
    }
}

impl Default for InMemoryRecordSource {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl RecordSource for InMemoryRecordSource {
    async fn fetch(&self, schema: &Schema) -> Result<Vec<Record>, FetchError> {
        let contents = self
            .contents
            .read()
            .map_err(|e| FetchError::Transport {
                message: format!("Failed to acquire read lock: {}", e),
            })?
            .clone();

        match contents {
            Contents::Records(records) => Ok(records),
            Contents::Json(payload) => records_from_json(schema, &payload),
            Contents::Failure(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::FieldSpec;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    fn schema() -> Schema {
        Schema::new("id").with_field(FieldSpec::string("title"))
    }

    #[tokio::test]
    async fn test_fetch_records() {
        let source = InMemoryRecordSource::new(vec![Record::new("1").with("title", "Python 101")]);
        let records = source.fetch(&schema()).await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_json() {
        let source = InMemoryRecordSource::from_json(json!([{"id": 7, "title": "Quiz"}]));
        let records = source.fetch(&schema()).await.unwrap();
        assert_eq!(records[0].key(), "7");
    }

    #[tokio::test]
    async fn test_replace_and_fail() {
        let source = InMemoryRecordSource::default();
        assert!(source.fetch(&schema()).await.unwrap().is_empty());

        assert_ok!(source.replace(vec![Record::new("a"), Record::new("b")]));
        assert_eq!(source.fetch(&schema()).await.unwrap().len(), 2);

        assert_ok!(source.fail_with(FetchError::Transport {
            message: "connection refused".to_string(),
        }));
        let err = assert_err!(source.fetch(&schema()).await);
        assert_eq!(err.error_code(), "FETCH_TRANSPORT");
    }

    #[tokio::test]
    async fn test_clones_share_contents() {
        let source = InMemoryRecordSource::default();
        let view_handle = source.clone();
        source.replace(vec![Record::new("x")]).unwrap();
        assert_eq!(view_handle.fetch(&schema()).await.unwrap().len(), 1);
    }
}
