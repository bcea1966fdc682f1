//! Record sources feeding list views
//!
//! The data source is an external collaborator: the controller only asks it
//! for records and reports failures as their own view state.

#[cfg(feature = "http")]
pub mod http;
pub mod in_memory;

#[cfg(feature = "http")]
pub use http::HttpRecordSource;
pub use in_memory::InMemoryRecordSource;

use crate::core::error::FetchError;
use crate::core::record::Record;
use crate::core::schema::Schema;
use async_trait::async_trait;

/// Source of the records displayed by a view
///
/// Implementations convert whatever they fetch into records of the given
/// schema. Nothing is retried here; retry policy belongs to the source.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch the full collection
    async fn fetch(&self, schema: &Schema) -> Result<Vec<Record>, FetchError>;
}

/// Convert a decoded JSON array into records
pub fn records_from_json(
    schema: &Schema,
    payload: &serde_json::Value,
) -> Result<Vec<Record>, FetchError> {
    let items = payload.as_array().ok_or_else(|| FetchError::Decode {
        message: "expected a JSON array of records".to_string(),
    })?;
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            schema
                .record_from_json(item)
                .map_err(|source| FetchError::InvalidRecord { index, source })
        })
        .collect()
}
