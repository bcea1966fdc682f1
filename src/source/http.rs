//! HTTP JSON record source
//!
//! Fetches `GET <url>` and expects `200` with a JSON array of objects. Any
//! non-2xx status is surfaced as [`FetchError::Status`], never swallowed.

use crate::core::error::FetchError;
use crate::core::record::Record;
use crate::core::schema::Schema;
use crate::source::{RecordSource, records_from_json};
use async_trait::async_trait;
use std::time::Duration;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Record source backed by a REST endpoint
#[derive(Clone)]
pub struct HttpRecordSource {
    client: reqwest::Client,
    url: String,
    bearer_token: Option<String>,
}

impl HttpRecordSource {
    /// Create a source for the given URL with the default timeout
    pub fn new(url: impl Into<String>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(transport)?;
        Ok(Self::with_client(client, url))
    }

    /// Create a source sharing an existing client
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            bearer_token: None,
        }
    }

    /// Forward an opaque bearer token issued by the session provider
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn transport(err: reqwest::Error) -> FetchError {
    FetchError::Transport {
        message: err.to_string(),
    }
}

#[async_trait]
impl RecordSource for HttpRecordSource {
    async fn fetch(&self, schema: &Schema) -> Result<Vec<Record>, FetchError> {
        let mut request = self.client.get(&self.url);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        tracing::debug!(url = %self.url, "Fetching records");
        let response = request.send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                url = %self.url,
                status = status.as_u16(),
                "Record source returned an error status"
            );
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        let payload: serde_json::Value = response.json().await.map_err(|e| FetchError::Decode {
            message: e.to_string(),
        })?;
        records_from_json(schema, &payload)
    }
}
