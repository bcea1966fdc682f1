//! Typed error handling for list views
//!
//! Errors are grouped by the layer that raises them so callers can react
//! to each case specifically instead of matching on strings.
//!
//! # Error Categories
//!
//! - [`QueryError`]: a filter, search or sort request that cannot be built
//! - [`FetchError`]: the record source failed or returned unusable data
//! - [`ConfigError`]: a view configuration could not be loaded or is inconsistent
//!
//! # Example
//!
//! ```rust,ignore
//! match controller.set_filter_value("due_date", QueryValue::text("soon")) {
//!     Ok(()) => {}
//!     Err(QueryError::TypeMismatch { field, .. }) => {
//!         println!("'{}' expects a date", field);
//!     }
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! ```

use crate::core::field::{MatchMode, ValueType};
use serde::Serialize;
use thiserror::Error;

/// The main error type for the crate
///
/// Each variant wraps the more specific error of one layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ListViewError {
    /// Query construction errors (filters, search, sort)
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Record source errors
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ListViewError {
    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ListViewError::Query(e) => e.error_code(),
            ListViewError::Fetch(e) => e.error_code(),
            ListViewError::Config(e) => e.error_code(),
        }
    }

    /// Convert to an error response for the presentation layer
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
        }
    }
}

/// Error payload handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

// =============================================================================
// Query Errors
// =============================================================================

/// Errors raised while building predicates or sort specs
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// The value's type does not match the field's declared type
    #[error("Type mismatch on field '{field}': expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: ValueType,
        found: String,
    },

    /// The field is not declared in the view schema
    #[error("Unknown field: {field}")]
    UnknownField { field: String },

    /// The comparison mode cannot be applied to the field's type
    #[error("Field '{field}' of type {value_type} does not support {mode} matching")]
    UnsupportedMode {
        field: String,
        mode: MatchMode,
        value_type: ValueType,
    },

    /// Lower bound is greater than the upper bound
    #[error("Invalid range on field '{field}': {min} is greater than {max}")]
    InvalidRange {
        field: String,
        min: String,
        max: String,
    },

    /// The value is not one of the enum's declared variants
    #[error("Invalid value '{value}' for field '{field}': expected one of {allowed:?}")]
    InvalidVariant {
        field: String,
        value: String,
        allowed: Vec<String>,
    },
}

impl QueryError {
    pub fn error_code(&self) -> &'static str {
        match self {
            QueryError::TypeMismatch { .. } => "TYPE_MISMATCH",
            QueryError::UnknownField { .. } => "UNKNOWN_FIELD",
            QueryError::UnsupportedMode { .. } => "UNSUPPORTED_MODE",
            QueryError::InvalidRange { .. } => "INVALID_RANGE",
            QueryError::InvalidVariant { .. } => "INVALID_VARIANT",
        }
    }

    /// Field the error relates to
    pub fn field(&self) -> &str {
        match self {
            QueryError::TypeMismatch { field, .. }
            | QueryError::UnknownField { field }
            | QueryError::UnsupportedMode { field, .. }
            | QueryError::InvalidRange { field, .. }
            | QueryError::InvalidVariant { field, .. } => field,
        }
    }
}

// =============================================================================
// Fetch Errors
// =============================================================================

/// Errors raised by a record source
///
/// A fetch failure is always reported as its own view state, never as an
/// empty result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// The backend answered with a non-2xx status
    #[error("Request to '{url}' failed with status {status}")]
    Status { status: u16, url: String },

    /// The backend could not be reached
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// The response body is not a JSON array of objects
    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    /// One of the returned records does not match the view schema
    #[error("Record {index} is invalid: {source}")]
    InvalidRecord {
        index: usize,
        #[source]
        source: QueryError,
    },
}

impl FetchError {
    pub fn error_code(&self) -> &'static str {
        match self {
            FetchError::Status { .. } => "FETCH_STATUS",
            FetchError::Transport { .. } => "FETCH_TRANSPORT",
            FetchError::Decode { .. } => "FETCH_DECODE",
            FetchError::InvalidRecord { .. } => "FETCH_INVALID_RECORD",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
        }
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to view configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read config file '{path}': {message}")]
    Io { path: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse config{}: {message}", file_suffix(.file))]
    Parse {
        file: Option<String>,
        message: String,
    },

    /// A field referenced in the configuration is not declared
    #[error("Unknown field '{field}' referenced in {context}")]
    UnknownField { field: String, context: String },

    /// A field is declared twice
    #[error("Field '{field}' is declared more than once")]
    DuplicateField { field: String },

    /// Invalid value in configuration
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

fn file_suffix(file: &Option<String>) -> String {
    file.as_ref()
        .map(|f| format!(" file '{}'", f))
        .unwrap_or_default()
}

impl ConfigError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => "CONFIG_IO",
            ConfigError::Parse { .. } => "CONFIG_PARSE",
            ConfigError::UnknownField { .. } => "CONFIG_UNKNOWN_FIELD",
            ConfigError::DuplicateField { .. } => "CONFIG_DUPLICATE_FIELD",
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mismatch_message() {
        let err = QueryError::TypeMismatch {
            field: "due_date".to_string(),
            expected: ValueType::Date,
            found: "string \"soon\"".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Type mismatch on field 'due_date': expected date, found string \"soon\""
        );
        assert_eq!(err.error_code(), "TYPE_MISMATCH");
        assert_eq!(err.field(), "due_date");
    }

    #[test]
    fn test_wrapped_error_code_delegates() {
        let err: ListViewError = FetchError::Status {
            status: 503,
            url: "http://localhost/courses".to_string(),
        }
        .into();
        assert_eq!(err.error_code(), "FETCH_STATUS");

        let response = err.to_response();
        assert_eq!(response.code, "FETCH_STATUS");
        assert!(response.message.contains("503"));
    }

    #[test]
    fn test_invalid_record_keeps_source() {
        use std::error::Error;

        let err = FetchError::InvalidRecord {
            index: 2,
            source: QueryError::UnknownField {
                field: "x".to_string(),
            },
        };
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("Record 2 is invalid"));
    }

    #[test]
    fn test_parse_error_message_with_and_without_file() {
        let with_file = ConfigError::Parse {
            file: Some("grades.yaml".to_string()),
            message: "bad indent".to_string(),
        };
        assert_eq!(
            with_file.to_string(),
            "Failed to parse config file 'grades.yaml': bad indent"
        );

        let without = ConfigError::Parse {
            file: None,
            message: "bad indent".to_string(),
        };
        assert_eq!(without.to_string(), "Failed to parse config: bad indent");
    }
}
