//! # lms-listview
//!
//! Filterable, sortable, paginated list views with summary statistics, for
//! the list pages of a learning-management dashboard (courses, grades,
//! quizzes, assignments, notifications, schedule).
//!
//! ## Features
//!
//! - **Typed fields**: string, number, date, boolean and enum fields declared once per view
//! - **Predicates**: case-insensitive search, exact match with an "All" sentinel, inclusive ranges, enum membership
//! - **Stable sorting**: single-column, click-to-toggle direction, ties keep their order
//! - **Statistics**: count, average, sum, min/max with an explicit "no data" state, percentages, group counts
//! - **Pagination**: page slicing with total/has_next/has_prev metadata
//! - **Configuration-Based**: describe a view in YAML
//! - **Record sources**: in-memory sample data or a REST endpoint (`http` feature)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use listview::prelude::*;
//!
//! let schema = Schema::new("id")
//!     .with_field(FieldSpec::string("name"))
//!     .with_field(FieldSpec::string("course").with_mode(MatchMode::Equals))
//!     .with_field(FieldSpec::number("grade"));
//!
//! let mut view = ViewController::new("grades", schema)
//!     .with_aggregate(AggregateSpec::average("grade"));
//! view.set_records(records)?;
//!
//! view.set_filter_value("course", "X")?;
//! view.set_sort("grade")?;            // ascending
//! view.set_sort("grade")?;            // descending
//! let average = view.aggregate().average("grade");
//! ```

pub mod config;
pub mod core;
pub mod source;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core Types ===
    pub use crate::core::{
        aggregate::{Aggregate, AggregateSpec, Extremum, Statistic},
        controller::{LoadTicket, QueryState, ViewController, ViewSnapshot, ViewStatus},
        derive::{Clock, DerivedField, FixedClock, SystemClock},
        field::{FieldSpec, FieldValue, MatchMode, ValueType},
        predicate::{Predicate, QueryValue},
        query::{PaginatedResponse, PaginationMeta, ViewQuery},
        record::Record,
        schema::Schema,
        sort::{SortDirection, SortSpec},
    };

    // === Engines ===
    pub use crate::core::{
        aggregate::aggregate,
        filter::{all_of, filter},
        predicate::{build_predicate, build_search_predicate},
        query::paginate,
        sort::sort,
    };

    // === Errors ===
    pub use crate::core::error::{
        ConfigError, ErrorResponse, FetchError, ListViewError, QueryError,
    };

    // === Config ===
    pub use crate::config::{AggregateConfig, AggregateKind, SortConfig, ViewConfig};

    // === Sources ===
    #[cfg(feature = "http")]
    pub use crate::source::HttpRecordSource;
    pub use crate::source::{InMemoryRecordSource, RecordSource};

    // === External dependencies ===
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
}
