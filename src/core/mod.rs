//! Core module containing the list view engines and their types

pub mod aggregate;
pub mod controller;
pub mod derive;
pub mod error;
pub mod field;
pub mod filter;
pub mod predicate;
pub mod query;
pub mod record;
pub mod schema;
pub mod sort;

pub use aggregate::{Aggregate, AggregateSpec, Extremum, Statistic, aggregate};
pub use controller::{LoadTicket, QueryState, ViewController, ViewSnapshot, ViewStatus};
pub use derive::{Clock, DerivedField, FixedClock, SystemClock};
pub use error::{ConfigError, ErrorResponse, FetchError, ListViewError, QueryError};
pub use field::{FieldSpec, FieldValue, MatchMode, ValueType};
pub use filter::{all_of, filter};
pub use predicate::{Predicate, QueryValue, build_predicate, build_search_predicate};
pub use query::{PaginatedResponse, PaginationMeta, ViewQuery, paginate};
pub use record::Record;
pub use schema::Schema;
pub use sort::{SortDirection, SortSpec, sort};
