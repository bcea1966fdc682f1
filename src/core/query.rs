//! Query parameters and pagination utilities

use crate::core::predicate::QueryValue;
use crate::core::sort::SortDirection;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Largest accepted page size
pub const MAX_PAGE_SIZE: usize = 100;

/// Full query of a view, as restored from a URL or saved state
///
/// All parameters have sensible defaults.
///
/// # Example
/// ```rust,ignore
/// let query: ViewQuery = serde_json::from_str(r#"{
///     "search": "java",
///     "filters": {"status": {"kind": "text", "value": "Active"}},
///     "sort": "due_date:desc",
///     "page": 2
/// }"#)?;
/// controller.apply_query(&query)?;
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ViewQuery {
    /// Search text applied to the view's search fields
    pub search: String,

    /// Filter value per field
    pub filters: IndexMap<String, QueryValue>,

    /// Sort field and direction
    ///
    /// # Format
    /// - `field:asc` or `field` (ascending)
    /// - `field:desc` (descending)
    pub sort: Option<String>,

    /// Page number (starts at 1)
    #[serde(default = "default_page")]
    pub page: usize,

    /// Number of items per page, the view's own size when absent
    pub limit: Option<usize>,
}

fn default_page() -> usize {
    1
}

impl ViewQuery {
    /// Get page number, ensuring minimum of 1
    pub fn page(&self) -> usize {
        self.page.max(1)
    }

    /// Get limit, clamped to `1..=MAX_PAGE_SIZE`
    pub fn limit(&self) -> Option<usize> {
        self.limit.map(clamp_page_size)
    }

    /// Split the sort expression into field and direction
    ///
    /// An unrecognized direction falls back to ascending.
    pub fn sort_parts(&self) -> Option<(&str, SortDirection)> {
        let sort = self.sort.as_deref()?.trim();
        if sort.is_empty() {
            return None;
        }
        Some(match sort.split_once(':') {
            Some((field, dir)) => (field, SortDirection::parse(dir).unwrap_or_default()),
            None => (sort, SortDirection::Ascending),
        })
    }
}

pub fn clamp_page_size(size: usize) -> usize {
    size.clamp(1, MAX_PAGE_SIZE)
}

/// Paginated response structure
///
/// Wraps one page of data with metadata about pagination state.
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    /// The paginated data
    pub data: Vec<T>,

    /// Pagination metadata
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    /// Current page number (starts at 1)
    pub page: usize,

    /// Number of items per page
    pub limit: usize,

    /// Total number of items (after filters)
    pub total: usize,

    /// Total number of pages
    pub total_pages: usize,

    /// Whether there is a next page
    pub has_next: bool,

    /// Whether there is a previous page
    pub has_prev: bool,
}

impl PaginationMeta {
    /// Create pagination metadata from calculation
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        let page = page.max(1);
        // Ensure limit is at least 1 to avoid division by zero
        let limit = limit.max(1);
        let total_pages = if total == 0 { 0 } else { total.div_ceil(limit) };
        let start = (page - 1).saturating_mul(limit);

        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: start.saturating_add(limit) < total,
            has_prev: page > 1,
        }
    }

    /// Index range of the page within the full collection
    ///
    /// A page past the end yields an empty range.
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = (self.page - 1).saturating_mul(self.limit).min(self.total);
        let end = start.saturating_add(self.limit).min(self.total);
        start..end
    }
}

/// Slice one page out of an ordered collection
pub fn paginate<T: Clone>(items: &[T], page: usize, limit: usize) -> PaginatedResponse<T> {
    let pagination = PaginationMeta::new(page, limit, items.len());
    PaginatedResponse {
        data: items[pagination.range()].to_vec(),
        pagination,
    }
}
