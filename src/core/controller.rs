//! View controller
//!
//! Owns the query state of one list view and keeps the derived view in sync:
//!
//! ```text
//! records ──▶ filter(predicates) ──┬──▶ sort(sort spec) ──▶ paginate(page) ──▶ visible records
//!                                  └──▶ aggregate ──────────────────────────▶ statistics
//! ```
//!
//! Filter and search changes recompute the statistics; sort and page changes
//! do not, so sorting or paging can never change what is counted.

use crate::config::ViewConfig;
use crate::core::aggregate::{Aggregate, AggregateSpec, aggregate};
use crate::core::derive::{DerivedField, SharedClock, SystemClock};
use crate::core::error::{ConfigError, ErrorResponse, FetchError, ListViewError, QueryError};
use crate::core::field::{FieldSpec, MatchMode};
use crate::core::filter::filter;
use crate::core::predicate::{Predicate, QueryValue, build_predicate, build_search_predicate};
use crate::core::query::{PaginationMeta, ViewQuery, clamp_page_size};
use crate::core::record::Record;
use crate::core::schema::Schema;
use crate::core::sort::{SortDirection, SortSpec, sort};
use crate::source::RecordSource;
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;

/// Identifies one data load; only the newest ticket is accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

/// Lifecycle of the view's data
#[derive(Debug, Clone, PartialEq)]
enum LoadPhase {
    /// Nothing loaded yet
    NotLoaded,
    /// A load is in flight
    Pending(LoadTicket),
    /// Records are available
    Loaded,
    /// The last load failed
    Failed(FetchError),
}

/// What the presentation layer should show
#[derive(Debug, Clone, PartialEq)]
pub enum ViewStatus {
    /// Data has not arrived yet
    Loading,
    /// The record source failed
    Failed(FetchError),
    /// Data arrived but the collection is empty
    NoRecords,
    /// Data arrived but the current filters exclude every record
    NoMatches,
    /// At least one record matches
    Ready,
}

impl ViewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewStatus::Loading => "loading",
            ViewStatus::Failed(_) => "failed",
            ViewStatus::NoRecords => "no_records",
            ViewStatus::NoMatches => "no_matches",
            ViewStatus::Ready => "ready",
        }
    }
}

/// One active filter
#[derive(Debug, Clone)]
pub struct ActiveFilter {
    pub value: QueryValue,
    pub predicate: Predicate,
}

/// The mutable filter, sort and page state of one view
#[derive(Debug, Clone)]
pub struct QueryState {
    search_text: String,
    search: Predicate,
    filters: IndexMap<String, ActiveFilter>,
    sort: Option<SortSpec>,
    page: usize,
}

impl QueryState {
    fn new(sort: Option<SortSpec>) -> Self {
        Self {
            search_text: String::new(),
            search: Predicate::always(),
            filters: IndexMap::new(),
            sort,
            page: 1,
        }
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn filters(&self) -> &IndexMap<String, ActiveFilter> {
        &self.filters
    }

    pub fn filter_value(&self, field: &str) -> Option<&QueryValue> {
        self.filters.get(field).map(|f| &f.value)
    }

    pub fn sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Whether any predicate restricts the view
    pub fn is_filtered(&self) -> bool {
        !self.search.is_identity() || !self.filters.is_empty()
    }

    fn predicates(&self) -> Vec<Predicate> {
        std::iter::once(self.search.clone())
            .chain(self.filters.values().map(|f| f.predicate.clone()))
            .filter(|p| !p.is_identity())
            .collect()
    }
}

/// Sort column and direction as shown to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortState {
    pub field: String,
    pub direction: SortDirection,
}

/// Status as shown to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusView {
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorResponse>,
}

/// Everything the presentation layer needs to render the view
#[derive(Debug, Clone, Serialize)]
pub struct ViewSnapshot {
    pub view: String,
    pub status: StatusView,
    pub records: Vec<Record>,
    pub pagination: PaginationMeta,
    pub aggregate: Aggregate,
    pub sort: Option<SortState>,
    pub search_text: String,
    pub filters: IndexMap<String, QueryValue>,
}

/// Controller of one list view
///
/// # Example
/// ```rust,ignore
/// let mut view = ViewController::from_config(ViewConfig::from_yaml_file("grades.yaml")?)?;
/// view.load_from(&source).await;
/// view.set_filter_value("course", "X")?;
/// view.set_sort("grade")?;
/// for record in view.visible_records() { /* render */ }
/// ```
pub struct ViewController {
    name: String,
    schema: Schema,
    search_fields: Vec<FieldSpec>,
    default_sort: Option<SortSpec>,
    page_size: usize,
    aggregates: Vec<AggregateSpec>,
    derived: Vec<DerivedField>,
    clock: SharedClock,

    phase: LoadPhase,
    last_ticket: u64,
    records: Vec<Record>,

    state: QueryState,
    filtered: Vec<Record>,
    sorted: Vec<Record>,
    aggregate: Aggregate,
}

impl ViewController {
    /// Create a controller over a schema, with no search fields or statistics
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            search_fields: Vec::new(),
            default_sort: None,
            page_size: 10,
            aggregates: Vec::new(),
            derived: Vec::new(),
            clock: Arc::new(SystemClock),
            phase: LoadPhase::NotLoaded,
            last_ticket: 0,
            records: Vec::new(),
            state: QueryState::new(None),
            filtered: Vec::new(),
            sorted: Vec::new(),
            aggregate: Aggregate::default(),
        }
    }

    /// Create a controller from a validated view configuration
    pub fn from_config(config: ViewConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let schema = config.schema();
        let search_fields = config.search_specs(&schema)?;
        let default_sort = config.default_sort_spec(&schema)?;
        let aggregates = config.aggregate_specs(&schema)?;

        let mut controller = Self::new(config.name.clone(), schema);
        controller.search_fields = search_fields;
        controller.page_size = config.page_size();
        controller.aggregates = aggregates;
        controller.derived = config.derived;
        controller.default_sort = default_sort.clone();
        controller.state = QueryState::new(default_sort);
        controller.refilter();
        Ok(controller)
    }

    /// Set the fields matched by the search box
    pub fn with_search_fields<I, S>(mut self, fields: I) -> Result<Self, QueryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.search_fields = fields
            .into_iter()
            .map(|name| self.schema.field(name.as_ref()).cloned())
            .collect::<Result<_, _>>()?;
        for spec in &self.search_fields {
            spec.require_mode(MatchMode::Contains)?;
        }
        Ok(self)
    }

    /// Set the sort applied on mount and on reset
    pub fn with_default_sort(
        mut self,
        field: &str,
        direction: SortDirection,
    ) -> Result<Self, QueryError> {
        let spec = SortSpec {
            field: self.schema.field(field)?.clone(),
            direction,
        };
        self.default_sort = Some(spec.clone());
        self.state.sort = Some(spec);
        self.resort();
        Ok(self)
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = clamp_page_size(page_size);
        self
    }

    pub fn with_aggregate(mut self, spec: AggregateSpec) -> Self {
        self.aggregates.push(spec);
        self.refilter();
        self
    }

    /// Add a derived field; its target is declared in the schema
    pub fn with_derived(mut self, derived: DerivedField) -> Self {
        self.schema.insert(derived.spec());
        self.derived.push(derived);
        self
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    // =========================================================================
    // Read side
    // =========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn query_state(&self) -> &QueryState {
        &self.state
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// All loaded records, after derivation
    pub fn all_records(&self) -> &[Record] {
        &self.records
    }

    /// Records passing every predicate, in input order
    pub fn filtered_records(&self) -> &[Record] {
        &self.filtered
    }

    /// Filtered records in sort order, all pages
    pub fn sorted_records(&self) -> &[Record] {
        &self.sorted
    }

    /// Records on the current page
    pub fn visible_records(&self) -> &[Record] {
        &self.sorted[self.pagination().range()]
    }

    pub fn pagination(&self) -> PaginationMeta {
        PaginationMeta::new(self.state.page, self.page_size, self.sorted.len())
    }

    /// Statistics over the filtered records
    pub fn aggregate(&self) -> &Aggregate {
        &self.aggregate
    }

    pub fn status(&self) -> ViewStatus {
        match &self.phase {
            LoadPhase::Failed(err) => ViewStatus::Failed(err.clone()),
            LoadPhase::NotLoaded | LoadPhase::Pending(_) => ViewStatus::Loading,
            LoadPhase::Loaded if self.records.is_empty() => ViewStatus::NoRecords,
            LoadPhase::Loaded if self.filtered.is_empty() => ViewStatus::NoMatches,
            LoadPhase::Loaded => ViewStatus::Ready,
        }
    }

    /// Serializable state of the view for the presentation layer
    pub fn snapshot(&self) -> ViewSnapshot {
        let status = self.status();
        let error = match &status {
            ViewStatus::Failed(err) => Some(err.to_response()),
            _ => None,
        };
        ViewSnapshot {
            view: self.name.clone(),
            status: StatusView {
                state: status.as_str(),
                error,
            },
            records: self.visible_records().to_vec(),
            pagination: self.pagination(),
            aggregate: self.aggregate.clone(),
            sort: self.state.sort.as_ref().map(|s| SortState {
                field: s.field.name.clone(),
                direction: s.direction,
            }),
            search_text: self.state.search_text.clone(),
            filters: self
                .state
                .filters
                .iter()
                .map(|(k, f)| (k.clone(), f.value.clone()))
                .collect(),
        }
    }

    // =========================================================================
    // Query mutations
    // =========================================================================

    /// Replace the search text; empty text clears the search
    ///
    /// On error the previous search is kept.
    pub fn set_search_text(&mut self, text: impl Into<String>) -> Result<(), QueryError> {
        let text = text.into();
        let search = build_search_predicate(&self.search_fields, &text).inspect_err(|err| {
            tracing::warn!(view = %self.name, error = %err, "Rejected search text");
        })?;
        self.state.search_text = text;
        self.state.search = search;
        self.refilter();
        Ok(())
    }

    /// Replace the filter of one field
    ///
    /// A value that matches everything ("All", empty text) removes the
    /// filter. On error the previous state is kept.
    pub fn set_filter_value(
        &mut self,
        field: &str,
        value: impl Into<QueryValue>,
    ) -> Result<(), QueryError> {
        let value = value.into();
        let predicate = self
            .schema
            .field(field)
            .and_then(|spec| build_predicate(spec, &value))
            .inspect_err(|err| {
                tracing::warn!(
                    view = %self.name,
                    field = %field,
                    error = %err,
                    "Rejected filter value"
                );
            })?;

        if predicate.is_identity() {
            self.state.filters.shift_remove(field);
        } else {
            self.state
                .filters
                .insert(field.to_string(), ActiveFilter { value, predicate });
        }
        self.refilter();
        Ok(())
    }

    /// Remove the filter of one field
    pub fn clear_filter(&mut self, field: &str) {
        if self.state.filters.shift_remove(field).is_some() {
            self.refilter();
        }
    }

    /// Sort by a column
    ///
    /// Clicking the active column flips the direction; any other column
    /// becomes the sort column in ascending order.
    pub fn set_sort(&mut self, field: &str) -> Result<(), QueryError> {
        let spec = self.schema.field(field)?.clone();
        let next = match self.state.sort.take() {
            Some(current) if current.field.name == field => SortSpec {
                field: spec,
                direction: current.direction.toggled(),
            },
            _ => SortSpec::ascending(spec),
        };
        tracing::debug!(
            view = %self.name,
            field = %field,
            direction = %next.direction,
            "Sort changed"
        );
        self.state.sort = Some(next);
        self.resort();
        Ok(())
    }

    /// Set an explicit sort column and direction
    pub fn set_sort_direction(
        &mut self,
        field: &str,
        direction: SortDirection,
    ) -> Result<(), QueryError> {
        let spec = self.schema.field(field)?.clone();
        self.state.sort = Some(SortSpec { field: spec, direction });
        self.resort();
        Ok(())
    }

    /// Go to a page (starting at 1); pages past the end are empty
    pub fn set_page(&mut self, page: usize) {
        self.state.page = page.max(1);
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = clamp_page_size(page_size);
    }

    /// Clear search and filters, restore the default sort, go to page 1
    pub fn reset_filters(&mut self) {
        self.state = QueryState::new(self.default_sort.clone());
        self.refilter();
    }

    /// Replace the whole query at once
    ///
    /// Nothing changes unless every part of the query is valid.
    pub fn apply_query(&mut self, query: &ViewQuery) -> Result<(), ListViewError> {
        let mut state = QueryState::new(self.default_sort.clone());

        state.search = build_search_predicate(&self.search_fields, &query.search)?;
        state.search_text = query.search.clone();

        for (field, value) in &query.filters {
            let predicate = build_predicate(self.schema.field(field)?, value)?;
            if !predicate.is_identity() {
                state.filters.insert(
                    field.clone(),
                    ActiveFilter {
                        value: value.clone(),
                        predicate,
                    },
                );
            }
        }

        if let Some((field, direction)) = query.sort_parts() {
            state.sort = Some(SortSpec {
                field: self.schema.field(field)?.clone(),
                direction,
            });
        }
        state.page = query.page();

        if let Some(limit) = query.limit() {
            self.page_size = limit;
        }
        self.state = state;
        self.refilter();
        Ok(())
    }

    // =========================================================================
    // Data lifecycle
    // =========================================================================

    /// Start a load; any earlier ticket becomes stale
    pub fn begin_load(&mut self) -> LoadTicket {
        self.last_ticket += 1;
        let ticket = LoadTicket(self.last_ticket);
        self.phase = LoadPhase::Pending(ticket);
        ticket
    }

    /// Complete a load started with [`begin_load`](Self::begin_load)
    ///
    /// Returns `false` when the ticket was superseded by a newer load, in
    /// which case the result is dropped.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Record>, FetchError>,
    ) -> bool {
        if ticket != LoadTicket(self.last_ticket) {
            tracing::warn!(
                view = %self.name,
                ticket = ticket.0,
                latest = self.last_ticket,
                "Dropping stale load result"
            );
            return false;
        }

        match result.and_then(|records| self.ingest(records)) {
            Ok(records) => {
                tracing::info!(view = %self.name, count = records.len(), "Records loaded");
                self.records = records;
                self.phase = LoadPhase::Loaded;
            }
            Err(err) => {
                tracing::warn!(view = %self.name, error = %err, "Record load failed");
                self.records.clear();
                self.phase = LoadPhase::Failed(err);
            }
        }
        self.refilter();
        true
    }

    /// Fetch from a record source and load the result
    pub async fn load_from(&mut self, source: &dyn RecordSource) -> bool {
        let ticket = self.begin_load();
        let result = source.fetch(&self.schema).await;
        self.finish_load(ticket, result)
    }

    /// Load records directly, superseding any load in flight
    pub fn set_records(&mut self, records: Vec<Record>) -> Result<(), FetchError> {
        let ticket = self.begin_load();
        self.finish_load(ticket, Ok(records));
        match &self.phase {
            LoadPhase::Failed(err) => Err(err.clone()),
            _ => Ok(()),
        }
    }

    fn ingest(&self, records: Vec<Record>) -> Result<Vec<Record>, FetchError> {
        let now = self.clock.now();
        records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                let mut record = self
                    .schema
                    .conform(record)
                    .map_err(|source| FetchError::InvalidRecord { index, source })?;
                for derived in &self.derived {
                    derived.apply(&mut record, now);
                }
                Ok(record)
            })
            .collect()
    }

    // =========================================================================
    // Recomputation
    // =========================================================================

    fn refilter(&mut self) {
        self.filtered = filter(&self.records, &self.state.predicates());
        self.aggregate = aggregate(&self.filtered, &self.aggregates);
        tracing::debug!(
            view = %self.name,
            total = self.records.len(),
            filtered = self.filtered.len(),
            "View refiltered"
        );
        self.resort();
    }

    fn resort(&mut self) {
        self.sorted = sort(&self.filtered, self.state.sort.as_ref());
    }
}
