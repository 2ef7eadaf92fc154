//! Table session: the orchestrator state behind the dashboard view.
//!
//! Owns the debounced search query, filter criteria, sort state and the
//! virtual list, and derives the visible table from the canonical store on
//! demand. Only the search text is debounced; criteria and sort changes apply
//! on the next view.

use std::time::Duration;

use serde::Serialize;

use crate::claims::ClaimController;
use crate::debounce::DebouncedQuery;
use crate::models::{ClaimError, FilterCriteria, MutationKey, Record, SortColumn, SortState};
use crate::pipeline::{self, ClaimStats};
use crate::store::RecordStore;
use crate::window::{VirtualList, Window, WindowConfig};

/// Derived table state returned to the presentation layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    /// Search text as typed
    pub query: String,
    /// Search text the rows were filtered with
    pub settled_query: String,
    pub criteria: FilterCriteria,
    /// Whether any filter is narrowing the rows
    pub filters_active: bool,
    pub sort: SortState,
    pub window: Window,
    /// Rows inside the window, in view order
    pub rows: Vec<Record>,
    pub matching: usize,
    pub total: usize,
    pub stats: ClaimStats,
    pub available_groups: Vec<String>,
    pub pending: Vec<MutationKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ClaimError>,
}

/// Query, criteria, sort and scroll state of one dashboard table.
#[derive(Debug)]
pub struct TableSession {
    query: DebouncedQuery,
    criteria: FilterCriteria,
    sort: SortState,
    list: VirtualList,
}

impl TableSession {
    pub fn new(debounce: Duration, window: WindowConfig) -> Self {
        Self {
            query: DebouncedQuery::new(debounce),
            criteria: FilterCriteria::default(),
            sort: SortState::default(),
            list: VirtualList::new(window),
        }
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query.set(query);
    }

    /// Quiet period for search input, applied from the next keystroke.
    pub fn set_query_delay(&mut self, delay: Duration) {
        self.query.set_delay(delay);
    }

    pub fn query(&self) -> &DebouncedQuery {
        &self.query
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        self.criteria = criteria;
    }

    pub fn clear_criteria(&mut self) {
        self.criteria.clear();
    }

    pub fn sort(&self) -> SortState {
        self.sort
    }

    pub fn set_sort(&mut self, sort: SortState) {
        self.sort = sort;
    }

    pub fn toggle_sort(&mut self, column: SortColumn) -> SortState {
        self.sort.toggle(column);
        self.sort
    }

    pub fn on_scroll(&mut self, scroll_offset: f64) {
        self.list.on_scroll(scroll_offset);
    }

    pub fn measure(&mut self, viewport_height: f64) {
        self.list.measure(viewport_height);
    }

    /// Run the pipeline over the store and cut out the visible rows.
    pub fn view(&mut self, store: &RecordStore, claims: &ClaimController) -> TableView {
        let settled_query = self.query.settled();
        let matching = pipeline::apply(store.records(), &settled_query, &self.criteria, &self.sort);

        self.list.set_item_count(matching.len());
        let window = self.list.window();
        let rows = matching[window.range()]
            .iter()
            .map(|record| (*record).clone())
            .collect();

        tracing::debug!(
            matching = matching.len(),
            start = window.start,
            end = window.end,
            "Table view computed"
        );

        TableView {
            query: self.query.immediate().to_string(),
            settled_query,
            criteria: self.criteria.clone(),
            filters_active: self.criteria.is_active(),
            sort: self.sort,
            window,
            rows,
            matching: matching.len(),
            total: store.len(),
            stats: ClaimStats::collect(&matching),
            available_groups: pipeline::available_groups(store.records()),
            pending: claims.pending(),
            error: claims.error(),
        }
    }

    /// Cancel timers owned by the session.
    pub fn dispose(&mut self) {
        self.query.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::errors::AppError;
    use crate::models::{ClaimRequest, ClaimResponse, SortDirection};
    use crate::pipeline::tests::record;
    use crate::upstream::MutationSink;
    use crate::window::{UNMEASURED_ROWS, WINDOWING_THRESHOLD};

    struct UnreachableSink;

    #[async_trait]
    impl MutationSink for UnreachableSink {
        async fn submit(&self, _request: &ClaimRequest) -> Result<ClaimResponse, AppError> {
            Err(AppError::Connection("offline".into()))
        }
    }

    fn fixture(count: usize) -> (RecordStore, ClaimController) {
        let mut store = RecordStore::new();
        store
            .replace_all(
                (0..count)
                    .map(|i| record(&format!("R{:04}", i), &format!("Guest {}", i)))
                    .collect(),
            )
            .unwrap();
        let controller = ClaimController::new(RecordStore::new().shared(), Arc::new(UnreachableSink));
        (store, controller)
    }

    #[tokio::test(start_paused = true)]
    async fn test_view_uses_settled_query_only() {
        let (store, claims) = fixture(30);
        let mut session = TableSession::new(Duration::from_millis(300), WindowConfig::new(40.0));

        session.set_query("Guest 2");
        let view = session.view(&store, &claims);
        assert_eq!(view.query, "Guest 2");
        assert_eq!(view.settled_query, "");
        assert_eq!(view.matching, 30);

        tokio::time::sleep(Duration::from_millis(301)).await;
        let view = session.view(&store, &claims);
        assert_eq!(view.settled_query, "Guest 2");
        // Guest 2, Guest 20..29
        assert_eq!(view.matching, 11);
        assert_eq!(view.total, 30);
    }

    #[tokio::test]
    async fn test_criteria_and_sort_apply_immediately() {
        let (mut store, claims) = fixture(5);
        store.update_field("R0003", crate::models::ClaimField::Shirt, true);
        let mut session = TableSession::new(Duration::from_millis(300), WindowConfig::new(40.0));

        session.set_criteria(FilterCriteria {
            shirt_claimed: Some(false),
            ..Default::default()
        });
        session.set_sort(SortState::new(SortColumn::Id, SortDirection::Desc));

        let view = session.view(&store, &claims);
        let ids: Vec<&str> = view.rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["R0004", "R0002", "R0001", "R0000"]);
        assert_eq!(view.stats.total, 4);

        session.clear_criteria();
        assert_eq!(session.view(&store, &claims).matching, 5);
    }

    #[tokio::test]
    async fn test_large_views_are_windowed() {
        let (store, claims) = fixture(WINDOWING_THRESHOLD * 5);
        let mut session = TableSession::new(Duration::from_millis(300), WindowConfig::new(40.0));

        let view = session.view(&store, &claims);
        assert_eq!(view.rows.len(), UNMEASURED_ROWS);
        assert_eq!(view.window.total_height, 500.0 * 40.0);

        session.measure(400.0);
        session.on_scroll(4000.0);
        let view = session.view(&store, &claims);
        assert_eq!(view.window.start, 95);
        assert_eq!(view.rows.first().unwrap().id, "R0095");
        assert_eq!(view.rows.len(), 20);
    }

    #[tokio::test]
    async fn test_toggle_sort_cycles() {
        let mut session = TableSession::new(Duration::from_millis(300), WindowConfig::new(40.0));
        assert_eq!(
            session.toggle_sort(SortColumn::Name).get(),
            Some((SortColumn::Name, SortDirection::Asc))
        );
        session.toggle_sort(SortColumn::Name);
        assert_eq!(session.toggle_sort(SortColumn::Name), SortState::unsorted());
    }
}
