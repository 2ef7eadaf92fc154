//! Table view API endpoints.

use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{error, revision, success, ApiResult};
use crate::errors::AppError;
use crate::models::{FilterCriteria, SortColumn, SortParts, SortState};
use crate::session::TableView;
use crate::window::Window;
use crate::{AppState, LoadStatus};

/// Request body for updating the search text.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQueryRequest {
    pub query: String,
    /// New debounce delay, used from this input onwards
    #[serde(default)]
    pub delay_ms: Option<u64>,
}

/// Current search text, as typed and as applied.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryState {
    pub query: String,
    pub settled_query: String,
    /// A debounced value is waiting to be applied
    pub pending: bool,
    pub delay_ms: u64,
}

/// Request body for scroll and resize notifications.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateViewportRequest {
    #[serde(default)]
    pub scroll_offset: Option<f64>,
    #[serde(default)]
    pub viewport_height: Option<f64>,
}

/// GET /api/view - Visible rows and derived table state.
pub async fn get_view(State(state): State<AppState>) -> ApiResult<TableView> {
    let store = state.store.read().await;
    let revision_id = store.revision();

    match &*state.load.read().await {
        LoadStatus::Ready => {}
        LoadStatus::Loading => {
            return error(
                AppError::Unavailable("Records are still loading".to_string()),
                revision_id,
            )
        }
        LoadStatus::Failed(err) => {
            return error(
                AppError::Unavailable(format!(
                    "Records could not be loaded ({}). Retry with POST /api/reload",
                    err.message()
                )),
                revision_id,
            )
        }
    }

    let view = state.session.lock().await.view(&store, &state.claims);
    success(view, revision_id)
}

/// PUT /api/view/query - Update the search text.
pub async fn update_query(
    State(state): State<AppState>,
    Json(request): Json<UpdateQueryRequest>,
) -> ApiResult<QueryState> {
    let revision_id = revision(&state).await;

    let mut session = state.session.lock().await;
    if let Some(delay_ms) = request.delay_ms {
        session.set_query_delay(Duration::from_millis(delay_ms));
    }
    session.set_query(request.query);

    let query = session.query();
    success(
        QueryState {
            query: query.immediate().to_string(),
            settled_query: query.settled(),
            pending: query.is_pending(),
            delay_ms: query.delay().as_millis() as u64,
        },
        revision_id,
    )
}

/// PUT /api/view/criteria - Replace the filter criteria.
pub async fn update_criteria(
    State(state): State<AppState>,
    Json(criteria): Json<FilterCriteria>,
) -> ApiResult<FilterCriteria> {
    let revision_id = revision(&state).await;

    let mut session = state.session.lock().await;
    session.set_criteria(criteria);

    success(session.criteria().clone(), revision_id)
}

/// DELETE /api/view/criteria - Clear every filter.
pub async fn clear_criteria(State(state): State<AppState>) -> ApiResult<FilterCriteria> {
    let revision_id = revision(&state).await;

    let mut session = state.session.lock().await;
    session.clear_criteria();

    success(session.criteria().clone(), revision_id)
}

/// PUT /api/view/sort - Set the sort column and direction.
pub async fn update_sort(
    State(state): State<AppState>,
    Json(parts): Json<SortParts>,
) -> ApiResult<SortState> {
    let revision_id = revision(&state).await;

    let mut session = state.session.lock().await;
    session.set_sort(SortState::from(parts));

    success(session.sort(), revision_id)
}

/// POST /api/view/sort/:column - Cycle sorting on a column header.
pub async fn toggle_sort(
    State(state): State<AppState>,
    Path(column): Path<SortColumn>,
) -> ApiResult<SortState> {
    let revision_id = revision(&state).await;

    let sort = state.session.lock().await.toggle_sort(column);
    success(sort, revision_id)
}

/// PUT /api/view/viewport - Report scroll position and container size.
pub async fn update_viewport(
    State(state): State<AppState>,
    Json(request): Json<UpdateViewportRequest>,
) -> ApiResult<Window> {
    let revision_id = revision(&state).await;

    if let Some(height) = request.viewport_height {
        if !(height.is_finite() && height >= 0.0) {
            return error(
                AppError::BadRequest("viewportHeight must be a non-negative number".to_string()),
                revision_id,
            );
        }
    }
    if let Some(offset) = request.scroll_offset {
        if !offset.is_finite() {
            return error(
                AppError::BadRequest("scrollOffset must be a number".to_string()),
                revision_id,
            );
        }
    }

    let store = state.store.read().await;
    let mut session = state.session.lock().await;
    if let Some(height) = request.viewport_height {
        session.measure(height);
    }
    if let Some(offset) = request.scroll_offset {
        session.on_scroll(offset);
    }

    let window = session.view(&store, &state.claims).window;
    success(window, revision_id)
}
