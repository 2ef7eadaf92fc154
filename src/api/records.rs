//! Record API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{error, revision, success, ApiResult};
use crate::errors::AppError;
use crate::models::{ClaimOutcome, Record, UpdateClaimRequest};
use crate::pipeline;
use crate::AppState;

/// Result of a reload from the upstream.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadSummary {
    pub records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded_at: Option<DateTime<Utc>>,
}

/// GET /api/records - List all records in load order.
pub async fn list_records(State(state): State<AppState>) -> ApiResult<Vec<Record>> {
    let store = state.store.read().await;
    success(store.records().to_vec(), store.revision())
}

/// GET /api/records/:id - Get a single record.
pub async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Record> {
    let store = state.store.read().await;

    match store.get(&id) {
        Some(record) => success(record.clone(), store.revision()),
        None => error(
            AppError::NotFound(format!("Record {} not found", id)),
            store.revision(),
        ),
    }
}

/// POST /api/records/:id/claims - Toggle a claim with optimistic update.
pub async fn update_claim(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateClaimRequest>,
) -> ApiResult<ClaimOutcome> {
    let result = state.claims.mutate(&id, request.field, request.value).await;
    let revision_id = revision(&state).await;

    match result {
        Ok(outcome) => success(outcome, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/reload - Replace the collection from the upstream.
pub async fn reload_records(State(state): State<AppState>) -> ApiResult<ReloadSummary> {
    let result = crate::load_records(&state).await;

    let store = state.store.read().await;
    match result {
        Ok(records) => success(
            ReloadSummary {
                records,
                loaded_at: store.loaded_at(),
            },
            store.revision(),
        ),
        Err(e) => error(e, store.revision()),
    }
}

/// GET /api/groups - Distinct club names for the group filter.
pub async fn list_groups(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    let store = state.store.read().await;
    success(pipeline::available_groups(store.records()), store.revision())
}
