//! Claim status API endpoints.

use axum::extract::State;

use super::{revision, success, ApiResult};
use crate::models::{ClaimError, MutationKey};
use crate::AppState;

/// GET /api/claims/pending - Keys with a claim in flight.
pub async fn list_pending(State(state): State<AppState>) -> ApiResult<Vec<MutationKey>> {
    let revision_id = revision(&state).await;
    success(state.claims.pending(), revision_id)
}

/// GET /api/claims/error - The last claim failure, if not dismissed.
pub async fn get_claim_error(State(state): State<AppState>) -> ApiResult<Option<ClaimError>> {
    let revision_id = revision(&state).await;
    success(state.claims.error(), revision_id)
}

/// DELETE /api/claims/error - Dismiss the claim failure notification.
pub async fn clear_claim_error(State(state): State<AppState>) -> ApiResult<()> {
    let revision_id = revision(&state).await;
    state.claims.clear_error();
    success((), revision_id)
}
