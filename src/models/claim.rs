//! Claim mutation models: the upstream wire contract and controller results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ClaimField, RawRecord};

/// Identifies one in-flight mutation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationKey {
    pub record_id: String,
    pub field: ClaimField,
}

impl MutationKey {
    pub fn new(record_id: impl Into<String>, field: ClaimField) -> Self {
        Self {
            record_id: record_id.into(),
            field,
        }
    }
}

/// Body sent to the upstream mutation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    pub record_id: String,
    pub field_name: ClaimField,
    pub value: bool,
}

/// Server-confirmed claim state of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub record_id: String,
    pub shirt_claimed: bool,
    pub meal_claimed: bool,
}

impl Confirmation {
    pub fn value(&self, field: ClaimField) -> bool {
        match field {
            ClaimField::Shirt => self.shirt_claimed,
            ClaimField::Meal => self.meal_claimed,
        }
    }
}

/// Upstream reply to a claim request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResponse {
    pub success: bool,
    #[serde(default)]
    pub confirmed: Option<Confirmation>,
}

/// Upstream reply to a record listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsResponse {
    pub success: bool,
    /// Present whenever `success` is true
    #[serde(default)]
    pub records: Option<Vec<RawRecord>>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Error payload returned by the upstream on failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

/// Request body for toggling a claim through this service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClaimRequest {
    pub field: ClaimField,
    pub value: bool,
}

/// User-facing category of a failed claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClaimErrorKind {
    NotFound,
    Connection,
    Server,
    Generic,
}

/// Dismissible notification describing the last failed claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimError {
    pub kind: ClaimErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<MutationKey>,
    pub occurred_at: DateTime<Utc>,
}

/// How an accepted or rejected claim request settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ClaimOutcome {
    /// Same key already in flight; nothing was sent
    Ignored,
    /// Server confirmed; the field holds the confirmed value
    Confirmed { value: bool },
    /// Request failed; the field holds its pre-mutation value
    RolledBack { value: bool, error: ClaimError },
}
