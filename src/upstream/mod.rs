//! Upstream check-in API.
//!
//! The record source and mutation sink are traits so the dashboard can be
//! driven by any backend; [`UpstreamClient`] implements both over HTTP.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::errors::AppError;
use crate::models::{ClaimRequest, ClaimResponse, RawRecord, Record, RecordsResponse, UpstreamErrorBody};

pub const RECORDS_PATH: &str = "/records";
pub const CLAIMS_PATH: &str = "/records/claims";

/// Read side of the upstream API.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch the full attendee list. Never returns partial data.
    async fn fetch_records(&self) -> Result<Vec<Record>, AppError>;
}

/// Write side of the upstream API.
#[async_trait]
pub trait MutationSink: Send + Sync {
    async fn submit(&self, request: &ClaimRequest) -> Result<ClaimResponse, AppError>;
}

/// HTTP client for the upstream check-in API.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl RecordSource for UpstreamClient {
    async fn fetch_records(&self) -> Result<Vec<Record>, AppError> {
        let response = self.http.get(self.url(RECORDS_PATH)).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_from_response(response).await);
        }

        let body: RecordsResponse = response.json().await?;
        if !body.success {
            return Err(AppError::Upstream {
                status: status.as_u16(),
                message: Some(
                    body.error
                        .unwrap_or_else(|| "Record source reported failure".to_string()),
                ),
            });
        }

        let raw = body.records.ok_or_else(|| {
            AppError::MalformedResponse("Record listing is missing its records".to_string())
        })?;
        let records = validate_records(raw)?;
        tracing::debug!(records = records.len(), "Fetched records from upstream");
        Ok(records)
    }
}

#[async_trait]
impl MutationSink for UpstreamClient {
    async fn submit(&self, request: &ClaimRequest) -> Result<ClaimResponse, AppError> {
        tracing::debug!(
            record_id = %request.record_id,
            field = %request.field_name,
            value = request.value,
            "Submitting claim upstream"
        );

        let response = self
            .http
            .post(self.url(CLAIMS_PATH))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(response.json().await?)
    }
}

/// Map a non-success upstream response to an error, reading its `error` message if any.
async fn error_from_response(response: reqwest::Response) -> AppError {
    let status = response.status();
    let body: UpstreamErrorBody = response.json().await.unwrap_or_default();

    if status == StatusCode::NOT_FOUND {
        return AppError::NotFound(body.error.unwrap_or_else(|| "Record not found".to_string()));
    }

    AppError::Upstream {
        status: status.as_u16(),
        message: body.error,
    }
}

/// Check per-record shape beyond what deserialization enforces.
pub fn validate_records(raw: Vec<RawRecord>) -> Result<Vec<Record>, AppError> {
    let mut seen = HashSet::with_capacity(raw.len());

    raw.into_iter()
        .enumerate()
        .map(|(i, record)| {
            if record.id.trim().is_empty() {
                return Err(AppError::MalformedResponse(format!(
                    "Record at position {} has a blank id",
                    i
                )));
            }
            if !seen.insert(record.id.clone()) {
                return Err(AppError::MalformedResponse(format!(
                    "Duplicate record id {}",
                    record.id
                )));
            }
            Ok(Record::from(record))
        })
        .collect()
}
