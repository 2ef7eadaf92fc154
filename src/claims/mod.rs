//! Optimistic claim controller.
//!
//! A claim toggle is written to the store immediately, then submitted
//! upstream. The server-confirmed value replaces it on success; the logged
//! pre-mutation value is restored on failure. At most one mutation per
//! `(record, field)` key is in flight; repeats while pending are ignored.
//!
//! Lock order is store, then ledger. Neither is held across the upstream call,
//! so mutations on different keys never wait on each other.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use crate::errors::AppError;
use crate::models::{
    ClaimError, ClaimErrorKind, ClaimField, ClaimOutcome, ClaimRequest, ClaimResponse,
    MutationKey,
};
use crate::store::SharedStore;
use crate::upstream::MutationSink;

const NOT_FOUND_MESSAGE: &str =
    "Record not found. It may have been removed; reload the list and try again.";
const CONNECTION_MESSAGE: &str = "Connection error. Check your network and try again.";
const GENERIC_MESSAGE: &str = "Failed to update the record. Please try again.";

/// Bookkeeping for in-flight mutations.
#[derive(Debug, Default)]
struct ClaimLedger {
    /// Pre-mutation value per pending key
    in_flight: BTreeMap<MutationKey, bool>,
    error: Option<ClaimError>,
}

/// Coordinates optimistic claim updates against the upstream API.
pub struct ClaimController {
    store: SharedStore,
    sink: Arc<dyn MutationSink>,
    ledger: Arc<Mutex<ClaimLedger>>,
}

impl ClaimController {
    pub fn new(store: SharedStore, sink: Arc<dyn MutationSink>) -> Self {
        Self {
            store,
            sink,
            ledger: Arc::new(Mutex::new(ClaimLedger::default())),
        }
    }

    /// Set a claim field, optimistically.
    ///
    /// Returns `Err` only when the record is unknown locally; upstream
    /// failures are rolled back and reported as [`ClaimOutcome::RolledBack`].
    /// The upstream call and its settlement run on their own task, so a
    /// caller that goes away never leaves the key pending.
    pub async fn mutate(
        &self,
        record_id: &str,
        field: ClaimField,
        value: bool,
    ) -> Result<ClaimOutcome, AppError> {
        let key = MutationKey::new(record_id, field);

        let previous = {
            let mut store = self.store.write().await;
            let mut ledger = lock(&self.ledger);

            if ledger.in_flight.contains_key(&key) {
                tracing::debug!(record_id, %field, "Claim already in flight, ignoring");
                return Ok(ClaimOutcome::Ignored);
            }

            ledger.error = None;

            let Some(previous) = store.update_field(record_id, field, value) else {
                let err = AppError::NotFound(format!("Record {} not found", record_id));
                ledger.error = Some(claim_error(&err, Some(key)));
                return Err(err);
            };

            ledger.in_flight.insert(key.clone(), previous);
            previous
        };

        let request = ClaimRequest {
            record_id: record_id.to_string(),
            field_name: field,
            value,
        };
        let sink = self.sink.clone();
        let store = self.store.clone();
        let ledger = self.ledger.clone();

        let task = tokio::spawn(async move {
            let result = sink.submit(&request).await;
            settle(&store, &ledger, key, previous, result).await
        });

        task.await
            .map_err(|e| AppError::Internal(format!("Claim task failed: {}", e)))
    }

    /// Keys with a mutation in flight, for disabling their controls.
    pub fn pending(&self) -> Vec<MutationKey> {
        lock(&self.ledger).in_flight.keys().cloned().collect()
    }

    /// Most recent claim failure, if not yet dismissed.
    pub fn error(&self) -> Option<ClaimError> {
        lock(&self.ledger).error.clone()
    }

    pub fn clear_error(&self) {
        lock(&self.ledger).error = None;
    }
}

fn lock(ledger: &Mutex<ClaimLedger>) -> MutexGuard<'_, ClaimLedger> {
    ledger.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Apply the upstream result: confirmed value on success, logged value otherwise.
async fn settle(
    store: &SharedStore,
    ledger: &Mutex<ClaimLedger>,
    key: MutationKey,
    previous: bool,
    result: Result<ClaimResponse, AppError>,
) -> ClaimOutcome {
    let mut store = store.write().await;
    let mut ledger = lock(ledger);
    let previous = ledger.in_flight.remove(&key).unwrap_or(previous);
    let MutationKey { record_id, field } = key.clone();

    match confirmed_value(result, &key) {
        Ok(confirmed) => {
            store.update_field(&record_id, field, confirmed);
            ledger.error = None;
            tracing::info!(%record_id, %field, value = confirmed, "Claim confirmed");
            ClaimOutcome::Confirmed { value: confirmed }
        }
        Err(err) => {
            store.update_field(&record_id, field, previous);
            let error = claim_error(&err, Some(key));
            tracing::warn!(
                %record_id,
                %field,
                restored = previous,
                "Claim rolled back: {}",
                err
            );
            ledger.error = Some(error.clone());
            ClaimOutcome::RolledBack {
                value: previous,
                error,
            }
        }
    }
}

/// Extract the confirmed value, rejecting structurally invalid successes.
fn confirmed_value(
    result: Result<ClaimResponse, AppError>,
    key: &MutationKey,
) -> Result<bool, AppError> {
    let response = result?;

    if !response.success {
        return Err(AppError::Upstream {
            status: 200,
            message: None,
        });
    }

    let confirmation = response.confirmed.ok_or_else(|| {
        AppError::MalformedResponse("Claim response is missing its confirmation".to_string())
    })?;

    if confirmation.record_id != key.record_id {
        return Err(AppError::MalformedResponse(format!(
            "Confirmation for {} does not match record {}",
            confirmation.record_id, key.record_id
        )));
    }

    Ok(confirmation.value(key.field))
}

/// Categorize an error into a user-facing notification.
fn claim_error(err: &AppError, key: Option<MutationKey>) -> ClaimError {
    let (kind, message) = match err {
        AppError::NotFound(_) => (ClaimErrorKind::NotFound, NOT_FOUND_MESSAGE.to_string()),
        AppError::Connection(_) => (ClaimErrorKind::Connection, CONNECTION_MESSAGE.to_string()),
        AppError::Upstream {
            message: Some(message),
            ..
        } if !message.trim().is_empty() => (ClaimErrorKind::Server, message.clone()),
        _ => (ClaimErrorKind::Generic, GENERIC_MESSAGE.to_string()),
    };

    ClaimError {
        kind,
        message,
        key,
        occurred_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Semaphore;

    use crate::models::Confirmation;
    use crate::pipeline::tests::record;
    use crate::store::RecordStore;

    #[derive(Clone)]
    enum Reply {
        /// Confirm with this value, or echo the requested one
        Confirm(Option<bool>),
        ConfirmOther(&'static str),
        Unconfirmed,
        Rejected,
        Fail(AppError),
    }

    struct MockSink {
        reply: Reply,
        calls: AtomicUsize,
        gate: Option<Arc<Semaphore>>,
    }

    impl MockSink {
        fn new(reply: Reply) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
                gate: None,
            }
        }

        fn gated(reply: Reply, gate: Arc<Semaphore>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::new(reply)
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MutationSink for MockSink {
        async fn submit(&self, request: &ClaimRequest) -> Result<ClaimResponse, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }

            let confirm = |value: bool, record_id: &str| ClaimResponse {
                success: true,
                confirmed: Some(Confirmation {
                    record_id: record_id.to_string(),
                    shirt_claimed: value,
                    meal_claimed: value,
                }),
            };

            match &self.reply {
                Reply::Confirm(value) => Ok(confirm(
                    value.unwrap_or(request.value),
                    &request.record_id,
                )),
                Reply::ConfirmOther(id) => Ok(confirm(request.value, id)),
                Reply::Unconfirmed => Ok(ClaimResponse {
                    success: true,
                    confirmed: None,
                }),
                Reply::Rejected => Ok(ClaimResponse {
                    success: false,
                    confirmed: None,
                }),
                Reply::Fail(err) => Err(err.clone()),
            }
        }
    }

    fn setup(sink: Arc<MockSink>) -> (SharedStore, Arc<ClaimController>) {
        let mut store = RecordStore::new();
        store
            .replace_all(vec![record("A1", "Alice"), record("B2", "Bob")])
            .unwrap();
        let store = store.shared();
        let controller = Arc::new(ClaimController::new(store.clone(), sink));
        (store, controller)
    }

    async fn wait_pending(controller: &ClaimController, key: &MutationKey) {
        while !controller.pending().contains(key) {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_confirmed_round_trip() {
        let sink = Arc::new(MockSink::new(Reply::Confirm(None)));
        let (store, controller) = setup(sink.clone());

        let outcome = controller.mutate("A1", ClaimField::Shirt, true).await.unwrap();

        assert_eq!(outcome, ClaimOutcome::Confirmed { value: true });
        assert_eq!(store.read().await.field("A1", ClaimField::Shirt), Some(true));
        assert!(controller.pending().is_empty());
        assert!(controller.error().is_none());
        assert_eq!(sink.calls(), 1);
    }

    #[tokio::test]
    async fn test_server_value_wins_over_requested() {
        let sink = Arc::new(MockSink::new(Reply::Confirm(Some(false))));
        let (store, controller) = setup(sink);

        let outcome = controller.mutate("A1", ClaimField::Meal, true).await.unwrap();

        assert_eq!(outcome, ClaimOutcome::Confirmed { value: false });
        assert_eq!(store.read().await.field("A1", ClaimField::Meal), Some(false));
    }

    #[tokio::test]
    async fn test_optimistic_write_visible_while_pending() {
        let gate = Arc::new(Semaphore::new(0));
        let sink = Arc::new(MockSink::gated(Reply::Confirm(None), gate.clone()));
        let (store, controller) = setup(sink);
        let key = MutationKey::new("A1", ClaimField::Shirt);

        let task = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.mutate("A1", ClaimField::Shirt, true).await })
        };
        wait_pending(&controller, &key).await;

        assert_eq!(store.read().await.field("A1", ClaimField::Shirt), Some(true));
        assert_eq!(controller.pending(), vec![key.clone()]);

        gate.add_permits(1);
        task.await.unwrap().unwrap();
        assert!(!controller.pending().contains(&key));
    }

    #[tokio::test]
    async fn test_failure_rolls_back() {
        let sink = Arc::new(MockSink::new(Reply::Fail(AppError::Upstream {
            status: 500,
            message: Some("Spreadsheet quota exceeded".into()),
        })));
        let (store, controller) = setup(sink);

        let outcome = controller.mutate("B2", ClaimField::Meal, true).await.unwrap();

        let ClaimOutcome::RolledBack { value, error } = outcome else {
            panic!("expected rollback, got {:?}", outcome);
        };
        assert!(!value);
        assert_eq!(error.kind, ClaimErrorKind::Server);
        assert_eq!(error.message, "Spreadsheet quota exceeded");
        assert_eq!(store.read().await.field("B2", ClaimField::Meal), Some(false));
        assert!(controller.pending().is_empty());
        assert!(controller.error().is_some());
    }

    #[tokio::test]
    async fn test_error_categories() {
        let cases = [
            (
                Reply::Fail(AppError::NotFound("gone".into())),
                ClaimErrorKind::NotFound,
                NOT_FOUND_MESSAGE,
            ),
            (
                Reply::Fail(AppError::Connection("refused".into())),
                ClaimErrorKind::Connection,
                CONNECTION_MESSAGE,
            ),
            (
                Reply::Fail(AppError::Upstream {
                    status: 502,
                    message: None,
                }),
                ClaimErrorKind::Generic,
                GENERIC_MESSAGE,
            ),
            (Reply::Unconfirmed, ClaimErrorKind::Generic, GENERIC_MESSAGE),
            (Reply::Rejected, ClaimErrorKind::Generic, GENERIC_MESSAGE),
            (
                Reply::ConfirmOther("B2"),
                ClaimErrorKind::Generic,
                GENERIC_MESSAGE,
            ),
        ];

        for (reply, kind, message) in cases {
            let sink = Arc::new(MockSink::new(reply));
            let (store, controller) = setup(sink);

            controller.mutate("A1", ClaimField::Shirt, true).await.unwrap();

            let error = controller.error().expect("error recorded");
            assert_eq!(error.kind, kind);
            assert_eq!(error.message, message);
            assert_eq!(error.key, Some(MutationKey::new("A1", ClaimField::Shirt)));
            assert_eq!(store.read().await.field("A1", ClaimField::Shirt), Some(false));
        }
    }

    #[tokio::test]
    async fn test_unknown_record_fails_without_network_call() {
        let sink = Arc::new(MockSink::new(Reply::Confirm(None)));
        let (store, controller) = setup(sink.clone());
        let revision = store.read().await.revision();

        let result = controller.mutate("Z9", ClaimField::Shirt, true).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(sink.calls(), 0);
        assert_eq!(controller.error().unwrap().kind, ClaimErrorKind::NotFound);
        assert!(controller.pending().is_empty());
        assert_eq!(store.read().await.revision(), revision);
    }

    #[tokio::test]
    async fn test_duplicate_request_ignored_while_pending() {
        let gate = Arc::new(Semaphore::new(0));
        let sink = Arc::new(MockSink::gated(Reply::Confirm(None), gate.clone()));
        let (store, controller) = setup(sink.clone());
        let key = MutationKey::new("A1", ClaimField::Meal);

        let first = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.mutate("A1", ClaimField::Meal, true).await })
        };
        wait_pending(&controller, &key).await;

        let second = controller.mutate("A1", ClaimField::Meal, false).await.unwrap();
        assert_eq!(second, ClaimOutcome::Ignored);
        assert_eq!(store.read().await.field("A1", ClaimField::Meal), Some(true));

        gate.add_permits(1);
        let first = first.await.unwrap().unwrap();
        assert_eq!(first, ClaimOutcome::Confirmed { value: true });
        assert_eq!(sink.calls(), 1);
        assert!(controller.pending().is_empty());
    }

    #[tokio::test]
    async fn test_different_keys_proceed_independently() {
        let gate = Arc::new(Semaphore::new(0));
        let sink = Arc::new(MockSink::gated(Reply::Confirm(None), gate.clone()));
        let (store, controller) = setup(sink.clone());

        let keys = [
            MutationKey::new("A1", ClaimField::Shirt),
            MutationKey::new("A1", ClaimField::Meal),
            MutationKey::new("B2", ClaimField::Shirt),
        ];

        let tasks: Vec<_> = keys
            .iter()
            .cloned()
            .map(|key| {
                let controller = controller.clone();
                tokio::spawn(async move { controller.mutate(&key.record_id, key.field, true).await })
            })
            .collect();

        for key in &keys {
            wait_pending(&controller, key).await;
        }
        assert_eq!(controller.pending().len(), 3);
        assert_eq!(sink.calls(), 3);

        gate.add_permits(3);
        for task in tasks {
            assert_eq!(
                task.await.unwrap().unwrap(),
                ClaimOutcome::Confirmed { value: true }
            );
        }

        let store = store.read().await;
        assert_eq!(store.field("A1", ClaimField::Shirt), Some(true));
        assert_eq!(store.field("A1", ClaimField::Meal), Some(true));
        assert_eq!(store.field("B2", ClaimField::Shirt), Some(true));
        assert_eq!(store.field("B2", ClaimField::Meal), Some(false));
    }

    #[tokio::test]
    async fn test_at_most_two_store_writes() {
        let sink = Arc::new(MockSink::new(Reply::Fail(AppError::Connection("down".into()))));
        let (store, controller) = setup(sink);
        let before = store.read().await.revision();

        controller.mutate("A1", ClaimField::Shirt, true).await.unwrap();

        assert_eq!(store.read().await.revision(), before + 2);
    }

    #[tokio::test]
    async fn test_new_attempt_clears_stale_error_and_clear_is_explicit() {
        let sink = Arc::new(MockSink::new(Reply::Confirm(None)));
        let (_store, controller) = setup(sink);

        let _ = controller.mutate("Z9", ClaimField::Shirt, true).await;
        assert!(controller.error().is_some());

        controller.clear_error();
        assert!(controller.error().is_none());

        let _ = controller.mutate("Z9", ClaimField::Shirt, true).await;
        assert!(controller.error().is_some());

        controller.mutate("A1", ClaimField::Shirt, true).await.unwrap();
        assert!(controller.error().is_none());
    }

    #[tokio::test]
    async fn test_abandoned_caller_still_settles_the_key() {
        let gate = Arc::new(Semaphore::new(0));
        let sink = Arc::new(MockSink::gated(
            Reply::Fail(AppError::Connection("down".into())),
            gate.clone(),
        ));
        let (store, controller) = setup(sink.clone());
        let key = MutationKey::new("A1", ClaimField::Shirt);

        let task = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.mutate("A1", ClaimField::Shirt, true).await })
        };
        wait_pending(&controller, &key).await;

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        gate.add_permits(1);
        while !controller.pending().is_empty() {
            tokio::task::yield_now().await;
        }
        assert_eq!(store.read().await.field("A1", ClaimField::Shirt), Some(false));
        assert_eq!(controller.error().unwrap().kind, ClaimErrorKind::Connection);

        // The key accepts new mutations again
        gate.add_permits(1);
        let outcome = controller.mutate("A1", ClaimField::Shirt, true).await.unwrap();
        assert!(matches!(outcome, ClaimOutcome::RolledBack { value: false, .. }));
        assert_eq!(sink.calls(), 2);
    }
}
