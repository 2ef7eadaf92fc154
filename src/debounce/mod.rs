//! Debounced search query state.
//!
//! The immediate value echoes every keystroke; the settled value is published
//! on a watch channel only after the input has been quiet for the configured
//! delay. Each new input restarts the timer.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Query input with an immediate and a debounced value.
///
/// Scheduling requires a running tokio runtime.
#[derive(Debug)]
pub struct DebouncedQuery {
    immediate: String,
    delay: Duration,
    settled: watch::Sender<String>,
    pending: Option<JoinHandle<()>>,
}

impl DebouncedQuery {
    pub fn new(delay: Duration) -> Self {
        let (settled, _) = watch::channel(String::new());
        Self {
            immediate: String::new(),
            delay,
            settled,
            pending: None,
        }
    }

    /// Value as typed, updated synchronously.
    pub fn immediate(&self) -> &str {
        &self.immediate
    }

    /// Last value that survived a quiet period.
    pub fn settled(&self) -> String {
        self.settled.borrow().clone()
    }

    #[cfg(test)]
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.settled.subscribe()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Change the quiet period. A timer already running keeps its old deadline.
    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Record new input and restart the quiet-period timer.
    pub fn set(&mut self, value: impl Into<String>) {
        self.immediate = value.into();
        self.cancel_pending();

        let settled = self.settled.clone();
        let value = self.immediate.clone();
        let deadline = Instant::now() + self.delay;

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let changed = settled.send_if_modified(|current| {
                if *current == value {
                    false
                } else {
                    current.clone_from(&value);
                    true
                }
            });
            if changed {
                tracing::debug!(query = %value, "Search query settled");
            }
        }));
    }

    /// Cancel any pending emission. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        self.cancel_pending();
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Default for DebouncedQuery {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl Drop for DebouncedQuery {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
