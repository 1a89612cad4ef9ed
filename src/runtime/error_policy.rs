//! # Error Policy
//!
//! Retry scheduling for failed passes and classification of watch stream errors.

use crate::controller::backoff::BackoffState;
use crate::controller::reconciler::{ReconcilerError, SecretTrigger};
use crate::observability::metrics;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{error, info, warn};

/// Delay used when the backoff table cannot be locked
const FALLBACK_BACKOFF_SECS: u64 = 60;

/// Per-trigger Fibonacci backoff for failed passes
///
/// Each secret keeps its own sequence so one failing secret does not slow the
/// retries of another.
#[derive(Debug)]
pub struct ErrorPolicy {
    min_seconds: u64,
    max_seconds: u64,
    states: Mutex<HashMap<SecretTrigger, BackoffState>>,
}

impl ErrorPolicy {
    #[must_use]
    pub fn new(min_seconds: u64, max_seconds: u64) -> Self {
        Self {
            min_seconds,
            max_seconds,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Record a failed pass and return how long to wait before redelivering
    pub fn handle_reconciliation_error(
        &self,
        trigger: &SecretTrigger,
        error: &ReconcilerError,
    ) -> Duration {
        error!(
            secret = %trigger,
            error.kind = error.kind(),
            "Reconciliation failed: {error}"
        );

        let (backoff_seconds, error_count) = match self.states.lock() {
            Ok(mut states) => {
                let state = states
                    .entry(trigger.clone())
                    .or_insert_with(|| BackoffState::new(self.min_seconds, self.max_seconds));
                state.increment_error();
                (state.backoff.next_backoff_seconds(), state.error_count)
            }
            Err(e) => {
                warn!("Failed to lock backoff states: {}, using default backoff", e);
                (FALLBACK_BACKOFF_SECS, 0)
            }
        };

        let delay = Duration::from_secs(backoff_seconds);
        let next_retry = chrono::Duration::from_std(delay)
            .ok()
            .and_then(|d| chrono::Utc::now().checked_add_signed(d))
            .map_or_else(|| "unknown".to_string(), |t| t.to_rfc3339());
        info!(
            secret = %trigger,
            error_count,
            "Retrying in {}s at {}",
            backoff_seconds,
            next_retry
        );

        metrics::increment_requeues();
        delay
    }

    /// Restart a trigger's backoff sequence after a successful pass
    pub fn reset(&self, trigger: &SecretTrigger) {
        match self.states.lock() {
            Ok(mut states) => {
                if let Some(state) = states.get_mut(trigger) {
                    state.reset();
                }
            }
            Err(e) => warn!("Failed to lock backoff states: {}", e),
        }
    }

    /// Consecutive failures recorded for a trigger
    #[must_use]
    pub fn error_count(&self, trigger: &SecretTrigger) -> u32 {
        self.states
            .lock()
            .ok()
            .and_then(|states| states.get(trigger).map(|state| state.error_count))
            .unwrap_or(0)
    }
}

/// How the watch loop should react to a watch stream error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchErrorAction {
    /// Keep consuming the stream, the watcher recovers on its own
    Continue,
    /// Drop the stream and start a new watch after the delay
    Restart(Duration),
}

/// Classify a watch stream error
///
/// Authentication failures and unknown errors restart the watch after
/// `restart_delay`. An expired resource version restarts immediately.
/// Throttling continues with the watcher's own backoff.
pub fn handle_watch_stream_error(error_string: &str, restart_delay: Duration) -> WatchErrorAction {
    metrics::increment_watch_errors();

    let is_401 = error_string.contains("401") || error_string.contains("Unauthorized");
    let is_403 = error_string.contains("403") || error_string.contains("Forbidden");
    let is_410 = error_string.contains("410")
        || error_string.contains("too old resource version")
        || error_string.contains("Expired")
        || error_string.contains("Gone");
    let is_429 = error_string.contains("429")
        || error_string.contains("storage is (re)initializing")
        || error_string.contains("TooManyRequests");

    if is_401 || is_403 {
        error!(
            "Watch on secrets was rejected, check that the service account may get, list, watch and patch secrets: {}",
            error_string
        );
        WatchErrorAction::Restart(restart_delay)
    } else if is_410 {
        warn!(error_type = "410", "Watch resource version expired, restarting watch");
        WatchErrorAction::Restart(Duration::ZERO)
    } else if is_429 {
        warn!(error_type = "429", "API server is throttling the watch: {}", error_string);
        WatchErrorAction::Continue
    } else {
        error!("Secret watch stream error: {}", error_string);
        WatchErrorAction::Restart(restart_delay)
    }
}
