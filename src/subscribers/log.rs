//! # LogWriter — forwards events to `tracing`
//!
//! Attempt-level events are logged at `debug`, how each slot settled and the
//! run-wide cancellation at `info`. Only subscriber faults reach `warn` or
//! above, so under [`DEFAULT_LOG_FILTER`] a run prints nothing of its own and
//! the binary's `unleash: <error>` line stays the only output of a failed run.
//!
//! ## Example output (`UNLEASH_LOG=debug`)
//! ```text
//! DEBUG attempt starting slot=0 attempt=1
//! DEBUG attempt failed slot=0 attempt=1 reason="\"false\" exited with status 1"
//! DEBUG backoff scheduled slot=0 attempt=1 delay_ms=1000
//!  INFO worker gave up slot=0 attempt=2 reason="\"false\" exited with status 1"
//!  INFO cancellation requested slot=0
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Filter directive used when `UNLEASH_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::AttemptStarting => {
                debug!(target: "unleash", slot = e.slot, attempt = e.attempt, "attempt starting");
            }
            EventKind::AttemptFailed => {
                debug!(target: "unleash", slot = e.slot, attempt = e.attempt, reason, "attempt failed");
            }
            EventKind::BackoffScheduled => {
                debug!(target: "unleash", slot = e.slot, attempt = e.attempt, delay_ms = e.delay_ms, "backoff scheduled");
            }
            EventKind::WorkerSucceeded => {
                debug!(target: "unleash", slot = e.slot, attempt = e.attempt, "worker succeeded");
            }
            EventKind::WorkerExhausted => {
                info!(target: "unleash", slot = e.slot, attempt = e.attempt, reason, "worker gave up");
            }
            EventKind::WorkerCancelled => {
                info!(target: "unleash", slot = e.slot, attempt = e.attempt, reason, "worker stopped retrying");
            }
            EventKind::CancellationRequested => {
                info!(target: "unleash", slot = e.slot, "cancellation requested");
            }
            EventKind::RunFinished => {
                info!(target: "unleash", failed = e.reason.is_some(), "run finished");
            }
            EventKind::SubscriberOverflow => {
                warn!(target: "unleash", reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                error!(target: "unleash", reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
