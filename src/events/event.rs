//! # Runtime events emitted by the supervisor and worker slots.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Attempt events**: one invocation of the child (starting, failed, backoff)
//! - **Worker terminal events**: how a slot settled (succeeded, exhausted, cancelled)
//! - **Run events**: cancellation and completion of the whole run
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use unleash::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::BackoffScheduled)
//!     .with_slot(2)
//!     .with_attempt(1)
//!     .with_delay(Duration::from_secs(1))
//!     .with_reason("exit status 1");
//!
//! assert_eq!(ev.kind, EventKind::BackoffScheduled);
//! assert_eq!(ev.slot, Some(2));
//! assert_eq!(ev.delay_ms, Some(1000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Attempt events ===
    /// A slot is starting an attempt.
    ///
    /// Sets: `slot`, `attempt` (1-based, per slot).
    AttemptStarting,

    /// An attempt failed.
    ///
    /// Sets: `slot`, `attempt`, `reason`.
    AttemptFailed,

    /// A slot will wait before its next attempt.
    ///
    /// Sets: `slot`, `attempt` (the failed one), `delay_ms`, `reason`.
    BackoffScheduled,

    // === Worker terminal events ===
    /// A slot finished with a successful attempt.
    ///
    /// Sets: `slot`, `attempt`.
    WorkerSucceeded,

    /// A slot used its whole restart budget without success.
    ///
    /// Sets: `slot`, `attempt` (last), `reason`.
    WorkerExhausted,

    /// A slot stopped retrying because the run was cancelled.
    ///
    /// Sets: `slot`, `attempt` (last), `reason`.
    WorkerCancelled,

    // === Run events ===
    /// A slot failed terminally and is about to cancel the run; siblings stop
    /// retrying. Published at most once per run, before the token fires.
    ///
    /// Sets: `slot` (of the cancelling slot), `reason`.
    CancellationRequested,

    /// Every slot has settled. Always the last event of a run.
    ///
    /// Sets: `reason` (only when the run failed).
    RunFinished,

    // === Subscriber events ===
    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `reason` (subscriber name and cause).
    SubscriberOverflow,

    /// Subscriber panicked during event processing.
    ///
    /// Sets: `reason` (subscriber name and panic message).
    SubscriberPanicked,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Worker slot, if applicable.
    pub slot: Option<usize>,
    /// Attempt count (starting from 1).
    pub attempt: Option<u32>,
    /// Backoff delay before next attempt in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            slot: None,
            attempt: None,
            delay_ms: None,
            reason: None,
        }
    }

    /// Attaches a worker slot.
    #[inline]
    pub fn with_slot(mut self, slot: usize) -> Self {
        self.slot = Some(slot);
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a backoff delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} info={info}"))
    }

    /// True for the event that closes a run.
    #[inline]
    pub fn is_run_finished(&self) -> bool {
        matches!(self.kind, EventKind::RunFinished)
    }
}
