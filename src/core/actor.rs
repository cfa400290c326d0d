//! # WorkerActor: one supervised slot.
//!
//! Drives up to `restarts + 1` attempts of a [`Task`] for a single slot:
//! - stops at the first successful attempt,
//! - waits a fixed [`BackoffPolicy`] delay between failed attempts,
//! - gives up early when the shared [`CancellationToken`] fires during a wait.
//!
//! ## Architecture
//! ```text
//! loop {
//!   ├─► attempt += 1
//!   ├─► run_once() ──► task.run()       (never interrupted)
//!   │       ├─ Ok  ──► publish WorkerSucceeded, return Ok
//!   │       └─ Err ──► last = err
//!   ├─► budget spent? ──► publish WorkerExhausted, return Exhausted(last)
//!   ├─► publish BackoffScheduled
//!   └─► select! {
//!         sleep(delay)        ──► continue
//!         token.cancelled()   ──► publish WorkerCancelled, return Cancelled(last)
//!       }
//! }
//! ```
//!
//! ## Rules
//! - Attempts run **sequentially** within one slot.
//! - A slot never cancels the token itself; the supervisor's wiring does that
//!   when the actor returns an error.
//! - The token is only consulted while waiting. A slot whose first attempt
//!   succeeds never touches it.

use std::sync::Arc;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::{
    core::runner::run_once,
    error::{AttemptError, WorkerError},
    events::{Bus, Event, EventKind},
    policies::{BackoffPolicy, RestartBudget},
    tasks::Task,
};

/// Parameters shared by every actor of a run.
#[derive(Clone, Copy, Debug)]
pub struct WorkerParams {
    /// How many restarts the slot may use.
    pub restarts: RestartBudget,
    /// Delay between attempts.
    pub backoff: BackoffPolicy,
}

/// How a backoff wait ended.
enum Wake {
    Elapsed,
    Cancelled,
}

/// Supervises the attempts of one worker slot.
pub struct WorkerActor {
    /// Ordinal of the slot (0-based).
    pub slot: usize,
    /// Task to execute.
    pub task: Arc<dyn Task>,
    /// Restart and backoff parameters.
    pub params: WorkerParams,
    /// Internal event bus.
    pub bus: Bus,
}

impl WorkerActor {
    /// Creates a new worker actor.
    pub fn new(slot: usize, task: Arc<dyn Task>, params: WorkerParams, bus: Bus) -> Self {
        Self {
            slot,
            task,
            params,
            bus,
        }
    }

    /// Runs the slot until success, budget exhaustion, or cancellation.
    ///
    /// ### Cancellation semantics
    /// - `token` is checked only while waiting between attempts.
    /// - If the backoff delay has already elapsed when the wait is polled, the
    ///   next attempt proceeds even if `token` is cancelled too.
    pub async fn run(self, token: CancellationToken) -> Result<(), WorkerError> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let last = match run_once(self.task.as_ref(), self.slot, attempt, &self.bus).await {
                Ok(()) => {
                    self.publish(EventKind::WorkerSucceeded, attempt, None);
                    return Ok(());
                }
                Err(e) => e,
            };

            if !self.params.restarts.allows_retry_after(attempt) {
                self.publish(EventKind::WorkerExhausted, attempt, Some(&last));
                return Err(WorkerError::Exhausted {
                    slot: self.slot,
                    attempts: attempt,
                    last,
                });
            }

            if let Wake::Cancelled = self.backoff(attempt, &last, &token).await {
                self.publish(EventKind::WorkerCancelled, attempt, Some(&last));
                return Err(WorkerError::Cancelled {
                    slot: self.slot,
                    attempts: attempt,
                    last,
                });
            }
        }
    }

    /// Waits the backoff delay or until `token` is cancelled.
    async fn backoff(&self, attempt: u32, last: &AttemptError, token: &CancellationToken) -> Wake {
        let delay = self.params.backoff.delay();
        self.bus.publish(
            Event::new(EventKind::BackoffScheduled)
                .with_slot(self.slot)
                .with_attempt(attempt)
                .with_delay(delay)
                .with_reason(last.to_string()),
        );

        let sleep = time::sleep(delay);
        tokio::pin!(sleep);
        select! {
            biased;
            _ = &mut sleep => Wake::Elapsed,
            _ = token.cancelled() => Wake::Cancelled,
        }
    }

    fn publish(&self, kind: EventKind, attempt: u32, err: Option<&AttemptError>) {
        let mut ev = Event::new(kind).with_slot(self.slot).with_attempt(attempt);
        if let Some(e) = err {
            ev = ev.with_reason(e.to_string());
        }
        self.bus.publish(ev);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use tokio::sync::broadcast;

    use super::*;
    use crate::tasks::TaskFn;

    fn params(restarts: u32) -> WorkerParams {
        WorkerParams {
            restarts: RestartBudget::new(restarts),
            backoff: BackoffPolicy::fixed(Duration::from_secs(1)),
        }
    }

    /// Task that fails its first `failures` calls, then succeeds.
    fn flaky(failures: u32) -> (Arc<dyn Task>, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let task: Arc<dyn Task> = TaskFn::arc("flaky", move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n <= failures {
                    Err(AttemptError::Fail {
                        error: format!("boom #{n}"),
                    })
                } else {
                    Ok(())
                }
            }
        });
        (task, calls)
    }

    fn count(rx: &mut broadcast::Receiver<Event>, kind: EventKind) -> usize {
        let mut n = 0;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == kind {
                n += 1;
            }
        }
        n
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_success_stops_immediately() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let (task, calls) = flaky(0);
        let token = CancellationToken::new();

        let actor = WorkerActor::new(0, task, params(3), bus);
        assert!(actor.run(token.clone()).await.is_ok());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!token.is_cancelled());
        assert_eq!(count(&mut rx, EventKind::BackoffScheduled), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_uses_whole_budget() {
        let bus = Bus::new(64);
        let (task, calls) = flaky(u32::MAX);
        let start = time::Instant::now();

        let actor = WorkerActor::new(4, task, params(2), bus);
        let err = actor.run(CancellationToken::new()).await.unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(err, WorkerError::Exhausted { slot: 4, attempts: 3, .. }));
        assert_eq!(err.last_error().to_string(), "execution failed: boom #3");
        // Two waits of 1s; no wait after the final attempt.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_budget_never_waits() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let (task, calls) = flaky(u32::MAX);
        let token = CancellationToken::new();
        token.cancel();

        let actor = WorkerActor::new(0, task, params(0), bus);
        let err = actor.run(token).await.unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, WorkerError::Exhausted { attempts: 1, .. }));
        assert_eq!(count(&mut rx, EventKind::BackoffScheduled), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_during_backoff_stops_retrying() {
        let bus = Bus::new(64);
        let (task, calls) = flaky(u32::MAX);
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(500)).await;
            canceller.cancel();
        });

        let actor = WorkerActor::new(1, task, params(5), bus);
        let err = actor.run(token).await.unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(err.is_cancelled());
        assert_eq!(err.attempts(), 1);
        assert_eq!(err.last_error().to_string(), "execution failed: boom #1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_token_does_not_block_first_attempt() {
        let bus = Bus::new(64);
        let (task, calls) = flaky(0);
        let token = CancellationToken::new();
        token.cancel();
        token.cancel();

        let actor = WorkerActor::new(0, task, params(1), bus);
        assert!(actor.run(token).await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
