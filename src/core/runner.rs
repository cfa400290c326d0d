//! # Run a single attempt of a task.
//!
//! Executes one attempt of a [`Task`] and publishes its lifecycle events to [`Bus`].
//!
//! ## Event flow
//! ```text
//! publish AttemptStarting → task.run() → Ok(())  → (nothing; the actor reports success)
//!                                      → Err(e)  → publish AttemptFailed
//! ```
//!
//! ## Rules
//! - The attempt is **never** interrupted: cancellation is not observed here.
//! - The task has released its resources by the time this returns.

use crate::{
    error::AttemptError,
    events::{Bus, Event, EventKind},
    tasks::Task,
};

/// Executes attempt number `attempt` of `task` on behalf of `slot`.
pub async fn run_once<T: Task + ?Sized>(
    task: &T,
    slot: usize,
    attempt: u32,
    bus: &Bus,
) -> Result<(), AttemptError> {
    bus.publish(
        Event::new(EventKind::AttemptStarting)
            .with_slot(slot)
            .with_attempt(attempt),
    );

    let res = task.run().await;
    if let Err(e) = &res {
        bus.publish(
            Event::new(EventKind::AttemptFailed)
                .with_slot(slot)
                .with_attempt(attempt)
                .with_reason(e.to_string()),
        );
    }
    res
}
