//! Retry policies.
//!
//! This module groups the knobs that control **how many** attempts a worker
//! makes and **how long** it waits between them.
//!
//! ## Contents
//! - [`RestartBudget`] how many restarts a worker may use after its first attempt
//! - [`BackoffPolicy`] the fixed delay between a failure and the next attempt
//!
//! ## Quick wiring
//! ```text
//! Config { restarts, backoff }
//!      └─► core::actor::WorkerActor uses:
//!           - budget.allows_retry_after(attempt) to decide continue/exit
//!           - backoff.delay() to schedule the next attempt
//! ```

mod backoff;
mod restart;

pub use backoff::BackoffPolicy;
pub use restart::RestartBudget;
