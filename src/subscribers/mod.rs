//! # Event subscribers.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   WorkerActor ── publish(Event) ──► Bus ──► Supervisor listener ──► SubscriberSet::emit(&Event)
//!                                                                   ┌─────────┼─────────┐
//!                                                                   ▼         ▼         ▼
//!                                                               LogWriter  custom    ...
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use async_trait::async_trait;
//! use unleash::{Event, EventKind, Subscribe};
//!
//! struct FailureCounter;
//!
//! #[async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::AttemptFailed {
//!             // increment a counter
//!         }
//!     }
//! }
//! ```

mod log;
mod set;
mod subscribe;

pub use log::{DEFAULT_LOG_FILTER, LogWriter};
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
