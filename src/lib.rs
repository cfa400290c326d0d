//! # unleash
//!
//! **unleash** runs `N` copies of the same child command concurrently and
//! restarts each copy on failure, up to a restart budget, until every copy has
//! either succeeded or given up.
//!
//! ## Architecture
//! ```text
//!                    ┌──────────────────────────────────────┐
//!                    │  Supervisor                          │
//!                    │  - CancellationToken (one per run)   │
//!                    │  - Bus (broadcast events, per run)   │
//!                    │  - SubscriberSet (LogWriter, ...)    │
//!                    └──────┬─────────────┬──────────┬──────┘
//!                           ▼             ▼          ▼
//!                    ┌────────────┐ ┌────────────┐ ┌────────────┐
//!                    │WorkerActor │ │WorkerActor │ │WorkerActor │
//!                    │  slot 0    │ │  slot 1    │ │  slot N-1  │
//!                    └─────┬──────┘ └─────┬──────┘ └─────┬──────┘
//!                          ▼              ▼              ▼
//!                     CommandTask    CommandTask    CommandTask   (child process per attempt)
//! ```
//!
//! ### Lifecycle of one slot
//! ```text
//! for attempt in 1..=restarts+1 {
//!   ├─► run the child to completion (inherits stdio)
//!   ├─► Ok  ──► slot succeeded, stop
//!   └─► Err ──► last attempt? ──► slot exhausted, cancel siblings
//!               else wait backoff (1s) or cancellation:
//!                  ├─ elapsed   ──► next attempt
//!                  └─ cancelled ──► slot stops with its last error
//! }
//! ```
//!
//! The run returns `Ok(())` if every slot succeeded, otherwise the first
//! terminal error that reached the supervisor.
//!
//! ## Example
//! ```rust
//! use unleash::{AttemptError, Config, Supervisor, TaskFn, TaskRef};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sup = Supervisor::new(Config::new(4, 2), Vec::new());
//!
//!     let hello: TaskRef = TaskFn::arc("hello", || async {
//!         Ok::<_, AttemptError>(())
//!     });
//!
//!     sup.run(hello).await?;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod policies;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use crate::core::{Config, Supervisor, default_workers};
pub use error::{AttemptError, RunError, WorkerError};
pub use events::{Bus, Event, EventKind};
pub use policies::{BackoffPolicy, RestartBudget};
pub use subscribers::{DEFAULT_LOG_FILTER, LogWriter, Subscribe, SubscriberSet};
pub use tasks::{CommandSpec, CommandTask, Task, TaskFn, TaskRef};
