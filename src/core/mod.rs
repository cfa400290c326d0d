//! Runtime core: fan-out, retries and aggregation.
//!
//! The public API from this module is [`Supervisor`] and its [`Config`].
//!
//! Internal modules:
//! - [`config`]: run settings with clamping;
//! - [`runner`]: executes one attempt and publishes its events;
//! - [`actor`]: drives one slot through attempts, backoff and cancellation;
//! - [`supervisor`]: spawns the slots and aggregates their outcome.

mod actor;
mod config;
mod runner;
mod supervisor;

pub use config::{Config, default_workers};
pub use supervisor::Supervisor;
