//! Runtime events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `WorkerActor` (attempt and terminal events), `Supervisor`
//!   (cancellation and run completion), `SubscriberSet` (overflow/panic).
//! - **Consumers**: the supervisor's event listener (fans out to `SubscriberSet`)
//!   and any receiver obtained from [`Bus::subscribe`].

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
