//! # Task abstraction.
//!
//! A [`Task`] is the unit every worker slot invokes once per attempt. The
//! shared handle type is [`TaskRef`], an `Arc<dyn Task>` handed to all slots.
//!
//! Tasks receive no cancellation token: an attempt that has started always
//! runs to completion. Cancellation only decides whether the *next* attempt
//! happens.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AttemptError;

/// Shared handle to a task.
pub type TaskRef = Arc<dyn Task>;

/// # Asynchronous unit run once per attempt.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use unleash::{AttemptError, Task};
///
/// struct Demo;
///
/// #[async_trait]
/// impl Task for Demo {
///     fn name(&self) -> &str { "demo" }
///
///     async fn run(&self) -> Result<(), AttemptError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Performs one attempt and reports whether it succeeded.
    ///
    /// Implementations must release every resource of the attempt (child
    /// handles, exit status) before returning.
    async fn run(&self) -> Result<(), AttemptError>;
}
