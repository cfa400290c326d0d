//! # Backoff policy between attempts.
//!
//! [`BackoffPolicy`] is a fixed delay: every failed attempt that still has
//! budget left is followed by the same wait. The wait is cancellable: the
//! worker loop races it against the shared cancellation token.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use unleash::BackoffPolicy;
//!
//! let backoff = BackoffPolicy::fixed(Duration::from_millis(250));
//! assert_eq!(backoff.delay(), Duration::from_millis(250));
//! assert_eq!(BackoffPolicy::default().delay(), Duration::from_secs(1));
//! ```

use std::time::Duration;

/// Fixed retry delay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffPolicy {
    delay: Duration,
}

impl Default for BackoffPolicy {
    /// One second between attempts.
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
        }
    }
}

impl BackoffPolicy {
    /// Creates a policy that always waits `delay`.
    pub const fn fixed(delay: Duration) -> Self {
        Self { delay }
    }

    /// Delay before the next attempt.
    pub fn delay(&self) -> Duration {
        self.delay
    }
}
