//! # Restart budget for worker slots.
//!
//! [`RestartBudget`] bounds the number of attempts one worker slot performs.
//! A budget of `R` restarts allows `R + 1` attempts in total:
//!
//! ```text
//! RestartBudget(0)  → one attempt, never retried
//! RestartBudget(2)  → attempt 1 ─► backoff ─► attempt 2 ─► backoff ─► attempt 3
//! ```

/// Number of restarts a worker may perform after its first failed attempt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RestartBudget(u32);

impl RestartBudget {
    /// Creates a budget of exactly `restarts` restarts.
    pub const fn new(restarts: u32) -> Self {
        Self(restarts)
    }

    /// Creates a budget from a signed value; negatives become zero.
    pub fn clamped(restarts: i64) -> Self {
        Self(restarts.clamp(0, i64::from(u32::MAX - 1)) as u32)
    }

    /// Configured restarts.
    pub fn restarts(&self) -> u32 {
        self.0
    }

    /// Total attempts permitted (`restarts + 1`).
    pub fn max_attempts(&self) -> u32 {
        self.0.saturating_add(1)
    }

    /// Whether another attempt may follow the failed attempt `attempt` (1-based).
    pub fn allows_retry_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts()
    }
}
