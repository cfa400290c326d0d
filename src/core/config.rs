//! # Runtime configuration.
//!
//! Provides [`Config`] centralized settings for one supervision run.
//!
//! ## Clamping
//! - `workers < 1` → `1`
//! - `restarts < 0` → `0`
//! - `bus_capacity = 0` → `1` (see [`Config::bus_capacity_clamped`])

use std::num::NonZeroUsize;
use std::thread;
use std::time::Duration;

use crate::policies::{BackoffPolicy, RestartBudget};

/// Settings for one supervision run.
///
/// ## Field semantics
/// - `workers`: number of concurrent worker slots (min 1)
/// - `restarts`: restart budget shared by every slot
/// - `backoff`: fixed wait between a failed attempt and the next one
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of concurrent worker slots.
    pub workers: NonZeroUsize,

    /// How many times each slot may restart the command after a failure.
    pub restarts: RestartBudget,

    /// Delay between attempts.
    pub backoff: BackoffPolicy,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages will
    /// skip older items.
    pub bus_capacity: usize,
}

impl Config {
    /// Builds a config from raw, possibly out-of-range caller input.
    ///
    /// ```rust
    /// use unleash::Config;
    ///
    /// let cfg = Config::new(0, -3);
    /// assert_eq!(cfg.workers.get(), 1);
    /// assert_eq!(cfg.max_attempts(), 1);
    /// ```
    pub fn new(workers: i64, restarts: i64) -> Self {
        Self {
            workers: clamp_workers(workers),
            restarts: RestartBudget::clamped(restarts),
            ..Self::default()
        }
    }

    /// Returns a copy with a different fixed backoff.
    pub fn with_backoff(mut self, delay: Duration) -> Self {
        self.backoff = BackoffPolicy::fixed(delay);
        self
    }

    /// Attempts each slot may perform (`restarts + 1`).
    #[inline]
    pub fn max_attempts(&self) -> u32 {
        self.restarts.max_attempts()
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `workers` = available parallelism of the host (1 if unknown)
    /// - `restarts = 0` (single-shot)
    /// - `backoff = 1s`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            workers: default_workers(),
            restarts: RestartBudget::default(),
            backoff: BackoffPolicy::default(),
            bus_capacity: 1024,
        }
    }
}

/// Number of processing units available to this process.
pub fn default_workers() -> NonZeroUsize {
    thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}

fn clamp_workers(workers: i64) -> NonZeroUsize {
    usize::try_from(workers)
        .ok()
        .and_then(NonZeroUsize::new)
        .unwrap_or(NonZeroUsize::MIN)
}
