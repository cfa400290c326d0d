//! Error types used by the unleash runtime and its tasks.
//!
//! This module defines three error enums, one per layer:
//!
//! - [`AttemptError`] — a single invocation of the child failed.
//! - [`WorkerError`] — a worker slot stopped without a successful attempt.
//! - [`RunError`] — what a whole run reports to its caller.
//!
//! Attempt errors never leave the worker loop on their own: the loop wraps the
//! last one into a [`WorkerError`] once it stops retrying. All types provide
//! `as_label` for logs.

use std::io;

use thiserror::Error;

/// # Errors produced by one attempt.
///
/// For retry purposes every variant is equivalent: any of them counts as a
/// failed attempt.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AttemptError {
    /// The child process could not be started at all.
    #[error("failed to start {program:?}: {source}")]
    Spawn {
        /// Program that was being started.
        program: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The child ran and exited with a non-zero status.
    #[error("{program:?} exited with status {code}")]
    ExitStatus {
        /// Program that exited.
        program: String,
        /// Exit code reported by the OS.
        code: i32,
    },

    /// The child was terminated by a signal.
    #[error("{program:?} terminated by signal {signal}")]
    Signal {
        /// Program that was terminated.
        program: String,
        /// Signal number (unix only; `-1` when unknown).
        signal: i32,
    },

    /// Free-form failure reported by a function-backed task.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },
}

impl AttemptError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use unleash::AttemptError;
    ///
    /// let err = AttemptError::ExitStatus { program: "false".into(), code: 1 };
    /// assert_eq!(err.as_label(), "attempt_exit_status");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            AttemptError::Spawn { .. } => "attempt_spawn",
            AttemptError::ExitStatus { .. } => "attempt_exit_status",
            AttemptError::Signal { .. } => "attempt_signal",
            AttemptError::Fail { .. } => "attempt_failed",
        }
    }
}

/// # Terminal error of one worker slot.
///
/// Both variants carry the error of the **last** attempt the slot made.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Every permitted attempt failed.
    #[error("worker {slot}: gave up after {attempts} attempt(s): {last}")]
    Exhausted {
        /// Ordinal of the slot (0-based).
        slot: usize,
        /// Attempts performed.
        attempts: u32,
        /// Error of the final attempt.
        last: AttemptError,
    },

    /// A sibling failed permanently while this slot was waiting to retry.
    #[error("worker {slot}: stopped retrying after {attempts} attempt(s): {last}")]
    Cancelled {
        /// Ordinal of the slot (0-based).
        slot: usize,
        /// Attempts performed before cancellation was observed.
        attempts: u32,
        /// Error of the most recent attempt.
        last: AttemptError,
    },
}

impl WorkerError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkerError::Exhausted { .. } => "worker_exhausted",
            WorkerError::Cancelled { .. } => "worker_cancelled",
        }
    }

    /// Slot that produced this error.
    pub fn slot(&self) -> usize {
        match self {
            WorkerError::Exhausted { slot, .. } | WorkerError::Cancelled { slot, .. } => *slot,
        }
    }

    /// Number of attempts the slot performed.
    pub fn attempts(&self) -> u32 {
        match self {
            WorkerError::Exhausted { attempts, .. } | WorkerError::Cancelled { attempts, .. } => {
                *attempts
            }
        }
    }

    /// Error of the slot's last attempt.
    pub fn last_error(&self) -> &AttemptError {
        match self {
            WorkerError::Exhausted { last, .. } | WorkerError::Cancelled { last, .. } => last,
        }
    }

    /// True if the slot stopped early because of cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WorkerError::Cancelled { .. })
    }
}

/// # Errors reported by a whole run.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RunError {
    /// The command specification was empty; no worker was started.
    #[error("nothing to run")]
    EmptyCommand,

    /// At least one worker never succeeded (first error recorded).
    #[error(transparent)]
    Worker(#[from] WorkerError),
}

impl RunError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use unleash::RunError;
    ///
    /// assert_eq!(RunError::EmptyCommand.as_label(), "run_empty_command");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RunError::EmptyCommand => "run_empty_command",
            RunError::Worker(e) => e.as_label(),
        }
    }
}
