//! # Task abstractions.
//!
//! This module provides the task-related types:
//! - [`Task`] - trait for one attempt of supervised work
//! - [`TaskRef`] - shared reference to a task (`Arc<dyn Task>`)
//! - [`TaskFn`] - function-based task implementation
//! - [`CommandSpec`], [`CommandTask`] - the child process run by the CLI

mod command;
mod task;
mod task_fn;

pub use command::{CommandSpec, CommandTask};
pub use task::{Task, TaskRef};
pub use task_fn::TaskFn;
