//! # Child-process task.
//!
//! [`CommandSpec`] is the validated description of the child (program plus
//! arguments). [`CommandTask`] runs it once per attempt with the supervisor's
//! own stdin/stdout/stderr, so output of concurrent children may interleave.
//!
//! ## Outcome mapping
//! ```text
//! spawn failed            → AttemptError::Spawn
//! exited with 0           → Ok(())
//! exited with code != 0   → AttemptError::ExitStatus
//! killed by a signal      → AttemptError::Signal
//! ```

use std::ffi::OsString;
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{AttemptError, RunError};
use crate::tasks::task::Task;

/// Program and arguments of the supervised child. Never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    program: OsString,
    args: Vec<OsString>,
}

impl CommandSpec {
    /// Builds a spec from an argv-style list: the first item is the program.
    ///
    /// Returns [`RunError::EmptyCommand`] if `argv` is empty.
    ///
    /// ```rust
    /// use unleash::CommandSpec;
    ///
    /// let spec = CommandSpec::from_argv(["echo", "hi"]).unwrap();
    /// assert_eq!(spec.program(), "echo");
    /// assert!(CommandSpec::from_argv(Vec::<String>::new()).is_err());
    /// ```
    pub fn from_argv<I, S>(argv: I) -> Result<Self, RunError>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut argv = argv.into_iter().map(Into::into);
        let program = argv.next().ok_or(RunError::EmptyCommand)?;
        Ok(Self {
            program,
            args: argv.collect(),
        })
    }

    /// Program to execute.
    pub fn program(&self) -> &OsString {
        &self.program
    }

    /// Arguments passed to the program.
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        cmd
    }
}

/// Task that runs a [`CommandSpec`] to completion.
#[derive(Debug)]
pub struct CommandTask {
    name: String,
    spec: CommandSpec,
}

impl CommandTask {
    /// Creates a task for the given command.
    pub fn new(spec: CommandSpec) -> Self {
        let name = spec.program.to_string_lossy().into_owned();
        Self { name, spec }
    }

    /// Command this task runs.
    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    fn check_status(&self, status: ExitStatus) -> Result<(), AttemptError> {
        if status.success() {
            return Ok(());
        }
        match status.code() {
            Some(code) => Err(AttemptError::ExitStatus {
                program: self.name.clone(),
                code,
            }),
            None => Err(AttemptError::Signal {
                program: self.name.clone(),
                signal: termination_signal(status),
            }),
        }
    }
}

#[async_trait]
impl Task for CommandTask {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> Result<(), AttemptError> {
        // `status()` waits for the child and reaps it before returning.
        let status = self
            .spec
            .to_command()
            .status()
            .await
            .map_err(|source| AttemptError::Spawn {
                program: self.name.clone(),
                source,
            })?;
        self.check_status(status)
    }
}

#[cfg(unix)]
fn termination_signal(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.signal().unwrap_or(-1)
}

#[cfg(not(unix))]
fn termination_signal(_status: ExitStatus) -> i32 {
    -1
}
