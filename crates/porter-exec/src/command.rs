//! Command execution utilities for runner backends.

use crate::shell::quote_join;
use async_trait::async_trait;
use std::fmt;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Why a command produced no exit status.
///
/// A non-zero exit is not an error here; callers read it from
/// [`CommandOutput::return_code`].
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Cannot start {command}: {error}")]
    Execution { command: String, error: String },
    #[error("Command {command} timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },
}

/// A reusable command template.
///
/// Baking is plain cloning: a backend keeps one `CommandSpec` per executable
/// and extends a copy with per-call arguments. Repeated flags are kept as-is,
/// so `-o BatchMode=yes -o ConnectionAttempts=1` works.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append `flag value` if a value is present.
    pub fn opt(self, flag: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.arg(flag).arg(value),
            None => self,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Program and arguments as tokens.
    pub fn tokens(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// Render the command as a single shell line without running it.
    ///
    /// Used to nest one command inside another, e.g. as the remote command
    /// of an ssh invocation.
    pub fn to_shell_line(&self) -> String {
        quote_join(&self.tokens())
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_shell_line())
    }
}

/// Captured result of a foreground command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, -1 when the process was killed by a signal
    pub return_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.return_code == 0
    }
}

/// Runs external commands.
///
/// `run` never treats a non-zero exit as an error; only spawn failures and
/// timeouts are `Err`.
#[async_trait]
pub trait ProcessExecutor: Send + Sync {
    /// Run in the foreground and capture output.
    async fn run(&self, cmd: &CommandSpec) -> Result<CommandOutput, CommandError>;

    /// Launch in the background and return the child PID.
    async fn spawn(&self, cmd: &CommandSpec) -> Result<u32, CommandError>;
}

/// [`ProcessExecutor`] backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioExecutor;

impl TokioExecutor {
    fn command(spec: &CommandSpec) -> Command {
        let mut cmd = Command::new(spec.program());
        cmd.args(spec.get_args()).stdin(Stdio::null());
        cmd
    }

    fn execution_error(spec: &CommandSpec, e: std::io::Error) -> CommandError {
        CommandError::Execution {
            command: spec.program().to_string(),
            error: e.to_string(),
        }
    }
}

#[async_trait]
impl ProcessExecutor for TokioExecutor {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        tracing::debug!("Running: {}", spec);
        let mut cmd = Self::command(spec);
        cmd.kill_on_drop(true);

        let output = match spec.get_timeout() {
            Some(timeout) => tokio::time::timeout(timeout, cmd.output())
                .await
                .map_err(|_| CommandError::Timeout {
                    command: spec.program().to_string(),
                    timeout,
                })?,
            None => cmd.output().await,
        }
        .map_err(|e| Self::execution_error(spec, e))?;

        Ok(CommandOutput {
            return_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn spawn(&self, spec: &CommandSpec) -> Result<u32, CommandError> {
        tracing::debug!("Spawning: {}", spec);
        let mut child = Self::command(spec)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Self::execution_error(spec, e))?;

        let pid = child.id().ok_or_else(|| CommandError::Execution {
            command: spec.program().to_string(),
            error: "child exited before its pid could be read".to_string(),
        })?;

        // Reap the child once it exits.
        tokio::spawn(async move {
            let _ = child.wait().await;
        });

        Ok(pid)
    }
}
