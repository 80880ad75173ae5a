//! Test utilities: a scripted process executor.

use async_trait::async_trait;
use porter_exec::{CommandError, CommandOutput, CommandSpec, ProcessExecutor};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Canned reaction to a command.
#[derive(Debug, Clone)]
pub enum Response {
    Output(CommandOutput),
    Timeout,
    NotFound,
}

impl Response {
    pub fn ok(stdout: &str) -> Self {
        Self::Output(CommandOutput {
            return_code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
        })
    }

    pub fn exit(return_code: i32, stderr: &str) -> Self {
        Self::Output(CommandOutput {
            return_code,
            stdout: String::new(),
            stderr: stderr.to_string(),
        })
    }
}

/// Executor that records commands and replays canned responses.
///
/// Rules match when their pattern is a substring of the command's shell
/// line; the first matching rule wins. Unmatched commands succeed with
/// empty output. Spawned processes get PIDs counting up from 4242.
pub struct ScriptedExecutor {
    rules: Vec<(String, Response)>,
    calls: Mutex<Vec<CommandSpec>>,
    next_pid: AtomicU32,
}

impl Default for ScriptedExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            calls: Mutex::new(Vec::new()),
            next_pid: AtomicU32::new(4242),
        }
    }

    pub fn on(mut self, pattern: &str, response: Response) -> Self {
        self.rules.push((pattern.to_string(), response));
        self
    }

    /// Every command seen so far, in order.
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Shell lines of every command seen so far.
    pub fn call_lines(&self) -> Vec<String> {
        self.calls().iter().map(CommandSpec::to_shell_line).collect()
    }

    fn respond(&self, cmd: &CommandSpec) -> Response {
        self.calls.lock().unwrap().push(cmd.clone());
        let line = cmd.to_shell_line();
        self.rules
            .iter()
            .find(|(pattern, _)| line.contains(pattern.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| Response::ok(""))
    }

    fn resolve(cmd: &CommandSpec, response: Response) -> Result<CommandOutput, CommandError> {
        match response {
            Response::Output(output) => Ok(output),
            Response::Timeout => Err(CommandError::Timeout {
                command: cmd.program().to_string(),
                timeout: cmd.get_timeout().unwrap_or(Duration::from_secs(3)),
            }),
            Response::NotFound => Err(CommandError::Execution {
                command: cmd.program().to_string(),
                error: "No such file or directory (os error 2)".to_string(),
            }),
        }
    }
}

#[async_trait]
impl ProcessExecutor for ScriptedExecutor {
    async fn run(&self, cmd: &CommandSpec) -> Result<CommandOutput, CommandError> {
        Self::resolve(cmd, self.respond(cmd))
    }

    async fn spawn(&self, cmd: &CommandSpec) -> Result<u32, CommandError> {
        Self::resolve(cmd, self.respond(cmd))?;
        Ok(self.next_pid.fetch_add(1, Ordering::SeqCst))
    }
}
