//! Submission results.

use chrono::{DateTime, Utc};
use porter_exec::{CommandError, CommandOutput, CommandSpec};

/// Outcome of launching a job.
///
/// Expected failures (non-zero exit, unreachable host, missing binary) are
/// reported here with a non-zero `return_code` rather than as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult {
    pub return_code: i32,
    pub command_line: String,
    /// Launched process ID, -1 when nothing was started
    pub pid: i64,
    pub stdout: String,
    pub stderr: String,
    pub submitted_at: DateTime<Utc>,
}

impl SubmissionResult {
    /// Result of a foreground submission command.
    pub fn from_output(cmd: &CommandSpec, output: CommandOutput) -> Self {
        Self {
            return_code: output.return_code,
            command_line: cmd.to_shell_line(),
            pid: -1,
            stdout: output.stdout,
            stderr: output.stderr,
            submitted_at: Utc::now(),
        }
    }

    /// A background process was started.
    pub fn launched(cmd: &CommandSpec, pid: u32) -> Self {
        Self {
            return_code: 0,
            command_line: cmd.to_shell_line(),
            pid: i64::from(pid),
            stdout: String::new(),
            stderr: String::new(),
            submitted_at: Utc::now(),
        }
    }

    /// The command could not be run at all.
    pub fn from_error(cmd: &CommandSpec, error: &CommandError) -> Self {
        let return_code = match error {
            CommandError::Execution { .. } => 127,
            CommandError::Timeout { .. } => 124,
        };
        Self {
            return_code,
            command_line: cmd.to_shell_line(),
            pid: -1,
            stdout: String::new(),
            stderr: error.to_string(),
            submitted_at: Utc::now(),
        }
    }

    pub fn success(&self) -> bool {
        self.return_code == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_error_codes() {
        let cmd = CommandSpec::new("qsub").arg("job.script");
        let missing = CommandError::Execution {
            command: "qsub".into(),
            error: "No such file or directory".into(),
        };
        let result = SubmissionResult::from_error(&cmd, &missing);
        assert_eq!(result.return_code, 127);
        assert_eq!(result.pid, -1);
        assert_eq!(result.command_line, "qsub job.script");
        assert!(result.stderr.contains("No such file"));
    }

    #[test]
    fn test_launched() {
        let cmd = CommandSpec::new("/work/0/job.script");
        let result = SubmissionResult::launched(&cmd, 4242);
        assert!(result.success());
        assert_eq!(result.pid, 4242);
    }
}
