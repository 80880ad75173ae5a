//! Run jobs as background processes on this machine.

use crate::process::{kill_tree_script, liveness_script};
use async_trait::async_trait;
use porter_core::{Job, ProcessDefinition, RunnerBackend, RunnerError, ScriptParts, SubmissionResult};
use porter_exec::{CommandSpec, ProcessExecutor};
use std::sync::Arc;

/// The default runner: spawn `job.script` and track its PID.
pub struct LocalRunner {
    executor: Arc<dyn ProcessExecutor>,
}

impl LocalRunner {
    pub fn init(_proc: &ProcessDefinition, executor: Arc<dyn ProcessExecutor>) -> Self {
        Self { executor }
    }

    fn shell(script: String) -> CommandSpec {
        CommandSpec::new("sh").arg("-c").arg(script)
    }
}

#[async_trait]
impl RunnerBackend for LocalRunner {
    fn name(&self) -> &'static str {
        "local"
    }

    fn script_parts(&self, _job: &mut Job, base: ScriptParts) -> Result<ScriptParts, RunnerError> {
        Ok(base)
    }

    async fn submit(&self, job: &mut Job) -> Result<SubmissionResult, RunnerError> {
        let cmd = CommandSpec::new(job.script.as_str());
        match self.executor.spawn(&cmd).await {
            Ok(pid) => {
                tracing::info!("Job #{} started with pid {}", job.index, pid);
                job.pid = Some(pid.to_string());
                Ok(SubmissionResult::launched(&cmd, pid))
            }
            Err(e) => Ok(SubmissionResult::from_error(&cmd, &e)),
        }
    }

    async fn is_running(&self, job: &Job) -> bool {
        let Some(pid) = job.process_id().filter(|pid| *pid > 0) else {
            return false;
        };
        self.executor
            .run(&Self::shell(liveness_script(pid)))
            .await
            .map(|output| output.success())
            .unwrap_or(false)
    }

    async fn kill(&self, job: &Job) {
        let Some(pid) = job.process_id().filter(|pid| *pid > 0) else {
            return;
        };
        if let Err(e) = self.executor.run(&Self::shell(kill_tree_script(pid))).await {
            tracing::warn!("Failed to kill job #{} (pid {}): {}", job.index, pid, e);
        }
    }
}
