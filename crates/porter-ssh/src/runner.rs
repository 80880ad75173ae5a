//! Run jobs on remote servers over ssh.

use crate::pool::{DEFAULT_TIMEOUT, SshServerPool};
use async_trait::async_trait;
use camino::Utf8PathBuf;
use porter_core::{
    Job, ProcessDefinition, RemoteTarget, RunnerBackend, RunnerError, ScriptParts,
    SubmissionResult,
};
use porter_exec::{CommandSpec, ProcessExecutor, quote};
use porter_local::{kill_tree_script, liveness_script};
use std::sync::Arc;
use std::time::Duration;

/// Runner that launches job scripts on live ssh servers.
///
/// Servers must see the same filesystem as this machine. The job's pid is
/// the PID of the local ssh client, and liveness checks and kills are sent
/// through the job's server.
pub struct SshRunner {
    executor: Arc<dyn ProcessExecutor>,
    ssh: CommandSpec,
    pool: SshServerPool,
    cwd: Utf8PathBuf,
}

impl SshRunner {
    /// Read `ssh_*` options and health-check the servers.
    pub async fn init(
        proc: &ProcessDefinition,
        executor: Arc<dyn ProcessExecutor>,
    ) -> Result<Self, RunnerError> {
        let ssh = CommandSpec::new(proc.runner.str_or("ssh_ssh", "ssh"));
        let servers = proc.runner.string_list("ssh_servers");
        if servers.is_empty() {
            return Err(RunnerError::Config(
                "No server specified for ssh runner (ssh_servers)".to_string(),
            ));
        }
        let keys = proc.runner.optional_string_list("ssh_keys");
        let timeout = match proc.runner.get_f64("ssh_timeout").filter(|secs| *secs > 0.0) {
            Some(secs) => Duration::try_from_secs_f64(secs).map_err(|e| {
                RunnerError::Config(format!("Invalid ssh_timeout {}: {}", secs, e))
            })?,
            None => DEFAULT_TIMEOUT,
        };

        tracing::debug!("Checking status of {} servers for {}", servers.len(), proc.id);
        let pool = SshServerPool::check(executor.as_ref(), &ssh, &servers, &keys, timeout).await;
        if pool.is_empty() {
            return Err(RunnerError::NoServerAlive);
        }
        tracing::info!(
            "Live servers for {}: {}",
            proc.id,
            pool.servers().collect::<Vec<_>>().join(", ")
        );

        let cwd = Utf8PathBuf::from_path_buf(std::env::current_dir()?).map_err(|path| {
            RunnerError::Config(format!(
                "Working directory is not valid UTF-8: {}",
                path.display()
            ))
        })?;

        Ok(Self {
            executor,
            ssh,
            pool,
            cwd,
        })
    }

    /// `ssh [-i key] <server> <command>`
    fn remote(&self, target: &RemoteTarget, command: impl Into<String>) -> CommandSpec {
        self.ssh
            .clone()
            .opt("-i", target.key.as_deref())
            .arg(&target.server)
            .arg(command)
    }

    fn target(&self, job: &Job) -> Result<RemoteTarget, RunnerError> {
        match &job.remote {
            Some(target) => Ok(target.clone()),
            None => self.pool.select(job.index).ok_or(RunnerError::NoServerAlive),
        }
    }
}

#[async_trait]
impl RunnerBackend for SshRunner {
    fn name(&self) -> &'static str {
        "ssh"
    }

    fn script_parts(&self, job: &mut Job, mut base: ScriptParts) -> Result<ScriptParts, RunnerError> {
        let target = self.pool.select(job.index).ok_or(RunnerError::NoServerAlive)?;

        base.header
            .push_str(&format!("#\n# Running job on server: {}\n#\n", target.server));
        base.pre.push_str(&format!("\ncd {}\n", quote(self.cwd.as_str())));
        job.remote = Some(target);

        Ok(base)
    }

    async fn submit(&self, job: &mut Job) -> Result<SubmissionResult, RunnerError> {
        let target = self.target(job)?;

        // The script must be visible from the remote side
        let probe = self.remote(
            &target,
            CommandSpec::new("ls").arg(job.script.as_str()).to_shell_line(),
        );
        match self.executor.run(&probe).await {
            Ok(output) if output.success() => {}
            Ok(output) => {
                let mut result = SubmissionResult::from_output(&probe, output);
                result.stderr.push_str(&format!(
                    "\nProbably the server ({}) is not using the same file system as the local machine.\n",
                    target.server
                ));
                return Ok(result);
            }
            Err(e) => return Ok(SubmissionResult::from_error(&probe, &e)),
        }

        let cmd = self.remote(&target, quote(job.script.as_str()));
        match self.executor.spawn(&cmd).await {
            Ok(pid) => {
                tracing::info!("Job #{} started on {} (ssh pid {})", job.index, target, pid);
                job.pid = Some(pid.to_string());
                job.remote = Some(target);
                Ok(SubmissionResult::launched(&cmd, pid))
            }
            Err(e) => Ok(SubmissionResult::from_error(&cmd, &e)),
        }
    }

    async fn is_running(&self, job: &Job) -> bool {
        let (Some(pid), Some(target)) = (job.process_id().filter(|p| *p > 0), &job.remote) else {
            return false;
        };
        self.executor
            .run(&self.remote(target, liveness_script(pid)))
            .await
            .map(|output| output.success())
            .unwrap_or(false)
    }

    async fn kill(&self, job: &Job) {
        let (Some(pid), Some(target)) = (job.process_id().filter(|p| *p > 0), &job.remote) else {
            return;
        };
        if let Err(e) = self
            .executor
            .run(&self.remote(target, kill_tree_script(pid)))
            .await
        {
            tracing::warn!("Failed to kill job #{} on {}: {}", job.index, target, e);
        }
    }
}
