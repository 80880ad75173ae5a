//! Submit, poll and cancel Grid Engine jobs.

use async_trait::async_trait;
use porter_core::{
    Job, OptionStyle, ProcessDefinition, RunnerBackend, RunnerError, ScriptParts,
    SchedulerHeaderBuilder, SubmissionResult,
};
use porter_exec::{CommandSpec, ProcessExecutor, parse_sge_job_id};
use std::sync::Arc;

/// `#$` directives built from `sge_*` options.
pub const SGE_HEADER: SchedulerHeaderBuilder = SchedulerHeaderBuilder {
    directive: "#$",
    prefix: "sge_",
    reserved: &["sge_N", "sge_qsub", "sge_qstat", "sge_qdel"],
    forbidden: &["sge_o", "sge_e", "sge_cwd"],
    style: OptionStyle::SingleDash,
};

/// Grid Engine runner.
pub struct SgeRunner {
    executor: Arc<dyn ProcessExecutor>,
    qsub: CommandSpec,
    qstat: CommandSpec,
    qdel: CommandSpec,
}

impl SgeRunner {
    pub fn init(proc: &ProcessDefinition, executor: Arc<dyn ProcessExecutor>) -> Self {
        Self {
            executor,
            qsub: CommandSpec::new(proc.runner.str_or("sge_qsub", "qsub")),
            qstat: CommandSpec::new(proc.runner.str_or("sge_qstat", "qstat")),
            qdel: CommandSpec::new(proc.runner.str_or("sge_qdel", "qdel")),
        }
    }
}

#[async_trait]
impl RunnerBackend for SgeRunner {
    fn name(&self) -> &'static str {
        "sge"
    }

    fn script_parts(&self, job: &mut Job, mut base: ScriptParts) -> Result<ScriptParts, RunnerError> {
        let proc = job.proc()?;
        let name = proc.job_name("sge_N", job)?;

        base.header.push_str(&SGE_HEADER.line(&format!("-N {}", name)));
        base.header.push_str(&SGE_HEADER.line("-cwd"));
        base.header
            .push_str(&SGE_HEADER.line(&format!("-o {}", job.stdout_path())));
        base.header
            .push_str(&SGE_HEADER.line(&format!("-e {}", job.stderr_path())));
        base.header.push_str(&SGE_HEADER.translate(&proc.runner)?);

        // qsub writes job.stdout and job.stderr itself
        base.saveoe = false;
        Ok(base)
    }

    async fn submit(&self, job: &mut Job) -> Result<SubmissionResult, RunnerError> {
        let cmd = self.qsub.clone().arg(job.script.as_str());
        let output = match self.executor.run(&cmd).await {
            Ok(output) => output,
            Err(e) => return Ok(SubmissionResult::from_error(&cmd, &e)),
        };

        let mut result = SubmissionResult::from_output(&cmd, output);
        if result.success() {
            match parse_sge_job_id(&result.stdout) {
                Some(job_id) => {
                    tracing::info!("Job #{} submitted as SGE job {}", job.index, job_id);
                    job.pid = Some(job_id);
                }
                None => {
                    tracing::warn!("No job ID in qsub output: {}", result.stdout.trim());
                    result.return_code = 1;
                }
            }
        }
        Ok(result)
    }

    async fn is_running(&self, job: &Job) -> bool {
        let Some(job_id) = job.scheduler_id() else {
            return false;
        };
        self.executor
            .run(&self.qstat.clone().args(["-j", job_id]))
            .await
            .map(|output| output.success())
            .unwrap_or(false)
    }

    async fn kill(&self, job: &Job) {
        let Some(job_id) = job.scheduler_id() else {
            return;
        };
        if let Err(e) = self.executor.run(&self.qdel.clone().args(["-f", job_id])).await {
            tracing::warn!("Failed to cancel SGE job {}: {}", job_id, e);
        }
    }
}
