//! Submit, poll and cancel SLURM jobs.

use async_trait::async_trait;
use porter_core::{
    Job, OptionStyle, ProcessDefinition, RunnerBackend, RunnerError, ScriptParts,
    SchedulerHeaderBuilder, SubmissionResult,
};
use porter_exec::{CommandSpec, ProcessExecutor, parse_slurm_job_id};
use std::sync::Arc;

/// `#SBATCH` directives built from `slurm_*` options.
///
/// One-letter keys become short options (`slurm_p` → `-p short`), longer
/// keys long ones (`slurm_mem` → `--mem=4G`).
pub const SLURM_HEADER: SchedulerHeaderBuilder = SchedulerHeaderBuilder {
    directive: "#SBATCH",
    prefix: "slurm_",
    reserved: &[
        "slurm_J",
        "slurm_srun_opts",
        "slurm_sbatch",
        "slurm_srun",
        "slurm_scancel",
        "slurm_squeue",
    ],
    forbidden: &["slurm_o", "slurm_e", "slurm_output", "slurm_error"],
    style: OptionStyle::ByLength,
};

/// SLURM runner.
pub struct SlurmRunner {
    executor: Arc<dyn ProcessExecutor>,
    sbatch: CommandSpec,
    srun: CommandSpec,
    scancel: CommandSpec,
    squeue: CommandSpec,
}

impl SlurmRunner {
    pub fn init(proc: &ProcessDefinition, executor: Arc<dyn ProcessExecutor>) -> Self {
        Self {
            executor,
            sbatch: CommandSpec::new(proc.runner.str_or("slurm_sbatch", "sbatch")),
            srun: CommandSpec::new(proc.runner.str_or("slurm_srun", "srun")),
            scancel: CommandSpec::new(proc.runner.str_or("slurm_scancel", "scancel")),
            squeue: CommandSpec::new(proc.runner.str_or("slurm_squeue", "squeue")),
        }
    }
}

#[async_trait]
impl RunnerBackend for SlurmRunner {
    fn name(&self) -> &'static str {
        "slurm"
    }

    fn script_parts(&self, job: &mut Job, mut base: ScriptParts) -> Result<ScriptParts, RunnerError> {
        let proc = job.proc()?;
        let name = proc.job_name("slurm_J", job)?;

        base.header.push_str(&SLURM_HEADER.line(&format!("-J {}", name)));
        base.header
            .push_str(&SLURM_HEADER.line(&format!("-o {}", job.stdout_path())));
        base.header
            .push_str(&SLURM_HEADER.line(&format!("-e {}", job.stderr_path())));
        base.header.push_str(&SLURM_HEADER.translate(&proc.runner)?);

        base.saveoe = false;

        // Run the command as a job step
        let srun_opts = proc.runner.str_or("slurm_srun_opts", "");
        base.command = self
            .srun
            .clone()
            .args(srun_opts.split_whitespace())
            .args(std::mem::take(&mut base.command))
            .tokens();

        Ok(base)
    }

    async fn submit(&self, job: &mut Job) -> Result<SubmissionResult, RunnerError> {
        let cmd = self.sbatch.clone().arg(job.script.as_str());
        let output = match self.executor.run(&cmd).await {
            Ok(output) => output,
            Err(e) => return Ok(SubmissionResult::from_error(&cmd, &e)),
        };

        let mut result = SubmissionResult::from_output(&cmd, output);
        if result.success() {
            match parse_slurm_job_id(&result.stdout) {
                Some(job_id) => {
                    tracing::info!("Job #{} submitted as SLURM job {}", job.index, job_id);
                    job.pid = Some(job_id);
                }
                None => {
                    tracing::warn!("No job ID in sbatch output: {}", result.stdout.trim());
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
            .run(&self.squeue.clone().args(["-j", job_id]))
            .await
            .map(|output| output.success())
            .unwrap_or(false)
    }

    async fn kill(&self, job: &Job) {
        let Some(job_id) = job.scheduler_id() else {
            return;
        };
        if let Err(e) = self.executor.run(&self.scancel.clone().arg(job_id)).await {
            tracing::warn!("Failed to cancel SLURM job {}: {}", job_id, e);
        }
    }
}
