//! Dry runs: create empty outputs instead of running the job.

use crate::local::LocalRunner;
use async_trait::async_trait;
use porter_core::{
    Job, OutputKind, ProcessDefinition, RunnerBackend, RunnerError, ScriptParts, SubmissionResult,
};
use porter_exec::{ProcessExecutor, quote};
use std::fs::{File, FileTimes};
use std::io::ErrorKind;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// How far a dry-run script's mtime is pushed into the past, so a later
/// real run never compares as up to date against it.
pub const BACKDATE: Duration = Duration::from_secs(1000);

/// Runner that touches declared outputs and skips the real command.
///
/// Launching and polling are the local runner's.
pub struct DryRunner {
    local: LocalRunner,
}

impl DryRunner {
    pub fn init(proc: &ProcessDefinition, executor: Arc<dyn ProcessExecutor>) -> Self {
        Self {
            local: LocalRunner::init(proc, executor),
        }
    }
}

/// Move the script's timestamps `BACKDATE` before its current mtime.
fn backdate(job: &Job) -> Result<(), RunnerError> {
    let file = match File::options().write(true).open(&job.script) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("No script to backdate at {}", job.script);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let mtime = file.metadata()?.modified()?;
    let backdated = mtime.checked_sub(BACKDATE).unwrap_or(SystemTime::UNIX_EPOCH);
    file.set_times(FileTimes::new().set_accessed(backdated).set_modified(backdated))?;
    Ok(())
}

#[async_trait]
impl RunnerBackend for DryRunner {
    fn name(&self) -> &'static str {
        "dry"
    }

    fn script_parts(&self, job: &mut Job, mut base: ScriptParts) -> Result<ScriptParts, RunnerError> {
        job.cache = false;

        base.pre.push_str("\n# Dry-run script to create empty output files and directories.\n\n");
        for output in &job.outputs {
            let path = job.output_path(&output.path);
            match output.kind {
                OutputKind::File => base.pre.push_str(&format!("touch {}\n", quote(path.as_str()))),
                OutputKind::Dir => {
                    base.pre.push_str(&format!("mkdir -p {}\n", quote(path.as_str())))
                }
                OutputKind::Var => {}
            }
        }

        base.command.clear();
        base.saveoe = false;
        Ok(base)
    }

    fn script_written(&self, job: &Job) -> Result<(), RunnerError> {
        backdate(job)
    }

    async fn submit(&self, job: &mut Job) -> Result<SubmissionResult, RunnerError> {
        self.local.submit(job).await
    }

    async fn is_running(&self, job: &Job) -> bool {
        self.local.is_running(job).await
    }

    async fn kill(&self, job: &Job) {
        self.local.kill(job).await
    }
}
