//! The runner backend contract.

use crate::error::RunnerError;
use crate::job::Job;
use crate::script::ScriptParts;
use crate::submission::SubmissionResult;
use async_trait::async_trait;

/// A job execution backend.
///
/// One-time setup happens when the backend is constructed (see each
/// backend's `init`); the value is then shared read-only by every job of
/// the process.
#[async_trait]
pub trait RunnerBackend: Send + Sync {
    /// Registry name, e.g. `"slurm"`.
    fn name(&self) -> &'static str;

    /// Decorate the script. Must not run anything.
    fn script_parts(&self, job: &mut Job, base: ScriptParts) -> Result<ScriptParts, RunnerError>;

    /// Touch up `job.script` once it has been written to disk.
    fn script_written(&self, _job: &Job) -> Result<(), RunnerError> {
        Ok(())
    }

    /// Launch the job and record its handle in `job.pid`.
    ///
    /// Returns `Err` only for unexpected failures.
    async fn submit(&self, job: &mut Job) -> Result<SubmissionResult, RunnerError>;

    /// Whether the job is still alive. A missing or invalid pid is `false`.
    async fn is_running(&self, job: &Job) -> bool;

    /// Best-effort termination. Never fails.
    async fn kill(&self, job: &Job);
}
