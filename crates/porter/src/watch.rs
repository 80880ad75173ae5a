//! Poll a submitted job until it finishes or the user interrupts.

use porter_core::{Job, RunnerBackend};
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};

/// How waiting on a job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The backend stopped reporting the job as running
    Finished,
    /// Interrupted; the job was sent a kill
    Killed,
}

/// Poll `job` every `poll_interval` until it stops running.
///
/// Resolving `interrupt` first kills the job.
pub async fn wait_for<F>(
    backend: &dyn RunnerBackend,
    job: &Job,
    poll_interval: Duration,
    interrupt: F,
) -> WaitOutcome
where
    F: Future,
{
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Skip the first tick (fires immediately)
    ticker.tick().await;

    tokio::pin!(interrupt);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !backend.is_running(job).await {
                    return WaitOutcome::Finished;
                }
                tracing::debug!("Job #{} still running", job.index);
            }
            _ = &mut interrupt => {
                tracing::info!("Interrupted, killing job #{}", job.index);
                backend.kill(job).await;
                return WaitOutcome::Killed;
            }
        }
    }
}
