//! Errors raised by runner backends.

use porter_exec::CommandError;
use thiserror::Error;

/// Failures that abort a process definition.
///
/// Per-job transport problems are not errors: they come back inside a
/// failed [`SubmissionResult`](crate::SubmissionResult).
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("No server is alive")]
    NoServerAlive,
    #[error("Template error: {0}")]
    Template(String),
    #[error("Job #{0} has outlived its process definition")]
    ProcessDropped(usize),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Command(#[from] CommandError),
}
