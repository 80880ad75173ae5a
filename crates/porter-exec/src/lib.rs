//! Shared command execution utilities for runner backends.
//!
//! Every backend talks to the outside world through [`ProcessExecutor`],
//! so the transport can be swapped for a scripted one in tests.

pub mod command;
pub mod job_id;
pub mod shell;

pub use command::{CommandError, CommandOutput, CommandSpec, ProcessExecutor, TokioExecutor};
pub use job_id::{parse_sge_job_id, parse_slurm_job_id};
pub use shell::{quote, quote_join};
