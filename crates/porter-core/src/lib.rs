//! Core types for porter runners.
//!
//! Defines the job model, the script parts every backend decorates, and the
//! [`RunnerBackend`] contract the backends implement.

pub mod backend;
pub mod config;
pub mod error;
pub mod header;
pub mod job;
pub mod process;
pub mod script;
pub mod submission;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use backend::RunnerBackend;
pub use config::{ConfigError, ProcessConfig, RunnerConfig, value_to_string};
pub use error::RunnerError;
pub use header::{OptionStyle, SchedulerHeaderBuilder};
pub use job::{Job, OutputKind, OutputSpec, RemoteTarget};
pub use process::{ProcessDefinition, SimpleTemplate, TemplateRenderer};
pub use script::ScriptParts;
pub use submission::SubmissionResult;
