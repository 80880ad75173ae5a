//! Available runner backends.

use porter_core::{ProcessDefinition, RunnerBackend, RunnerError};
use porter_exec::ProcessExecutor;
use porter_local::{DryRunner, LocalRunner};
use porter_sge::SgeRunner;
use porter_slurm::SlurmRunner;
use porter_ssh::SshRunner;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown runner: {0} (expected one of local, dry, ssh, sge, slurm)")]
pub struct UnknownRunner(pub String);

/// Runner backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunnerKind {
    Local,
    Dry,
    Ssh,
    Sge,
    Slurm,
}

impl RunnerKind {
    pub const ALL: [RunnerKind; 5] = [Self::Local, Self::Dry, Self::Ssh, Self::Sge, Self::Slurm];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Dry => "dry",
            Self::Ssh => "ssh",
            Self::Sge => "sge",
            Self::Slurm => "slurm",
        }
    }

    /// Build the backend for `proc`, running its one-time setup.
    pub async fn init(
        self,
        proc: &ProcessDefinition,
        executor: Arc<dyn ProcessExecutor>,
    ) -> Result<Box<dyn RunnerBackend>, RunnerError> {
        tracing::debug!("Initializing {} runner for {}", self, proc.id);
        Ok(match self {
            Self::Local => Box::new(LocalRunner::init(proc, executor)),
            Self::Dry => Box::new(DryRunner::init(proc, executor)),
            Self::Ssh => Box::new(SshRunner::init(proc, executor).await?),
            Self::Sge => Box::new(SgeRunner::init(proc, executor)),
            Self::Slurm => Box::new(SlurmRunner::init(proc, executor)),
        })
    }
}

impl fmt::Display for RunnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RunnerKind {
    type Err = UnknownRunner;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownRunner(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use porter_core::testing::ScriptedExecutor;

    #[test]
    fn test_parse_kind() {
        assert_eq!("slurm".parse::<RunnerKind>().unwrap(), RunnerKind::Slurm);
        assert_eq!("SGE".parse::<RunnerKind>().unwrap(), RunnerKind::Sge);
        assert_eq!(" dry ".parse::<RunnerKind>().unwrap(), RunnerKind::Dry);
        assert!("pbs".parse::<RunnerKind>().is_err());
        for kind in RunnerKind::ALL {
            assert_eq!(kind.to_string().parse::<RunnerKind>().unwrap(), kind);
        }
    }

    #[tokio::test]
    async fn test_init_names() {
        let proc = ProcessDefinition::new("pTest");
        for kind in [RunnerKind::Local, RunnerKind::Dry, RunnerKind::Sge, RunnerKind::Slurm] {
            let backend = kind.init(&proc, Arc::new(ScriptedExecutor::new())).await.unwrap();
            assert_eq!(backend.name(), kind.name());
        }
    }

    #[tokio::test]
    async fn test_ssh_init_errors_propagate() {
        let proc = ProcessDefinition::new("pTest");
        let result = RunnerKind::Ssh
            .init(&proc, Arc::new(ScriptedExecutor::new()))
            .await;
        assert!(matches!(result, Err(RunnerError::Config(_))));
    }
}
