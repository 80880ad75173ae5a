//! Per-process runner state.

use crate::kind::RunnerKind;
use camino::Utf8PathBuf;
use porter_core::{Job, ProcessDefinition, RunnerBackend, RunnerError, ScriptParts};
use porter_exec::ProcessExecutor;
use std::fs;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Everything a process's jobs share: the definition, the executor and the
/// initialized backend.
///
/// The backend is built on first use. Concurrent first callers wait for a
/// single initialization; a failed one is retried on the next call.
pub struct RunnerContext {
    kind: RunnerKind,
    proc: Arc<ProcessDefinition>,
    executor: Arc<dyn ProcessExecutor>,
    backend: OnceCell<Box<dyn RunnerBackend>>,
}

impl RunnerContext {
    pub fn new(
        kind: RunnerKind,
        proc: Arc<ProcessDefinition>,
        executor: Arc<dyn ProcessExecutor>,
    ) -> Self {
        Self {
            kind,
            proc,
            executor,
            backend: OnceCell::new(),
        }
    }

    pub fn proc(&self) -> &Arc<ProcessDefinition> {
        &self.proc
    }

    /// The backend, initializing it if needed.
    pub async fn backend(&self) -> Result<&dyn RunnerBackend, RunnerError> {
        let backend = self
            .backend
            .get_or_try_init(|| self.kind.init(&self.proc, self.executor.clone()))
            .await?;
        Ok(backend.as_ref())
    }

    /// A new job of this process.
    pub fn job(&self, index: usize, directory: impl Into<Utf8PathBuf>) -> Job {
        Job::new(index, directory, &self.proc)
    }

    /// Decorate `base` for `job` and write the executable `job.script`.
    ///
    /// Returns the script text.
    pub async fn prepare(&self, job: &mut Job, base: ScriptParts) -> Result<String, RunnerError> {
        let backend = self.backend().await?;
        fs::create_dir_all(&job.directory)?;

        let parts = backend.script_parts(job, base)?;
        let script = parts.render(job);
        fs::write(&job.script, &script)?;
        make_executable(&job.script)?;
        backend.script_written(job)?;

        tracing::debug!("Wrote {}", job.script);
        Ok(script)
    }
}

#[cfg(unix)]
fn make_executable(path: &camino::Utf8Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o755);
    fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn make_executable(_path: &camino::Utf8Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8Path;
    use porter_core::RunnerConfig;
    use porter_core::testing::{Response, ScriptedExecutor};
    use serde_json::json;
    use tempfile::TempDir;

    fn context(kind: RunnerKind, runner: RunnerConfig, executor: Arc<ScriptedExecutor>) -> RunnerContext {
        let proc = Arc::new(ProcessDefinition::new("pCtx").with_runner(runner));
        RunnerContext::new(kind, proc, executor)
    }

    #[tokio::test]
    async fn test_backend_initializes_once() {
        let executor = Arc::new(ScriptedExecutor::new());
        let ctx = context(
            RunnerKind::Ssh,
            RunnerConfig::new().with("ssh_servers", json!(["node1", "node2"])),
            executor.clone(),
        );

        let (a, b) = tokio::join!(ctx.backend(), ctx.backend());
        assert_eq!(a.unwrap().name(), "ssh");
        assert_eq!(b.unwrap().name(), "ssh");
        ctx.backend().await.unwrap();

        // One health check per server
        assert_eq!(executor.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_init_is_reported() {
        let executor = Arc::new(ScriptedExecutor::new().on("node1", Response::Timeout));
        let ctx = context(
            RunnerKind::Ssh,
            RunnerConfig::new().with("ssh_servers", json!(["node1"])),
            executor,
        );
        assert!(matches!(ctx.backend().await, Err(RunnerError::NoServerAlive)));
    }

    #[tokio::test]
    async fn test_prepare_writes_script() {
        let temp = TempDir::new().unwrap();
        let dir = Utf8Path::from_path(temp.path()).unwrap().join("1");
        let ctx = context(
            RunnerKind::Sge,
            RunnerConfig::new().with("sge_q", "all.q"),
            Arc::new(ScriptedExecutor::new()),
        );
        let mut job = ctx.job(0, dir.clone());

        let script = ctx
            .prepare(&mut job, ScriptParts::new(vec!["echo".into(), "hi".into()]))
            .await
            .unwrap();

        assert_eq!(fs::read_to_string(dir.join("job.script")).unwrap(), script);
        assert!(script.starts_with("#!/usr/bin/env bash\n#$ -N pCtx.notag..1\n#$ -cwd\n"));
        assert!(script.contains("#$ -q all.q\n"));
        // qsub captures output itself
        assert!(script.ends_with("\necho hi\n"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(dir.join("job.script")).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }

    #[tokio::test]
    async fn test_prepare_dry_leaves_script_backdated() {
        let temp = TempDir::new().unwrap();
        let dir = Utf8Path::from_path(temp.path()).unwrap();
        let ctx = context(RunnerKind::Dry, RunnerConfig::new(), Arc::new(ScriptedExecutor::new()));
        let mut job = ctx.job(0, dir);

        let old = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_700_000_000);
        let file = fs::File::create(&job.script).unwrap();
        file.set_modified(old).unwrap();
        drop(file);

        let started = std::time::SystemTime::now();
        ctx.prepare(&mut job, ScriptParts::new(vec!["sort".into()]))
            .await
            .unwrap();

        // Rewritten, then pushed into the past
        let mtime = fs::metadata(&job.script).unwrap().modified().unwrap();
        assert!(mtime > old);
        assert!(mtime < started);
        let lag = started.duration_since(mtime).unwrap();
        assert!(lag <= porter_local::BACKDATE + std::time::Duration::from_secs(60));
        assert!(lag >= porter_local::BACKDATE - std::time::Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_prepare_rejects_forbidden_option() {
        let temp = TempDir::new().unwrap();
        let dir = Utf8Path::from_path(temp.path()).unwrap();
        let ctx = context(
            RunnerKind::Slurm,
            RunnerConfig::new().with("slurm_o", "out.log"),
            Arc::new(ScriptedExecutor::new()),
        );
        let mut job = ctx.job(0, dir);
        let result = ctx.prepare(&mut job, ScriptParts::default()).await;
        assert!(matches!(result, Err(RunnerError::Config(_))));
        assert!(!dir.join("job.script").exists());
    }
}
