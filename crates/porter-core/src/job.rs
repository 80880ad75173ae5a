//! Job types.

use crate::error::RunnerError;
use crate::process::ProcessDefinition;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Weak};

/// Kind of a declared job output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// A single file
    File,
    /// A directory
    Dir,
    /// A plain value with nothing on disk
    Var,
}

impl FromStr for OutputKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" | "path" => Ok(Self::File),
            "dir" | "folder" => Ok(Self::Dir),
            "var" => Ok(Self::Var),
            other => Err(format!("Unknown output type: {}", other)),
        }
    }
}

/// A declared output, relative to the job's `output/` directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub kind: OutputKind,
    pub path: String,
}

impl OutputSpec {
    pub fn new(kind: OutputKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

impl FromStr for OutputSpec {
    type Err = String;

    /// Parse `kind:path`, e.g. `file:sorted.bam` or `dir:plots/`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, path) = s
            .split_once(':')
            .ok_or_else(|| format!("Expected <type>:<path>, got: {}", s))?;
        if path.is_empty() {
            return Err(format!("Empty output path: {}", s));
        }
        Ok(Self::new(kind.parse()?, path))
    }
}

/// Remote host a job was bound to by the ssh runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub server: String,
    pub key: Option<String>,
}

impl fmt::Display for RemoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.server)
    }
}

/// One unit of work handed to a runner.
#[derive(Debug, Clone)]
pub struct Job {
    /// Ordinal within the process
    pub index: usize,

    /// Job directory holding the script, captured output and `output/`
    pub directory: Utf8PathBuf,

    /// Path to the generated script
    pub script: Utf8PathBuf,

    /// Declared outputs, in order
    pub outputs: Vec<OutputSpec>,

    /// Runner-assigned handle: local PID, ssh client PID or scheduler job ID
    pub pid: Option<String>,

    /// Whether results of this run may be cached
    pub cache: bool,

    /// Data available to job name templates
    pub data: BTreeMap<String, String>,

    /// Remote target, set by the ssh runner
    pub remote: Option<RemoteTarget>,

    proc: Weak<ProcessDefinition>,
}

impl Job {
    pub fn new(
        index: usize,
        directory: impl Into<Utf8PathBuf>,
        proc: &Arc<ProcessDefinition>,
    ) -> Self {
        let directory = directory.into();
        Self {
            index,
            script: directory.join("job.script"),
            directory,
            outputs: Vec::new(),
            pid: None,
            cache: true,
            data: BTreeMap::new(),
            remote: None,
            proc: Arc::downgrade(proc),
        }
    }

    pub fn with_outputs(mut self, outputs: Vec<OutputSpec>) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// The owning process definition.
    pub fn proc(&self) -> Result<Arc<ProcessDefinition>, RunnerError> {
        self.proc
            .upgrade()
            .ok_or(RunnerError::ProcessDropped(self.index))
    }

    pub fn stdout_path(&self) -> Utf8PathBuf {
        self.directory.join("job.stdout")
    }

    pub fn stderr_path(&self) -> Utf8PathBuf {
        self.directory.join("job.stderr")
    }

    pub fn output_dir(&self) -> Utf8PathBuf {
        self.directory.join("output")
    }

    pub fn output_path(&self, relative: &str) -> Utf8PathBuf {
        self.output_dir().join(relative)
    }

    pub fn script(&self) -> &Utf8Path {
        &self.script
    }

    /// The pid, unless unset or blank.
    pub fn pid(&self) -> Option<&str> {
        self.pid.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }

    /// The pid as a scheduler job ID: digits only, so unset and negative
    /// placeholders never reach `qstat`/`squeue`.
    pub fn scheduler_id(&self) -> Option<&str> {
        self.pid().filter(|p| p.bytes().all(|b| b.is_ascii_digit()))
    }

    /// The pid as a non-negative process ID.
    ///
    /// Returns `None` when unset, not numeric, or negative.
    pub fn process_id(&self) -> Option<u32> {
        let pid: i64 = self.pid()?.parse().ok()?;
        u32::try_from(pid).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proc() -> Arc<ProcessDefinition> {
        Arc::new(ProcessDefinition::new("pTest"))
    }

    #[test]
    fn test_job_paths() {
        let proc = proc();
        let job = Job::new(0, "/work/pTest/1", &proc);
        assert_eq!(job.script, "/work/pTest/1/job.script");
        assert_eq!(job.stdout_path(), "/work/pTest/1/job.stdout");
        assert_eq!(job.stderr_path(), "/work/pTest/1/job.stderr");
        assert_eq!(job.output_path("a.txt"), "/work/pTest/1/output/a.txt");
    }

    #[test]
    fn test_process_id() {
        let proc = proc();
        let mut job = Job::new(0, "/tmp", &proc);
        assert_eq!(job.process_id(), None);

        job.pid = Some("1234".to_string());
        assert_eq!(job.process_id(), Some(1234));

        job.pid = Some("-1".to_string());
        assert_eq!(job.process_id(), None);

        job.pid = Some("abc".to_string());
        assert_eq!(job.process_id(), None);

        job.pid = Some("  ".to_string());
        assert_eq!(job.pid(), None);
    }

    #[test]
    fn test_scheduler_id() {
        let proc = proc();
        let mut job = Job::new(0, "/tmp", &proc);
        assert_eq!(job.scheduler_id(), None);

        job.pid = Some(" 6556149\n".to_string());
        assert_eq!(job.scheduler_id(), Some("6556149"));

        for bad in ["-1", "", "12;rm", "4.2"] {
            job.pid = Some(bad.to_string());
            assert_eq!(job.scheduler_id(), None, "{}", bad);
        }
    }

    #[test]
    fn test_proc_backreference_is_weak() {
        let proc = proc();
        let job = Job::new(3, "/tmp", &proc);
        assert_eq!(job.proc().unwrap().id, "pTest");

        drop(proc);
        assert!(matches!(job.proc(), Err(RunnerError::ProcessDropped(3))));
    }

    #[test]
    fn test_parse_output_spec() {
        let spec: OutputSpec = "file:a.txt".parse().unwrap();
        assert_eq!(spec, OutputSpec::new(OutputKind::File, "a.txt"));

        let spec: OutputSpec = "dir:b/".parse().unwrap();
        assert_eq!(spec, OutputSpec::new(OutputKind::Dir, "b/"));

        assert!("a.txt".parse::<OutputSpec>().is_err());
        assert!("file:".parse::<OutputSpec>().is_err());
        assert!("blob:x".parse::<OutputSpec>().is_err());
    }
}
