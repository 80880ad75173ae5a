//! Process definitions and job name templates.

use crate::config::RunnerConfig;
use crate::error::RunnerError;
use crate::job::Job;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Renders configuration strings against job data.
pub trait TemplateRenderer: Debug + Send + Sync {
    fn render(
        &self,
        source: &str,
        envs: &BTreeMap<String, String>,
        data: &BTreeMap<String, String>,
    ) -> Result<String, RunnerError>;
}

/// `{{ name }}` substitution. Job data shadows process envs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleTemplate;

impl TemplateRenderer for SimpleTemplate {
    fn render(
        &self,
        source: &str,
        envs: &BTreeMap<String, String>,
        data: &BTreeMap<String, String>,
    ) -> Result<String, RunnerError> {
        let mut out = String::with_capacity(source.len());
        let mut rest = source;

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after
                .find("}}")
                .ok_or_else(|| RunnerError::Template(format!("Unclosed '{{{{' in: {}", source)))?;
            let name = after[..end].trim();
            let value = data
                .get(name)
                .or_else(|| envs.get(name))
                .ok_or_else(|| RunnerError::Template(format!("Unknown variable: {}", name)))?;
            out.push_str(value);
            rest = &after[end + 2..];
        }
        out.push_str(rest);

        Ok(out)
    }
}

/// A process: the shared definition behind a group of jobs.
#[derive(Debug, Clone)]
pub struct ProcessDefinition {
    pub id: String,
    pub tag: String,
    pub suffix: String,

    /// Backend options
    pub runner: RunnerConfig,

    /// Template variables
    pub envs: BTreeMap<String, String>,

    template: Arc<dyn TemplateRenderer>,
}

impl ProcessDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag: "notag".to_string(),
            suffix: String::new(),
            runner: RunnerConfig::default(),
            envs: BTreeMap::new(),
            template: Arc::new(SimpleTemplate),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_runner(mut self, runner: RunnerConfig) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_envs(mut self, envs: BTreeMap<String, String>) -> Self {
        self.envs = envs;
        self
    }

    pub fn with_template(mut self, template: Arc<dyn TemplateRenderer>) -> Self {
        self.template = template;
        self
    }

    /// Render `source` for `job`.
    pub fn render(&self, source: &str, job: &Job) -> Result<String, RunnerError> {
        self.template.render(source, &self.envs, &job.data)
    }

    /// `<id>.<tag>.<suffix>.<index + 1>`, with `@` in the tag replaced
    /// since schedulers reject it in job names.
    pub fn default_job_name(&self, job: &Job) -> String {
        format!(
            "{}.{}.{}.{}",
            self.id,
            self.tag.replace('@', "_"),
            self.suffix,
            job.index + 1
        )
    }

    /// Scheduler job name: the template under `key` if configured, else the
    /// default, rendered against the job.
    pub fn job_name(&self, key: &str, job: &Job) -> Result<String, RunnerError> {
        let source = self
            .runner
            .get_str(key)
            .unwrap_or_else(|| self.default_job_name(job));
        self.render(&source, job)
    }
}
