//! Runner configuration and process definition loading.

use crate::process::ProcessDefinition;
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Backend options of a process, keyed by backend prefix (`ssh_servers`,
/// `sge_N`, `slurm_J`, ...).
///
/// Keys iterate in sorted order, which fixes the order of generated
/// scheduler directives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunnerConfig(BTreeMap<String, Value>);

impl RunnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// String value of `key`, or `default` when absent or null.
    pub fn str_or(&self, key: &str, default: &str) -> String {
        match self.get(key) {
            None | Some(Value::Null) => default.to_string(),
            Some(value) => value_to_string(value),
        }
    }

    /// String value of `key`, if set.
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.get(key) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value_to_string(value)),
        }
    }

    /// Numeric value of `key`. Numeric strings are accepted.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// List of strings. A scalar is treated as a one-element list.
    pub fn string_list(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.iter().map(value_to_string).collect(),
            Some(value) => vec![value_to_string(value)],
        }
    }

    /// List whose entries may be disabled with `false`, `null` or `""`.
    pub fn optional_string_list(&self, key: &str) -> Vec<Option<String>> {
        let optional = |value: &Value| match value {
            Value::Null | Value::Bool(false) => None,
            Value::String(s) if s.is_empty() => None,
            other => Some(value_to_string(other)),
        };
        match self.get(key) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.iter().map(optional).collect(),
            Some(value) => vec![optional(value)],
        }
    }
}

impl FromIterator<(String, Value)> for RunnerConfig {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Render a config value the way it appears on a command line.
///
/// Strings are taken verbatim; everything else uses its JSON form.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn default_tag() -> String {
    "notag".to_string()
}

/// On-disk form of a process definition.
///
/// ```json
/// {
///   "id": "pAlign",
///   "tag": "hg38",
///   "runner": { "slurm_p": "short", "slurm_mem": "4G" },
///   "envs": { "sample": "S1" }
/// }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProcessConfig {
    pub id: String,
    #[serde(default = "default_tag")]
    pub tag: String,
    #[serde(default)]
    pub suffix: String,
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub envs: BTreeMap<String, String>,
}

impl ProcessConfig {
    /// Load a process definition from a JSON file.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn into_definition(self) -> ProcessDefinition {
        ProcessDefinition::new(self.id)
            .with_tag(self.tag)
            .with_suffix(self.suffix)
            .with_runner(self.runner)
            .with_envs(self.envs)
    }
}
