//! Translate runner options into scheduler directive lines.

use crate::config::{RunnerConfig, value_to_string};
use crate::error::RunnerError;
use serde_json::Value;

/// How an option name becomes a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionStyle {
    /// Always `-name` / `-name value` (grid engine)
    SingleDash,
    /// `-x` / `-x value` for one-letter names, `--name` / `--name=value`
    /// otherwise (Slurm)
    ByLength,
}

/// Builds the directive block of a batch script.
///
/// Every `<prefix>*` key that is not reserved becomes one directive:
/// `true` gives a bare flag, anything else a flag with its value.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerHeaderBuilder {
    /// Directive marker, e.g. `#$` or `#SBATCH`
    pub directive: &'static str,
    /// Option key prefix, e.g. `sge_`
    pub prefix: &'static str,
    /// Keys consumed by the runner itself
    pub reserved: &'static [&'static str],
    /// Keys the runner sets itself and users may not override
    pub forbidden: &'static [&'static str],
    pub style: OptionStyle,
}

impl SchedulerHeaderBuilder {
    /// A single directive line.
    pub fn line(&self, body: &str) -> String {
        format!("{} {}\n", self.directive, body)
    }

    fn flag(&self, name: &str, value: &Value) -> String {
        let bare = matches!(value, Value::Bool(true));
        let value = value_to_string(value);
        match self.style {
            OptionStyle::ByLength if name.chars().count() > 1 => {
                if bare {
                    format!("--{}", name)
                } else {
                    format!("--{}={}", name, value)
                }
            }
            _ => {
                if bare {
                    format!("-{}", name)
                } else {
                    format!("-{} {}", name, value)
                }
            }
        }
    }

    /// Directives for all user options, in sorted key order.
    pub fn translate(&self, config: &RunnerConfig) -> Result<String, RunnerError> {
        let mut header = String::new();
        for (key, value) in config.iter() {
            let Some(name) = key.strip_prefix(self.prefix) else {
                continue;
            };
            if name.is_empty() || self.reserved.contains(&key.as_str()) || value.is_null() {
                continue;
            }
            if self.forbidden.contains(&key.as_str()) {
                return Err(RunnerError::Config(format!(
                    "{} cannot be configured, the runner sets it (got {})",
                    self.forbidden.join(", "),
                    key
                )));
            }
            header.push_str(&self.line(&self.flag(name, value)));
        }
        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SGE: SchedulerHeaderBuilder = SchedulerHeaderBuilder {
        directive: "#$",
        prefix: "sge_",
        reserved: &["sge_N", "sge_qsub"],
        forbidden: &["sge_o", "sge_e", "sge_cwd"],
        style: OptionStyle::SingleDash,
    };

    const SLURM: SchedulerHeaderBuilder = SchedulerHeaderBuilder {
        directive: "#SBATCH",
        prefix: "slurm_",
        reserved: &["slurm_J"],
        forbidden: &["slurm_o", "slurm_e"],
        style: OptionStyle::ByLength,
    };

    #[test]
    fn test_single_dash_flags() {
        let config = RunnerConfig::new()
            .with("sge_notify", true)
            .with("sge_q", "all.q")
            .with("sge_pe", "smp 4")
            .with("sge_N", "ignored")
            .with("sge_qsub", "/usr/bin/qsub")
            .with("slurm_p", "other runner");
        assert_eq!(
            SGE.translate(&config).unwrap(),
            "#$ -notify\n#$ -pe smp 4\n#$ -q all.q\n"
        );
    }

    #[test]
    fn test_by_length_flags() {
        let config = RunnerConfig::new()
            .with("slurm_p", "short")
            .with("slurm_exclusive", true)
            .with("slurm_mem", "4G")
            .with("slurm_c", 4)
            .with("slurm_J", "ignored");
        assert_eq!(
            SLURM.translate(&config).unwrap(),
            "#SBATCH -c 4\n#SBATCH --exclusive\n#SBATCH --mem=4G\n#SBATCH -p short\n"
        );
    }

    #[test]
    fn test_false_is_stringified() {
        let config = RunnerConfig::new().with("sge_notify", false);
        assert_eq!(SGE.translate(&config).unwrap(), "#$ -notify false\n");
    }

    #[test]
    fn test_forbidden_keys() {
        for key in ["sge_o", "sge_e", "sge_cwd"] {
            let config = RunnerConfig::new().with(key, "x");
            assert!(matches!(SGE.translate(&config), Err(RunnerError::Config(_))));
        }
        let config = RunnerConfig::new().with("slurm_e", "err.log");
        assert!(matches!(SLURM.translate(&config), Err(RunnerError::Config(_))));
    }
}
