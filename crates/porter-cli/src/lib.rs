//! CLI argument parsing for porter.

use camino::Utf8PathBuf;
use clap::Parser;
use porter_core::OutputSpec;
use porter_registry::RunnerKind;

#[derive(Parser, Debug)]
#[command(name = "porter")]
#[command(about = "Run a job through a local, dry, ssh, SGE or SLURM runner")]
pub struct Args {
    /// Runner backend (local, dry, ssh, sge, slurm)
    #[arg(short, long, default_value = "local")]
    pub runner: RunnerKind,

    /// Process definition file (JSON)
    #[arg(short, long)]
    pub config: Option<Utf8PathBuf>,

    /// Process id, used when no config file is given
    #[arg(long, default_value = "porter")]
    pub id: String,

    /// Job directory
    #[arg(short, long, default_value = "porter-job")]
    pub workdir: Utf8PathBuf,

    /// Job index within the process
    #[arg(long, default_value = "0")]
    pub index: usize,

    /// Declared output as TYPE:PATH (file or dir), repeatable
    #[arg(long = "output", value_name = "TYPE:PATH")]
    pub outputs: Vec<OutputSpec>,

    /// Template data as KEY=VALUE, repeatable
    #[arg(long = "data", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub data: Vec<(String, String)>,

    /// Poll interval in seconds
    #[arg(long, default_value = "5")]
    pub poll_interval: u64,

    /// Write the job script and print it without submitting
    #[arg(long)]
    pub no_submit: bool,

    /// Increase log verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Command to run
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Expected KEY=VALUE, got: {}", s))?;
    Ok((key.trim().to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use porter_core::OutputKind;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["porter", "echo", "hi"]).unwrap();
        assert_eq!(args.runner, RunnerKind::Local);
        assert_eq!(args.workdir, "porter-job");
        assert_eq!(args.poll_interval, 5);
        assert_eq!(args.command, ["echo", "hi"]);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_full_arguments() {
        let args = Args::try_parse_from([
            "porter",
            "--runner",
            "slurm",
            "--config",
            "proc.json",
            "--output",
            "file:a.txt",
            "--output",
            "dir:b/",
            "--data",
            "sample=S1",
            "-vv",
            "--",
            "sort",
            "-k1,1",
            "in.bed",
        ])
        .unwrap();
        assert_eq!(args.runner, RunnerKind::Slurm);
        assert_eq!(args.config.unwrap(), "proc.json");
        assert_eq!(args.outputs.len(), 2);
        assert_eq!(args.outputs[1].kind, OutputKind::Dir);
        assert_eq!(args.data, [("sample".to_string(), "S1".to_string())]);
        assert_eq!(args.verbose, 2);
        assert_eq!(args.command, ["sort", "-k1,1", "in.bed"]);
    }

    #[test]
    fn test_rejects_unknown_runner() {
        assert!(Args::try_parse_from(["porter", "--runner", "pbs"]).is_err());
        assert!(Args::try_parse_from(["porter", "--output", "a.txt"]).is_err());
        assert!(Args::try_parse_from(["porter", "--data", "novalue"]).is_err());
    }
}
