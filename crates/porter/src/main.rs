//! Porter - submit a job script through a pluggable runner and watch it.

mod watch;

use clap::Parser;
use miette::{IntoDiagnostic, Result, miette};
use porter_cli::Args;
use porter_core::{ProcessConfig, ProcessDefinition, ScriptParts};
use porter_exec::TokioExecutor;
use porter_registry::RunnerContext;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use watch::{WaitOutcome, wait_for};

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_process(args: &Args) -> Result<ProcessDefinition> {
    match &args.config {
        Some(path) => Ok(ProcessConfig::load(path).into_diagnostic()?.into_definition()),
        None => Ok(ProcessDefinition::new(args.id.clone())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let proc = Arc::new(load_process(&args)?);
    let ctx = RunnerContext::new(args.runner, proc, Arc::new(TokioExecutor));

    let mut job = ctx
        .job(args.index, args.workdir.clone())
        .with_outputs(args.outputs.clone());
    for (key, value) in &args.data {
        job.data.insert(key.clone(), value.clone());
    }

    let script = ctx
        .prepare(&mut job, ScriptParts::new(args.command.clone()))
        .await
        .into_diagnostic()?;
    if args.no_submit {
        print!("{}", script);
        return Ok(());
    }

    let backend = ctx.backend().await.into_diagnostic()?;
    let result = backend.submit(&mut job).await.into_diagnostic()?;
    if !result.success() {
        eprintln!("{}", result.stderr.trim_end());
        return Err(miette!(
            "Submission failed with code {}: {}",
            result.return_code,
            result.command_line
        ));
    }
    tracing::info!(
        "Submitted job #{} via {} ({})",
        job.index,
        backend.name(),
        job.pid().unwrap_or("-")
    );

    let outcome = wait_for(
        backend,
        &job,
        Duration::from_secs(args.poll_interval.max(1)),
        tokio::signal::ctrl_c(),
    )
    .await;

    let elapsed = chrono::Utc::now() - result.submitted_at;
    match outcome {
        WaitOutcome::Finished => {
            tracing::info!(
                "Job #{} finished after {}s, output in {}",
                job.index,
                elapsed.num_seconds(),
                job.directory
            );
            Ok(())
        }
        WaitOutcome::Killed => Err(miette!("Job #{} was killed", job.index)),
    }
}
