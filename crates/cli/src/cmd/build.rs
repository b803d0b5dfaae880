//! Implementation of the `extforge build` command.
//!
//! Prepares the build directory, runs the configuration tool and then the
//! build tool, and reports which stage failed if any did.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde_json::json;

use extforge_lib::{BuildConfig, BuildFailure, BuildResult, Orchestrator, OutputMode, ProcessRunner, RuntimeVersion};

use crate::cmd::BuildArgs;
use crate::output::{OutputFormat, format_elapsed, print_done, print_failure, print_field, print_json, print_step};

/// A finished orchestration run and what went into it.
pub struct BuildRun {
  pub config: BuildConfig,
  pub version: RuntimeVersion,
  pub result: BuildResult,
  pub elapsed: Duration,
}

/// Resolve configuration and runtime version, then orchestrate the build.
pub fn run_build(args: &BuildArgs, output: OutputFormat) -> Result<BuildRun> {
  let config = args.config()?;

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let version = args.runtime_version(&rt)?;

  if !output.is_json() {
    print_step(&format!(
      "Building native extension for Python {} in {}",
      version,
      config.build_dir.display()
    ));
  }

  let mode = if args.capture {
    OutputMode::Capture
  } else {
    OutputMode::Inherit
  };
  let orchestrator = Orchestrator::new(config, ProcessRunner::new(mode));

  let started = Instant::now();
  let result = rt.block_on(orchestrator.run(version));
  let elapsed = started.elapsed();

  Ok(BuildRun {
    config: orchestrator.config().clone(),
    version,
    result,
    elapsed,
  })
}

/// Print a failed run; shared by `build` and `package`.
pub fn report_failure(failure: &BuildFailure, output: OutputFormat) -> Result<()> {
  if output.is_json() {
    return print_json(&failure_json(failure));
  }

  print_failure(failure);
  Ok(())
}

fn failure_json(failure: &BuildFailure) -> serde_json::Value {
  match failure {
    BuildFailure::Prepare(err) => json!({
      "status": "failed",
      "stage": "prepare",
      "path": err.path,
      "kind": err.kind,
      "error": failure.to_string(),
    }),
    BuildFailure::Stage { stage, command, outcome } => json!({
      "status": "failed",
      "stage": stage,
      "command": command,
      "outcome": outcome,
      "error": failure.to_string(),
    }),
  }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn elapsed_ms(elapsed: Duration) -> u64 {
  u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

pub fn cmd_build(args: &BuildArgs, output: OutputFormat) -> Result<()> {
  let run = run_build(args, output)?;

  match &run.result {
    BuildResult::Ready { build_dir } => {
      let build_dir = dunce::canonicalize(build_dir).unwrap_or_else(|_| build_dir.clone());

      if output.is_json() {
        return print_json(&json!({
          "status": "ready",
          "build_dir": build_dir,
          "runtime_version": run.version,
          "configure": run.config.configure_command(run.version),
          "build": run.config.build_command(),
          "elapsed_ms": elapsed_ms(run.elapsed),
        }));
      }

      print_done("Native extension built");
      print_field("Build directory", build_dir.display());
      print_field("Elapsed", format_elapsed(run.elapsed));
      Ok(())
    }
    BuildResult::Failed(failure) => {
      report_failure(failure, output)?;
      std::process::exit(1);
    }
  }
}
