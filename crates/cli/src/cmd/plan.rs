//! Implementation of the `extforge plan` command.
//!
//! Prints the exact commands a build would run, without touching the
//! filesystem or launching the tools.

use anyhow::{Context, Result};

use extforge_lib::Stage;

use crate::cmd::BuildArgs;
use crate::output::{OutputFormat, print_field, print_json, print_stage_command, print_step};

pub fn cmd_plan(args: &BuildArgs, output: OutputFormat) -> Result<()> {
  let config = args.config()?;

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let version = args.runtime_version(&rt)?;

  let configure = config.configure_command(version);
  let build = config.build_command();

  if output.is_json() {
    return print_json(&serde_json::json!({
      "runtime_version": version,
      "build_dir": config.build_dir,
      "configure": configure,
      "build": build,
    }));
  }

  print_step(&format!("Build plan for Python {}", version));
  print_field("Build directory", config.build_dir.display());
  println!();
  print_stage_command(Stage::Configure, &configure);
  print_stage_command(Stage::Build, &build);

  Ok(())
}
