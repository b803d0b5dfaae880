mod build;
mod info;
mod package;
mod plan;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use extforge_lib::consts::DEFAULT_INTERPRETER;
use extforge_lib::{BuildConfig, RuntimeVersion};

pub use build::cmd_build;
pub use info::cmd_info;
pub use package::cmd_package;
pub use plan::cmd_plan;

/// Options shared by every command that plans or runs a build.
///
/// Unset options fall back to `EXTFORGE_*` environment variables, then to
/// built-in defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
  /// Out-of-tree build directory
  #[arg(long)]
  pub build_dir: Option<PathBuf>,

  /// Source tree passed to the configuration tool (relative to the build directory)
  #[arg(long)]
  pub source_dir: Option<PathBuf>,

  /// Runtime version to build for, e.g. 3.9 (skips interpreter detection)
  #[arg(long, conflicts_with = "python")]
  pub python_version: Option<RuntimeVersion>,

  /// Interpreter to query for the runtime version
  #[arg(long)]
  pub python: Option<String>,

  /// Parallel jobs for the build tool
  #[arg(short, long)]
  pub jobs: Option<usize>,

  /// Configuration tool
  #[arg(long)]
  pub config_tool: Option<String>,

  /// Build tool
  #[arg(long)]
  pub build_tool: Option<String>,

  /// Flag enabling the Python 3 build
  #[arg(long, allow_hyphen_values = true)]
  pub feature_flag: Option<String>,

  /// Prefix of the binding component selection flag
  #[arg(long, allow_hyphen_values = true)]
  pub component_prefix: Option<String>,

  /// Capture tool output and log it instead of passing it through
  #[arg(long)]
  pub capture: bool,
}

impl BuildArgs {
  /// Environment-derived configuration with command-line overrides on top.
  pub fn config(&self) -> Result<BuildConfig> {
    let mut config = BuildConfig::from_env().context("Invalid build configuration in environment")?;

    if let Some(dir) = &self.build_dir {
      config.build_dir = dir.clone();
    }
    if let Some(dir) = &self.source_dir {
      config.source_dir = dir.clone();
    }
    if let Some(jobs) = self.jobs {
      config.jobs = jobs;
    }
    if let Some(tool) = &self.config_tool {
      config.config_tool = tool.clone();
    }
    if let Some(tool) = &self.build_tool {
      config.build_tool = tool.clone();
    }
    if let Some(flag) = &self.feature_flag {
      config.flags.feature_flag = flag.clone();
    }
    if let Some(prefix) = &self.component_prefix {
      config.flags.component_prefix = prefix.clone();
    }

    config.validate().context("Invalid build configuration")?;
    Ok(config)
  }

  /// The explicit `--python-version`, or the version reported by the interpreter.
  pub fn runtime_version(&self, rt: &tokio::runtime::Runtime) -> Result<RuntimeVersion> {
    if let Some(version) = self.python_version {
      return Ok(version);
    }

    let interpreter = self.python.as_deref().unwrap_or(DEFAULT_INTERPRETER);
    rt.block_on(RuntimeVersion::detect(interpreter))
      .with_context(|| format!("Failed to detect runtime version from {}", interpreter))
  }
}
