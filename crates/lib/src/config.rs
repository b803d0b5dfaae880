//! Build configuration.
//!
//! Defaults come from [`crate::consts`]; [`BuildConfig::from_env`] layers the
//! `EXTFORGE_*` environment overrides on top. Callers (the CLI) apply their
//! own flags after that.

use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

use crate::consts::{self, env};
use crate::plan::{self, VersionFlags};
use crate::runtime::RuntimeVersion;
use crate::types::CommandSpec;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid value {value:?} for {var}: {reason}")]
  InvalidEnv {
    var: &'static str,
    value: String,
    reason: String,
  },

  #[error("job count must be at least 1")]
  ZeroJobs,

  #[error("{0} must not be empty")]
  EmptyTool(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
  /// Out-of-tree build root.
  pub build_dir: PathBuf,
  /// Source tree passed to the configuration tool. Relative paths are
  /// resolved by the tool against the build directory.
  pub source_dir: PathBuf,
  pub config_tool: String,
  pub build_tool: String,
  /// Parallel jobs passed to the build tool as `-j<N>`.
  pub jobs: usize,
  pub flags: VersionFlags,
}

impl Default for BuildConfig {
  fn default() -> Self {
    Self {
      build_dir: PathBuf::from(consts::DEFAULT_BUILD_DIR),
      source_dir: PathBuf::from(consts::DEFAULT_SOURCE_DIR),
      config_tool: consts::DEFAULT_CONFIG_TOOL.to_string(),
      build_tool: consts::DEFAULT_BUILD_TOOL.to_string(),
      jobs: consts::DEFAULT_JOBS,
      flags: VersionFlags::default(),
    }
  }
}

impl BuildConfig {
  /// Defaults with environment overrides applied.
  pub fn from_env() -> Result<Self, ConfigError> {
    let mut config = Self::default();

    if let Ok(tool) = std::env::var(env::CONFIG_TOOL) {
      config.config_tool = tool;
    }
    if let Ok(tool) = std::env::var(env::BUILD_TOOL) {
      config.build_tool = tool;
    }
    if let Ok(dir) = std::env::var(env::BUILD_DIR) {
      config.build_dir = PathBuf::from(dir);
    }
    if let Ok(dir) = std::env::var(env::SOURCE_DIR) {
      config.source_dir = PathBuf::from(dir);
    }
    if let Ok(jobs) = std::env::var(env::JOBS) {
      config.jobs = jobs.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::InvalidEnv {
        var: env::JOBS,
        value: jobs.clone(),
        reason: e.to_string(),
      })?;
    }

    debug!(config = ?config, "loaded build configuration");
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.jobs == 0 {
      return Err(ConfigError::ZeroJobs);
    }
    if self.config_tool.trim().is_empty() {
      return Err(ConfigError::EmptyTool("configuration tool"));
    }
    if self.build_tool.trim().is_empty() {
      return Err(ConfigError::EmptyTool("build tool"));
    }
    Ok(())
  }

  /// Configuration tool pointed at the source tree, before version flags.
  pub fn configure_base(&self) -> CommandSpec {
    CommandSpec::new(&self.config_tool).arg(self.source_dir.to_string_lossy())
  }

  pub fn configure_command(&self, version: RuntimeVersion) -> CommandSpec {
    plan::plan(version, &self.configure_base(), &self.flags)
  }

  pub fn build_command(&self) -> CommandSpec {
    plan::build_command(&self.build_tool, self.jobs)
  }
}
