//! Configuration and build command synthesis.
//!
//! Everything here is pure: the same inputs always produce the same
//! [`CommandSpec`], and nothing touches the filesystem or spawns processes.

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_COMPONENT_PREFIX, DEFAULT_FEATURE_FLAG, PYTHON3_MAJOR_THRESHOLD};
use crate::runtime::RuntimeVersion;
use crate::types::CommandSpec;

/// Flags appended to the configuration command for newer runtimes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionFlags {
  /// Appended verbatim.
  pub feature_flag: String,
  /// Prefix of the component-selection flag; the component name is appended to it.
  pub component_prefix: String,
}

impl Default for VersionFlags {
  fn default() -> Self {
    Self {
      feature_flag: DEFAULT_FEATURE_FLAG.to_string(),
      component_prefix: DEFAULT_COMPONENT_PREFIX.to_string(),
    }
  }
}

/// Name of the binding-library component matching `version`, e.g. `python-py39`.
pub fn component_name(version: RuntimeVersion) -> String {
  format!("python-py{}{}", version.major, version.minor)
}

/// Build the configuration command for `version`.
///
/// Starts from `base` (tool plus source tree). When the runtime's major
/// version reaches the threshold, the feature flag and the component
/// selection flag are appended in that order; otherwise `base` is returned
/// unchanged.
pub fn plan(version: RuntimeVersion, base: &CommandSpec, flags: &VersionFlags) -> CommandSpec {
  let mut command = base.clone();

  if version.major >= PYTHON3_MAJOR_THRESHOLD {
    command.args.push(flags.feature_flag.clone());
    command
      .args
      .push(format!("{}{}", flags.component_prefix, component_name(version)));
  }

  command
}

/// `<tool> -j<jobs>`
pub fn build_command(tool: &str, jobs: usize) -> CommandSpec {
  CommandSpec::new(tool).arg(format!("-j{}", jobs))
}
