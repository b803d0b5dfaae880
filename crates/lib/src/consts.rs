//! Fixed names and default values.

pub const APP_NAME: &str = "extforge";

/// Out-of-tree build root, relative to the invocation directory.
pub const DEFAULT_BUILD_DIR: &str = "cmake_build";

/// Source tree handed to the configuration tool, relative to the build directory.
pub const DEFAULT_SOURCE_DIR: &str = "../opensfm/src";

pub const DEFAULT_CONFIG_TOOL: &str = "cmake";
pub const DEFAULT_BUILD_TOOL: &str = "make";
pub const DEFAULT_JOBS: usize = 4;

/// Interpreter queried for the runtime version when none is given.
pub const DEFAULT_INTERPRETER: &str = "python3";

/// Runtimes at or above this major version get the binding-selection flags.
pub const PYTHON3_MAJOR_THRESHOLD: u32 = 3;

pub const DEFAULT_FEATURE_FLAG: &str = "-DBUILD_FOR_PYTHON3=ON";
pub const DEFAULT_COMPONENT_PREFIX: &str = "-DBOOST_PYTHON3_COMPONENT=";

/// Environment overrides read by [`crate::config::BuildConfig::from_env`].
pub mod env {
  pub const CONFIG_TOOL: &str = "EXTFORGE_CONFIG_TOOL";
  pub const BUILD_TOOL: &str = "EXTFORGE_BUILD_TOOL";
  pub const JOBS: &str = "EXTFORGE_JOBS";
  pub const BUILD_DIR: &str = "EXTFORGE_BUILD_DIR";
  pub const SOURCE_DIR: &str = "EXTFORGE_SOURCE_DIR";
}
