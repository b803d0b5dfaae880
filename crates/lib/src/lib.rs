//! extforge-lib: build orchestration for a Python package's native extension.
//!
//! The extension is compiled out of tree before packaging:
//! - `prepare`: create or confirm the build directory
//! - `plan`: synthesize the configuration command for a runtime version
//! - `stage`: run one external tool and report how it ended
//! - `orchestrate`: sequence the above, stopping at the first failure
//! - `package`: hand a successful build to the package manifest

pub mod config;
pub mod consts;
pub mod orchestrate;
pub mod package;
pub mod plan;
pub mod platform;
pub mod prepare;
pub mod runtime;
pub mod stage;
pub mod types;
pub mod util;

pub use config::{BuildConfig, ConfigError};
pub use orchestrate::{BuildFailure, BuildResult, Orchestrator, Phase};
pub use package::{PackageDescriptor, PackageError, PackageManifest};
pub use prepare::{FilesystemError, FilesystemErrorKind, ensure_directory};
pub use runtime::{RuntimeError, RuntimeVersion};
pub use stage::{OutputMode, ProcessRunner, Stage, StageOutcome, StageRunner};
pub use types::CommandSpec;
