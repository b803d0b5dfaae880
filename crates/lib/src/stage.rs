//! Running a single external build stage.
//!
//! A stage is one tool invocation (the configuration tool or the build tool)
//! run to completion in the build directory. The runner only looks at how the
//! process ended; whatever the tool writes to disk or prints is its own
//! business.

use std::fmt;
use std::future::Future;
use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use serde::{Serialize, Serializer};
use tokio::process::Command;
use tracing::{debug, info};

use crate::types::CommandSpec;

/// Which stage of the build sequence a command belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
  Configure,
  Build,
}

impl Stage {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Configure => "configure",
      Self::Build => "build",
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// How a stage's process ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StageOutcome {
  Success,
  /// The process ran and reported failure. `code` is `None` when it was
  /// terminated by a signal.
  NonZeroExit { code: Option<i32> },
  /// The process could not be started.
  LaunchFailure {
    #[serde(serialize_with = "serialize_error_kind")]
    kind: io::ErrorKind,
    message: String,
  },
}

impl StageOutcome {
  pub fn is_success(&self) -> bool {
    matches!(self, Self::Success)
  }

  fn from_status(status: ExitStatus) -> Self {
    if status.success() {
      Self::Success
    } else {
      Self::NonZeroExit { code: status.code() }
    }
  }

  fn from_launch_error(err: &io::Error) -> Self {
    Self::LaunchFailure {
      kind: err.kind(),
      message: err.to_string(),
    }
  }
}

impl fmt::Display for StageOutcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Success => write!(f, "succeeded"),
      Self::NonZeroExit { code: Some(code) } => write!(f, "exited with code {}", code),
      Self::NonZeroExit { code: None } => write!(f, "terminated by signal"),
      Self::LaunchFailure { message, .. } => write!(f, "failed to launch: {}", message),
    }
  }
}

fn serialize_error_kind<S: Serializer>(kind: &io::ErrorKind, serializer: S) -> Result<S::Ok, S::Error> {
  serializer.collect_str(kind)
}

/// Executes one stage command and reports how it ended.
///
/// The returned future resolves only once the process has terminated.
pub trait StageRunner {
  fn run(&self, command: &CommandSpec, working_dir: &Path) -> impl Future<Output = StageOutcome> + Send;
}

/// What happens to a stage's stdout and stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
  /// Pass through to the parent's streams.
  #[default]
  Inherit,
  /// Collect, then log at debug level after the process exits.
  Capture,
}

/// [`StageRunner`] that spawns real processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
  pub output: OutputMode,
}

impl ProcessRunner {
  pub fn new(output: OutputMode) -> Self {
    Self { output }
  }
}

impl StageRunner for ProcessRunner {
  async fn run(&self, command: &CommandSpec, working_dir: &Path) -> StageOutcome {
    info!(cmd = %command, cwd = %working_dir.display(), "running stage command");

    let mut process = Command::new(&command.program);
    process.args(&command.args).current_dir(working_dir).stdin(Stdio::null());

    let outcome = match self.output {
      OutputMode::Inherit => match process.status().await {
        Ok(status) => StageOutcome::from_status(status),
        Err(err) => StageOutcome::from_launch_error(&err),
      },
      OutputMode::Capture => match process.output().await {
        Ok(output) => {
          let stdout = String::from_utf8_lossy(&output.stdout);
          let stderr = String::from_utf8_lossy(&output.stderr);
          if !stdout.is_empty() {
            debug!(stdout = %stdout, "command stdout");
          }
          if !stderr.is_empty() {
            debug!(stderr = %stderr, "command stderr");
          }
          StageOutcome::from_status(output.status)
        }
        Err(err) => StageOutcome::from_launch_error(&err),
      },
    };

    debug!(cmd = %command, outcome = %outcome, "stage command finished");
    outcome
  }
}
