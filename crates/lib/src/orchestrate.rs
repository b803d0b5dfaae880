//! Build orchestration.
//!
//! Drives the native extension build as a strict sequence:
//!
//! 1. prepare the build directory
//! 2. run the configuration tool in it
//! 3. run the build tool in it
//!
//! The first failure ends the run. Nothing is retried here; a caller that
//! wants retries re-invokes [`Orchestrator::orchestrate`], which starts over
//! from directory preparation.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::BuildConfig;
use crate::prepare::{FilesystemError, ensure_directory};
use crate::runtime::RuntimeVersion;
use crate::stage::{Stage, StageOutcome, StageRunner};
use crate::types::CommandSpec;

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Idle,
  Preparing,
  Configuring,
  Building,
  /// Terminal; `success` is false when any step failed.
  Done { success: bool },
}

impl fmt::Display for Phase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Idle => "idle",
      Self::Preparing => "preparing",
      Self::Configuring => "configuring",
      Self::Building => "building",
      Self::Done { success: true } => "succeeded",
      Self::Done { success: false } => "failed",
    };
    write!(f, "{}", name)
  }
}

/// Why a run failed.
#[derive(Debug, Error)]
pub enum BuildFailure {
  #[error("failed to prepare build directory: {0}")]
  Prepare(#[from] FilesystemError),

  #[error("{stage} stage {outcome}: {command}")]
  Stage {
    stage: Stage,
    command: CommandSpec,
    outcome: StageOutcome,
  },
}

impl BuildFailure {
  /// The stage that failed, or `None` if the directory could not be prepared.
  pub fn stage(&self) -> Option<Stage> {
    match self {
      Self::Prepare(_) => None,
      Self::Stage { stage, .. } => Some(*stage),
    }
  }
}

/// Terminal value of a run.
#[derive(Debug)]
pub enum BuildResult {
  /// Both stages succeeded; the build tool's artifacts are in `build_dir`.
  Ready { build_dir: PathBuf },
  Failed(BuildFailure),
}

impl BuildResult {
  pub fn is_success(&self) -> bool {
    matches!(self, Self::Ready { .. })
  }

  pub fn build_dir(&self) -> Option<&Path> {
    match self {
      Self::Ready { build_dir } => Some(build_dir),
      Self::Failed(_) => None,
    }
  }

  pub fn failure(&self) -> Option<&BuildFailure> {
    match self {
      Self::Ready { .. } => None,
      Self::Failed(failure) => Some(failure),
    }
  }

  pub fn into_result(self) -> Result<PathBuf, BuildFailure> {
    match self {
      Self::Ready { build_dir } => Ok(build_dir),
      Self::Failed(failure) => Err(failure),
    }
  }
}

/// Sequences directory preparation and the two build stages.
pub struct Orchestrator<R> {
  config: BuildConfig,
  runner: R,
}

impl<R: StageRunner> Orchestrator<R> {
  pub fn new(config: BuildConfig, runner: R) -> Self {
    Self { config, runner }
  }

  pub fn config(&self) -> &BuildConfig {
    &self.config
  }

  pub fn runner(&self) -> &R {
    &self.runner
  }

  /// Run against the configured build directory.
  pub async fn run(&self, version: RuntimeVersion) -> BuildResult {
    let build_dir = self.config.build_dir.clone();
    self.orchestrate(&build_dir, version).await
  }

  /// Prepare `build_dir`, then configure and build inside it.
  pub async fn orchestrate(&self, build_dir: &Path, version: RuntimeVersion) -> BuildResult {
    info!(build_dir = %build_dir.display(), version = %version, "starting extension build");
    debug!(phase = %Phase::Idle, "orchestrator invoked");

    debug!(phase = %Phase::Preparing, "preparing build directory");
    if let Err(err) = ensure_directory(build_dir) {
      let phase = Phase::Done { success: false };
      error!(phase = %phase, error = %err, "build directory preparation failed");
      return BuildResult::Failed(err.into());
    }

    let configure = self.config.configure_command(version);
    debug!(phase = %Phase::Configuring, "configuring");
    if let Err(failure) = self.run_stage(Stage::Configure, configure, build_dir).await {
      return BuildResult::Failed(failure);
    }

    let build = self.config.build_command();
    debug!(phase = %Phase::Building, "compiling extension");
    if let Err(failure) = self.run_stage(Stage::Build, build, build_dir).await {
      return BuildResult::Failed(failure);
    }

    let phase = Phase::Done { success: true };
    info!(phase = %phase, build_dir = %build_dir.display(), "extension build complete");
    BuildResult::Ready {
      build_dir: build_dir.to_path_buf(),
    }
  }

  async fn run_stage(&self, stage: Stage, command: CommandSpec, build_dir: &Path) -> Result<(), BuildFailure> {
    let outcome = self.runner.run(&command, build_dir).await;

    if outcome.is_success() {
      info!(stage = %stage, "stage succeeded");
      return Ok(());
    }

    let phase = Phase::Done { success: false };
    error!(phase = %phase, stage = %stage, cmd = %command, outcome = %outcome, "stage failed");
    Err(BuildFailure::Stage {
      stage,
      command,
      outcome,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::plan::VersionFlags;
  use crate::prepare::FilesystemErrorKind;
  use std::collections::HashMap;
  use std::sync::Mutex;
  use tempfile::TempDir;
  use tracing_test::traced_test;

  /// Records every invocation and answers with a scripted outcome per program.
  #[derive(Default)]
  struct RecordingRunner {
    outcomes: HashMap<String, StageOutcome>,
    calls: Mutex<Vec<(CommandSpec, PathBuf)>>,
  }

  impl RecordingRunner {
    fn with_outcome(mut self, program: &str, outcome: StageOutcome) -> Self {
      self.outcomes.insert(program.to_string(), outcome);
      self
    }

    fn calls(&self) -> Vec<(CommandSpec, PathBuf)> {
      self.calls.lock().unwrap().clone()
    }

    fn calls_to(&self, program: &str) -> Vec<CommandSpec> {
      self
        .calls()
        .into_iter()
        .filter(|(cmd, _)| cmd.program == program)
        .map(|(cmd, _)| cmd)
        .collect()
    }
  }

  impl StageRunner for RecordingRunner {
    async fn run(&self, command: &CommandSpec, working_dir: &Path) -> StageOutcome {
      self
        .calls
        .lock()
        .unwrap()
        .push((command.clone(), working_dir.to_path_buf()));
      self
        .outcomes
        .get(&command.program)
        .cloned()
        .unwrap_or(StageOutcome::Success)
    }
  }

  fn test_config(build_dir: &Path) -> BuildConfig {
    BuildConfig {
      build_dir: build_dir.to_path_buf(),
      source_dir: PathBuf::from("source-path"),
      config_tool: "config-tool".to_string(),
      build_tool: "build-tool".to_string(),
      jobs: 4,
      flags: VersionFlags {
        feature_flag: "--enable-feature".to_string(),
        component_prefix: "--select-component=".to_string(),
      },
    }
  }

  fn exit(code: i32) -> StageOutcome {
    StageOutcome::NonZeroExit { code: Some(code) }
  }

  #[tokio::test]
  async fn successful_run_from_absent_directory() {
    let temp = TempDir::new().unwrap();
    let build_dir = temp.path().join("cmake_build");
    let orchestrator = Orchestrator::new(test_config(&build_dir), RecordingRunner::default());

    let result = orchestrator.orchestrate(&build_dir, RuntimeVersion::new(3, 9)).await;

    assert!(result.is_success());
    assert_eq!(result.build_dir(), Some(build_dir.as_path()));
    assert!(build_dir.is_dir());

    let calls = orchestrator.runner().calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
      calls[0].0.argv(),
      vec!["config-tool", "source-path", "--enable-feature", "--select-component=python-py39"]
    );
    assert_eq!(calls[1].0.argv(), vec!["build-tool", "-j4"]);
    assert!(calls.iter().all(|(_, cwd)| cwd == &build_dir));
  }

  #[tokio::test]
  async fn configure_failure_skips_build() {
    let temp = TempDir::new().unwrap();
    let build_dir = temp.path().join("cmake_build");
    let runner = RecordingRunner::default().with_outcome("config-tool", exit(1));
    let orchestrator = Orchestrator::new(test_config(&build_dir), runner);

    let result = orchestrator.orchestrate(&build_dir, RuntimeVersion::new(3, 9)).await;

    let failure = result.failure().expect("run should fail");
    assert_eq!(failure.stage(), Some(Stage::Configure));
    assert!(orchestrator.runner().calls_to("build-tool").is_empty());
  }

  #[tokio::test]
  async fn configure_launch_failure_skips_build() {
    let temp = TempDir::new().unwrap();
    let build_dir = temp.path().join("cmake_build");
    let missing = StageOutcome::LaunchFailure {
      kind: std::io::ErrorKind::NotFound,
      message: "not found".to_string(),
    };
    let runner = RecordingRunner::default().with_outcome("config-tool", missing.clone());
    let orchestrator = Orchestrator::new(test_config(&build_dir), runner);

    let result = orchestrator.orchestrate(&build_dir, RuntimeVersion::new(3, 9)).await;

    match result {
      BuildResult::Failed(BuildFailure::Stage { stage, outcome, .. }) => {
        assert_eq!(stage, Stage::Configure);
        assert_eq!(outcome, missing);
      }
      other => panic!("unexpected result: {:?}", other),
    }
    assert!(orchestrator.runner().calls_to("build-tool").is_empty());
  }

  #[tokio::test]
  async fn build_failure_is_reported_after_single_configure() {
    let temp = TempDir::new().unwrap();
    let build_dir = temp.path().join("cmake_build");
    let runner = RecordingRunner::default().with_outcome("build-tool", exit(1));
    let orchestrator = Orchestrator::new(test_config(&build_dir), runner);

    let result = orchestrator.orchestrate(&build_dir, RuntimeVersion::new(3, 9)).await;

    match result.into_result() {
      Err(BuildFailure::Stage { stage, outcome, command }) => {
        assert_eq!(stage, Stage::Build);
        assert_eq!(outcome, exit(1));
        assert_eq!(command.program, "build-tool");
      }
      other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(orchestrator.runner().calls_to("config-tool").len(), 1);
  }

  #[tokio::test]
  async fn prepare_failure_runs_no_stage() {
    let temp = TempDir::new().unwrap();
    let build_dir = temp.path().join("cmake_build");
    std::fs::write(&build_dir, "occupied").unwrap();
    let orchestrator = Orchestrator::new(test_config(&build_dir), RecordingRunner::default());

    let result = orchestrator.orchestrate(&build_dir, RuntimeVersion::new(3, 9)).await;

    match result.failure() {
      Some(BuildFailure::Prepare(err)) => assert_eq!(err.kind, FilesystemErrorKind::NotADirectory),
      other => panic!("unexpected failure: {:?}", other),
    }
    assert!(orchestrator.runner().calls().is_empty());
  }

  #[tokio::test]
  async fn repeated_success_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let build_dir = temp.path().join("cmake_build");
    let orchestrator = Orchestrator::new(test_config(&build_dir), RecordingRunner::default());

    assert!(orchestrator.run(RuntimeVersion::new(3, 9)).await.is_success());
    std::fs::write(build_dir.join("csfm.so"), "artifact").unwrap();
    assert!(orchestrator.run(RuntimeVersion::new(3, 9)).await.is_success());

    assert_eq!(orchestrator.runner().calls().len(), 4);
    assert!(build_dir.join("csfm.so").exists());
  }

  #[tokio::test]
  async fn python2_runtime_configures_without_flags() {
    let temp = TempDir::new().unwrap();
    let build_dir = temp.path().join("cmake_build");
    let orchestrator = Orchestrator::new(test_config(&build_dir), RecordingRunner::default());

    orchestrator.orchestrate(&build_dir, RuntimeVersion::new(2, 7)).await;

    let configure = orchestrator.runner().calls_to("config-tool");
    assert_eq!(configure[0].argv(), vec!["config-tool", "source-path"]);
  }

  #[tokio::test]
  #[traced_test]
  async fn stage_failure_is_logged() {
    let temp = TempDir::new().unwrap();
    let build_dir = temp.path().join("cmake_build");
    let runner = RecordingRunner::default().with_outcome("config-tool", exit(2));
    let orchestrator = Orchestrator::new(test_config(&build_dir), runner);

    orchestrator.orchestrate(&build_dir, RuntimeVersion::new(3, 9)).await;

    assert!(logs_contain("stage failed"));
    assert!(logs_contain("exited with code 2"));
    assert!(logs_contain("phase=failed"));
    assert!(!logs_contain("phase=succeeded"));
  }

  #[tokio::test]
  #[traced_test]
  async fn completed_run_logs_success_phase() {
    let temp = TempDir::new().unwrap();
    let build_dir = temp.path().join("cmake_build");
    let orchestrator = Orchestrator::new(test_config(&build_dir), RecordingRunner::default());

    orchestrator.orchestrate(&build_dir, RuntimeVersion::new(3, 9)).await;

    assert!(logs_contain("phase=succeeded"));
    assert!(!logs_contain("phase=failed"));
  }

  #[test]
  fn terminal_phase_names_result() {
    assert_eq!(Phase::Done { success: true }.to_string(), "succeeded");
    assert_eq!(Phase::Done { success: false }.to_string(), "failed");
    assert_eq!(Phase::Configuring.to_string(), "configuring");
  }

  #[test]
  fn failure_message_names_stage_and_command() {
    let failure = BuildFailure::Stage {
      stage: Stage::Build,
      command: CommandSpec::new("make").arg("-j4"),
      outcome: exit(2),
    };

    assert_eq!(failure.to_string(), "build stage exited with code 2: make -j4");
  }

  #[tokio::test]
  #[cfg(unix)]
  async fn real_processes_see_plan_and_build_dir() {
    use crate::stage::{OutputMode, ProcessRunner};

    let temp = TempDir::new().unwrap();
    let build_dir = temp.path().join("cmake_build");
    let script = temp.path().join("configure.sh");
    std::fs::write(&script, "printf '%s\\n' \"$@\" > configure.args\n").unwrap();

    let config = BuildConfig {
      build_dir: build_dir.clone(),
      source_dir: script.clone(),
      config_tool: "/bin/sh".to_string(),
      build_tool: "true".to_string(),
      jobs: 2,
      flags: VersionFlags::default(),
    };
    let orchestrator = Orchestrator::new(config, ProcessRunner::new(OutputMode::Capture));

    let result = orchestrator.run(RuntimeVersion::new(3, 12)).await;

    assert!(result.is_success(), "{:?}", result);
    let args = std::fs::read_to_string(build_dir.join("configure.args")).unwrap();
    assert_eq!(
      args.lines().collect::<Vec<_>>(),
      vec!["-DBUILD_FOR_PYTHON3=ON", "-DBOOST_PYTHON3_COMPONENT=python-py312"]
    );
  }

  #[tokio::test]
  #[cfg(unix)]
  async fn real_build_tool_failure() {
    use crate::stage::ProcessRunner;

    let temp = TempDir::new().unwrap();
    let build_dir = temp.path().join("cmake_build");
    let config = BuildConfig {
      build_dir: build_dir.clone(),
      source_dir: PathBuf::from("."),
      config_tool: "true".to_string(),
      build_tool: "false".to_string(),
      jobs: 1,
      flags: VersionFlags::default(),
    };
    let orchestrator = Orchestrator::new(config, ProcessRunner::default());

    let result = orchestrator.run(RuntimeVersion::new(3, 9)).await;

    assert_eq!(result.failure().and_then(BuildFailure::stage), Some(Stage::Build));
  }
}
