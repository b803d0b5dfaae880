//! Runtime version of the interpreter the extension is built for.
//!
//! The version is read once, before orchestration starts, either from an
//! explicit `major.minor` string or by asking an interpreter to print it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// Script run by [`RuntimeVersion::detect`] to print `major.minor`.
const VERSION_PROBE: &str = "import sys; print('%d.%d' % sys.version_info[:2])";

#[derive(Debug, Error)]
pub enum RuntimeError {
  #[error("invalid runtime version {input:?}: {reason}")]
  Parse { input: String, reason: String },

  #[error("failed to launch interpreter {interpreter}: {source}")]
  Launch {
    interpreter: String,
    #[source]
    source: std::io::Error,
  },

  #[error("interpreter {interpreter} exited with code {code:?}")]
  ProbeFailed { interpreter: String, code: Option<i32> },
}

/// A `(major, minor)` runtime version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RuntimeVersion {
  pub major: u32,
  pub minor: u32,
}

impl RuntimeVersion {
  pub const fn new(major: u32, minor: u32) -> Self {
    Self { major, minor }
  }

  /// Query `interpreter` for its version.
  pub async fn detect(interpreter: &str) -> Result<Self, RuntimeError> {
    debug!(interpreter = %interpreter, "probing runtime version");

    let output = Command::new(interpreter)
      .arg("-c")
      .arg(VERSION_PROBE)
      .output()
      .await
      .map_err(|source| RuntimeError::Launch {
        interpreter: interpreter.to_string(),
        source,
      })?;

    if !output.status.success() {
      return Err(RuntimeError::ProbeFailed {
        interpreter: interpreter.to_string(),
        code: output.status.code(),
      });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let version: Self = stdout.trim().parse()?;

    info!(interpreter = %interpreter, version = %version, "detected runtime version");
    Ok(version)
  }
}

impl fmt::Display for RuntimeVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}", self.major, self.minor)
  }
}

impl FromStr for RuntimeVersion {
  type Err = RuntimeError;

  /// Accepts `3`, `3.9` and `3.9.7`. Anything after the minor component is ignored.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let parse_err = |reason: &str| RuntimeError::Parse {
      input: s.to_string(),
      reason: reason.to_string(),
    };

    let trimmed = s.trim();
    if trimmed.is_empty() {
      return Err(parse_err("empty version"));
    }

    let mut parts = trimmed.splitn(3, '.');
    let major = parts
      .next()
      .unwrap_or_default()
      .parse::<u32>()
      .map_err(|_| parse_err("major component is not a number"))?;
    let minor = match parts.next() {
      Some(minor) => minor
        .parse::<u32>()
        .map_err(|_| parse_err("minor component is not a number"))?,
      None => 0,
    };

    Ok(Self { major, minor })
  }
}
