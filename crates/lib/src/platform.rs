//! Host platform facts that affect the native extension.

use std::fmt;

use serde::Serialize;

/// Operating systems the extension is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
  Linux,
  MacOs,
  Windows,
}

impl Os {
  pub fn current() -> Option<Self> {
    match std::env::consts::OS {
      "linux" => Some(Self::Linux),
      "macos" => Some(Self::MacOs),
      "windows" => Some(Self::Windows),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::MacOs => "darwin",
      Self::Windows => "windows",
    }
  }

  /// File suffix of a compiled Python extension module on this OS.
  pub fn extension_suffix(&self) -> &'static str {
    match self {
      Self::Windows => ".pyd",
      Self::Linux | Self::MacOs => ".so",
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// `arch-os` pair, e.g. `x86_64-linux`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Platform {
  pub arch: &'static str,
  pub os: Os,
}

impl Platform {
  /// Returns `None` on an OS the build does not support.
  pub fn current() -> Option<Self> {
    Some(Self {
      arch: std::env::consts::ARCH,
      os: Os::current()?,
    })
  }

  pub fn triple(&self) -> String {
    format!("{}-{}", self.arch, self.os)
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.triple())
  }
}
