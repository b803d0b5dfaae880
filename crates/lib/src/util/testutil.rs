//! Test utilities for extforge-lib.
//!
//! Cross-platform helpers for tests that need to run real processes as
//! stand-ins for the configuration and build tools.

use crate::types::CommandSpec;

/// A shell running `script`.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> CommandSpec {
  CommandSpec::new("/bin/sh").args(["-c", script])
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> CommandSpec {
  CommandSpec::new("cmd.exe").args(["/C", script])
}

/// A command that exits with `code`.
pub fn exit_with(code: i32) -> CommandSpec {
  shell_cmd(&format!("exit {}", code))
}

/// A command that creates `filename` in the current directory.
#[cfg(unix)]
pub fn touch_file(filename: &str) -> CommandSpec {
  CommandSpec::new("/usr/bin/touch").arg(filename)
}

#[cfg(windows)]
pub fn touch_file(filename: &str) -> CommandSpec {
  // Use PowerShell to create an empty file - more reliable than cmd.exe approaches
  CommandSpec::new("powershell.exe").args([
    "-NoProfile".to_string(),
    "-Command".to_string(),
    format!("New-Item -ItemType File -Path '{}' -Force | Out-Null", filename),
  ])
}

/// A command that echoes `msg` to stdout.
#[cfg(unix)]
pub fn echo_msg(msg: &str) -> CommandSpec {
  CommandSpec::new("/bin/echo").arg(msg)
}

#[cfg(windows)]
pub fn echo_msg(msg: &str) -> CommandSpec {
  CommandSpec::new("cmd.exe").args(["/C".to_string(), format!("echo {}", msg)])
}
