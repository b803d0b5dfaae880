//! Terminal and JSON output for the CLI.
//!
//! Progress and results go to stdout, failures and warnings to stderr. In
//! JSON mode a command prints exactly one document on stdout and nothing
//! else.

use std::fmt::Display;
use std::io::Write;
use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

use extforge_lib::{BuildFailure, CommandSpec, Stage};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

const STEP: &str = "==>";
const DONE: &str = "✓";
const FAILED: &str = "✗";
const WARN: &str = "!";

/// Wide enough for the longest stage name.
const STAGE_COLUMN: usize = 9;

/// `250ms`, `1.5s`, `2m 05s`.
pub fn format_elapsed(elapsed: Duration) -> String {
  let secs = elapsed.as_secs();
  if secs == 0 {
    format!("{}ms", elapsed.as_millis())
  } else if secs < 60 {
    format!("{:.1}s", elapsed.as_secs_f64())
  } else {
    format!("{}m {:02}s", secs / 60, secs % 60)
  }
}

/// Headline and optional detail for a failed run.
///
/// Stage failures put the outcome in the headline and the full command in the
/// detail, so a long command line never hides which stage broke.
pub fn failure_lines(failure: &BuildFailure) -> (String, Option<String>) {
  match failure {
    BuildFailure::Prepare(_) => (failure.to_string(), None),
    BuildFailure::Stage { stage, command, outcome } => {
      (format!("{} stage {}", stage, outcome), Some(format!("$ {}", command)))
    }
  }
}

/// `  configure  cmake ../src -DBUILD_FOR_PYTHON3=ON ...`
pub fn stage_command_line(stage: Stage, command: &CommandSpec) -> String {
  format!("  {:<width$}  {}", stage.as_str(), command, width = STAGE_COLUMN)
}

pub fn print_step(message: &str) {
  println!("{} {}", STEP.if_supports_color(Stream::Stdout, |s| s.blue()), message);
}

pub fn print_done(message: &str) {
  println!("{} {}", DONE.if_supports_color(Stream::Stdout, |s| s.green()), message);
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    WARN.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_failure(failure: &BuildFailure) {
  let (headline, detail) = failure_lines(failure);
  eprintln!(
    "{} {}",
    FAILED.if_supports_color(Stream::Stderr, |s| s.red()),
    headline.if_supports_color(Stream::Stderr, |s| s.red())
  );
  if let Some(detail) = detail {
    eprintln!("    {}", detail.if_supports_color(Stream::Stderr, |s| s.dimmed()));
  }
}

pub fn print_field(label: &str, value: impl Display) {
  println!("  {}: {}", label.if_supports_color(Stream::Stdout, |s| s.dimmed()), value);
}

pub fn print_stage_command(stage: Stage, command: &CommandSpec) {
  println!(
    "{}",
    stage_command_line(stage, command).if_supports_color(Stream::Stdout, |s| s.cyan())
  );
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
  let mut out = std::io::stdout().lock();
  serde_json::to_writer_pretty(&mut out, value).context("Failed to serialize to JSON")?;
  writeln!(out).context("Failed to write to stdout")?;
  Ok(())
}
