mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use extforge_lib::consts::DEFAULT_INTERPRETER;

use cmd::BuildArgs;
use output::OutputFormat;

/// extforge - build a Python package's native extension and hand it to packaging
#[derive(Parser)]
#[command(name = "extforge")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(short = 'o', long, global = true, value_enum, default_value = "text")]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Show the configuration and build commands without running them
  Plan {
    #[command(flatten)]
    build: BuildArgs,
  },

  /// Configure and compile the native extension
  Build {
    #[command(flatten)]
    build: BuildArgs,
  },

  /// Build the extension (unless prebuilt) and emit the package manifest
  Package {
    #[command(flatten)]
    build: BuildArgs,

    /// Package an already compiled extension instead of building it
    #[arg(long)]
    prebuilt: Option<PathBuf>,

    /// Write the manifest to this file instead of stdout
    #[arg(long)]
    manifest: Option<PathBuf>,
  },

  /// Show platform and runtime information
  Info {
    /// Interpreter to query for its version
    #[arg(long, default_value = DEFAULT_INTERPRETER)]
    python: String,
  },
}

fn init_tracing(verbose: bool) {
  let default = if verbose {
    "extforge=debug,extforge_lib=debug"
  } else {
    "warn"
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  match cli.command {
    Commands::Plan { build } => cmd::cmd_plan(&build, cli.output),
    Commands::Build { build } => cmd::cmd_build(&build, cli.output),
    Commands::Package {
      build,
      prebuilt,
      manifest,
    } => cmd::cmd_package(&build, prebuilt.as_deref(), manifest.as_deref(), cli.output),
    Commands::Info { python } => cmd::cmd_info(&python, cli.output),
  }
}
