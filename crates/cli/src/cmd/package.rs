//! Implementation of the `extforge package` command.
//!
//! Produces the package manifest. By default the extension is built first
//! and the manifest points at the artifact in the build directory; with
//! `--prebuilt` the build is skipped and the given artifact is used.

use std::path::Path;

use anyhow::{Context, Result};

use extforge_lib::package::{self, PackageDescriptor, PackageError, PackageManifest};

use crate::cmd::BuildArgs;
use crate::cmd::build::{report_failure, run_build};
use crate::output::{OutputFormat, print_done};

pub fn cmd_package(
  args: &BuildArgs,
  prebuilt: Option<&Path>,
  manifest_path: Option<&Path>,
  output: OutputFormat,
) -> Result<()> {
  let descriptor = PackageDescriptor::default();

  let manifest = match prebuilt {
    Some(artifact) => package::assemble_prebuilt(&descriptor, artifact),
    None => {
      // Stdout carries the manifest unless it goes to a file.
      let run = if manifest_path.is_some() {
        run_build(args, output)?
      } else {
        let quiet = BuildArgs {
          capture: true,
          ..args.clone()
        };
        run_build(&quiet, OutputFormat::Json)?
      };
      match package::assemble(&descriptor, run.result) {
        Ok(manifest) => manifest,
        Err(PackageError::BuildFailed(failure)) => {
          report_failure(&failure, output)?;
          std::process::exit(1);
        }
        Err(err) => return Err(err).context("Failed to assemble package"),
      }
    }
  };

  emit(&manifest, manifest_path)
}

fn emit(manifest: &PackageManifest, path: Option<&Path>) -> Result<()> {
  match path {
    Some(path) => {
      manifest
        .write_to(path)
        .with_context(|| format!("Failed to write manifest: {}", path.display()))?;
      print_done(&format!(
        "Wrote manifest for {} {} to {}",
        manifest.descriptor.name,
        manifest.descriptor.version,
        path.display()
      ));
    }
    None => println!("{}", manifest.to_json().context("Failed to serialize manifest")?),
  }
  Ok(())
}
