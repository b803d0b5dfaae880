//! Package metadata and the build-to-package handoff.
//!
//! The descriptor is static: the scripts, Python packages and data files the
//! distribution ships. [`assemble`] adds the one dynamic piece, the compiled
//! extension, once a build has succeeded, and lists it as data of the first
//! package. The artifact is assumed to be where the build tool puts it; its
//! presence and contents are not checked.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::orchestrate::{BuildFailure, BuildResult};
use crate::platform::{Os, Platform};

/// Base name of the compiled extension module.
const ARTIFACT_STEM: &str = "csfm";

#[derive(Debug, Error)]
pub enum PackageError {
  #[error("native extension build failed: {0}")]
  BuildFailed(#[source] BuildFailure),

  #[error("failed to serialize package manifest: {0}")]
  Serialize(#[from] serde_json::Error),

  #[error("failed to write package manifest {}: {source}", .path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Declarative package metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
  pub name: String,
  pub version: String,
  pub description: String,
  pub url: String,
  pub author: String,
  pub license: String,
  pub scripts: Vec<String>,
  pub packages: Vec<String>,
  /// Data files bundled per package, relative to the package directory.
  pub package_data: BTreeMap<String, Vec<String>>,
  /// File name of the compiled extension produced in the build directory.
  pub artifact: String,
}

impl Default for PackageDescriptor {
  fn default() -> Self {
    let artifact = host_artifact_name();
    let mut package_data = BTreeMap::new();
    package_data.insert(
      "opensfm".to_string(),
      vec![artifact.clone(), "data/sensor_data.json".to_string()],
    );

    Self {
      name: "OpenSfM".to_string(),
      version: "0.1".to_string(),
      description: "A Structure from Motion library".to_string(),
      url: "https://github.com/mapillary/OpenSfM".to_string(),
      author: "Mapillary".to_string(),
      license: "BSD".to_string(),
      scripts: vec![
        "bin/opensfm_run_all".to_string(),
        "bin/opensfm".to_string(),
        "bin/export_bundler".to_string(),
      ],
      packages: vec![
        "opensfm".to_string(),
        "opensfm.commands".to_string(),
        "opensfm.large".to_string(),
      ],
      package_data,
      artifact,
    }
  }
}

/// Extension file name for `os`, e.g. `csfm.so`.
pub fn artifact_name(os: Os) -> String {
  format!("{}{}", ARTIFACT_STEM, os.extension_suffix())
}

/// Extension file name for the host; unknown hosts get the Windows name.
pub fn host_artifact_name() -> String {
  Platform::current().map_or_else(|| artifact_name(Os::Windows), |platform| artifact_name(platform.os))
}

impl PackageDescriptor {
  /// Package that receives the compiled extension.
  pub fn artifact_package(&self) -> Option<&str> {
    self.packages.first().map(String::as_str)
  }

  /// Copy with the artifact listed as data of [`Self::artifact_package`].
  fn with_bundled_artifact(&self) -> Self {
    let mut descriptor = self.clone();
    if let Some(package) = self.artifact_package() {
      let data = descriptor.package_data.entry(package.to_string()).or_default();
      if !data.contains(&self.artifact) {
        data.push(self.artifact.clone());
      }
    }
    descriptor
  }
}

/// A descriptor plus the location of the compiled extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
  #[serde(flatten)]
  pub descriptor: PackageDescriptor,
  /// Where the compiled extension is picked up from.
  pub artifact_path: PathBuf,
  /// Whether the artifact came from this build or was supplied prebuilt.
  pub prebuilt: bool,
}

impl PackageManifest {
  pub fn to_json(&self) -> Result<String, PackageError> {
    Ok(serde_json::to_string_pretty(self)?)
  }

  pub fn write_to(&self, path: &Path) -> Result<(), PackageError> {
    let json = self.to_json()?;
    fs::write(path, format!("{}\n", json)).map_err(|source| PackageError::Write {
      path: path.to_path_buf(),
      source,
    })?;
    info!(path = %path.display(), "wrote package manifest");
    Ok(())
  }
}

/// Build a manifest from a finished orchestration run.
///
/// Only a successful run can be packaged; a failed one is handed back as
/// [`PackageError::BuildFailed`].
pub fn assemble(descriptor: &PackageDescriptor, result: BuildResult) -> Result<PackageManifest, PackageError> {
  let build_dir = result.into_result().map_err(PackageError::BuildFailed)?;
  let artifact_path = build_dir.join(&descriptor.artifact);

  info!(artifact = %artifact_path.display(), "packaging built extension");
  Ok(PackageManifest {
    descriptor: descriptor.with_bundled_artifact(),
    artifact_path,
    prebuilt: false,
  })
}

/// Build a manifest around an externally built extension, skipping orchestration.
pub fn assemble_prebuilt(descriptor: &PackageDescriptor, artifact_path: impl Into<PathBuf>) -> PackageManifest {
  let artifact_path = artifact_path.into();
  info!(artifact = %artifact_path.display(), "packaging prebuilt extension");

  PackageManifest {
    descriptor: descriptor.with_bundled_artifact(),
    artifact_path,
    prebuilt: true,
  }
}
