//! Build directory preparation.
//!
//! [`ensure_directory`] creates the out-of-tree build root and every missing
//! parent. An existing directory is accepted as-is, so repeated runs against
//! the same path are safe.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Classification of a directory preparation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "os_code")]
pub enum FilesystemErrorKind {
  PermissionDenied,
  InvalidPath,
  /// The path, or one of its parents, exists but is not a directory.
  NotADirectory,
  /// Any other failure, with the raw OS error code when one is available.
  Other(Option<i32>),
}

impl fmt::Display for FilesystemErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::PermissionDenied => write!(f, "permission denied"),
      Self::InvalidPath => write!(f, "invalid path"),
      Self::NotADirectory => write!(f, "not a directory"),
      Self::Other(Some(code)) => write!(f, "os error {}", code),
      Self::Other(None) => write!(f, "unknown error"),
    }
  }
}

impl From<&io::Error> for FilesystemErrorKind {
  fn from(err: &io::Error) -> Self {
    match err.kind() {
      io::ErrorKind::PermissionDenied => Self::PermissionDenied,
      io::ErrorKind::InvalidInput => Self::InvalidPath,
      io::ErrorKind::NotADirectory => Self::NotADirectory,
      _ => Self::Other(err.raw_os_error()),
    }
  }
}

/// Failure to prepare a directory.
#[derive(Debug, Error)]
#[error("cannot prepare directory {}: {kind}", .path.display())]
pub struct FilesystemError {
  pub path: PathBuf,
  pub kind: FilesystemErrorKind,
  #[source]
  pub source: io::Error,
}

impl FilesystemError {
  fn new(path: &Path, kind: FilesystemErrorKind, source: io::Error) -> Self {
    Self {
      path: path.to_path_buf(),
      kind,
      source,
    }
  }
}

/// Ensure `path` exists and is a directory.
///
/// Missing parents are created. If the path already exists as a directory
/// nothing is touched and the call succeeds; if it exists as anything else
/// the call fails with [`FilesystemErrorKind::NotADirectory`].
pub fn ensure_directory(path: impl AsRef<Path>) -> Result<(), FilesystemError> {
  let path = path.as_ref();

  match fs::create_dir_all(path) {
    Ok(()) => {
      debug!(path = %path.display(), "build directory ready");
      Ok(())
    }
    Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
      if path.is_dir() {
        debug!(path = %path.display(), "build directory already exists");
        Ok(())
      } else {
        Err(FilesystemError::new(path, FilesystemErrorKind::NotADirectory, err))
      }
    }
    Err(err) => {
      let kind = FilesystemErrorKind::from(&err);
      Err(FilesystemError::new(path, kind, err))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn entries(dir: &Path) -> Vec<PathBuf> {
    let mut names: Vec<_> = fs::read_dir(dir).unwrap().map(|e| e.unwrap().path()).collect();
    names.sort();
    names
  }

  #[test]
  fn creates_missing_directory_with_parents() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("a").join("b").join("cmake_build");

    ensure_directory(&target).unwrap();

    assert!(target.is_dir());
  }

  #[test]
  fn second_call_is_a_no_op() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("cmake_build");

    ensure_directory(&target).unwrap();
    fs::write(target.join("CMakeCache.txt"), "cache").unwrap();
    let before = entries(&target);

    ensure_directory(&target).unwrap();

    assert_eq!(entries(&target), before);
    assert_eq!(fs::read_to_string(target.join("CMakeCache.txt")).unwrap(), "cache");
  }

  #[test]
  fn existing_file_is_not_a_directory() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("cmake_build");
    fs::write(&target, "not a dir").unwrap();

    let err = ensure_directory(&target).unwrap_err();

    assert_eq!(err.kind, FilesystemErrorKind::NotADirectory);
    assert_eq!(err.path, target);
    assert!(target.is_file(), "existing file must be left alone");
  }

  #[test]
  #[cfg(unix)]
  fn file_as_parent_is_not_a_directory() {
    let temp = TempDir::new().unwrap();
    let parent = temp.path().join("blocker");
    fs::write(&parent, "").unwrap();

    let err = ensure_directory(parent.join("child")).unwrap_err();

    assert_eq!(err.kind, FilesystemErrorKind::NotADirectory);
  }

  #[test]
  #[cfg(unix)]
  fn interior_nul_is_an_invalid_path() {
    let err = ensure_directory("cmake\0build").unwrap_err();

    assert_eq!(err.kind, FilesystemErrorKind::InvalidPath);
  }

  #[test]
  fn error_message_names_path_and_kind() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("file");
    fs::write(&target, "").unwrap();

    let err = ensure_directory(&target).unwrap_err();
    let msg = err.to_string();

    assert!(msg.contains("not a directory"), "{}", msg);
    assert!(msg.contains(&target.display().to_string()), "{}", msg);
  }

  #[test]
  fn kind_mapping_from_io_errors() {
    let denied = io::Error::from(io::ErrorKind::PermissionDenied);
    let invalid = io::Error::from(io::ErrorKind::InvalidInput);
    let other = io::Error::from_raw_os_error(28);

    assert_eq!(FilesystemErrorKind::from(&denied), FilesystemErrorKind::PermissionDenied);
    assert_eq!(FilesystemErrorKind::from(&invalid), FilesystemErrorKind::InvalidPath);
    assert!(matches!(FilesystemErrorKind::from(&other), FilesystemErrorKind::Other(_)));
  }
}
