//! Discovery of the `tdl` executable.
//!
//! Lookup order: an explicit override, then `bin/tdl` next to the running
//! binary, then `PATH`.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

#[cfg(windows)]
const TDL_BINARY_NAME: &str = "tdl.exe";
#[cfg(not(windows))]
const TDL_BINARY_NAME: &str = "tdl";

/// Where a located executable came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutableSource {
    Override,
    Bundled,
    Path,
}

impl fmt::Display for ExecutableSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Override => write!(f, "configured path"),
            Self::Bundled => write!(f, "bundled bin directory"),
            Self::Path => write!(f, "PATH"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedExecutable {
    pub path: PathBuf,
    pub source: ExecutableSource,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocateError {
    #[error("configured tdl executable not found: {}", .0.display())]
    OverrideMissing(PathBuf),

    #[error("tdl executable not found in the bundled bin directory or on PATH")]
    NotFound,
}

/// Find the `tdl` executable.
pub fn locate_tdl(override_path: Option<&Path>) -> Result<LocatedExecutable, LocateError> {
    let bundle_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    locate_in(override_path, bundle_dir.as_deref())
}

fn locate_in(
    override_path: Option<&Path>,
    bundle_dir: Option<&Path>,
) -> Result<LocatedExecutable, LocateError> {
    if let Some(path) = override_path {
        // A bare name such as "tdl" is resolved through PATH.
        let resolved = if path.is_file() {
            Some(path.to_path_buf())
        } else {
            which::which(path).ok()
        };
        return resolved
            .map(|path| found(path, ExecutableSource::Override))
            .ok_or_else(|| LocateError::OverrideMissing(path.to_path_buf()));
    }

    if let Some(dir) = bundle_dir {
        let candidate = dir.join("bin").join(TDL_BINARY_NAME);
        if candidate.is_file() {
            return Ok(found(candidate, ExecutableSource::Bundled));
        }
    }

    which::which(TDL_BINARY_NAME)
        .map(|path| found(path, ExecutableSource::Path))
        .map_err(|_| LocateError::NotFound)
}

fn found(path: PathBuf, source: ExecutableSource) -> LocatedExecutable {
    debug!(path = %path.display(), %source, "located tdl executable");
    LocatedExecutable { path, source }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("my-tdl");
        std::fs::write(&tool, b"").unwrap();

        let located = locate_in(Some(&tool), Some(dir.path())).unwrap();
        assert_eq!(located.path, tool);
        assert_eq!(located.source, ExecutableSource::Override);
    }

    #[test]
    fn test_missing_override_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope").join("tdl");

        assert_eq!(
            locate_in(Some(&missing), None),
            Err(LocateError::OverrideMissing(missing))
        );
    }

    #[test]
    fn test_bundled_bin_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("bin")).unwrap();
        let tool = dir.path().join("bin").join(TDL_BINARY_NAME);
        std::fs::write(&tool, b"").unwrap();

        let located = locate_in(None, Some(dir.path())).unwrap();
        assert_eq!(located.path, tool);
        assert_eq!(located.source, ExecutableSource::Bundled);
    }
}
