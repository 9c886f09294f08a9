//! Working directory for downloads and extraction

use std::path::{Path, PathBuf};

use log::info;
use tempfile::TempDir;

use super::error::InstallerError;
use super::targets::MANAGED_DIRS;
use crate::config::Settings;

/// Where the release archive is downloaded and unpacked
///
/// `Ephemeral` removes itself when dropped, so every exit path of its owner
/// (normal return, error, interrupted pipeline) cleans it up.
#[derive(Debug)]
pub enum WorkDir {
    Ephemeral(TempDir),
    Persistent(PathBuf),
}

impl WorkDir {
    /// Ephemeral when installing, the persistent download directory otherwise
    pub fn for_settings(settings: &Settings) -> Result<Self, InstallerError> {
        if settings.install {
            Self::ephemeral()
        } else {
            Self::persistent(&settings.download_dir)
        }
    }

    /// Fresh, uniquely named directory under the system temp dir
    pub fn ephemeral() -> Result<Self, InstallerError> {
        let dir = tempfile::Builder::new()
            .prefix("immich-geodata-")
            .tempdir()
            .map_err(|e| InstallerError::io("create temp dir", std::env::temp_dir(), e))?;
        info!("Using temporary directory {}", dir.path().display());
        Ok(WorkDir::Ephemeral(dir))
    }

    /// Reusable directory; stale extracted data from an earlier run is purged
    pub fn persistent(path: impl Into<PathBuf>) -> Result<Self, InstallerError> {
        let path = path.into();
        std::fs::create_dir_all(&path).map_err(|e| InstallerError::io("create dir", &path, e))?;

        for name in MANAGED_DIRS {
            let stale = path.join(name);
            if stale.symlink_metadata().is_ok() {
                info!("Removing stale {}", stale.display());
                remove_path(&stale)?;
            }
        }

        info!("Using download directory {}", path.display());
        Ok(WorkDir::Persistent(path))
    }

    pub fn path(&self) -> &Path {
        match self {
            WorkDir::Ephemeral(dir) => dir.path(),
            WorkDir::Persistent(path) => path,
        }
    }

    pub fn is_ephemeral(&self) -> bool {
        matches!(self, WorkDir::Ephemeral(_))
    }
}

/// Remove a directory tree, or a single file or symlink
pub(crate) fn remove_path(path: &Path) -> Result<(), InstallerError> {
    let is_dir = path
        .symlink_metadata()
        .map(|m| m.is_dir())
        .map_err(|e| InstallerError::io("stat", path, e))?;
    let result = if is_dir {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    result.map_err(|e| InstallerError::io("remove", path, e))
}
