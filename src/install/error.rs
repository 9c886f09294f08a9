//! Installer error types

use std::path::PathBuf;

use thiserror::Error;

/// Fatal failures of the fetch pipeline and of the filesystem during install
#[derive(Debug, Error)]
pub enum InstallerError {
    #[error("no Immich manifest found; probed:\n{}", format_probed(.probed))]
    ManifestNotFound { probed: Vec<PathBuf> },

    #[error("release tag '{tag}' not found (try --tag latest)")]
    TagNotFound { tag: String },

    #[error("could not verify release tag '{tag}': {reason}")]
    TagCheckFailed { tag: String, reason: String },

    #[error("download of {url} failed: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("failed to extract {}: {source}", .archive.display())]
    Extraction {
        archive: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{op} failed for {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to change owner of {}: {source}", .path.display())]
    Ownership {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl InstallerError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

fn format_probed(probed: &[PathBuf]) -> String {
    probed
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n")
}
