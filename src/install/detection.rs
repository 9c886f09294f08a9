//! Immich host layout detection
//!
//! Immich has shipped its server in three directory arrangements over time.
//! Each is recognised by where its `package.json` lives:
//! - `/usr/src/app/package.json` (server at the app root)
//! - `/usr/src/app/server/package.json` (server in a sub-folder)
//! - `/app/immich/server/package.json` (community images)
//!
//! Only the manifest *path* decides where files go; the version read from it
//! is informational.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Deserialize;

use super::error::InstallerError;
use crate::config::Settings;

/// Version reported when the manifest has no usable `version` field.
pub const FALLBACK_VERSION: &str = "0.0.0";

/// Probe order for manifests, paired with the layout each one identifies
const MANIFEST_CANDIDATES: [(&str, HostLayout); 3] = [
    ("/usr/src/app/package.json", HostLayout::AppRoot),
    ("/usr/src/app/server/package.json", HostLayout::AppRootServer),
    ("/app/immich/server/package.json", HostLayout::ImmichServer),
];

/// Known Immich directory arrangements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostLayout {
    AppRoot,
    AppRootServer,
    ImmichServer,
    /// Manifest found somewhere unexpected; installs to the `AppRoot` target
    Unknown,
}

impl HostLayout {
    /// Absolute (unrooted) install path of the `i18n-iso-countries` module
    pub fn i18n_target(self) -> &'static str {
        match self {
            HostLayout::AppRoot | HostLayout::Unknown => {
                "/usr/src/app/node_modules/i18n-iso-countries"
            }
            HostLayout::AppRootServer => "/usr/src/app/server/node_modules/i18n-iso-countries",
            HostLayout::ImmichServer => "/app/immich/server/node_modules/i18n-iso-countries",
        }
    }

    /// Classify a manifest path found under `settings.root`
    pub fn from_manifest(settings: &Settings, manifest: &Path) -> Self {
        MANIFEST_CANDIDATES
            .iter()
            .find(|(candidate, _)| settings.host_path(candidate) == manifest)
            .map(|&(_, layout)| layout)
            .unwrap_or(HostLayout::Unknown)
    }
}

impl std::fmt::Display for HostLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HostLayout::AppRoot => "app root (/usr/src/app)",
            HostLayout::AppRootServer => "app server (/usr/src/app/server)",
            HostLayout::ImmichServer => "immich server (/app/immich/server)",
            HostLayout::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A located manifest and everything derived from it
#[derive(Debug, Clone)]
pub struct HostInfo {
    pub manifest: PathBuf,
    pub layout: HostLayout,
    pub version: String,
}

#[derive(Deserialize)]
struct PackageManifest {
    #[serde(default)]
    version: Option<String>,
}

/// Return the first candidate manifest that exists, in probe order
pub fn locate_manifest(settings: &Settings) -> Result<PathBuf, InstallerError> {
    let probed: Vec<PathBuf> = MANIFEST_CANDIDATES
        .iter()
        .map(|(candidate, _)| settings.host_path(candidate))
        .collect();

    for path in &probed {
        debug!("Probing manifest {}", path.display());
        if path.is_file() {
            return Ok(path.clone());
        }
    }

    Err(InstallerError::ManifestNotFound { probed })
}

/// Read the `version` field, falling back to [`FALLBACK_VERSION`]
pub fn read_manifest_version(manifest: &Path) -> String {
    let parsed = std::fs::read_to_string(manifest)
        .map_err(|e| e.to_string())
        .and_then(|raw| serde_json::from_str::<PackageManifest>(&raw).map_err(|e| e.to_string()));

    match parsed {
        Ok(PackageManifest {
            version: Some(version),
        }) if !version.trim().is_empty() => version.trim().to_string(),
        Ok(_) => {
            warn!("No version in {}, assuming {FALLBACK_VERSION}", manifest.display());
            FALLBACK_VERSION.to_string()
        }
        Err(e) => {
            warn!(
                "Could not read version from {}: {e}; assuming {FALLBACK_VERSION}",
                manifest.display()
            );
            FALLBACK_VERSION.to_string()
        }
    }
}

/// Locate the manifest, classify the layout and read the version
pub fn detect_host(settings: &Settings) -> Result<HostInfo, InstallerError> {
    let manifest = locate_manifest(settings)?;
    let layout = HostLayout::from_manifest(settings, &manifest);
    if layout == HostLayout::Unknown {
        warn!(
            "Unrecognised layout for {}, defaulting to {}",
            manifest.display(),
            HostLayout::AppRoot.i18n_target()
        );
    }
    let version = read_manifest_version(&manifest);
    Ok(HostInfo {
        manifest,
        layout,
        version,
    })
}
