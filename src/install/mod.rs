//! Geodata release installation
//!
//! Pipeline: resolve the release tag, download and extract the archive into
//! a working directory, then (in install mode) detect the Immich layout and
//! replace the geodata and country-name directories, keeping `.bak` copies.

mod detection;
mod download;
mod error;
mod privilege;
mod runners;
mod targets;
mod workdir;

// Public exports
pub use detection::{FALLBACK_VERSION, HostInfo, HostLayout, detect_host, locate_manifest};
pub use download::{ReleaseTag, resolve_download_url};
pub use error::InstallerError;
pub use runners::run;
pub use targets::{
    InstallTarget, TargetKind, TargetOutcome, TargetReport, TargetState, backup_path, install_all,
};
pub use workdir::WorkDir;
