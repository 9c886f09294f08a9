//! Installation of extracted data into the Immich tree
//!
//! Each target moves through `NotStarted → BackedUp → Replaced → OwnershipFixed`
//! on its own. A target whose extracted source is missing is skipped and
//! reported, leaving whatever is installed untouched; filesystem errors abort.

use std::ffi::OsString;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use walkdir::WalkDir;

use super::detection::HostLayout;
use super::error::InstallerError;
use super::privilege::chown_recursive;
use super::workdir::remove_path;
use crate::config::{Owner, Settings};

/// Extracted directory holding reverse-geocoding data
pub const GEODATA_DIR: &str = "geodata";
/// Extracted directory holding the localized country-name module
pub const I18N_DIR: &str = "i18n-iso-countries";
/// Top-level archive directories managed by this tool
pub const MANAGED_DIRS: [&str; 2] = [GEODATA_DIR, I18N_DIR];

const GEODATA_TARGET: &str = "/build/geodata";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Geodata,
    I18n,
}

impl TargetKind {
    pub fn source_dir(self) -> &'static str {
        match self {
            TargetKind::Geodata => GEODATA_DIR,
            TargetKind::I18n => I18N_DIR,
        }
    }
}

/// Progress of one target through the install steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TargetState {
    NotStarted,
    BackedUp,
    Replaced,
    OwnershipFixed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetOutcome {
    Installed { backup: Option<PathBuf> },
    SourceMissing { source: PathBuf },
}

/// Destination plus the extracted directory that feeds it
#[derive(Debug, Clone)]
pub struct InstallTarget {
    pub kind: TargetKind,
    pub path: PathBuf,
    pub source: PathBuf,
}

#[derive(Debug, Clone)]
pub struct TargetReport {
    pub kind: TargetKind,
    pub path: PathBuf,
    pub state: TargetState,
    pub outcome: TargetOutcome,
}

impl TargetReport {
    pub fn is_installed(&self) -> bool {
        matches!(self.outcome, TargetOutcome::Installed { .. })
    }
}

/// Resolve both targets for a detected layout
pub fn plan_targets(settings: &Settings, layout: HostLayout, work_dir: &Path) -> [InstallTarget; 2] {
    [
        InstallTarget {
            kind: TargetKind::Geodata,
            path: settings.host_path(GEODATA_TARGET),
            source: work_dir.join(GEODATA_DIR),
        },
        InstallTarget {
            kind: TargetKind::I18n,
            path: settings.host_path(layout.i18n_target()),
            source: work_dir.join(I18N_DIR),
        },
    ]
}

/// `<target>.bak`, next to the target
pub fn backup_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".bak");
    target.with_file_name(name)
}

/// Run every target, collecting reports; only filesystem errors stop the loop
pub fn install_all(
    targets: &[InstallTarget],
    owner: Owner,
) -> Result<Vec<TargetReport>, InstallerError> {
    targets
        .iter()
        .map(|target| install_target(target, owner))
        .collect()
}

/// Back up, replace and re-own a single target
pub fn install_target(target: &InstallTarget, owner: Owner) -> Result<TargetReport, InstallerError> {
    let mut state = TargetState::NotStarted;
    let path = &target.path;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| InstallerError::io("create dir", parent, e))?;
    }

    let mut backup = None;
    if path.symlink_metadata().is_ok() {
        let bak = backup_path(path);
        if bak.symlink_metadata().is_ok() {
            remove_path(&bak)?;
        }
        info!("Backing up {} to {}", path.display(), bak.display());
        copy_tree(path, &bak)?;
        backup = Some(bak);
        state = TargetState::BackedUp;
    }

    if !target.source.is_dir() {
        error!(
            "Extracted directory {} not found; leaving {} untouched",
            target.source.display(),
            path.display()
        );
        return Ok(TargetReport {
            kind: target.kind,
            path: path.clone(),
            state,
            outcome: TargetOutcome::SourceMissing {
                source: target.source.clone(),
            },
        });
    }

    if path.symlink_metadata().is_ok() {
        remove_path(path)?;
    }
    copy_tree(&target.source, path)?;
    state = TargetState::Replaced;

    chown_recursive(path, owner)?;
    state = TargetState::OwnershipFixed;
    info!("Installed {}", path.display());

    Ok(TargetReport {
        kind: target.kind,
        path: path.clone(),
        state,
        outcome: TargetOutcome::Installed { backup },
    })
}

/// Copy a tree like `cp -a`
///
/// Keeps permissions, ownership, modification times and symlinks. Ownership
/// the caller may not grant (EPERM when unprivileged) is skipped, as `cp -a`
/// does.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<(), InstallerError> {
    let mut dirs = Vec::new();

    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            InstallerError::io("walk", path, e.into())
        })?;
        let rel = entry.path().strip_prefix(src).unwrap_or(Path::new(""));
        let to = dst.join(rel);
        let file_type = entry.file_type();
        let meta = entry
            .metadata()
            .map_err(|e| InstallerError::io("stat", entry.path(), e.into()))?;

        if file_type.is_symlink() {
            let link = std::fs::read_link(entry.path())
                .map_err(|e| InstallerError::io("read link", entry.path(), e))?;
            std::os::unix::fs::symlink(&link, &to)
                .map_err(|e| InstallerError::io("symlink", &to, e))?;
        } else if file_type.is_dir() {
            std::fs::create_dir_all(&to).map_err(|e| InstallerError::io("create dir", &to, e))?;
        } else {
            copy_file(entry.path(), &to)?;
        }
        keep_owner(&meta, &to)?;

        if file_type.is_dir() {
            dirs.push((meta, to));
        }
    }

    // Directory attributes last: filling a directory bumps its mtime, and
    // read-only directories must still accept their children
    for (meta, to) in dirs.into_iter().rev() {
        keep_mtime(&meta, &to);
        std::fs::set_permissions(&to, meta.permissions())
            .map_err(|e| InstallerError::io("set permissions", &to, e))?;
    }

    Ok(())
}

fn copy_file(from: &Path, to: &Path) -> Result<(), InstallerError> {
    std::fs::copy(from, to).map_err(|e| InstallerError::io("copy", from, e))?;
    match std::fs::metadata(from) {
        Ok(meta) => keep_mtime(&meta, to),
        Err(e) => warn!("Could not read modification time of {}: {e}", from.display()),
    }
    Ok(())
}

/// Give `to` the uid:gid recorded in `meta`, without following symlinks
fn keep_owner(meta: &std::fs::Metadata, to: &Path) -> Result<(), InstallerError> {
    match std::os::unix::fs::lchown(to, Some(meta.uid()), Some(meta.gid())) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            debug!("Keeping current owner of {}: {e}", to.display());
            Ok(())
        }
        Err(source) => Err(InstallerError::Ownership {
            path: to.to_path_buf(),
            source,
        }),
    }
}

/// Best effort; symlinks keep their creation time
fn keep_mtime(meta: &std::fs::Metadata, to: &Path) {
    let Ok(mtime) = meta.modified() else {
        return;
    };
    let result = std::fs::File::open(to).and_then(|file| file.set_modified(mtime));
    if let Err(e) = result {
        warn!("Could not keep modification time of {}: {e}", to.display());
    }
}
