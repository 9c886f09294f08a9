//! Ownership fixing for installed trees
//!
//! Installed data must belong to the account Immich runs as (root in the
//! official images). Symlinks are re-owned themselves and never followed.

use std::path::Path;

use log::debug;
use nix::unistd::{Gid, Uid, chown};
use walkdir::WalkDir;

use super::error::InstallerError;
use crate::config::Owner;

/// Recursively set the owner of `root` and everything below it
pub fn chown_recursive(root: &Path, owner: Owner) -> Result<(), InstallerError> {
    let uid = Uid::from_raw(owner.uid);
    let gid = Gid::from_raw(owner.gid);
    let mut count = 0usize;

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| InstallerError::Ownership {
            path: e.path().unwrap_or(root).to_path_buf(),
            source: e.into(),
        })?;
        let path = entry.path();

        let result = if entry.path_is_symlink() {
            std::os::unix::fs::lchown(path, Some(owner.uid), Some(owner.gid))
        } else {
            chown(path, Some(uid), Some(gid)).map_err(std::io::Error::from)
        };
        result.map_err(|source| InstallerError::Ownership {
            path: path.to_path_buf(),
            source,
        })?;
        count += 1;
    }

    debug!(
        "Set owner {}:{} on {count} entries under {}",
        owner.uid,
        owner.gid,
        root.display()
    );
    Ok(())
}
