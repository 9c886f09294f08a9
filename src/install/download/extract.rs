//! Release archive extraction (.tar.gz)

use std::fs::File;
use std::path::Path;

use flate2::read::GzDecoder;
use log::info;
use tar::Archive;

use crate::install::error::InstallerError;

/// Unpack a gzip tarball into `dest`, keeping its directory structure
///
/// Ownership is never taken from the archive and special mode bits
/// (setuid, setgid, sticky) are dropped.
pub async fn extract_archive(archive: &Path, dest: &Path) -> Result<(), InstallerError> {
    let archive = archive.to_path_buf();
    let dest = dest.to_path_buf();

    // Wrap CPU-bound tar extraction in spawn_blocking
    let archive_for_err = archive.clone();
    tokio::task::spawn_blocking(move || unpack(&archive, &dest))
        .await
        .map_err(|e| InstallerError::Extraction {
            archive: archive_for_err,
            source: std::io::Error::other(e),
        })?
}

fn unpack(archive: &Path, dest: &Path) -> Result<(), InstallerError> {
    let extraction = |source| InstallerError::Extraction {
        archive: archive.to_path_buf(),
        source,
    };

    let file = File::open(archive).map_err(extraction)?;
    let mut tar = Archive::new(GzDecoder::new(file));
    tar.set_preserve_permissions(false);
    tar.set_preserve_ownerships(false);
    tar.set_unpack_xattrs(false);
    tar.set_overwrite(true);
    tar.unpack(dest).map_err(extraction)?;

    info!("Extracted {} into {}", archive.display(), dest.display());
    Ok(())
}
