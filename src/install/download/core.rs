//! Archive download with progress reporting

use std::path::{Path, PathBuf};

use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use tokio::io::AsyncWriteExt;

use crate::config::RELEASE_ASSET;
use crate::install::error::InstallerError;

/// Download `url` into `<work_dir>/release.tar.gz`, following redirects
///
/// Any transport error or non-success status is fatal; a partially written
/// archive is removed before returning.
pub async fn download_archive(
    client: &reqwest::Client,
    url: &str,
    work_dir: &Path,
) -> Result<PathBuf, InstallerError> {
    let archive_path = work_dir.join(RELEASE_ASSET);
    let failed = |reason: String| InstallerError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| failed(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(failed(format!("HTTP {status}")));
    }

    let total_bytes = response.content_length();
    let pb = match total_bytes {
        Some(total) => ProgressBar::new(total),
        None => ProgressBar::no_length(),
    };
    if let Ok(style) = ProgressStyle::default_bar()
        .template("   [{bar:40.green/blue}] {bytes}/{total_bytes}  {bytes_per_sec}")
    {
        pb.set_style(style.progress_chars("█▓░"));
    }

    let result = stream_to_file(response, &archive_path, &pb).await;
    pb.finish_and_clear();

    match result {
        Ok(downloaded) => {
            info!("Downloaded {downloaded} bytes to {}", archive_path.display());
            Ok(archive_path)
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(&archive_path).await;
            Err(match e {
                StreamError::Transfer(e) => failed(e.to_string()),
                StreamError::Write(e) => InstallerError::io("write", &archive_path, e),
            })
        }
    }
}

enum StreamError {
    Transfer(reqwest::Error),
    Write(std::io::Error),
}

async fn stream_to_file(
    response: reqwest::Response,
    path: &Path,
    pb: &ProgressBar,
) -> Result<u64, StreamError> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(StreamError::Write)?;
    let mut downloaded: u64 = 0;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(StreamError::Transfer)?;
        file.write_all(&chunk).await.map_err(StreamError::Write)?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }

    file.flush().await.map_err(StreamError::Write)?;
    Ok(downloaded)
}
