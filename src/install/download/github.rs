//! Release tag resolution against the GitHub release index

use log::{debug, info};
use reqwest::StatusCode;

use crate::config::Settings;
use crate::install::error::InstallerError;

pub(crate) const USER_AGENT: &str = concat!("immich-geodata/", env!("CARGO_PKG_VERSION"));

/// Requested release: the `latest` alias or an explicit tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseTag {
    Latest,
    Named(String),
}

impl ReleaseTag {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "latest" => ReleaseTag::Latest,
            tag => ReleaseTag::Named(tag.to_string()),
        }
    }
}

impl std::fmt::Display for ReleaseTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReleaseTag::Latest => f.write_str("latest"),
            ReleaseTag::Named(tag) => f.write_str(tag),
        }
    }
}

/// Shared HTTP client for index checks and downloads
pub fn http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().user_agent(USER_AGENT).build()
}

/// Turn a release tag into a download URL
///
/// `latest` is not checked; a missing latest release surfaces as a
/// download failure. Named tags must exist in the release index.
pub async fn resolve_download_url(
    client: &reqwest::Client,
    settings: &Settings,
    tag: &ReleaseTag,
) -> Result<String, InstallerError> {
    let tag = match tag {
        ReleaseTag::Latest => return Ok(settings.latest_download_url()),
        ReleaseTag::Named(tag) => tag,
    };

    let index_url = settings.tag_index_url(tag);
    debug!("Checking release index {index_url}");

    let response = client
        .get(&index_url)
        .header(reqwest::header::ACCEPT, "application/vnd.github+json")
        .send()
        .await
        .map_err(|e| InstallerError::TagCheckFailed {
            tag: tag.clone(),
            reason: e.to_string(),
        })?;

    match response.status() {
        StatusCode::OK => {
            info!("Release tag {tag} exists");
            Ok(settings.tag_download_url(tag))
        }
        StatusCode::NOT_FOUND => Err(InstallerError::TagNotFound { tag: tag.clone() }),
        status => Err(InstallerError::TagCheckFailed {
            tag: tag.clone(),
            reason: format!("HTTP {status}"),
        }),
    }
}
