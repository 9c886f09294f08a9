//! CLI argument parsing for the geodata installer

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for immich-geodata
#[derive(Parser, Debug, Clone)]
#[command(name = "immich-geodata")]
#[command(version, about = "Download geodata releases and install them into an Immich server")]
pub struct Args {
    /// Release tag to fetch (`latest` follows the newest published release)
    #[arg(long, default_value = "latest")]
    pub tag: String,

    /// Install into the Immich tree instead of only downloading
    #[arg(long)]
    pub install: bool,

    /// Release repository as owner/name
    #[arg(long, env = "GEODATA_REPO", default_value = "ADSFAaron/immich-geodata-zh-tw")]
    pub repo: String,

    /// Host serving release downloads
    #[arg(long, env = "GEODATA_GITHUB_URL", default_value = "https://github.com")]
    pub github_url: String,

    /// Host serving the release index API
    #[arg(long, env = "GEODATA_API_URL", default_value = "https://api.github.com")]
    pub api_url: String,

    /// Filesystem prefix for every host path (manifests and install targets)
    #[arg(long, env = "GEODATA_ROOT", default_value = "/")]
    pub root: PathBuf,

    /// Persistent directory used when not installing
    #[arg(long, env = "GEODATA_DOWNLOAD_DIR", default_value = "./geodata-download")]
    pub download_dir: PathBuf,

    /// Owner applied to installed files, as uid:gid
    #[arg(long, env = "GEODATA_OWNER", default_value = "0:0")]
    pub owner: String,
}
