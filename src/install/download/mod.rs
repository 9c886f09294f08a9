//! Release resolution, download and extraction
//!
//! ## Module Organization
//!
//! - `github` - Release tag validation and download URL derivation
//! - `core` - Archive download with progress tracking
//! - `extract` - `.tar.gz` extraction into the working directory

mod core;
mod extract;
mod github;

pub use self::core::download_archive;
pub use extract::extract_archive;
pub use github::{ReleaseTag, http_client, resolve_download_url};
