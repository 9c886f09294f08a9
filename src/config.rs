use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, anyhow};

use crate::cli::Args;

/// Archive name published with every release.
pub const RELEASE_ASSET: &str = "release.tar.gz";

/// Resolved runtime configuration, passed explicitly to every step.
#[derive(Debug, Clone)]
pub struct Settings {
    pub tag: String,
    pub install: bool,
    pub repo: String,
    pub github_url: String,
    pub api_url: String,
    pub root: PathBuf,
    pub download_dir: PathBuf,
    pub owner: Owner,
}

/// Numeric owner applied to installed trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner {
    pub uid: u32,
    pub gid: u32,
}

impl Owner {
    pub const ROOT: Owner = Owner { uid: 0, gid: 0 };
}

impl FromStr for Owner {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (uid, gid) = s
            .split_once(':')
            .ok_or_else(|| anyhow!("owner must be uid:gid, got {s:?}"))?;
        Ok(Owner {
            uid: uid.trim().parse().with_context(|| format!("invalid uid in {s:?}"))?,
            gid: gid.trim().parse().with_context(|| format!("invalid gid in {s:?}"))?,
        })
    }
}

impl TryFrom<Args> for Settings {
    type Error = anyhow::Error;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let repo = args.repo.trim_matches('/').to_string();
        if repo.split('/').count() != 2 {
            return Err(anyhow!("repository must be owner/name, got {:?}", args.repo));
        }

        let tag = args.tag.trim().to_string();
        if let Some(bad) = tag
            .chars()
            .find(|c| matches!(c, '/' | '?' | '#' | '%') || c.is_whitespace() || c.is_control())
        {
            return Err(anyhow!("release tag {tag:?} contains unsupported character {bad:?}"));
        }
        if tag.is_empty() || tag == "." || tag == ".." {
            return Err(anyhow!("release tag {:?} is not a valid tag name", args.tag));
        }

        Ok(Self {
            tag,
            install: args.install,
            repo,
            github_url: args.github_url.trim_end_matches('/').to_string(),
            api_url: args.api_url.trim_end_matches('/').to_string(),
            root: args.root,
            download_dir: args.download_dir,
            owner: args.owner.parse()?,
        })
    }
}

impl Settings {
    /// Map a fixed absolute host path under the configured root.
    pub fn host_path(&self, absolute: &str) -> PathBuf {
        self.root.join(absolute.trim_start_matches('/'))
    }

    /// Stable redirect to the newest release's archive
    pub fn latest_download_url(&self) -> String {
        format!(
            "{}/{}/releases/latest/download/{}",
            self.github_url, self.repo, RELEASE_ASSET
        )
    }

    /// Archive URL scoped to one tag
    pub fn tag_download_url(&self, tag: &str) -> String {
        format!(
            "{}/{}/releases/download/{}/{}",
            self.github_url, self.repo, tag, RELEASE_ASSET
        )
    }

    /// Release index entry for one tag
    pub fn tag_index_url(&self, tag: &str) -> String {
        format!("{}/repos/{}/releases/tags/{}", self.api_url, self.repo, tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn settings(extra: &[&str]) -> Settings {
        let mut argv = vec!["immich-geodata", "--repo", "acme/geo"];
        argv.extend_from_slice(extra);
        Settings::try_from(Args::try_parse_from(argv).unwrap()).unwrap()
    }

    #[test]
    fn host_paths_are_rooted() {
        let s = settings(&["--root", "/tmp/sysroot"]);
        assert_eq!(
            s.host_path("/build/geodata"),
            PathBuf::from("/tmp/sysroot/build/geodata")
        );
        let s = settings(&[]);
        assert_eq!(s.host_path("/build/geodata"), PathBuf::from("/build/geodata"));
    }

    #[test]
    fn urls_embed_repo_and_tag() {
        let s = settings(&["--github-url", "http://host/", "--api-url", "http://api"]);
        assert_eq!(
            s.latest_download_url(),
            "http://host/acme/geo/releases/latest/download/release.tar.gz"
        );
        assert_eq!(
            s.tag_download_url("2024-09-01"),
            "http://host/acme/geo/releases/download/2024-09-01/release.tar.gz"
        );
        assert_eq!(
            s.tag_index_url("2024-09-01"),
            "http://api/repos/acme/geo/releases/tags/2024-09-01"
        );
    }

    #[test]
    fn owner_parsing() {
        assert_eq!("0:0".parse::<Owner>().unwrap(), Owner::ROOT);
        assert_eq!(
            "1000:100".parse::<Owner>().unwrap(),
            Owner { uid: 1000, gid: 100 }
        );
        assert!("root".parse::<Owner>().is_err());
        assert!("a:b".parse::<Owner>().is_err());
    }

    #[test]
    fn rejects_tags_that_change_the_url() {
        for tag in ["v1#x", "v1?x", "v1/../v2", "v1 x", "a%2Fb", "", ".."] {
            let args = Args::try_parse_from(["immich-geodata", "--tag", tag]).unwrap();
            assert!(Settings::try_from(args).is_err(), "accepted {tag:?}");
        }
        let s = settings(&["--tag", " v1.2.3 "]);
        assert_eq!(s.tag, "v1.2.3");
        assert!(s.tag_index_url(&s.tag).ends_with("/releases/tags/v1.2.3"));
    }

    #[test]
    fn rejects_malformed_repo() {
        let args = Args::try_parse_from(["immich-geodata", "--repo", "justone"]).unwrap();
        assert!(Settings::try_from(args).is_err());
    }
}
