//! Shared fixtures: a mock release host and a fake Immich sysroot
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use flate2::Compression;
use flate2::write::GzEncoder;

pub const REPO: &str = "acme/geodata";

/// Tag whose index lookup answers 503
pub const FLAKY_TAG: &str = "flaky";
/// Tag whose download never finishes
pub const STALLED_TAG: &str = "stalled";

#[derive(Default)]
pub struct Hits {
    pub index: AtomicUsize,
    pub download: AtomicUsize,
}

struct HostState {
    archives: HashMap<String, Vec<u8>>,
    latest: Option<String>,
    hits: Arc<Hits>,
}

/// In-process stand-in for both the release index and the download host
pub struct MockHost {
    pub addr: SocketAddr,
    pub hits: Arc<Hits>,
}

impl MockHost {
    /// Serve `archives` by tag; `latest` names the tag the latest alias redirects to
    pub async fn start(archives: Vec<(&str, Vec<u8>)>, latest: Option<&str>) -> Self {
        let hits = Arc::new(Hits::default());
        let state = Arc::new(HostState {
            archives: archives
                .into_iter()
                .map(|(tag, bytes)| (tag.to_string(), bytes))
                .collect(),
            latest: latest.map(str::to_string),
            hits: hits.clone(),
        });

        let app = Router::new()
            .route("/repos/{owner}/{name}/releases/tags/{tag}", get(index))
            .route(
                "/{owner}/{name}/releases/latest/download/release.tar.gz",
                get(latest_redirect),
            )
            .route(
                "/{owner}/{name}/releases/download/{tag}/release.tar.gz",
                get(download),
            )
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, hits }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn index_hits(&self) -> usize {
        self.hits.index.load(Ordering::SeqCst)
    }

    pub fn download_hits(&self) -> usize {
        self.hits.download.load(Ordering::SeqCst)
    }
}

async fn index(
    State(state): State<Arc<HostState>>,
    UrlPath((_owner, _name, tag)): UrlPath<(String, String, String)>,
) -> StatusCode {
    state.hits.index.fetch_add(1, Ordering::SeqCst);
    if tag == FLAKY_TAG {
        StatusCode::SERVICE_UNAVAILABLE
    } else if state.archives.contains_key(&tag) || tag == STALLED_TAG {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn latest_redirect(
    State(state): State<Arc<HostState>>,
    UrlPath((owner, name)): UrlPath<(String, String)>,
) -> Response {
    match &state.latest {
        Some(tag) => Redirect::temporary(&format!(
            "/{owner}/{name}/releases/download/{tag}/release.tar.gz"
        ))
        .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn download(
    State(state): State<Arc<HostState>>,
    UrlPath((_owner, _name, tag)): UrlPath<(String, String, String)>,
) -> Response {
    state.hits.download.fetch_add(1, Ordering::SeqCst);
    if tag == STALLED_TAG {
        tokio::time::sleep(Duration::from_secs(120)).await;
    }
    match state.archives.get(&tag) {
        Some(bytes) => bytes.clone().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Build a release tarball; `i18n` controls whether the country module is included
pub fn release_archive(marker: &str, i18n: bool) -> Vec<u8> {
    let gz = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(gz);

    let mut files: Vec<(String, String)> = vec![
        ("geodata/cities500.txt".into(), format!("cities {marker}")),
        ("geodata/geodata-date.txt".into(), marker.to_string()),
    ];
    if i18n {
        files.push((
            "i18n-iso-countries/langs/zh.json".into(),
            format!("{{\"marker\":\"{marker}\"}}"),
        ));
        files.push((
            "i18n-iso-countries/package.json".into(),
            "{\"name\":\"i18n-iso-countries\"}".into(),
        ));
    }

    for (name, body) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, body.as_bytes()).unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap()
}

/// Fake filesystem root holding an Immich install
pub struct Sysroot {
    pub dir: tempfile::TempDir,
}

impl Sysroot {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute host path mapped into this root
    pub fn host(&self, absolute: &str) -> PathBuf {
        self.path().join(absolute.trim_start_matches('/'))
    }

    pub fn write(&self, absolute: &str, body: &str) {
        let path = self.host(absolute);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    pub fn read(&self, absolute: &str) -> String {
        std::fs::read_to_string(self.host(absolute)).unwrap()
    }
}

/// `uid:gid` of the test process, so ownership fixing works unprivileged
pub fn current_owner() -> String {
    format!(
        "{}:{}",
        nix::unistd::Uid::current().as_raw(),
        nix::unistd::Gid::current().as_raw()
    )
}

/// Command-line arguments pointing the installer at `host` and `root`
pub fn base_args(host: &MockHost, root: &Sysroot, download_dir: &Path) -> Vec<String> {
    vec![
        "--repo".into(),
        REPO.into(),
        "--github-url".into(),
        host.url(),
        "--api-url".into(),
        host.url(),
        "--root".into(),
        root.path().display().to_string(),
        "--download-dir".into(),
        download_dir.display().to_string(),
        "--owner".into(),
        current_owner(),
    ]
}

/// Entries directly under `dir`
pub fn entries(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect()
}
