//! Checkpoint and tile fetchers
//!
//! The probe's origin URL selects the transport: `http`/`https` read from
//! the log's public endpoints, `file` reads a log mirrored on the local
//! filesystem. File reads are confined to the origin path prefix.

use async_trait::async_trait;
use bt_transparency::{Error, Result};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

/// Read access to a tile-based log
#[async_trait]
pub trait TileFetcher: Send + Sync {
    /// Fetch the latest signed checkpoint
    async fn read_checkpoint(&self) -> Result<Vec<u8>>;

    /// Fetch a level tile, optionally a partial one of the given width
    async fn read_tile(&self, level: u64, index: u64, width: Option<u64>) -> Result<Vec<u8>>;
}

/// Build the fetcher matching an origin URL scheme
pub fn fetcher_for_origin(origin: &str) -> Result<Box<dyn TileFetcher>> {
    let url =
        url::Url::parse(origin).map_err(|e| Error::Parse(format!("invalid log origin: {}", e)))?;

    match url.scheme() {
        "http" | "https" => Ok(Box::new(HttpFetcher::new(origin)?)),
        "file" => Ok(Box::new(FileFetcher::new(Path::new(url.path())))),
        scheme => Err(Error::Parse(format!("unsupported url scheme: {}", scheme))),
    }
}

/// The sub-path of a tile within the log
///
/// Tile indices are encoded in base-1000 path segments, every segment but
/// the last prefixed with `x` (e.g. index 1234067 becomes `x001/x234/067`);
/// partial tiles append `.p/<width>`.
pub(crate) fn tile_path(level: u64, index: u64, width: Option<u64>) -> String {
    let mut segments = Vec::new();
    let mut n = index;
    loop {
        segments.push(format!("{:03}", n % 1000));
        n /= 1000;
        if n == 0 {
            break;
        }
    }
    segments.reverse();

    let mut path = format!("tile/{}/", level);
    if let Some((last, upper)) = segments.split_last() {
        for segment in upper {
            path.push('x');
            path.push_str(segment);
            path.push('/');
        }
        path.push_str(last);
    }

    if let Some(w) = width {
        path.push_str(&format!(".p/{}", w));
    }

    path
}

/// HTTP(S) fetcher for a log's public read endpoints
pub struct HttpFetcher {
    base: String,
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(base: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("boot-transparency")
            .pool_idle_timeout(Duration::from_secs(29))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        let url = format!("{}/{}", self.base, path);
        tracing::debug!(%url, "fetching from log");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Network(format!(
                "log request {} failed: {}",
                url,
                response.status()
            )));
        }

        Ok(response
            .bytes()
            .await
            .map_err(|e| Error::Network(e.to_string()))?
            .to_vec())
    }
}

#[async_trait]
impl TileFetcher for HttpFetcher {
    async fn read_checkpoint(&self) -> Result<Vec<u8>> {
        self.get("checkpoint").await
    }

    async fn read_tile(&self, level: u64, index: u64, width: Option<u64>) -> Result<Vec<u8>> {
        self.get(&tile_path(level, index, width)).await
    }
}

/// Filesystem fetcher for a log mirrored under a local prefix
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn read(&self, relative: &str) -> Result<Vec<u8>> {
        // reject any path that could step outside the prefix
        let relative = Path::new(relative);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(Error::Config(format!(
                "path {:?} escapes the log prefix",
                relative
            )));
        }

        let path = self.root.join(relative);
        std::fs::read(&path)
            .map_err(|e| Error::Network(format!("reading {}: {}", path.display(), e)))
    }
}

#[async_trait]
impl TileFetcher for FileFetcher {
    async fn read_checkpoint(&self) -> Result<Vec<u8>> {
        self.read("checkpoint")
    }

    async fn read_tile(&self, level: u64, index: u64, width: Option<u64>) -> Result<Vec<u8>> {
        self.read(&tile_path(level, index, width))
    }
}
