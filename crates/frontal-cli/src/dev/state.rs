//! Shared state for the development server.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use frontal_bundler::Compilation;
use parking_lot::RwLock;

use crate::dev::channel::LiveReloadChannel;

/// In-memory copy of the latest compilation, keyed by URL path.
#[derive(Debug, Clone, Default)]
pub struct BundleCache {
    /// path -> (content, content-type)
    files: HashMap<String, (Vec<u8>, &'static str)>,
}

impl BundleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_compilation(compilation: &Compilation) -> Self {
        let files = compilation
            .assets
            .iter()
            .map(|(name, asset)| {
                (
                    format!("/{}", name.trim_start_matches('/')),
                    (asset.content.clone(), content_type(name)),
                )
            })
            .collect();
        Self { files }
    }

    pub fn insert(&mut self, path: impl Into<String>, content: Vec<u8>) {
        let path = path.into();
        let kind = content_type(&path);
        self.files.insert(path, (content, kind));
    }

    pub fn get(&self, path: &str) -> Option<&(Vec<u8>, &'static str)> {
        self.files.get(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

pub struct DevServerState {
    cache: RwLock<BundleCache>,
    channel: Arc<LiveReloadChannel>,
    public_dir: RwLock<PathBuf>,
    /// URL prefix the site is served under, always with a trailing slash.
    base: String,
}

impl DevServerState {
    pub fn new(channel: Arc<LiveReloadChannel>, public_dir: PathBuf, base: &str) -> Self {
        let base = format!("/{}/", base.trim_matches('/')).replace("//", "/");
        Self {
            cache: RwLock::new(BundleCache::new()),
            channel,
            public_dir: RwLock::new(public_dir),
            base,
        }
    }

    pub fn channel(&self) -> &Arc<LiveReloadChannel> {
        &self.channel
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn update(&self, compilation: &Compilation) {
        *self.cache.write() = BundleCache::from_compilation(compilation);
    }

    pub fn set_public_dir(&self, dir: PathBuf) {
        *self.public_dir.write() = dir;
    }

    pub fn public_dir(&self) -> PathBuf {
        self.public_dir.read().clone()
    }

    pub fn cached_files(&self) -> usize {
        self.cache.read().len()
    }

    /// Path relative to the site root, or `None` outside `base`.
    pub fn site_path<'a>(&self, url_path: &'a str) -> Option<&'a str> {
        if url_path.len() + 1 == self.base.len() && self.base.starts_with(url_path) {
            return Some("");
        }
        url_path.strip_prefix(self.base.as_str())
    }

    /// Cached file for a site path. Directories resolve to their `index.html`.
    pub fn cached(&self, site_path: &str) -> Option<(Vec<u8>, &'static str)> {
        let cache = self.cache.read();
        candidates(site_path)
            .iter()
            .find_map(|candidate| cache.get(candidate).cloned())
    }
}

/// URL paths tried for a request, in order.
fn candidates(site_path: &str) -> Vec<String> {
    let trimmed = site_path.trim_matches('/');
    if trimmed.is_empty() {
        return vec!["/index.html".to_string()];
    }
    if site_path.ends_with('/') {
        return vec![format!("/{trimmed}/index.html")];
    }
    vec![format!("/{trimmed}"), format!("/{trimmed}/index.html")]
}

pub type SharedState = Arc<DevServerState>;

/// Content type from the file extension.
pub fn content_type(path: impl AsRef<Path>) -> &'static str {
    let extension = path
        .as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    match extension {
        "html" | "htm" => "text/html; charset=utf-8",
        "js" | "mjs" => "application/javascript",
        "css" => "text/css",
        "json" | "map" => "application/json",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "txt" => "text/plain; charset=utf-8",
        "xml" => "application/xml",
        _ => "application/octet-stream",
    }
}
