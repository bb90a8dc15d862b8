//! Keyed cache of descriptor sources.
//!
//! Library, component and icon descriptors are read once per generation and
//! served from memory until their path is invalidated.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

#[derive(Debug, Default)]
pub struct ModuleRegistry {
    sources: RwLock<HashMap<PathBuf, Arc<str>>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source of `path`, read from disk on first use.
    pub async fn load(&self, path: &Path) -> io::Result<Arc<str>> {
        if let Some(source) = self.sources.read().get(path) {
            return Ok(Arc::clone(source));
        }

        let content: Arc<str> = tokio::fs::read_to_string(path).await?.into();
        self.sources
            .write()
            .insert(path.to_path_buf(), Arc::clone(&content));
        Ok(content)
    }

    /// Drop the cached source for `path`. Returns whether an entry existed.
    pub fn invalidate(&self, path: &Path) -> bool {
        let removed = self.sources.write().remove(path).is_some();
        if removed {
            tracing::debug!(path = %path.display(), "module cache entry invalidated");
        }
        removed
    }

    pub fn clear(&self) {
        self.sources.write().clear();
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.sources.read().contains_key(path)
    }
}
