//! Watch requests registered during a build.
//!
//! Plugins ask for files to be watched while they run; the dev server turns
//! the recorded requests into file-system watches and routes the resulting
//! events by [`WatchOrigin`].

use std::path::{Path, PathBuf};

use parking_lot::Mutex;

/// Who asked for a path to be watched. Decides how a change is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchOrigin {
    Config,
    Pages,
    Partials,
    Assets,
    Library,
    Component,
    Icons,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRequest {
    /// A file or a directory watched recursively.
    pub path: PathBuf,
    pub origin: WatchOrigin,
}

#[derive(Debug, Default)]
pub struct WatchRegistry {
    requests: Mutex<Vec<WatchRequest>>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a watch. Returns `false` when the path is already watched.
    pub fn watch(&self, path: impl AsRef<Path>, origin: WatchOrigin) -> bool {
        let path = path.as_ref();
        let mut requests = self.requests.lock();
        if requests.iter().any(|r| r.path == path) {
            return false;
        }
        tracing::trace!(path = %path.display(), ?origin, "watch requested");
        requests.push(WatchRequest {
            path: path.to_path_buf(),
            origin,
        });
        true
    }

    pub fn requests(&self) -> Vec<WatchRequest> {
        self.requests.lock().clone()
    }

    /// Origin of the most specific request covering `path`.
    pub fn origin_of(&self, path: &Path) -> Option<WatchOrigin> {
        self.requests
            .lock()
            .iter()
            .filter(|r| path.starts_with(&r.path))
            .max_by_key(|r| r.path.components().count())
            .map(|r| r.origin)
    }

    pub fn clear(&self) {
        self.requests.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_paths_are_ignored() {
        let watches = WatchRegistry::new();
        assert!(watches.watch("/site/library/library.toml", WatchOrigin::Library));
        assert!(!watches.watch("/site/library/library.toml", WatchOrigin::Component));
        assert_eq!(watches.len(), 1);
        assert_eq!(watches.requests()[0].origin, WatchOrigin::Library);
    }

    #[test]
    fn most_specific_request_wins() {
        let watches = WatchRegistry::new();
        watches.watch("/site/pages", WatchOrigin::Pages);
        watches.watch("/site/pages/.partials", WatchOrigin::Partials);

        assert_eq!(
            watches.origin_of(Path::new("/site/pages/.partials/nav.html")),
            Some(WatchOrigin::Partials)
        );
        assert_eq!(
            watches.origin_of(Path::new("/site/pages/index.html")),
            Some(WatchOrigin::Pages)
        );
        assert_eq!(watches.origin_of(Path::new("/elsewhere/x")), None);
    }
}
