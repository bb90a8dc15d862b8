//! File-system watches for one dev generation.
//!
//! The paths come from the watch requests recorded during a build. Every event
//! is stamped with the generation that created the watcher, so events still in
//! flight after a restart can be told apart and dropped.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use frontal_bundler::WatchRequest;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Changed,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub generation: u64,
    pub kind: ChangeKind,
    pub path: PathBuf,
}

pub struct ProjectWatcher {
    generation: u64,
    watcher: RecommendedWatcher,
    watched: HashSet<PathBuf>,
}

impl ProjectWatcher {
    /// Create a watcher sending into `tx`. Repeated events for the same path
    /// within `debounce` are dropped.
    pub fn new(generation: u64, tx: mpsc::Sender<WatchEvent>, debounce: Duration) -> Result<Self> {
        let mut last_event: Option<(PathBuf, Instant)> = None;

        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(err) => {
                    tracing::warn!(error = %err, "file watcher error");
                    return;
                }
            };
            let Some(kind) = change_kind(&event.kind) else {
                return;
            };

            for path in event.paths {
                let now = Instant::now();
                if let Some((last_path, last_time)) = &last_event {
                    if *last_path == path && now.duration_since(*last_time) < debounce {
                        continue;
                    }
                }
                last_event = Some((path.clone(), now));

                let change = WatchEvent {
                    generation,
                    kind,
                    path,
                };
                if tx.blocking_send(change).is_err() {
                    // receiver gone, dev server is shutting down
                    return;
                }
            }
        })?;

        Ok(Self {
            generation,
            watcher,
            watched: HashSet::new(),
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start watching every requested path not watched yet. Directories are
    /// watched recursively; paths that do not exist are skipped.
    pub fn sync(&mut self, requests: &[WatchRequest]) -> usize {
        let mut added = 0;
        for request in requests {
            if self.watched.contains(&request.path) || !request.path.exists() {
                continue;
            }
            let mode = if request.path.is_dir() {
                RecursiveMode::Recursive
            } else {
                RecursiveMode::NonRecursive
            };
            match self.watcher.watch(&request.path, mode) {
                Ok(()) => {
                    tracing::debug!(
                        path = %request.path.display(),
                        origin = ?request.origin,
                        generation = self.generation,
                        "watching"
                    );
                    self.watched.insert(request.path.clone());
                    added += 1;
                }
                Err(err) => {
                    tracing::warn!(path = %request.path.display(), error = %err, "cannot watch path");
                }
            }
        }
        added
    }

    pub fn is_watching(&self, path: &Path) -> bool {
        self.watched.contains(path)
    }

    pub fn len(&self) -> usize {
        self.watched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watched.is_empty()
    }
}

fn change_kind(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Added),
        EventKind::Modify(_) => Some(ChangeKind::Changed),
        EventKind::Remove(_) => Some(ChangeKind::Removed),
        _ => None,
    }
}
