//! Immutable configuration snapshots and structural diffing.

use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::FrontalConfig;

/// An immutable, cheaply clonable view of the configuration of one project.
///
/// A reload produces a new snapshot; existing holders keep the old one.
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    inner: Arc<SnapshotInner>,
}

#[derive(Debug)]
struct SnapshotInner {
    root: PathBuf,
    source: Option<PathBuf>,
    config: FrontalConfig,
}

impl ConfigSnapshot {
    pub fn new(root: impl Into<PathBuf>, source: Option<PathBuf>, config: FrontalConfig) -> Self {
        Self {
            inner: Arc::new(SnapshotInner {
                root: root.into(),
                source,
                config,
            }),
        }
    }

    /// Snapshot of the defaults rooted at `root`, without a source file.
    pub fn defaults(root: impl Into<PathBuf>) -> Self {
        Self::new(root, None, FrontalConfig::default())
    }

    /// Project root every relative path is resolved against.
    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    /// Configuration file this snapshot was read from.
    pub fn source(&self) -> Option<&Path> {
        self.inner.source.as_deref()
    }

    pub fn config(&self) -> &FrontalConfig {
        &self.inner.config
    }

    /// Resolve a configured path against the project root.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.inner.root.join(path)
        }
    }

    pub fn pages_dir(&self) -> PathBuf {
        self.resolve(&self.config().pages.path)
    }

    pub fn partials_dir(&self) -> PathBuf {
        self.pages_dir().join(&self.config().pages.partials)
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.resolve(&self.config().assets.path)
    }

    pub fn build_dir(&self) -> PathBuf {
        self.resolve(&self.config().build.path)
    }

    pub fn public_dir(&self) -> PathBuf {
        self.resolve(&self.config().server.public)
    }

    /// Top-level sections that differ between `self` (old) and `next`.
    pub fn diff(&self, next: &ConfigSnapshot) -> ConfigDiff {
        let (old, new) = (self.config(), next.config());
        let sections = ConfigSection::ALL
            .iter()
            .copied()
            .filter(|section| match section {
                ConfigSection::Plugins => old.plugins != new.plugins,
                ConfigSection::Assets => old.assets != new.assets,
                ConfigSection::Server => old.server != new.server,
                ConfigSection::Build => old.build != new.build,
                ConfigSection::Pages => old.pages != new.pages,
                ConfigSection::Bundles => old.bundles != new.bundles,
                ConfigSection::Library => old.library != new.library,
                ConfigSection::Icons => old.icons != new.icons,
            })
            .collect();

        ConfigDiff { sections }
    }
}

impl Deref for ConfigSnapshot {
    type Target = FrontalConfig;

    fn deref(&self) -> &Self::Target {
        self.config()
    }
}

/// Top-level configuration section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Plugins,
    Assets,
    Server,
    Build,
    Pages,
    Bundles,
    Library,
    Icons,
}

impl ConfigSection {
    pub const ALL: [ConfigSection; 8] = [
        ConfigSection::Plugins,
        ConfigSection::Assets,
        ConfigSection::Server,
        ConfigSection::Build,
        ConfigSection::Pages,
        ConfigSection::Bundles,
        ConfigSection::Library,
        ConfigSection::Icons,
    ];

    /// What a change to this section demands of a running dev session.
    pub fn change_class(self) -> ChangeClass {
        match self {
            ConfigSection::Server
            | ConfigSection::Build
            | ConfigSection::Pages
            | ConfigSection::Plugins
            | ConfigSection::Icons => ChangeClass::Restart,
            ConfigSection::Assets | ConfigSection::Bundles | ConfigSection::Library => {
                ChangeClass::Content
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConfigSection::Plugins => "plugins",
            ConfigSection::Assets => "assets",
            ConfigSection::Server => "server",
            ConfigSection::Build => "build",
            ConfigSection::Pages => "pages",
            ConfigSection::Bundles => "bundles",
            ConfigSection::Library => "library",
            ConfigSection::Icons => "icons",
        }
    }
}

impl fmt::Display for ConfigSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChangeClass {
    /// Rebuild with the current pipeline and notify clients.
    Content,
    /// Tear the pipeline down and start a new generation.
    Restart,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDiff {
    sections: Vec<ConfigSection>,
}

impl ConfigDiff {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn sections(&self) -> &[ConfigSection] {
        &self.sections
    }

    /// Strongest change class across the changed sections.
    pub fn change_class(&self) -> Option<ChangeClass> {
        self.sections.iter().map(|s| s.change_class()).max()
    }

    pub fn requires_restart(&self) -> bool {
        self.change_class() == Some(ChangeClass::Restart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(value: serde_json::Value) -> ConfigSnapshot {
        ConfigSnapshot::new(
            "/project",
            None,
            FrontalConfig::from_user_value(value).unwrap(),
        )
    }

    #[test]
    fn identical_snapshots_have_empty_diff() {
        let a = snapshot(json!({}));
        let b = snapshot(json!({}));
        assert!(a.diff(&b).is_empty());
        assert_eq!(a.diff(&b).change_class(), None);
    }

    #[test]
    fn bundle_change_is_content_class() {
        let a = snapshot(json!({}));
        let b = snapshot(json!({ "bundles": { "main": { "assets": ["x.js"] } } }));
        let diff = a.diff(&b);
        assert_eq!(diff.sections(), &[ConfigSection::Bundles]);
        assert!(!diff.requires_restart());
    }

    #[test]
    fn restart_section_dominates() {
        let a = snapshot(json!({}));
        let b = snapshot(json!({
            "server": { "port": 4000 },
            "library": { "enabled": false }
        }));
        let diff = a.diff(&b);
        assert_eq!(diff.sections(), &[ConfigSection::Server, ConfigSection::Library]);
        assert!(diff.requires_restart());
    }

    #[test]
    fn paths_resolve_against_root() {
        let s = snapshot(json!({ "pages": { "path": "site" } }));
        assert_eq!(s.pages_dir(), PathBuf::from("/project/site"));
        assert_eq!(s.partials_dir(), PathBuf::from("/project/site/.partials"));
        assert_eq!(s.build_dir(), PathBuf::from("/project/.frontal"));
    }
}
