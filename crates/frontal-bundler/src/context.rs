//! Shared state of one build generation.

use std::sync::Arc;

use frontal_config::{BundleMap, ConfigSnapshot};
use parking_lot::RwLock;

use crate::modules::ModuleRegistry;
use crate::watch::WatchRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Development,
    Production,
}

/// Handle passed to plugins and the engine.
///
/// Cheap to clone; every clone sees the same generation.
#[derive(Debug, Clone)]
pub struct AppContext {
    inner: Arc<ContextInner>,
}

#[derive(Debug)]
struct ContextInner {
    config: ConfigSnapshot,
    mode: Mode,
    modules: ModuleRegistry,
    watches: WatchRegistry,
    computed_bundles: RwLock<Option<Arc<BundleMap>>>,
}

impl AppContext {
    pub fn new(config: ConfigSnapshot, mode: Mode) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                config,
                mode,
                modules: ModuleRegistry::new(),
                watches: WatchRegistry::new(),
                computed_bundles: RwLock::new(None),
            }),
        }
    }

    pub fn config(&self) -> &ConfigSnapshot {
        &self.inner.config
    }

    pub fn mode(&self) -> Mode {
        self.inner.mode
    }

    pub fn in_dev_mode(&self) -> bool {
        self.inner.mode == Mode::Development
    }

    pub fn modules(&self) -> &ModuleRegistry {
        &self.inner.modules
    }

    pub fn watches(&self) -> &WatchRegistry {
        &self.inner.watches
    }

    /// Bundle map computed by the last resolve, if one has run.
    pub fn computed_bundles(&self) -> Option<Arc<BundleMap>> {
        self.inner.computed_bundles.read().clone()
    }

    pub(crate) fn set_computed_bundles(&self, bundles: Arc<BundleMap>) {
        *self.inner.computed_bundles.write() = Some(bundles);
    }

    /// Whether two handles belong to the same generation.
    pub fn same_generation(&self, other: &AppContext) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
