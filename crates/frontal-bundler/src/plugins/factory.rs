//! Construct plugins by name from configuration entries.

use std::sync::Arc;

use frontal_config::PluginSpec;
use indexmap::IndexMap;
use serde_json::Value;

use crate::context::AppContext;
use crate::plugins::icons::IconsPlugin;
use crate::plugins::library::LibraryPlugin;
use crate::plugins::live_reload::LiveReloadPlugin;
use crate::plugins::plugin::FrontalPlugin;
use crate::plugins::registry::PluginRegistry;
use crate::{Error, Result};

type Constructor =
    Arc<dyn Fn(&AppContext, &Value) -> Result<Arc<dyn FrontalPlugin>> + Send + Sync>;

#[derive(Clone, Default)]
pub struct PluginFactory {
    constructors: IndexMap<String, Constructor>,
}

impl PluginFactory {
    /// A factory that knows no plugins.
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory with the built-in `library`, `live-reload` and `icons` plugins.
    pub fn with_builtins() -> Self {
        let mut factory = Self::new();
        factory.register(LibraryPlugin::NAME, |ctx, _| {
            Ok(Arc::new(LibraryPlugin::new(ctx.clone())))
        });
        factory.register(LiveReloadPlugin::NAME, |ctx, _| {
            Ok(Arc::new(LiveReloadPlugin::new(ctx.clone())))
        });
        factory.register(IconsPlugin::NAME, |ctx, _| {
            Ok(Arc::new(IconsPlugin::new(ctx.clone())))
        });
        factory
    }

    /// Register (or replace) the constructor for `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(&AppContext, &Value) -> Result<Arc<dyn FrontalPlugin>> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Arc::new(constructor));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    pub fn create(&self, ctx: &AppContext, spec: &PluginSpec) -> Result<Arc<dyn FrontalPlugin>> {
        let constructor = self
            .constructors
            .get(&spec.plugin)
            .ok_or_else(|| Error::PluginLoad {
                plugin: spec.plugin.clone(),
                message: "no plugin registered under this name".to_string(),
            })?;

        constructor(ctx, &spec.options).map_err(|err| match err {
            Error::PluginLoad { .. } => err,
            other => Error::PluginLoad {
                plugin: spec.plugin.clone(),
                message: other.to_string(),
            },
        })
    }

    /// Instantiate every configured plugin in order.
    ///
    /// Plugins that fail to load are logged and skipped; their errors are
    /// returned alongside the registry of the ones that loaded.
    pub fn load(&self, ctx: &AppContext, specs: &[PluginSpec]) -> (PluginRegistry, Vec<Error>) {
        let mut registry = PluginRegistry::new();
        let mut errors = Vec::new();

        for spec in specs {
            match self.create(ctx, spec) {
                Ok(plugin) => {
                    tracing::debug!(plugin = %spec.plugin, "plugin loaded");
                    registry.add_shared(plugin);
                }
                Err(err) => {
                    tracing::error!(plugin = %spec.plugin, error = %err, "failed to load plugin");
                    errors.push(err);
                }
            }
        }

        (registry, errors)
    }
}
