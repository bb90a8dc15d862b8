//! Ordered plugin registry.
//!
//! Plugins run in registration order for every capability. Failures are
//! contained per plugin: they are logged, reported to the caller, and the
//! remaining plugins still run.

use std::sync::Arc;

use crate::context::AppContext;
use crate::engine::EngineConfig;
use crate::plugins::hooks::{Hook, HookContext};
use crate::plugins::plugin::FrontalPlugin;
use crate::{Error, Result};

#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn FrontalPlugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<P: FrontalPlugin + 'static>(&mut self, plugin: P) {
        self.plugins.push(Arc::new(plugin));
    }

    pub fn add_shared(&mut self, plugin: Arc<dyn FrontalPlugin>) {
        self.plugins.push(plugin);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn FrontalPlugin>> {
        self.plugins.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Whether any plugin has a hook registered under `name`.
    pub fn has_hook(&self, name: &str) -> bool {
        self.plugins
            .iter()
            .any(|p| p.hooks().is_some_and(|h| h.has_hook(name)))
    }

    /// Every hook registered under `name`, in plugin order, paired with the
    /// name of the plugin that owns it.
    pub fn hooks_for(&self, name: &str) -> Vec<(&str, Arc<dyn Hook>)> {
        self.plugins
            .iter()
            .filter_map(|p| p.hooks().map(|h| (p.name(), h)))
            .filter(|(_, h)| h.has_hook(name))
            .flat_map(|(plugin, h)| h.get_hooks(name).iter().map(move |hook| (plugin, Arc::clone(hook))))
            .collect()
    }

    /// Run every hook under `name` over `input`, left to right.
    pub async fn apply_hooks(
        &self,
        name: &str,
        ctx: &HookContext<'_>,
        input: String,
    ) -> Result<String> {
        let mut output = input;
        for (plugin, hook) in self.hooks_for(name) {
            output = hook.call(ctx, output).await.map_err(|err| match err {
                Error::PluginRuntime { .. } => err,
                other => Error::plugin_runtime(plugin, other),
            })?;
        }
        Ok(output)
    }

    /// Let every plugin adjust the engine settings.
    pub fn configure_all(&self, engine: &mut EngineConfig) -> Vec<Error> {
        let mut errors = Vec::new();
        for plugin in &self.plugins {
            if let Err(err) = plugin.configure(engine) {
                let err = Error::plugin_runtime(plugin.name(), err);
                tracing::error!(plugin = plugin.name(), error = %err, "plugin configure failed");
                errors.push(err);
            }
        }
        errors
    }

    pub async fn teardown_all(&self, ctx: &AppContext) -> Vec<Error> {
        let mut errors = Vec::new();
        for plugin in &self.plugins {
            if let Err(err) = plugin.teardown().await {
                tracing::warn!(plugin = plugin.name(), error = %err, "plugin teardown failed");
                errors.push(err);
            }
        }
        ctx.watches().clear();
        errors
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Mode;
    use crate::plugins::hooks::{HookRegistry, PAGE_BEFORE_EMIT, hook_fn};
    use frontal_config::ConfigSnapshot;
    use std::path::Path;

    struct Wrapping {
        name: &'static str,
        hooks: HookRegistry,
    }

    impl Wrapping {
        fn new(name: &'static str, tag: &'static str) -> Self {
            let mut hooks = HookRegistry::new();
            hooks.add_hook(
                PAGE_BEFORE_EMIT,
                hook_fn(move |_, html| Ok(format!("<{tag}>{html}</{tag}>"))),
            );
            Self { name, hooks }
        }
    }

    impl FrontalPlugin for Wrapping {
        fn name(&self) -> &str {
            self.name
        }

        fn hooks(&self) -> Option<&HookRegistry> {
            Some(&self.hooks)
        }
    }

    struct Failing;

    impl FrontalPlugin for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn configure(&self, _engine: &mut EngineConfig) -> Result<()> {
            Err(Error::Configuration("nope".into()))
        }
    }

    fn ctx() -> AppContext {
        AppContext::new(ConfigSnapshot::defaults("/site"), Mode::Production)
    }

    #[tokio::test]
    async fn hooks_compose_left_to_right() {
        let mut registry = PluginRegistry::new();
        registry.add(Wrapping::new("a", "a"));
        registry.add(Failing);
        registry.add(Wrapping::new("b", "b"));

        let app = ctx();
        let hook_ctx = HookContext {
            app: &app,
            page_name: "index.html",
            page_path: Path::new("/site/pages/index.html"),
        };

        assert!(registry.has_hook(PAGE_BEFORE_EMIT));
        let out = registry
            .apply_hooks(PAGE_BEFORE_EMIT, &hook_ctx, "x".to_string())
            .await
            .unwrap();
        assert_eq!(out, "<b><a>x</a></b>");
    }

    #[tokio::test]
    async fn hook_errors_carry_the_plugin_name() {
        let mut hooks = HookRegistry::new();
        hooks.add_hook(
            PAGE_BEFORE_EMIT,
            hook_fn(|_, _| Err(Error::Configuration("bad icon".into()))),
        );
        let mut registry = PluginRegistry::new();
        registry.add(Wrapping {
            name: "icons",
            hooks,
        });

        let app = ctx();
        let hook_ctx = HookContext {
            app: &app,
            page_name: "index.html",
            page_path: Path::new("/site/pages/index.html"),
        };
        let err = registry
            .apply_hooks(PAGE_BEFORE_EMIT, &hook_ctx, String::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PluginRuntime { ref plugin, .. } if plugin == "icons"));
    }

    #[test]
    fn configure_failures_do_not_stop_other_plugins() {
        let app = ctx();
        let mut registry = PluginRegistry::new();
        registry.add(Failing);
        registry.add(Wrapping::new("a", "a"));

        let mut engine = EngineConfig::for_context(&app);
        let errors = registry.configure_all(&mut engine);
        assert_eq!(errors.len(), 1);
        assert_eq!(registry.names(), vec!["failing", "a"]);
    }
}
