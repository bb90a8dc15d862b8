//! One build generation: plugins, engine and the two-phase compile.
//!
//! A [`Pipeline`] is created once per configuration snapshot. [`Pipeline::build`]
//! can run any number of times against it; the dev server rebuilds through the
//! same pipeline until a restart-class change replaces it.

use std::sync::Arc;

use frontal_config::BundleMap;
use serde::Serialize;

use crate::bundles::resolve_bundles;
use crate::context::AppContext;
use crate::engine::{BuildEngine, Compilation, EngineConfig, FsEngine};
use crate::entries::{cleanup_page_scripts, compile_bundle_targets, compile_page_targets};
use crate::pages::{PageMatcher, PageRecord, discover_pages};
use crate::plugins::{PluginFactory, PluginRegistry};
use crate::watch::WatchOrigin;
use crate::{Error, Result};

pub struct Pipeline {
    ctx: AppContext,
    plugins: PluginRegistry,
    engine: Arc<dyn BuildEngine>,
    /// Plugin load and configure failures, reported with every build.
    setup_errors: Vec<String>,
}

impl Pipeline {
    /// Load the configured plugins, let them adjust the engine settings and
    /// create a [`FsEngine`] from the result.
    pub fn new(ctx: AppContext, factory: &PluginFactory) -> Self {
        let (plugins, mut errors) = factory.load(&ctx, &ctx.config().plugins);

        let mut engine_config = EngineConfig::for_context(&ctx);
        errors.extend(plugins.configure_all(&mut engine_config));

        let engine = Arc::new(FsEngine::new(ctx.clone(), &engine_config));
        tracing::debug!(
            plugins = ?plugins.names(),
            mode = ?ctx.mode(),
            "pipeline ready"
        );

        Self {
            ctx,
            plugins,
            engine,
            setup_errors: errors.iter().map(ToString::to_string).collect(),
        }
    }

    /// Assemble a pipeline from parts, e.g. with a custom engine.
    pub fn with_engine(
        ctx: AppContext,
        plugins: PluginRegistry,
        engine: Arc<dyn BuildEngine>,
    ) -> Self {
        Self {
            ctx,
            plugins,
            engine,
            setup_errors: Vec::new(),
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    pub fn setup_errors(&self) -> &[String] {
        &self.setup_errors
    }

    /// Resolve bundles, match pages and compile both phases.
    pub async fn build(&self) -> BuildReport {
        let config = self.ctx.config();
        let mut errors = Vec::new();

        let resolved = resolve_bundles(&config.bundles, &self.plugins).await;
        errors.extend(resolved.errors);
        let bundles = Arc::new(resolved.bundles);
        self.ctx.set_computed_bundles(Arc::clone(&bundles));

        let mut pages = discover_pages(config);
        match PageMatcher::new(&bundles) {
            Ok(matcher) => matcher.assign(&mut pages),
            Err(err) => {
                tracing::error!(error = %err, "cannot match pages to bundles");
                errors.push(err);
            }
        }
        tracing::debug!(pages = pages.len(), bundles = bundles.len(), "pages matched");

        if self.ctx.in_dev_mode() {
            self.watch_project();
        }

        let compilation = match self.compile(&bundles, &pages).await {
            Ok(compilation) => compilation,
            Err(err) => {
                tracing::error!(error = %err, "build engine failed");
                errors.push(err);
                Compilation::default()
            }
        };

        BuildReport {
            compilation,
            pages,
            bundles,
            errors,
            setup_errors: self.setup_errors.clone(),
        }
    }

    async fn compile(&self, bundles: &BundleMap, pages: &[PageRecord]) -> Result<Compilation> {
        let targets = compile_bundle_targets(bundles);
        let mut compilation = self.engine.compile(&targets, &self.plugins).await?;

        let page_targets = compile_page_targets(pages, &compilation);
        let page_compilation = self.engine.compile(&page_targets, &self.plugins).await?;
        compilation.absorb(page_compilation);

        let removed = cleanup_page_scripts(&mut compilation, pages, &self.ctx.config().build);
        compilation.rehash();
        tracing::debug!(
            assets = compilation.assets.len(),
            removed = removed.len(),
            hash = %compilation.hash,
            "compilation finished"
        );
        Ok(compilation)
    }

    fn watch_project(&self) {
        let config = self.ctx.config();
        let watches = self.ctx.watches();
        watches.watch(config.pages_dir(), WatchOrigin::Pages);
        watches.watch(config.partials_dir(), WatchOrigin::Partials);
        watches.watch(config.assets_dir(), WatchOrigin::Assets);
        if let Some(source) = config.source() {
            watches.watch(source, WatchOrigin::Config);
        }
    }

    /// End this generation: every plugin's `teardown()` runs and the watch
    /// requests are dropped.
    pub async fn teardown(&self) -> Vec<Error> {
        self.plugins.teardown_all(&self.ctx).await
    }
}

/// Result of one [`Pipeline::build`].
#[derive(Debug)]
pub struct BuildReport {
    pub compilation: Compilation,
    pub pages: Vec<PageRecord>,
    pub bundles: Arc<BundleMap>,
    /// Bundle resolution and page matching failures.
    pub errors: Vec<Error>,
    /// Plugin load and configure failures of the pipeline.
    pub setup_errors: Vec<String>,
}

impl BuildReport {
    /// Every build error, compilation errors last.
    pub fn errors(&self) -> impl Iterator<Item = &Error> {
        self.errors.iter().chain(self.compilation.errors.iter())
    }

    pub fn has_errors(&self) -> bool {
        !self.setup_errors.is_empty() || self.errors().next().is_some()
    }

    pub fn warnings(&self) -> &[String] {
        &self.compilation.warnings
    }

    pub fn stats(&self) -> BuildStats {
        let errors = self
            .setup_errors
            .iter()
            .cloned()
            .chain(self.errors().map(ToString::to_string))
            .collect();

        BuildStats {
            hash: self.compilation.hash.clone(),
            errors,
            warnings: self.compilation.warnings.clone(),
            assets: self
                .compilation
                .assets
                .iter()
                .map(|(name, asset)| AssetStat {
                    name: name.clone(),
                    size: asset.content.len(),
                    emitted: asset.emitted,
                    development: asset.development,
                })
                .collect(),
        }
    }
}

/// Serializable summary of a build, as sent to dev clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub hash: String,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub assets: Vec<AssetStat>,
}

impl BuildStats {
    /// No asset was re-emitted and nothing failed.
    pub fn unchanged(&self) -> bool {
        self.errors.is_empty() && !self.assets.iter().any(|a| a.emitted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetStat {
    pub name: String,
    pub size: usize,
    pub emitted: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub development: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EmittedAsset;

    fn report(emitted: bool, errors: Vec<Error>) -> BuildReport {
        let mut compilation = Compilation::default();
        compilation.assets.insert(
            "index.html".into(),
            EmittedAsset {
                content: b"<html>".to_vec(),
                emitted,
                development: false,
            },
        );
        compilation.errors = errors;
        compilation.rehash();
        BuildReport {
            compilation,
            pages: Vec::new(),
            bundles: Arc::new(BundleMap::new()),
            errors: vec![Error::plugin_runtime("library", "boom")],
            setup_errors: Vec::new(),
        }
    }

    #[test]
    fn errors_chain_pipeline_then_compilation() {
        let report = report(
            true,
            vec![Error::Resolution {
                specifier: "x.js".into(),
                requested_by: "bundle `main`".into(),
            }],
        );
        let messages: Vec<String> = report.errors().map(ToString::to_string).collect();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("library"));
        assert!(messages[1].contains("x.js"));
        assert!(report.has_errors());
    }

    #[test]
    fn stats_report_emitted_assets() {
        let mut report = report(false, Vec::new());
        report.errors.clear();
        let stats = report.stats();
        assert!(stats.unchanged());
        assert_eq!(stats.assets[0].size, 6);

        let json = serde_json::to_value(&stats).unwrap();
        assert!(json["assets"][0].get("development").is_none());
        assert_eq!(json["hash"], serde_json::json!(report.compilation.hash));
    }
}
