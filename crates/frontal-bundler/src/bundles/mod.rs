//! Compute the bundle map from the configured bundles and every plugin's
//! contribution.

use frontal_config::{BundleMap, merge_bundle_maps};

use crate::Error;
use crate::plugins::PluginRegistry;

/// Outcome of a bundle resolve. Plugin failures do not abort the resolve;
/// they are collected here.
#[derive(Debug, Default)]
pub struct ResolvedBundles {
    pub bundles: BundleMap,
    pub errors: Vec<Error>,
}

/// Resolve the computed bundle map.
///
/// The configured bundles are seeded with empty assets and pages, every
/// plugin's `bundles()` contribution is merged on in registration order, and
/// the configured bundles are merged last so user assets follow plugin ones.
pub async fn resolve_bundles(raw: &BundleMap, plugins: &PluginRegistry) -> ResolvedBundles {
    let mut current: BundleMap = raw
        .iter()
        .map(|(name, desc)| (name.clone(), desc.seed()))
        .collect();
    let mut errors = Vec::new();

    for plugin in plugins.iter() {
        match plugin.bundles(&current).await {
            Ok(Some(partial)) => {
                tracing::debug!(
                    plugin = plugin.name(),
                    bundles = partial.len(),
                    "plugin contributed bundles"
                );
                current = merge_bundle_maps(&current, &partial);
            }
            Ok(None) => {}
            Err(err) => {
                let err = match err {
                    Error::PluginRuntime { .. } => err,
                    other => Error::plugin_runtime(plugin.name(), other),
                };
                tracing::error!(plugin = plugin.name(), error = %err, "bundle contribution failed");
                errors.push(err);
            }
        }
    }

    ResolvedBundles {
        bundles: merge_bundle_maps(&current, raw),
        errors,
    }
}
