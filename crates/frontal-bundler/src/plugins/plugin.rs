use async_trait::async_trait;
use frontal_config::BundleMap;

use crate::Result;
use crate::engine::EngineConfig;
use crate::plugins::hooks::HookRegistry;

/// A frontal plugin.
///
/// Every capability is optional: the default implementations do nothing, so a
/// plugin only overrides what it contributes.
#[async_trait]
pub trait FrontalPlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Hooks this plugin registered, if any.
    fn hooks(&self) -> Option<&HookRegistry> {
        None
    }

    /// Adjust engine settings (aliases, module directories, virtual modules).
    fn configure(&self, _engine: &mut EngineConfig) -> Result<()> {
        Ok(())
    }

    /// Contribute to the bundle map.
    ///
    /// Receives the map as computed so far and returns a partial map that is
    /// deep-merged onto it, or `None` to contribute nothing.
    async fn bundles(&self, _bundles: &BundleMap) -> Result<Option<BundleMap>> {
        Ok(None)
    }

    /// Release resources before the generation is dropped.
    async fn teardown(&self) -> Result<()> {
        Ok(())
    }
}
