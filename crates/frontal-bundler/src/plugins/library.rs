//! Built-in `library` plugin.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use frontal_config::BundleMap;

use crate::Result;
use crate::context::AppContext;
use crate::engine::EngineConfig;
use crate::library::{Library, expand_library};
use crate::plugins::plugin::FrontalPlugin;

/// Expands the configured library and the components each bundle selects.
pub struct LibraryPlugin {
    ctx: AppContext,
    library: Option<Arc<dyn Library>>,
}

impl LibraryPlugin {
    pub const NAME: &'static str = "library";

    /// Reads the library descriptor from `library.location`.
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx, library: None }
    }

    /// Uses `library` instead of a descriptor file.
    pub fn with_library(ctx: AppContext, library: Arc<dyn Library>) -> Self {
        Self {
            ctx,
            library: Some(library),
        }
    }
}

#[async_trait]
impl FrontalPlugin for LibraryPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    /// `@library` resolves to the library directory, and packages installed
    /// next to the library are found before the project's.
    fn configure(&self, engine: &mut EngineConfig) -> Result<()> {
        let config = self.ctx.config();
        let location = config.resolve(&config.library.location);
        let dir = location.parent().unwrap_or_else(|| Path::new("."));
        engine.alias("@library", dir);
        engine.module_dir(dir.join("node_modules"));
        Ok(())
    }

    async fn bundles(&self, bundles: &BundleMap) -> Result<Option<BundleMap>> {
        expand_library(&self.ctx, self.library.clone(), bundles).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Mode;
    use frontal_config::ConfigSnapshot;
    use std::path::PathBuf;

    #[test]
    fn configure_adds_library_alias_and_modules() {
        let ctx = AppContext::new(ConfigSnapshot::defaults("/site"), Mode::Production);
        let mut engine = EngineConfig::for_context(&ctx);
        LibraryPlugin::new(ctx).configure(&mut engine).unwrap();

        assert_eq!(engine.aliases["@library"], PathBuf::from("/site/library"));
        assert_eq!(
            engine.module_dirs,
            vec![
                PathBuf::from("/site/node_modules"),
                PathBuf::from("/site/library/node_modules"),
            ]
        );
    }
}
