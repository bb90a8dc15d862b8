//! Built-in `live-reload` plugin.

use async_trait::async_trait;
use frontal_config::{AssetReference, BundleDescriptor, BundleMap};

use crate::Result;
use crate::context::AppContext;
use crate::engine::EngineConfig;
use crate::pages::MATCH_ALL;
use crate::plugins::plugin::FrontalPlugin;

/// Specifier of the in-memory client module.
pub const LIVE_RELOAD_CLIENT: &str = "frontal:live-reload-client";

/// Bundle carrying the client.
pub const LIVE_RELOAD_BUNDLE: &str = "hmr";

/// Path the dev server accepts websocket connections on.
pub const SOCKET_PATH: &str = "/__frontal_ws__";

const CLIENT_SOURCE: &str = include_str!("live_reload_client.js");

/// Adds the live-reload client to every page while developing.
pub struct LiveReloadPlugin {
    ctx: AppContext,
}

impl LiveReloadPlugin {
    pub const NAME: &'static str = "live-reload";

    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl FrontalPlugin for LiveReloadPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn configure(&self, engine: &mut EngineConfig) -> Result<()> {
        if self.ctx.in_dev_mode() {
            engine.virtual_module(LIVE_RELOAD_CLIENT, CLIENT_SOURCE);
        }
        Ok(())
    }

    async fn bundles(&self, _bundles: &BundleMap) -> Result<Option<BundleMap>> {
        if !self.ctx.in_dev_mode() {
            return Ok(None);
        }

        let mut contribution = BundleMap::new();
        contribution.insert(
            LIVE_RELOAD_BUNDLE.to_string(),
            BundleDescriptor::with_assets([AssetReference::new(LIVE_RELOAD_CLIENT)])
                .pages([MATCH_ALL]),
        );
        Ok(Some(contribution))
    }
}
