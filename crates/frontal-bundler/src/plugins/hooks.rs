//! Named extension points owned by each plugin instance.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::Result;
use crate::context::AppContext;

/// Runs on every page after bundle assets are injected and before it is emitted.
pub const PAGE_BEFORE_EMIT: &str = "page:beforeEmit";

/// What a hook is running against.
pub struct HookContext<'a> {
    pub app: &'a AppContext,
    /// Logical page name, e.g. `blog/post.html`.
    pub page_name: &'a str,
    pub page_path: &'a Path,
}

/// A content transform registered under a hook name.
///
/// Hooks registered under the same name are composed left to right: each
/// receives the output of the previous one.
#[async_trait]
pub trait Hook: Send + Sync {
    async fn call(&self, ctx: &HookContext<'_>, input: String) -> Result<String>;
}

struct FnHook<F>(F);

#[async_trait]
impl<F> Hook for FnHook<F>
where
    F: Fn(&HookContext<'_>, String) -> Result<String> + Send + Sync,
{
    async fn call(&self, ctx: &HookContext<'_>, input: String) -> Result<String> {
        (self.0)(ctx, input)
    }
}

/// Wrap a synchronous closure as a [`Hook`].
pub fn hook_fn<F>(f: F) -> Arc<dyn Hook>
where
    F: Fn(&HookContext<'_>, String) -> Result<String> + Send + Sync + 'static,
{
    Arc::new(FnHook(f))
}

#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: IndexMap<String, Vec<Arc<dyn Hook>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_hook(&mut self, name: impl Into<String>, hook: Arc<dyn Hook>) {
        self.hooks.entry(name.into()).or_default().push(hook);
    }

    /// True only when at least one hook is registered under `name`.
    pub fn has_hook(&self, name: &str) -> bool {
        self.hooks.get(name).is_some_and(|hooks| !hooks.is_empty())
    }

    pub fn get_hooks(&self, name: &str) -> &[Arc<dyn Hook>] {
        self.hooks.get(name).map(Vec::as_slice).unwrap_or_default()
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.hooks.iter().map(|(name, hooks)| (name, hooks.len())))
            .finish()
    }
}
