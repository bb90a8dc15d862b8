//! Plugin system: the capability trait, hooks, the ordered registry, the
//! name-based factory and the built-in plugins.

mod factory;
mod hooks;
mod plugin;
mod registry;

pub mod icons;
pub mod library;
pub mod live_reload;

pub use factory::PluginFactory;
pub use hooks::{Hook, HookContext, HookRegistry, PAGE_BEFORE_EMIT, hook_fn};
pub use icons::IconsPlugin;
pub use library::LibraryPlugin;
pub use live_reload::LiveReloadPlugin;
pub use plugin::FrontalPlugin;
pub use registry::PluginRegistry;
