//! Development server: live-reload channel, file watching and HTTP serving.
//!
//! File events flow from [`ProjectWatcher`] into [`DevApp::handle`], which
//! rebuilds through the current pipeline and notifies clients over the
//! [`LiveReloadChannel`].

pub mod app;
pub mod channel;
pub mod protocol;
pub mod server;
pub mod state;
pub mod watcher;

pub use app::{DevApp, Reaction};
pub use channel::{ChannelState, LiveReloadChannel};
pub use protocol::{Message, MessageType, Outcome};
pub use state::{BundleCache, DevServerState, SharedState};
pub use watcher::{ChangeKind, ProjectWatcher, WatchEvent};
