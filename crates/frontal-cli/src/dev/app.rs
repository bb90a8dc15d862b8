//! The dev-mode reaction loop.
//!
//! A [`DevApp`] owns the current generation (pipeline plus file watcher) and
//! decides what each file event means: a rebuild, a page or content
//! notification, or a restart into a new generation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use frontal_bundler::pages::{has_extension, page_name};
use frontal_bundler::{AppContext, Mode, Pipeline, PluginFactory, WatchOrigin};
use frontal_config::{ConfigDiscovery, ConfigSnapshot};
use serde_json::json;
use tokio::sync::mpsc;

use crate::dev::protocol::{Message, MessageType, Outcome};
use crate::dev::state::SharedState;
use crate::dev::watcher::{ChangeKind, ProjectWatcher, WatchEvent};
use crate::error::Result;
use crate::ui;

/// Window in which repeated events for one path collapse into one.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// What [`DevApp::handle`] did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// The event came from a discarded generation.
    Stale,
    /// Nothing to do.
    Ignored,
    Rebuilt(Outcome),
    Restarted(Outcome),
}

struct Generation {
    id: u64,
    pipeline: Pipeline,
    /// `None` when the platform watcher could not be created.
    watcher: Option<ProjectWatcher>,
}

pub struct DevApp {
    root: PathBuf,
    factory: PluginFactory,
    state: SharedState,
    events: mpsc::Sender<WatchEvent>,
    debounce: Duration,
    current: Generation,
}

impl DevApp {
    /// Load the configuration under `root`, create the first generation and
    /// run the initial build.
    pub async fn start(
        root: impl Into<PathBuf>,
        factory: PluginFactory,
        state: SharedState,
        events: mpsc::Sender<WatchEvent>,
    ) -> Result<Self> {
        let root = root.into();
        let config = ConfigDiscovery::new(&root).load()?;
        state.set_public_dir(config.public_dir());

        let current = new_generation(1, config, &factory, &events, DEFAULT_DEBOUNCE);
        let mut app = Self {
            root,
            factory,
            state,
            events,
            debounce: DEFAULT_DEBOUNCE,
            current,
        };
        app.rebuild().await;
        Ok(app)
    }

    pub fn generation(&self) -> u64 {
        self.current.id
    }

    pub fn config(&self) -> &ConfigSnapshot {
        self.current.pipeline.context().config()
    }

    pub fn context(&self) -> &AppContext {
        self.current.pipeline.context()
    }

    /// Build with the current pipeline and report the result to clients.
    pub async fn rebuild(&mut self) -> Outcome {
        let channel = Arc::clone(self.state.channel());
        channel.build_started().await;

        let started = Instant::now();
        let report = self.current.pipeline.build().await;
        let stats = report.stats();

        for warning in report.warnings() {
            ui::warning(warning);
        }
        for error in &stats.errors {
            ui::error(error);
        }

        self.state.update(&report.compilation);
        if let Some(watcher) = self.current.watcher.as_mut() {
            let requests = self.current.pipeline.context().watches().requests();
            watcher.sync(&requests);
        }

        let outcome = channel.build_finished(stats).await;
        let elapsed = ui::format_duration(started.elapsed());
        match outcome {
            Outcome::Ok | Outcome::Warnings => ui::success(&format!("Built in {elapsed}")),
            Outcome::StillOk => ui::info(&format!("Nothing changed ({elapsed})")),
            Outcome::Errors => ui::error(&format!("Build failed after {elapsed}")),
        }
        outcome
    }

    pub async fn handle(&mut self, event: WatchEvent) -> Reaction {
        if event.generation != self.current.id {
            tracing::debug!(
                event_generation = event.generation,
                current = self.current.id,
                path = %event.path.display(),
                "dropping event from a previous generation"
            );
            return Reaction::Stale;
        }

        let ctx = self.current.pipeline.context().clone();
        let Some(origin) = ctx.watches().origin_of(&event.path) else {
            return Reaction::Ignored;
        };
        tracing::debug!(path = %event.path.display(), ?origin, kind = ?event.kind, "file event");

        match origin {
            WatchOrigin::Config => self.config_changed().await,
            WatchOrigin::Pages => {
                if !has_extension(&event.path, &ctx.config().pages.extensions) {
                    return Reaction::Ignored;
                }
                let outcome = self.rebuild().await;
                if event.kind == ChangeKind::Changed {
                    if let Some(name) = page_name(&ctx.config().pages_dir(), &event.path) {
                        self.state.channel().page_changed(&name).await;
                    }
                }
                Reaction::Rebuilt(outcome)
            }
            WatchOrigin::Partials
            | WatchOrigin::Assets
            | WatchOrigin::Library
            | WatchOrigin::Component
            | WatchOrigin::Icons => {
                ctx.modules().invalidate(&event.path);
                let outcome = self.rebuild().await;
                if event.kind == ChangeKind::Changed {
                    let target = relative_target(&self.root, &event.path);
                    self.state.channel().content_changed(&target).await;
                }
                Reaction::Rebuilt(outcome)
            }
        }
    }

    async fn config_changed(&mut self) -> Reaction {
        let next = match ConfigDiscovery::new(&self.root).load() {
            Ok(next) => next,
            Err(err) => {
                ui::error(&format!("Configuration not reloaded: {err}"));
                let message = Message::with_data(MessageType::Error, json!(err.to_string()));
                self.state.channel().broadcast(&[message]).await;
                return Reaction::Ignored;
            }
        };

        let diff = self.config().diff(&next);
        if diff.is_empty() {
            return Reaction::Ignored;
        }
        let sections: Vec<&str> = diff.sections().iter().map(|s| s.as_str()).collect();
        tracing::info!(sections = ?sections, restart = diff.requires_restart(), "configuration changed");

        let old_server = &self.config().server;
        if old_server.host != next.server.host || old_server.port != next.server.port {
            ui::warning("Server address changes apply after restarting `frontal dev`");
        }
        self.state.set_public_dir(next.public_dir());

        if diff.requires_restart() {
            Reaction::Restarted(self.restart(next).await)
        } else {
            self.teardown_current().await;
            let ctx = AppContext::new(next, Mode::Development);
            self.current.pipeline = Pipeline::new(ctx, &self.factory);
            let outcome = self.rebuild().await;
            self.state.channel().content_changed("*").await;
            Reaction::Rebuilt(outcome)
        }
    }

    /// Discard the current generation and build a new one from `next`.
    async fn restart(&mut self, next: ConfigSnapshot) -> Outcome {
        self.teardown_current().await;
        let id = self.current.id + 1;
        ui::info("Configuration changed, restarting");
        // replacing the generation drops the old watcher
        self.current = new_generation(id, next, &self.factory, &self.events, self.debounce);
        self.rebuild().await
    }

    async fn teardown_current(&self) {
        for err in self.current.pipeline.teardown().await {
            tracing::warn!(error = %err, "plugin teardown failed");
        }
    }

    /// Tear the pipeline down and disconnect every client.
    pub async fn shutdown(self) {
        self.teardown_current().await;
        self.state.channel().close_all().await;
    }
}

fn new_generation(
    id: u64,
    config: ConfigSnapshot,
    factory: &PluginFactory,
    events: &mpsc::Sender<WatchEvent>,
    debounce: Duration,
) -> Generation {
    let ctx = AppContext::new(config, Mode::Development);
    let pipeline = Pipeline::new(ctx, factory);
    for err in pipeline.setup_errors() {
        ui::error(err);
    }

    let watcher = match ProjectWatcher::new(id, events.clone(), debounce) {
        Ok(watcher) => Some(watcher),
        Err(err) => {
            ui::warning(&format!("File watching disabled: {err}"));
            None
        }
    };
    tracing::debug!(generation = id, "dev generation created");

    Generation {
        id,
        pipeline,
        watcher,
    }
}

/// `path` relative to the project root with `/` separators.
fn relative_target(root: &Path, path: &Path) -> String {
    page_name(root, path).unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dev::channel::LiveReloadChannel;
    use crate::dev::state::DevServerState;
    use std::fs;

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("assets")).unwrap();
        fs::create_dir_all(root.join("pages")).unwrap();
        fs::write(root.join("assets/app.js"), "console.log('app')").unwrap();
        fs::write(
            root.join("pages/index.html"),
            "<html><head></head><body></body></html>",
        )
        .unwrap();
        fs::write(root.join("frontal.toml"), "[server]\nport = 4000\n").unwrap();
        dir
    }

    async fn app(root: &Path) -> (DevApp, mpsc::Receiver<WatchEvent>) {
        let channel = Arc::new(LiveReloadChannel::new());
        let state = Arc::new(DevServerState::new(channel, root.join("public"), "/"));
        let (tx, rx) = mpsc::channel(64);
        let app = DevApp::start(root, PluginFactory::with_builtins(), state, tx)
            .await
            .unwrap();
        (app, rx)
    }

    fn event(generation: u64, kind: ChangeKind, path: PathBuf) -> WatchEvent {
        WatchEvent {
            generation,
            kind,
            path,
        }
    }

    #[tokio::test]
    async fn initial_build_registers_watches() {
        let dir = site();
        let (app, _rx) = app(dir.path()).await;
        assert_eq!(app.generation(), 1);
        let watches = app.context().watches();
        assert_eq!(
            watches.origin_of(&dir.path().join("frontal.toml")),
            Some(WatchOrigin::Config)
        );
        assert_eq!(
            watches.origin_of(&dir.path().join("pages/index.html")),
            Some(WatchOrigin::Pages)
        );
        assert!(app.state.cached("index.html").is_some());
    }

    #[tokio::test]
    async fn restart_creates_exactly_one_generation() {
        let dir = site();
        let root = dir.path();
        let (mut app, _rx) = app(root).await;

        fs::write(root.join("frontal.toml"), "[pages]\npath = \"pages\"\nextensions = [\"html\", \"htm\"]\n").unwrap();
        let reaction = app
            .handle(event(1, ChangeKind::Changed, root.join("frontal.toml")))
            .await;
        assert!(matches!(reaction, Reaction::Restarted(_)));
        assert_eq!(app.generation(), 2);

        let stale = app
            .handle(event(1, ChangeKind::Changed, root.join("pages/index.html")))
            .await;
        assert_eq!(stale, Reaction::Stale);
        assert_eq!(app.generation(), 2);
    }

    #[tokio::test]
    async fn unchanged_config_is_ignored() {
        let dir = site();
        let root = dir.path();
        let (mut app, _rx) = app(root).await;

        let reaction = app
            .handle(event(1, ChangeKind::Changed, root.join("frontal.toml")))
            .await;
        assert_eq!(reaction, Reaction::Ignored);
        assert_eq!(app.generation(), 1);
    }

    #[tokio::test]
    async fn bundle_change_rebuilds_in_place() {
        let dir = site();
        let root = dir.path();
        let (mut app, _rx) = app(root).await;
        let (_, mut client) = app.state.channel().register();

        fs::write(
            root.join("frontal.toml"),
            "[server]\nport = 4000\n\n[bundles.main]\nassets = [\"@assets/app.js\"]\npages = [\"index.html\"]\n",
        )
        .unwrap();
        let reaction = app
            .handle(event(1, ChangeKind::Changed, root.join("frontal.toml")))
            .await;
        assert!(matches!(reaction, Reaction::Rebuilt(_)));
        assert_eq!(app.generation(), 1);

        let mut last = None;
        while let Ok(raw) = client.try_recv() {
            last = Some(serde_json::from_str::<Message>(&raw).unwrap());
        }
        assert_eq!(last, Some(Message::content_changed("*")));
    }

    #[tokio::test]
    async fn page_edit_notifies_page_name() {
        let dir = site();
        let root = dir.path();
        let (mut app, _rx) = app(root).await;
        let (_, mut client) = app.state.channel().register();

        let page = root.join("pages/index.html");
        fs::write(&page, "<html><head></head><body><h1>new</h1></body></html>").unwrap();
        let reaction = app.handle(event(1, ChangeKind::Changed, page)).await;
        assert_eq!(reaction, Reaction::Rebuilt(Outcome::Ok));

        let mut kinds = Vec::new();
        let mut last = None;
        while let Ok(raw) = client.try_recv() {
            let message: Message = serde_json::from_str(&raw).unwrap();
            kinds.push(message.kind);
            last = Some(message);
        }
        assert!(kinds.contains(&MessageType::Invalid));
        assert_eq!(last, Some(Message::page_changed("index.html")));
    }

    fn drain(client: &mut mpsc::Receiver<String>) -> Vec<Message> {
        let mut messages = Vec::new();
        while let Ok(raw) = client.try_recv() {
            messages.push(serde_json::from_str(&raw).unwrap());
        }
        messages
    }

    #[tokio::test]
    async fn asset_added_or_removed_rebuilds_without_content_changed() {
        let dir = site();
        let root = dir.path();
        let (mut app, _rx) = app(root).await;
        let (_, mut client) = app.state.channel().register();
        drain(&mut client);

        let extra = root.join("assets/extra.js");
        fs::write(&extra, "console.log('extra')").unwrap();
        for kind in [ChangeKind::Added, ChangeKind::Removed] {
            let reaction = app.handle(event(1, kind, extra.clone())).await;
            assert!(matches!(reaction, Reaction::Rebuilt(_)), "{kind:?}");
            let kinds: Vec<MessageType> = drain(&mut client).into_iter().map(|m| m.kind).collect();
            assert!(kinds.contains(&MessageType::Invalid), "{kind:?}");
            assert!(!kinds.contains(&MessageType::ContentChanged), "{kind:?}");
        }

        let reaction = app.handle(event(1, ChangeKind::Changed, extra)).await;
        assert!(matches!(reaction, Reaction::Rebuilt(_)));
        assert_eq!(
            drain(&mut client).pop(),
            Some(Message::content_changed("assets/extra.js"))
        );
    }

    #[tokio::test]
    async fn non_page_file_in_pages_dir_is_ignored() {
        let dir = site();
        let root = dir.path();
        let (mut app, _rx) = app(root).await;
        let (_, mut client) = app.state.channel().register();
        drain(&mut client);

        let notes = root.join("pages/notes.md");
        fs::write(&notes, "# notes").unwrap();
        let reaction = app.handle(event(1, ChangeKind::Changed, notes)).await;
        assert_eq!(reaction, Reaction::Ignored);
        assert!(drain(&mut client).is_empty());
    }

    #[tokio::test]
    async fn unwatched_path_is_ignored() {
        let dir = site();
        let (mut app, _rx) = app(dir.path()).await;
        let reaction = app
            .handle(event(1, ChangeKind::Changed, PathBuf::from("/elsewhere/x.js")))
            .await;
        assert_eq!(reaction, Reaction::Ignored);
    }
}
