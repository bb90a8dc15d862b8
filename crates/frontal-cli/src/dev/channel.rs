//! Live-reload notification channel.
//!
//! Tracks connected clients and the build state machine
//! `Idle → Compiling → (ok | warnings | errors | still-ok) → Idle`.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use frontal_bundler::BuildStats;
use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::dev::protocol::{self, Message, Outcome};

/// Queued messages per client before sends start waiting.
const CLIENT_BUFFER: usize = 100;

pub type ClientRegistry = Arc<RwLock<HashMap<usize, mpsc::Sender<String>>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Idle,
    Compiling,
}

#[derive(Debug)]
pub struct LiveReloadChannel {
    clients: ClientRegistry,
    next_id: AtomicUsize,
    state: RwLock<ChannelState>,
    last_stats: RwLock<Option<BuildStats>>,
    last_outcome: RwLock<Option<Outcome>>,
}

impl Default for LiveReloadChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveReloadChannel {
    pub fn new() -> Self {
        Self {
            clients: Arc::new(RwLock::new(HashMap::new())),
            next_id: AtomicUsize::new(0),
            state: RwLock::new(ChannelState::Idle),
            last_stats: RwLock::new(None),
            last_outcome: RwLock::new(None),
        }
    }

    /// Add a client. Its queue already holds the handshake and, when a build
    /// has finished before, a forced replay of that result.
    pub fn register(&self) -> (usize, mpsc::Receiver<String>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(CLIENT_BUFFER);

        let mut greeting = protocol::handshake();
        if let Some(stats) = self.last_stats.read().as_ref() {
            greeting.extend(protocol::stats_messages(stats, true).1);
        }
        for message in greeting {
            // fresh queue, cannot be full
            let _ = tx.try_send(message.to_json());
        }

        self.clients.write().insert(id, tx);
        tracing::debug!(client = id, "live-reload client connected");
        (id, rx)
    }

    pub fn unregister(&self, id: usize) {
        if self.clients.write().remove(&id).is_some() {
            tracing::debug!(client = id, "live-reload client disconnected");
        }
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }

    pub fn state(&self) -> ChannelState {
        *self.state.read()
    }

    pub fn last_outcome(&self) -> Option<Outcome> {
        *self.last_outcome.read()
    }

    pub async fn build_started(&self) {
        *self.state.write() = ChannelState::Compiling;
        self.broadcast(&[Message::invalid()]).await;
    }

    /// Report a finished build and return to idle.
    pub async fn build_finished(&self, stats: BuildStats) -> Outcome {
        let (outcome, messages) = protocol::stats_messages(&stats, false);
        *self.last_stats.write() = Some(stats);
        *self.last_outcome.write() = Some(outcome);
        *self.state.write() = ChannelState::Idle;
        self.broadcast(&messages).await;
        outcome
    }

    pub async fn page_changed(&self, name: &str) {
        self.broadcast(&[Message::page_changed(name)]).await;
    }

    pub async fn content_changed(&self, target: &str) {
        self.broadcast(&[Message::content_changed(target)]).await;
    }

    /// Say goodbye and drop every client.
    pub async fn close_all(&self) {
        self.broadcast(&[Message::close()]).await;
        self.clients.write().clear();
    }

    /// Send `messages` in order to every client. Clients whose queue is gone
    /// are removed before this returns.
    pub async fn broadcast(&self, messages: &[Message]) {
        let payloads: Vec<String> = messages.iter().map(Message::to_json).collect();
        let clients: Vec<(usize, mpsc::Sender<String>)> = self
            .clients
            .read()
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        let mut failed = Vec::new();
        for (id, tx) in clients {
            for payload in &payloads {
                if tx.send(payload.clone()).await.is_err() {
                    failed.push(id);
                    break;
                }
            }
        }

        if !failed.is_empty() {
            let mut registry = self.clients.write();
            for id in failed {
                registry.remove(&id);
                tracing::debug!(client = id, "dropped unreachable live-reload client");
            }
        }
    }
}
