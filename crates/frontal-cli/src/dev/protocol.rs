//! Messages sent to live-reload clients.
//!
//! Every message is a JSON object `{"type": ..., "data": ...}`; `data` is
//! omitted when the type carries none.

use frontal_bundler::BuildStats;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageType {
    Hot,
    #[serde(rename = "liveReload")]
    LiveReload,
    Invalid,
    Hash,
    StillOk,
    LogLevel,
    Overlay,
    Progress,
    ProgressUpdate,
    Ok,
    PageChanged,
    ContentChanged,
    Warnings,
    Errors,
    Error,
    Close,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Message {
    pub fn new(kind: MessageType) -> Self {
        Self { kind, data: None }
    }

    pub fn with_data(kind: MessageType, data: Value) -> Self {
        Self {
            kind,
            data: Some(data),
        }
    }

    pub fn invalid() -> Self {
        Self::new(MessageType::Invalid)
    }

    pub fn hash(hash: &str) -> Self {
        Self::with_data(MessageType::Hash, json!(hash))
    }

    pub fn still_ok() -> Self {
        Self::new(MessageType::StillOk)
    }

    pub fn ok() -> Self {
        Self::new(MessageType::Ok)
    }

    pub fn warnings(warnings: &[String]) -> Self {
        Self::with_data(MessageType::Warnings, json!(warnings))
    }

    pub fn errors(errors: &[String]) -> Self {
        Self::with_data(MessageType::Errors, json!(errors))
    }

    pub fn page_changed(name: &str) -> Self {
        Self::with_data(MessageType::PageChanged, json!({ "name": name }))
    }

    pub fn content_changed(target: &str) -> Self {
        Self::with_data(MessageType::ContentChanged, json!({ "target": target }))
    }

    pub fn close() -> Self {
        Self::new(MessageType::Close)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Greeting for a freshly connected client.
pub fn handshake() -> Vec<Message> {
    vec![
        Message::with_data(MessageType::LogLevel, json!("silent")),
        Message::new(MessageType::Hot),
        Message::with_data(MessageType::LiveReload, json!(true)),
        Message::with_data(MessageType::Overlay, json!(true)),
    ]
}

/// How a finished build is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Warnings,
    Errors,
    StillOk,
}

impl Outcome {
    /// Outcome of `stats`. A forced report never yields [`Outcome::StillOk`].
    pub fn of(stats: &BuildStats, force: bool) -> Self {
        if !force && stats.unchanged() {
            Outcome::StillOk
        } else if !stats.errors.is_empty() {
            Outcome::Errors
        } else if !stats.warnings.is_empty() {
            Outcome::Warnings
        } else {
            Outcome::Ok
        }
    }
}

/// Messages reporting a finished build: `still-ok` alone, or `hash` followed
/// by one of `errors`, `warnings` or `ok`.
pub fn stats_messages(stats: &BuildStats, force: bool) -> (Outcome, Vec<Message>) {
    let outcome = Outcome::of(stats, force);
    let messages = match outcome {
        Outcome::StillOk => vec![Message::still_ok()],
        Outcome::Errors => vec![Message::hash(&stats.hash), Message::errors(&stats.errors)],
        Outcome::Warnings => vec![
            Message::hash(&stats.hash),
            Message::warnings(&stats.warnings),
        ],
        Outcome::Ok => vec![Message::hash(&stats.hash), Message::ok()],
    };
    (outcome, messages)
}
