use serde::{Deserialize, Serialize};

/// Message kind: periodic liveness frame carrying a local timestamp.
pub const KIND_HEARTBEAT: &str = "heartbeat";
/// Message kind: free-form application payload.
pub const KIND_CUSTOM: &str = "custom";
/// Message kind: ask the peer to show its window.
pub const KIND_SHOW_WINDOW: &str = "show-window";
/// Message kind: ask the peer to hide its window.
pub const KIND_HIDE_WINDOW: &str = "hide-window";

/// One application message on the bridge.
///
/// `kind` is the application-level discriminator; `value` is a free-form
/// string payload. Serialized form is the wire representation:
/// `{"kind":"...","value":"..."}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub kind: String,
    pub value: String,
}

impl Message {
    /// Create a message.
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }

    /// Create a heartbeat message stamped with the current local wall clock.
    pub fn heartbeat() -> Self {
        Self {
            kind: KIND_HEARTBEAT.to_string(),
            value: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Serialize to the wire representation.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse the wire representation.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Whether this is a liveness frame rather than application data.
    pub fn is_heartbeat(&self) -> bool {
        self.kind == KIND_HEARTBEAT
    }
}
