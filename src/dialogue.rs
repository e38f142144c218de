//! Append-only dialogue history shared across execution contexts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Who produced a dialogue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

impl Role {
    /// Wire name used by chat-completion APIs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

/// One immutable entry in the dialogue history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueEntry {
    pub role: Role,
    pub content: String,
    /// When the entry was appended.
    pub at: DateTime<Utc>,
}

impl DialogueEntry {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            at: Utc::now(),
        }
    }
}

/// Ordered history of a session. Entries are never mutated after insertion.
#[derive(Debug, Default)]
pub struct Dialogue {
    entries: Mutex<Vec<DialogueEntry>>,
}

impl Dialogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry at the end of the history.
    pub fn put(&self, role: Role, content: impl Into<String>) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(DialogueEntry::new(role, content));
    }

    /// Copy of the full history, oldest first.
    pub fn snapshot(&self) -> Vec<DialogueEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
