//! Message log entries for a discussion room

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Client-assigned id of a message awaiting server confirmation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TempId(pub String);

impl TempId {
    /// Compose a temporary id from the session start time and a local counter.
    ///
    /// The pair is unique for the lifetime of a session as long as the
    /// counter only grows.
    pub fn compose(session_started_ms: i64, counter: u64) -> Self {
        Self(format!("temp-{}-{}", session_started_ms, counter))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Address of a chat message in the log
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageKey {
    /// Local optimistic entry
    Pending(TempId),
    /// Server-assigned id
    Confirmed(String),
}

impl MessageKey {
    pub fn as_str(&self) -> &str {
        match self {
            MessageKey::Pending(temp) => temp.as_str(),
            MessageKey::Confirmed(id) => id,
        }
    }
}

/// A participant's chat message
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub key: MessageKey,
    pub author_username: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub like_count: u32,
    pub dislike_count: u32,
}

impl ChatMessage {
    pub fn is_pending(&self) -> bool {
        matches!(self.key, MessageKey::Pending(_))
    }

    /// Server id, if the message has been confirmed
    pub fn server_id(&self) -> Option<&str> {
        match &self.key {
            MessageKey::Confirmed(id) => Some(id),
            MessageKey::Pending(_) => None,
        }
    }

    pub fn format_timestamp(&self) -> String {
        self.created_at.format("%H:%M").to_string()
    }
}

/// Kind of a server-authored log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    System,
    DiscussionStart,
    DiscussionEnd,
    Timer,
    UserJoined,
    UserLeft,
}

/// A server-authored line, appended verbatim and never mutated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub content: String,
}

/// One line of the discussion log
#[derive(Debug, Clone, PartialEq)]
pub enum LogEntry {
    Chat(ChatMessage),
    Notice(Notice),
}

impl LogEntry {
    pub fn as_chat(&self) -> Option<&ChatMessage> {
        match self {
            LogEntry::Chat(msg) => Some(msg),
            LogEntry::Notice(_) => None,
        }
    }
}
