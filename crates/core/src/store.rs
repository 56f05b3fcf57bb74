//! Ordered discussion log with optimistic local echo
//!
//! Local messages enter the log as pending entries keyed by a [`TempId`].
//! When the server broadcasts the confirmed copy (carrying the same temp id)
//! the pending entry is removed and the confirmed one is appended at the
//! tail. Ordering is by arrival: a confirmed message can land after
//! messages that were confirmed during its round trip.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::{ChatMessage, LogEntry, MessageKey, Notice, NoticeKind, TempId};
use crate::protocol::ChatFrame;

/// What happened to an inbound confirmed message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// A pending entry was promoted
    Promoted,
    /// A message from someone else (or an unmatched temp id) was appended
    Appended,
    /// The server id was already in the log
    Duplicate,
}

#[derive(Debug)]
pub struct MessageStore {
    entries: Vec<LogEntry>,
    session_started_ms: i64,
    next_temp: u64,
}

impl MessageStore {
    pub fn new(session_started_at: DateTime<Utc>) -> Self {
        Self {
            entries: Vec::new(),
            session_started_ms: session_started_at.timestamp_millis(),
            next_temp: 0,
        }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find a chat message by its current key string (temp or server id)
    pub fn get(&self, id: &str) -> Option<&ChatMessage> {
        self.chats().find(|m| m.key.as_str() == id)
    }

    pub fn chats(&self) -> impl Iterator<Item = &ChatMessage> {
        self.entries.iter().filter_map(LogEntry::as_chat)
    }

    pub fn pending_count(&self) -> usize {
        self.chats().filter(|m| m.is_pending()).count()
    }

    /// Append a pending local message and return its temporary id.
    ///
    /// Callers gate on phase and trim the body; this only records it.
    pub fn submit_local(&mut self, body: String, author: &str, now: DateTime<Utc>) -> TempId {
        let temp_id = TempId::compose(self.session_started_ms, self.next_temp);
        self.next_temp += 1;

        self.entries.push(LogEntry::Chat(ChatMessage {
            key: MessageKey::Pending(temp_id.clone()),
            author_username: author.to_string(),
            body,
            created_at: now,
            like_count: 0,
            dislike_count: 0,
        }));

        temp_id
    }

    /// Merge a server-confirmed message into the log
    pub fn reconcile(&mut self, confirmed: ChatFrame) -> Reconciled {
        if self
            .chats()
            .any(|m| m.server_id() == Some(confirmed.id.as_str()))
        {
            debug!(message_id = %confirmed.id, "Dropping re-delivered message");
            return Reconciled::Duplicate;
        }

        let mut outcome = Reconciled::Appended;
        if let Some(temp_id) = &confirmed.temp_id {
            let pending = MessageKey::Pending(temp_id.clone());
            if let Some(pos) = self
                .entries
                .iter()
                .position(|e| e.as_chat().is_some_and(|m| m.key == pending))
            {
                self.entries.remove(pos);
                outcome = Reconciled::Promoted;
            }
        }

        self.entries.push(LogEntry::Chat(ChatMessage {
            key: MessageKey::Confirmed(confirmed.id),
            author_username: confirmed.author_username,
            body: confirmed.content,
            created_at: confirmed.created_at,
            like_count: confirmed.like_count,
            dislike_count: confirmed.dislike_count,
        }));

        outcome
    }

    /// Overwrite the counters of a confirmed message.
    ///
    /// Returns false when the message is not in the log yet; the update is
    /// dropped rather than parked.
    pub fn apply_vote(&mut self, message_id: &str, like_count: u32, dislike_count: u32) -> bool {
        let target = self.entries.iter_mut().find_map(|e| match e {
            LogEntry::Chat(m) if m.server_id() == Some(message_id) => Some(m),
            _ => None,
        });

        match target {
            Some(msg) => {
                msg.like_count = like_count;
                msg.dislike_count = dislike_count;
                true
            }
            None => {
                debug!(message_id = %message_id, "Vote update for unknown message dropped");
                false
            }
        }
    }

    pub fn push_notice(&mut self, kind: NoticeKind, content: String) {
        self.entries.push(LogEntry::Notice(Notice { kind, content }));
    }
}
