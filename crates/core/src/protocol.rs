//! Discussion and directory protocol frames
//!
//! Every frame is a JSON object with a `type` discriminator. Inbound frames
//! decode into [`ServerFrame`]; outbound user actions encode from
//! [`ClientFrame`]. Tags this client does not know decode into
//! [`ServerFrame::Unknown`] so the caller can log and drop them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;
use crate::models::{DiscussionId, RatingMatrix, RoomSummary, TempId, Vote};

/// A confirmed chat message as broadcast by the server
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatFrame {
    pub id: String,
    pub content: String,
    #[serde(rename = "username", alias = "authorUsername")]
    pub author_username: String,
    #[serde(rename = "timestamp", alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "likeCount", default)]
    pub like_count: u32,
    #[serde(rename = "dislikeCount", default)]
    pub dislike_count: u32,
    #[serde(rename = "tempId", default)]
    pub temp_id: Option<TempId>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VoteUpdate {
    #[serde(rename = "messageID", alias = "messageId")]
    pub message_id: String,
    #[serde(rename = "likeCount")]
    pub like_count: u32,
    #[serde(rename = "dislikeCount")]
    pub dislike_count: u32,
}

/// End of the timed discussion, optionally carrying the rating setup
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DiscussionEnd {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub users: Option<Vec<String>>,
    #[serde(default)]
    pub criteria: Option<Vec<String>>,
    #[serde(rename = "discussionID", alias = "discussionId", default)]
    pub discussion_id: Option<DiscussionId>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RatingInfo {
    pub users: Vec<String>,
    pub criteria: Vec<String>,
}

/// Inbound discussion channel frame
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ServerFrame {
    #[serde(rename = "system")]
    System { content: String },

    #[serde(rename = "discussion_start")]
    DiscussionStart { content: String },

    #[serde(rename = "discussion_end")]
    DiscussionEnd(DiscussionEnd),

    #[serde(rename = "timer")]
    Timer { content: String },

    #[serde(rename = "userJoined")]
    UserJoined { content: String },

    #[serde(rename = "userLeft")]
    UserLeft { content: String },

    #[serde(rename = "usual")]
    Usual(ChatFrame),

    #[serde(rename = "vote_update")]
    VoteUpdate(VoteUpdate),

    #[serde(rename = "rating_info")]
    RatingInfo(RatingInfo),

    #[serde(rename = "setRoomName")]
    SetRoomName { content: String },

    /// Any tag not listed above
    #[serde(skip_deserializing)]
    Unknown { tag: String },
}

const KNOWN_TAGS: &[&str] = &[
    "system",
    "discussion_start",
    "discussion_end",
    "timer",
    "userJoined",
    "userLeft",
    "usual",
    "vote_update",
    "rating_info",
    "setRoomName",
];

impl ServerFrame {
    /// Decode one inbound text frame.
    ///
    /// Fails with `MalformedFrame` when the payload is not a JSON object with
    /// a string `type`, or when a known tag is missing required fields.
    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| ProtocolError::MalformedFrame(format!("invalid JSON: {}", e)))?;

        let tag = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| ProtocolError::MalformedFrame("missing type tag".into()))?;

        if !KNOWN_TAGS.contains(&tag) {
            return Ok(ServerFrame::Unknown {
                tag: tag.to_string(),
            });
        }

        let mut frame: ServerFrame = serde_json::from_value(value)
            .map_err(|e| ProtocolError::MalformedFrame(format!("{}", e)))?;

        // The server omits tempId for foreign messages but be lenient about
        // an empty one as well.
        if let ServerFrame::Usual(chat) = &mut frame {
            if chat.temp_id.as_ref().is_some_and(|t| t.0.is_empty()) {
                chat.temp_id = None;
            }
        }

        Ok(frame)
    }

    /// The `type` tag this frame was decoded from
    pub fn tag(&self) -> &str {
        match self {
            ServerFrame::System { .. } => "system",
            ServerFrame::DiscussionStart { .. } => "discussion_start",
            ServerFrame::DiscussionEnd(_) => "discussion_end",
            ServerFrame::Timer { .. } => "timer",
            ServerFrame::UserJoined { .. } => "userJoined",
            ServerFrame::UserLeft { .. } => "userLeft",
            ServerFrame::Usual(_) => "usual",
            ServerFrame::VoteUpdate(_) => "vote_update",
            ServerFrame::RatingInfo(_) => "rating_info",
            ServerFrame::SetRoomName { .. } => "setRoomName",
            ServerFrame::Unknown { tag } => tag,
        }
    }
}

/// Outbound frame on either persistent channel
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ClientFrame {
    /// Readiness signal, discussion channel
    #[serde(rename = "ready_check")]
    ReadyCheck { username: String },

    /// Chat message, discussion channel
    #[serde(rename = "usual")]
    Usual {
        content: String,
        username: String,
        #[serde(rename = "tempId")]
        temp_id: TempId,
    },

    /// Vote on a message, discussion channel
    #[serde(rename = "rate")]
    Rate {
        #[serde(rename = "messageID")]
        message_id: String,
        vote: Vote,
        username: String,
    },

    /// Directory channel only
    #[serde(rename = "filter")]
    Filter { topic: u32, subtopic: u32 },
}

impl ClientFrame {
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Body of the request/response rating submission
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSubmission {
    pub discussion_id: DiscussionId,
    pub ratings: RatingMatrix,
}

/// Decode a directory snapshot: a bare JSON array of rooms, `null` for none
pub fn decode_room_snapshot(raw: &str) -> Result<Vec<RoomSummary>, ProtocolError> {
    let rooms: Option<Vec<RoomSummary>> = serde_json::from_str(raw)
        .map_err(|e| ProtocolError::MalformedFrame(format!("invalid room list: {}", e)))?;
    Ok(rooms.unwrap_or_default())
}
