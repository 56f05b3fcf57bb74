//! Room directory models

use serde::{Deserialize, Deserializer, Serialize};

/// Topic or subtopic id meaning "any"
pub const ANY: u32 = 0;

/// Descriptive metadata carried with a directory entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TopicMetadata {
    /// "personal" or "professional"
    pub mode: String,
    /// "blitz" or "free" for personal rooms
    pub sub_type: String,
    #[serde(rename = "topic")]
    pub topic_id: u32,
    #[serde(rename = "subtopic")]
    pub subtopic_id: u32,
    pub custom_topic: String,
    pub custom_subtopic: String,
    pub description: String,
    pub purpose: String,
    #[serde(deserialize_with = "null_as_default")]
    pub key_questions: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub export_options: Vec<String>,
    pub dont_join: bool,
    /// Minutes
    pub duration: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub start_time: Option<String>,
}

/// One joinable room as listed by the directory channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: u64,
    pub name: String,
    pub open: bool,
    #[serde(rename = "users")]
    pub users_count: u32,
    pub max_users: u32,
    #[serde(default)]
    pub discussion_active: bool,
    #[serde(flatten)]
    pub topic: TopicMetadata,
}

impl RoomSummary {
    pub fn is_full(&self) -> bool {
        self.users_count >= self.max_users
    }

    /// Open, not full, and not already discussing
    pub fn is_joinable(&self) -> bool {
        self.open && !self.is_full() && !self.discussion_active
    }
}

/// Topic/subtopic selector pushed to the directory channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterSpec {
    pub topic_id: u32,
    pub subtopic_id: u32,
}

impl FilterSpec {
    pub fn any() -> Self {
        Self::default()
    }
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
