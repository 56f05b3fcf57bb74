//! Rating and voting values

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Server id of an archived discussion.
///
/// The server sends it as a JSON number today; strings are accepted too.
/// Numeric ids are written back as numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiscussionId(pub String);

impl fmt::Display for DiscussionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DiscussionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Serialize for DiscussionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.parse::<i64>() {
            Ok(n) => serializer.serialize_i64(n),
            Err(_) => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for DiscussionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl Visitor<'_> for IdVisitor {
            type Value = DiscussionId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a discussion id as number or string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(DiscussionId(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(DiscussionId(v.to_string()))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(DiscussionId(v.to_string()))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

/// A participant's vote on a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Like,
    Clear,
    Dislike,
}

impl Vote {
    pub fn as_i8(self) -> i8 {
        match self {
            Vote::Like => 1,
            Vote::Clear => 0,
            Vote::Dislike => -1,
        }
    }
}

impl Serialize for Vote {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.as_i8())
    }
}

/// Lowest accepted score
pub const MIN_SCORE: u8 = 1;
/// Highest accepted score
pub const MAX_SCORE: u8 = 5;

/// peer -> criterion -> score
pub type RatingMatrix = BTreeMap<String, BTreeMap<String, u8>>;
