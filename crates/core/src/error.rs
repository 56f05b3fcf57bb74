//! Error types for the discussion engine
//!
//! The taxonomy mirrors how each failure is surfaced: protocol errors drop a
//! frame, transport errors end the session, validation errors never reach the
//! network, submission errors are shown for a bounded time.

use thiserror::Error;

use crate::session::Phase;

/// Inbound frame could not be used
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),
}

/// Connection-level failures; the session becomes `Disconnected`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
}

/// Local rejections, surfaced next to the offending control
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Score {0} is outside 1..=5")]
    InvalidScore(u8),

    #[error("Every participant must be rated on every criterion")]
    IncompleteRatings,

    #[error("Discussion id is not known yet")]
    MissingDiscussionId,

    #[error("Ratings were already submitted")]
    AlreadySubmitted,

    #[error("A rating submission is already in flight")]
    SubmissionInFlight,

    #[error("There is nobody to rate")]
    NothingToRate,

    #[error("{0} is not among the participants to rate")]
    UnknownPeer(String),

    #[error("{0} is not a rating criterion")]
    UnknownCriterion(String),

    #[error("Message {0} is not in the log")]
    UnknownMessage(String),

    #[error("Message {0} is still waiting for confirmation")]
    PendingMessage(String),

    #[error("Cannot vote on your own message")]
    OwnMessage,
}

/// Rating submission failed after reaching the network
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Server rejected ratings: {0}")]
    ServerRejected(String),

    #[error("Rating request failed: {0}")]
    Transport(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error("Cannot {action} while {phase}")]
    NotPermitted { action: &'static str, phase: Phase },
}

pub type Result<T> = std::result::Result<T, Error>;
