//! Discussion session state machine
//!
//! A [`Session`] is created per joined room and consumes inbound frames one
//! at a time. Phases only move forward:
//!
//! ```text
//! Idle -> AwaitingReady -> Active -> Ended -> RatingOpen -> RatingSubmitted
//! ```
//!
//! with `Disconnected` reachable from anywhere and final. Message and vote
//! frames are forwarded to the [`MessageStore`], rating setup to the
//! [`RatingWorkflow`]. Outbound actions are checked against the current
//! phase before a [`ClientFrame`] is handed back for sending.

use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{Error, Result, SubmissionError, TransportError, ValidationError};
use crate::invariants::{assert_rating_invariants, assert_store_invariants};
use crate::models::{DiscussionId, NoticeKind, Vote};
use crate::protocol::{ClientFrame, DiscussionEnd, RatingSubmission, ServerFrame};
use crate::rating::RatingWorkflow;
use crate::store::MessageStore;

/// Input that signals readiness before the discussion starts
pub const READY_TOKEN: &str = "+";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Idle,
    AwaitingReady,
    Active,
    Ended,
    RatingOpen,
    RatingSubmitted,
    Disconnected,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::AwaitingReady => "awaiting ready",
            Phase::Active => "discussion active",
            Phase::Ended => "discussion ended",
            Phase::RatingOpen => "rating open",
            Phase::RatingSubmitted => "rating submitted",
            Phase::Disconnected => "disconnected",
        };
        f.write_str(name)
    }
}

/// Who is in which room; passed in, never read from ambient storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub room_id: String,
    pub username: String,
}

#[derive(Debug)]
pub struct Session {
    context: SessionContext,
    phase: Phase,
    room_name: Option<String>,
    discussion_id: Option<DiscussionId>,
    time_remaining: Option<Duration>,
    store: MessageStore,
    rating: Option<RatingWorkflow>,
    disconnect_notice: Option<TransportError>,
}

impl Session {
    pub fn new(context: SessionContext, started_at: DateTime<Utc>) -> Self {
        Self {
            context,
            phase: Phase::Idle,
            room_name: None,
            discussion_id: None,
            time_remaining: None,
            store: MessageStore::new(started_at),
            rating: None,
            disconnect_notice: None,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn rating(&self) -> Option<&RatingWorkflow> {
        self.rating.as_ref()
    }

    pub fn discussion_id(&self) -> Option<&DiscussionId> {
        self.discussion_id.as_ref()
    }

    /// Display name announced by the server, if any
    pub fn room_name(&self) -> Option<&str> {
        self.room_name.as_deref()
    }

    /// Remaining discussion time from the most recent timer frame
    pub fn time_remaining(&self) -> Option<Duration> {
        self.time_remaining
    }

    /// Move forward to `to`; backward or same-phase moves are ignored
    fn advance(&mut self, to: Phase) -> bool {
        if self.phase == Phase::Disconnected || to <= self.phase {
            return false;
        }
        info!(
            room_id = %self.context.room_id,
            from = %self.phase,
            to = %to,
            "Session phase changed"
        );
        self.phase = to;
        true
    }

    /// The discussion channel is open
    pub fn on_open(&mut self) -> bool {
        if self.phase != Phase::Idle {
            return false;
        }
        self.advance(Phase::AwaitingReady)
    }

    /// The discussion channel closed or failed.
    ///
    /// Only the first error is kept as the user-visible notice.
    pub fn on_transport_error(&mut self, error: TransportError) -> bool {
        if self.phase == Phase::Disconnected {
            debug!(error = %error, "Already disconnected");
            return false;
        }
        info!(room_id = %self.context.room_id, error = %error, "Session disconnected");
        self.phase = Phase::Disconnected;
        self.disconnect_notice = Some(error);
        true
    }

    /// Hand out the disconnect notice once
    pub fn take_disconnect_notice(&mut self) -> Option<TransportError> {
        self.disconnect_notice.take()
    }

    /// Decode and apply one raw inbound frame.
    ///
    /// A malformed frame is returned as an error and leaves the session
    /// untouched; the caller logs it and keeps reading.
    pub fn handle_text(&mut self, raw: &str) -> Result<Option<Phase>> {
        let frame = ServerFrame::decode(raw)?;
        Ok(self.handle_frame(frame))
    }

    /// Apply one decoded inbound frame, returning the new phase if it changed
    pub fn handle_frame(&mut self, frame: ServerFrame) -> Option<Phase> {
        if self.phase == Phase::Disconnected {
            debug!(tag = frame.tag(), "Frame after disconnect ignored");
            return None;
        }

        let before = self.phase;
        debug!(tag = frame.tag(), phase = %before, "Handling frame");

        match frame {
            ServerFrame::System { content } => {
                self.store.push_notice(NoticeKind::System, content);
            }
            ServerFrame::DiscussionStart { content } => {
                self.store.push_notice(NoticeKind::DiscussionStart, content);
                self.advance(Phase::Active);
            }
            ServerFrame::DiscussionEnd(end) => self.on_discussion_end(end),
            ServerFrame::Timer { content } => {
                if let Some(remaining) = parse_remaining(&content) {
                    self.time_remaining = Some(remaining);
                }
                self.store.push_notice(NoticeKind::Timer, content);
            }
            ServerFrame::UserJoined { content } => {
                self.store.push_notice(NoticeKind::UserJoined, content);
            }
            ServerFrame::UserLeft { content } => {
                self.store.push_notice(NoticeKind::UserLeft, content);
            }
            ServerFrame::Usual(chat) => {
                let outcome = self.store.reconcile(chat);
                debug!(?outcome, "Chat message reconciled");
            }
            ServerFrame::VoteUpdate(update) => {
                self.store
                    .apply_vote(&update.message_id, update.like_count, update.dislike_count);
            }
            ServerFrame::RatingInfo(info) => self.open_rating(info.users, info.criteria),
            ServerFrame::SetRoomName { content } => {
                self.room_name = Some(content);
            }
            ServerFrame::Unknown { tag } => {
                warn!(tag = %tag, "Ignoring frame with unknown type");
            }
        }

        assert_store_invariants(&self.store);
        if let Some(rating) = &self.rating {
            assert_rating_invariants(rating, &self.context.username);
        }

        (self.phase != before).then_some(self.phase)
    }

    fn on_discussion_end(&mut self, end: DiscussionEnd) {
        if !end.content.is_empty() {
            self.store.push_notice(NoticeKind::DiscussionEnd, end.content);
        }
        if let Some(id) = end.discussion_id {
            self.discussion_id = Some(id);
        }
        self.time_remaining = None;
        self.advance(Phase::Ended);

        if let (Some(users), Some(criteria)) = (end.users, end.criteria) {
            self.open_rating(users, criteria);
        }
    }

    fn open_rating(&mut self, users: Vec<String>, criteria: Vec<String>) {
        if self.phase >= Phase::RatingSubmitted {
            debug!("Rating setup after submission ignored");
            return;
        }

        let me = self.context.username.as_str();
        match &mut self.rating {
            Some(rating) => rating.reannounce(me, users, criteria),
            None => {
                let rating = RatingWorkflow::open(me, users, criteria);
                if rating.nothing_to_rate() {
                    info!("Nobody to rate in this discussion");
                }
                self.rating = Some(rating);
            }
        }
        self.advance(Phase::RatingOpen);
    }

    /// Handle a line typed into the message box.
    ///
    /// Returns the frame to send, or `None` when the input is not sendable
    /// in the current phase but is not an error either (blank input, or
    /// anything other than the ready token before the discussion starts).
    pub fn submit_input(&mut self, input: &str, now: DateTime<Utc>) -> Result<Option<ClientFrame>> {
        let trimmed = input.trim();

        match self.phase {
            Phase::AwaitingReady => {
                if trimmed == READY_TOKEN {
                    Ok(Some(ClientFrame::ReadyCheck {
                        username: self.context.username.clone(),
                    }))
                } else {
                    Ok(None)
                }
            }
            Phase::Active => {
                if trimmed.is_empty() {
                    return Ok(None);
                }
                let temp_id =
                    self.store
                        .submit_local(trimmed.to_string(), &self.context.username, now);
                assert_store_invariants(&self.store);
                Ok(Some(ClientFrame::Usual {
                    content: trimmed.to_string(),
                    username: self.context.username.clone(),
                    temp_id,
                }))
            }
            phase => {
                if trimmed.is_empty() {
                    Ok(None)
                } else {
                    Err(Error::NotPermitted {
                        action: "send a message",
                        phase,
                    })
                }
            }
        }
    }

    /// Build a vote on a confirmed message written by someone else
    pub fn vote(&self, message_id: &str, vote: Vote) -> Result<ClientFrame> {
        if self.phase == Phase::Disconnected {
            return Err(Error::NotPermitted {
                action: "vote",
                phase: self.phase,
            });
        }

        let message = self
            .store
            .get(message_id)
            .ok_or_else(|| ValidationError::UnknownMessage(message_id.to_string()))?;
        if message.is_pending() {
            return Err(ValidationError::PendingMessage(message_id.to_string()).into());
        }
        if message.author_username == self.context.username {
            return Err(ValidationError::OwnMessage.into());
        }

        Ok(ClientFrame::Rate {
            message_id: message_id.to_string(),
            vote,
            username: self.context.username.clone(),
        })
    }

    pub fn set_score(&mut self, peer: &str, criterion: &str, value: u8) -> Result<()> {
        let phase = self.phase;
        let rating = self.rating.as_mut().ok_or(Error::NotPermitted {
            action: "rate participants",
            phase,
        })?;
        rating.set_score(peer, criterion, value)?;
        Ok(())
    }

    /// Validate the ratings and produce the request body to send.
    ///
    /// On success the submission is in flight until
    /// [`finish_rating_submission`](Self::finish_rating_submission) is
    /// called with the outcome.
    pub fn begin_rating_submission(&mut self) -> Result<RatingSubmission> {
        match self.phase {
            Phase::RatingOpen => {}
            Phase::RatingSubmitted => return Err(ValidationError::AlreadySubmitted.into()),
            phase => {
                return Err(Error::NotPermitted {
                    action: "submit ratings",
                    phase,
                })
            }
        }

        let phase = self.phase;
        let rating = self.rating.as_mut().ok_or(Error::NotPermitted {
            action: "submit ratings",
            phase,
        })?;
        Ok(rating.begin_submit(self.discussion_id.as_ref())?)
    }

    /// Record the outcome of the rating request; returns the new phase if it
    /// changed
    pub fn finish_rating_submission(
        &mut self,
        outcome: std::result::Result<(), SubmissionError>,
        now: Instant,
    ) -> Option<Phase> {
        let submitted = self
            .rating
            .as_mut()
            .is_some_and(|rating| rating.finish_submit(outcome, now));

        (submitted && self.advance(Phase::RatingSubmitted)).then_some(self.phase)
    }

    /// Leave the room. All session state is dropped with `self`.
    pub fn leave(self) {
        info!(
            room_id = %self.context.room_id,
            messages = self.store.len(),
            phase = %self.phase,
            "Leaving room"
        );
    }
}

/// Parse the trailing `MM:SS` or `HH:MM:SS` token of a timer line
fn parse_remaining(content: &str) -> Option<Duration> {
    let token = content.split_whitespace().last()?;
    let parts = token
        .split(':')
        .map(|p| p.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;

    // Server-supplied digits; overflow means the token is not a time
    let secs = match parts.as_slice() {
        [m, s] => m.checked_mul(60)?.checked_add(*s)?,
        [h, m, s] => h
            .checked_mul(3600)?
            .checked_add(m.checked_mul(60)?)?
            .checked_add(*s)?,
        _ => return None,
    };
    Some(Duration::from_secs(secs))
}
