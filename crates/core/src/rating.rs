//! Post-discussion peer rating
//!
//! Once a discussion ends every participant scores each peer on each
//! criterion. The workflow owns the score matrix and the single submission:
//! it validates locally, hands out the request body, and is told the outcome
//! by whoever performed the request.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::error::{SubmissionError, ValidationError};
use crate::models::{DiscussionId, RatingMatrix, MAX_SCORE, MIN_SCORE};
use crate::protocol::RatingSubmission;

/// How long a failed submission's message stays visible
pub const RATING_ERROR_DISPLAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingStatus {
    /// Scores may be entered
    Collecting,
    /// A request is outstanding
    InFlight,
    /// Accepted by the server; the matrix is frozen
    Submitted,
}

#[derive(Debug)]
pub struct RatingWorkflow {
    peers: Vec<String>,
    criteria: Vec<String>,
    matrix: RatingMatrix,
    status: RatingStatus,
    last_error: Option<(SubmissionError, Instant)>,
}

impl RatingWorkflow {
    /// Start collecting scores for everyone in `users` except `self_username`
    pub fn open(self_username: &str, users: Vec<String>, criteria: Vec<String>) -> Self {
        let mut workflow = Self {
            peers: Vec::new(),
            criteria: Vec::new(),
            matrix: RatingMatrix::new(),
            status: RatingStatus::Collecting,
            last_error: None,
        };
        workflow.set_targets(self_username, users, criteria);
        workflow
    }

    /// Replace the peer and criteria sets, keeping scores already entered.
    ///
    /// Ignored while a submission is in flight and once the ratings have
    /// been submitted.
    pub fn reannounce(&mut self, self_username: &str, users: Vec<String>, criteria: Vec<String>) {
        if self.status != RatingStatus::Collecting {
            warn!(status = ?self.status, "Ignoring rating setup during or after submission");
            return;
        }
        self.set_targets(self_username, users, criteria);
    }

    fn set_targets(&mut self, self_username: &str, users: Vec<String>, criteria: Vec<String>) {
        self.peers = dedup(users.into_iter().filter(|u| u != self_username));
        self.criteria = dedup(criteria.into_iter());
    }

    pub fn peers(&self) -> &[String] {
        &self.peers
    }

    pub fn criteria(&self) -> &[String] {
        &self.criteria
    }

    pub fn matrix(&self) -> &RatingMatrix {
        &self.matrix
    }

    pub fn status(&self) -> RatingStatus {
        self.status
    }

    pub fn nothing_to_rate(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn score(&self, peer: &str, criterion: &str) -> Option<u8> {
        self.matrix.get(peer)?.get(criterion).copied()
    }

    pub fn set_score(&mut self, peer: &str, criterion: &str, value: u8) -> Result<(), ValidationError> {
        match self.status {
            RatingStatus::Submitted => return Err(ValidationError::AlreadySubmitted),
            RatingStatus::InFlight => return Err(ValidationError::SubmissionInFlight),
            RatingStatus::Collecting => {}
        }
        if !(MIN_SCORE..=MAX_SCORE).contains(&value) {
            return Err(ValidationError::InvalidScore(value));
        }
        if !self.peers.iter().any(|p| p == peer) {
            return Err(ValidationError::UnknownPeer(peer.to_string()));
        }
        if !self.criteria.iter().any(|c| c == criterion) {
            return Err(ValidationError::UnknownCriterion(criterion.to_string()));
        }

        self.matrix
            .entry(peer.to_string())
            .or_default()
            .insert(criterion.to_string(), value);
        Ok(())
    }

    /// Every peer has a score for every criterion
    pub fn is_complete(&self) -> bool {
        self.peers
            .iter()
            .all(|p| self.criteria.iter().all(|c| self.score(p, c).is_some()))
    }

    /// Validate and build the request body, marking the submission in flight.
    pub fn begin_submit(
        &mut self,
        discussion_id: Option<&DiscussionId>,
    ) -> Result<RatingSubmission, ValidationError> {
        match self.status {
            RatingStatus::Submitted => return Err(ValidationError::AlreadySubmitted),
            RatingStatus::InFlight => return Err(ValidationError::SubmissionInFlight),
            RatingStatus::Collecting => {}
        }
        if self.nothing_to_rate() {
            return Err(ValidationError::NothingToRate);
        }
        if !self.is_complete() {
            return Err(ValidationError::IncompleteRatings);
        }
        let discussion_id = discussion_id.ok_or(ValidationError::MissingDiscussionId)?;

        // Only the announced pairs are sent; scores for peers dropped by a
        // later announcement stay local.
        let ratings: RatingMatrix = self
            .peers
            .iter()
            .map(|p| {
                let row: BTreeMap<String, u8> = self
                    .criteria
                    .iter()
                    .filter_map(|c| self.score(p, c).map(|s| (c.clone(), s)))
                    .collect();
                (p.clone(), row)
            })
            .collect();

        self.status = RatingStatus::InFlight;
        self.last_error = None;

        Ok(RatingSubmission {
            discussion_id: discussion_id.clone(),
            ratings,
        })
    }

    /// Record the outcome of the request started by `begin_submit`.
    ///
    /// Returns true when the ratings are now submitted.
    pub fn finish_submit(&mut self, outcome: Result<(), SubmissionError>, now: Instant) -> bool {
        if self.status != RatingStatus::InFlight {
            warn!(status = ?self.status, "Submission outcome without a request in flight");
            return false;
        }

        match outcome {
            Ok(()) => {
                info!(peers = self.peers.len(), "Ratings submitted");
                self.status = RatingStatus::Submitted;
                true
            }
            Err(e) => {
                warn!(error = %e, "Rating submission failed");
                self.status = RatingStatus::Collecting;
                self.last_error = Some((e, now));
                false
            }
        }
    }

    /// The last submission error, while it is still within its display window
    pub fn visible_error(&self, now: Instant) -> Option<&SubmissionError> {
        match &self.last_error {
            Some((e, at)) if now.saturating_duration_since(*at) < RATING_ERROR_DISPLAY => Some(e),
            _ => None,
        }
    }
}

fn dedup(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workflow() -> RatingWorkflow {
        RatingWorkflow::open(
            "carol",
            vec!["alice".into(), "bob".into(), "carol".into()],
            vec!["p".into(), "q".into()],
        )
    }

    #[test]
    fn test_self_is_excluded() {
        let w = workflow();
        assert_eq!(w.peers(), &["alice".to_string(), "bob".to_string()]);
    }

    #[test]
    fn test_only_self_means_nothing_to_rate() {
        let mut w = RatingWorkflow::open("alice", vec!["alice".into()], vec!["p".into()]);
        assert!(w.nothing_to_rate());
        assert_eq!(
            w.begin_submit(Some(&DiscussionId::from("1"))),
            Err(ValidationError::NothingToRate)
        );
    }

    #[test]
    fn test_complete_exactly_on_fourth_score() {
        let mut w = workflow();
        let id = DiscussionId::from("7");
        let pairs = [("alice", "p"), ("alice", "q"), ("bob", "p"), ("bob", "q")];

        for (i, (peer, criterion)) in pairs.iter().enumerate() {
            assert!(!w.is_complete());
            assert_eq!(w.begin_submit(Some(&id)), Err(ValidationError::IncompleteRatings));
            w.set_score(peer, criterion, (i + 1) as u8).unwrap();
        }

        assert!(w.is_complete());
        let submission = w.begin_submit(Some(&id)).unwrap();
        assert_eq!(submission.ratings["bob"]["q"], 4);
    }

    #[test]
    fn test_out_of_range_score_does_not_mutate() {
        let mut w = workflow();
        assert_eq!(w.set_score("alice", "p", 0), Err(ValidationError::InvalidScore(0)));
        assert_eq!(w.set_score("alice", "p", 6), Err(ValidationError::InvalidScore(6)));
        assert!(w.matrix().is_empty());
    }

    #[test]
    fn test_unknown_peer_rejected() {
        let mut w = workflow();
        assert_eq!(
            w.set_score("carol", "p", 3),
            Err(ValidationError::UnknownPeer("carol".into()))
        );
    }

    fn fill(w: &mut RatingWorkflow) {
        for peer in ["alice", "bob"] {
            for criterion in ["p", "q"] {
                w.set_score(peer, criterion, 5).unwrap();
            }
        }
    }

    #[test]
    fn test_missing_discussion_id() {
        let mut w = workflow();
        fill(&mut w);
        assert_eq!(w.begin_submit(None), Err(ValidationError::MissingDiscussionId));
        assert_eq!(w.status(), RatingStatus::Collecting);
    }

    #[test]
    fn test_success_freezes_matrix() {
        let mut w = workflow();
        fill(&mut w);
        w.begin_submit(Some(&DiscussionId::from("7"))).unwrap();
        assert_eq!(w.set_score("alice", "p", 1), Err(ValidationError::SubmissionInFlight));

        assert!(w.finish_submit(Ok(()), Instant::now()));
        assert_eq!(w.set_score("alice", "p", 1), Err(ValidationError::AlreadySubmitted));
        assert_eq!(
            w.begin_submit(Some(&DiscussionId::from("7"))),
            Err(ValidationError::AlreadySubmitted)
        );
    }

    #[test]
    fn test_failure_allows_retry_and_error_expires() {
        let mut w = workflow();
        fill(&mut w);
        let id = DiscussionId::from("7");
        let failed_at = Instant::now();

        w.begin_submit(Some(&id)).unwrap();
        assert!(!w.finish_submit(
            Err(SubmissionError::ServerRejected("Missing required criteria".into())),
            failed_at,
        ));

        assert_eq!(w.status(), RatingStatus::Collecting);
        assert!(w.visible_error(failed_at + Duration::from_secs(1)).is_some());
        assert!(w.visible_error(failed_at + RATING_ERROR_DISPLAY).is_none());

        w.set_score("alice", "p", 2).unwrap();
        assert!(w.begin_submit(Some(&id)).is_ok());
    }

    #[test]
    fn test_reannounce_keeps_scores() {
        let mut w = workflow();
        w.set_score("alice", "p", 3).unwrap();
        w.reannounce("carol", vec!["alice".into(), "dave".into()], vec!["p".into()]);
        assert_eq!(w.peers(), &["alice".to_string(), "dave".to_string()]);
        assert_eq!(w.score("alice", "p"), Some(3));
        assert!(!w.is_complete());
    }

    #[test]
    fn test_reannounce_ignored_while_in_flight() {
        let mut w = workflow();
        for peer in ["alice", "bob"] {
            for criterion in ["p", "q"] {
                w.set_score(peer, criterion, 4).unwrap();
            }
        }
        let sent = w.begin_submit(Some(&DiscussionId::from("7"))).unwrap();

        w.reannounce("carol", vec!["dave".into()], vec!["r".into()]);
        assert_eq!(w.status(), RatingStatus::InFlight);
        assert_eq!(w.peers(), &["alice".to_string(), "bob".to_string()]);
        assert_eq!(w.criteria(), &["p".to_string(), "q".to_string()]);
        assert_eq!(sent.ratings.len(), 2);

        assert!(w.finish_submit(Ok(()), Instant::now()));
        w.reannounce("carol", vec!["dave".into()], vec!["r".into()]);
        assert_eq!(w.peers(), &["alice".to_string(), "bob".to_string()]);
    }
}
