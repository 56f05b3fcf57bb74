//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible states during development.
//! These checks are compiled out in release builds.

use std::collections::HashSet;

use crate::models::{MessageKey, MAX_SCORE, MIN_SCORE};
use crate::rating::RatingWorkflow;
use crate::store::MessageStore;

/// Validate that the message log holds each key at most once
pub fn assert_store_invariants(store: &MessageStore) {
    if !cfg!(debug_assertions) {
        return;
    }

    let mut seen: HashSet<&MessageKey> = HashSet::new();
    for msg in store.chats() {
        debug_assert!(
            seen.insert(&msg.key),
            "Message key {:?} appears more than once in the log",
            msg.key
        );
    }
}

/// Validate that a rating workflow never targets its own user and only
/// holds in-range scores
pub fn assert_rating_invariants(rating: &RatingWorkflow, self_username: &str) {
    debug_assert!(
        !rating.peers().iter().any(|p| p == self_username),
        "User {} is asked to rate themselves",
        self_username
    );

    for (peer, row) in rating.matrix() {
        for (criterion, score) in row {
            debug_assert!(
                (MIN_SCORE..=MAX_SCORE).contains(score),
                "Score {} for {}/{} is out of range",
                score,
                peer,
                criterion
            );
        }
    }
}
