//! Colloquy Core Library
//!
//! Client engine for timed, moderated group discussions: the inbound frame
//! codec, the session phase machine, the optimistic message log, the
//! post-discussion rating workflow and the live room directory.
//!
//! Nothing here performs I/O. Callers feed decoded frames and user actions
//! in, one at a time, and send whatever [`ClientFrame`] comes back.

pub mod directory;
pub mod error;
pub mod invariants;
pub mod models;
pub mod protocol;
pub mod rating;
pub mod session;
pub mod store;

pub use directory::DirectoryFeed;
pub use error::{Error, ProtocolError, Result, SubmissionError, TransportError, ValidationError};
pub use models::*;
pub use protocol::{ClientFrame, RatingSubmission, ServerFrame};
pub use rating::{RatingStatus, RatingWorkflow, RATING_ERROR_DISPLAY};
pub use session::{Phase, Session, SessionContext, READY_TOKEN};
pub use store::{MessageStore, Reconciled};
