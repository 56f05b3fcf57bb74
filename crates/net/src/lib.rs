//! Colloquy Network Library
//!
//! Transports for the discussion client engine.
//!
//! # Architecture
//!
//! - **Discussion channel**: WebSocket per joined room
//! - **Directory channel**: WebSocket carrying the live room list
//! - **Rating submission**: one HTTP request per discussion
//! - **Framing**: one JSON text message per frame
//!
//! # Usage
//!
//! ```ignore
//! let mut client = DiscussionClient::connect(&endpoint, "12", "alice", "secret").await?;
//! let mut session = Session::new(context, Utc::now());
//!
//! // Consume events one at a time
//! while let Some(event) = client.next_event().await {
//!     match event {
//!         ChannelEvent::Opened => { session.on_open(); }
//!         ChannelEvent::Frame(text) => { session.handle_text(&text)?; }
//!         ChannelEvent::Closed(reason) => { session.on_transport_error(reason); }
//!     }
//! }
//! ```

pub mod channel;
pub mod directory;
pub mod discussion;
pub mod endpoint;
pub mod error;
mod frame;
pub mod rating;

pub use channel::ChannelEvent;
pub use directory::DirectoryClient;
pub use discussion::DiscussionClient;
pub use endpoint::{Endpoint, DEFAULT_HOST};
pub use error::{Error, Result};
pub use rating::{HttpRatingSubmitter, RatingSubmitter};
