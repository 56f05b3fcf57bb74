//! Data models for the discussion engine

mod message;
mod rating;
mod room;

pub use message::*;
pub use rating::*;
pub use room::*;
