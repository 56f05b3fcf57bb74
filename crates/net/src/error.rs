//! Network error types

use std::io;

use colloquy_core::{SubmissionError, TransportError};
use tokio_tungstenite::tungstenite;

/// Network result type
pub type Result<T> = std::result::Result<T, Error>;

/// Network errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid address: {0}")]
    Address(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Not connected")]
    NotConnected,
}

impl From<Error> for TransportError {
    fn from(e: Error) -> Self {
        match e {
            Error::ConnectionClosed | Error::NotConnected => TransportError::ConnectionClosed,
            Error::WebSocket(tungstenite::Error::ConnectionClosed)
            | Error::WebSocket(tungstenite::Error::AlreadyClosed) => {
                TransportError::ConnectionClosed
            }
            other => TransportError::ConnectionFailed(other.to_string()),
        }
    }
}

impl From<Error> for SubmissionError {
    fn from(e: Error) -> Self {
        SubmissionError::Transport(e.to_string())
    }
}
