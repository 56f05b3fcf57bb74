//! WebSocket text frame reading/writing
//!
//! Every protocol frame is one JSON text message. Ping, pong and binary
//! messages carry nothing for us and are skipped; a close message or the end
//! of the stream is reported as `ConnectionClosed`.

use futures_util::{Stream, StreamExt};
use tokio_tungstenite::tungstenite::{self, Message};

use colloquy_core::ClientFrame;

use crate::error::{Error, Result};

/// Maximum accepted text frame (1MB sanity limit)
const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Read the next text frame from a WebSocket stream
pub async fn read_frame<S>(stream: &mut S) -> Result<String>
where
    S: Stream<Item = std::result::Result<Message, tungstenite::Error>> + Unpin,
{
    loop {
        let message = match stream.next().await {
            Some(Ok(message)) => message,
            Some(Err(tungstenite::Error::ConnectionClosed)) | None => {
                return Err(Error::ConnectionClosed)
            }
            Some(Err(e)) => return Err(Error::WebSocket(e)),
        };

        match message {
            Message::Text(text) => {
                if text.len() > MAX_FRAME_SIZE {
                    tracing::warn!(len = text.len(), "Dropping oversized frame");
                    continue;
                }
                return Ok(text.as_str().to_owned());
            }
            Message::Close(_) => return Err(Error::ConnectionClosed),
            Message::Ping(_) | Message::Pong(_) | Message::Binary(_) | Message::Frame(_) => {
                continue
            }
        }
    }
}

/// Encode an outbound frame as a WebSocket text message
pub fn encode_frame(frame: &ClientFrame) -> Result<Message> {
    Ok(Message::text(frame.to_text()?))
}
