//! Discussion channel client

use colloquy_core::ClientFrame;

use crate::channel::{Channel, ChannelEvent};
use crate::endpoint::Endpoint;
use crate::error::Result;

/// Connection to one discussion room
pub struct DiscussionClient {
    channel: Channel,
    room_id: String,
}

impl DiscussionClient {
    /// Join a room. The password is sent as a connection parameter.
    pub async fn connect(
        endpoint: &Endpoint,
        room_id: &str,
        username: &str,
        password: &str,
    ) -> Result<Self> {
        let url = endpoint.chat_url(room_id, username, password)?;
        let channel = Channel::open(&url, "discussion").await?;
        Ok(Self {
            channel,
            room_id: room_id.to_string(),
        })
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        self.channel.next_event().await
    }

    /// Send a frame produced by the session
    pub async fn send(&self, frame: &ClientFrame) -> Result<()> {
        debug_assert!(
            !matches!(frame, ClientFrame::Filter { .. }),
            "Filter frames belong on the directory channel"
        );
        self.channel.send(frame).await
    }

    /// Leave the room by closing the channel
    pub async fn leave(&self) {
        self.channel.close().await;
    }
}
