//! Room directory channel client

use colloquy_core::ClientFrame;

use crate::channel::{Channel, ChannelEvent};
use crate::endpoint::Endpoint;
use crate::error::Result;

/// Connection to the live room list
pub struct DirectoryClient {
    channel: Channel,
}

impl DirectoryClient {
    pub async fn connect(endpoint: &Endpoint) -> Result<Self> {
        let url = endpoint.directory_url()?;
        let channel = Channel::open(&url, "directory").await?;
        Ok(Self { channel })
    }

    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        self.channel.next_event().await
    }

    /// Push a filter frame produced by the directory feed
    pub async fn push_filter(&self, frame: &ClientFrame) -> Result<()> {
        debug_assert!(
            matches!(frame, ClientFrame::Filter { .. }),
            "Only filter frames go on the directory channel"
        );
        self.channel.send(frame).await
    }

    pub async fn close(&self) {
        self.channel.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy_core::{DirectoryFeed, TransportError};
    use futures_util::{SinkExt, StreamExt};
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;
    use tokio_tungstenite::tungstenite::Message;

    #[tokio::test]
    async fn test_filter_then_snapshot() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Minimal directory server: read one filter, answer with one room
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            let filter = loop {
                match ws.next().await.unwrap().unwrap() {
                    Message::Text(text) => break text.as_str().to_owned(),
                    _ => continue,
                }
            };
            ws.send(Message::text(
                r#"[{"id":1,"name":"Ethics","open":true,"users":1,"maxUsers":2,"discussionActive":false}]"#
                    .to_string(),
            ))
            .await
            .unwrap();
            ws.close(None).await.unwrap();
            filter
        });

        let endpoint = Endpoint::new(addr.to_string(), false);
        let mut client = DirectoryClient::connect(&endpoint).await.unwrap();
        let mut feed = DirectoryFeed::new();

        assert_eq!(client.next_event().await, Some(ChannelEvent::Opened));
        client.push_filter(&feed.on_open()).await.unwrap();

        match client.next_event().await {
            Some(ChannelEvent::Frame(text)) => {
                feed.apply_snapshot(&text).unwrap();
            }
            other => panic!("Expected snapshot, got {:?}", other),
        }
        assert_eq!(feed.rooms()[0].name, "Ethics");

        assert_eq!(
            client.next_event().await,
            Some(ChannelEvent::Closed(TransportError::ConnectionClosed))
        );

        let filter = server.await.unwrap();
        assert_eq!(filter, r#"{"type":"filter","topic":0,"subtopic":0}"#);
    }
}
