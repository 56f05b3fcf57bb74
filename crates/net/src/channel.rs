//! Persistent WebSocket channel
//!
//! A channel owns one WebSocket connection driven by a spawned task. Inbound
//! text frames are queued as [`ChannelEvent`]s for the owner to consume one
//! at a time; outbound frames go through a command queue. Both the
//! discussion and the directory connections are built on this.

use colloquy_core::{ClientFrame, TransportError};
use futures_util::{SinkExt, StreamExt};
use reqwest::Url;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::frame::{encode_frame, read_frame};

/// Queue depth for inbound events and outbound commands
const QUEUE_DEPTH: usize = 64;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Event delivered from a channel's connection task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The connection is established; always the first event
    Opened,
    /// One inbound text frame, still encoded
    Frame(String),
    /// The connection ended; always the last event
    Closed(TransportError),
}

enum ChannelCommand {
    Send(Message),
    Close,
}

/// Handle to a running channel
pub struct Channel {
    event_rx: mpsc::Receiver<ChannelEvent>,
    cmd_tx: mpsc::Sender<ChannelCommand>,
}

impl Channel {
    /// Open a WebSocket to `url` and start its connection task
    pub async fn open(url: &Url, label: &'static str) -> Result<Self> {
        let id = Uuid::new_v4();
        info!(conn = %id, channel = label, host = url.host_str().unwrap_or(""), "Connecting");

        let (socket, _response) = match connect_async(url.as_str()).await {
            Ok(pair) => pair,
            Err(e) => {
                warn!(conn = %id, channel = label, error = %e, "Connection failed");
                return Err(Error::WebSocket(e));
            }
        };

        let (event_tx, event_rx) = mpsc::channel(QUEUE_DEPTH);
        let (cmd_tx, cmd_rx) = mpsc::channel(QUEUE_DEPTH);

        tokio::spawn(connection_task(
            id,
            label,
            socket,
            event_tx,
            cmd_rx,
        ));

        Ok(Self {
            event_rx,
            cmd_tx,
        })
    }

    /// Get the next channel event; `None` after `Closed` has been delivered
    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        self.event_rx.recv().await
    }

    /// Queue a frame for sending
    pub async fn send(&self, frame: &ClientFrame) -> Result<()> {
        let message = encode_frame(frame)?;
        self.cmd_tx
            .send(ChannelCommand::Send(message))
            .await
            .map_err(|_| Error::NotConnected)
    }

    /// Close the connection deliberately
    pub async fn close(&self) {
        let _ = self.cmd_tx.send(ChannelCommand::Close).await;
    }
}

/// Main connection task
async fn connection_task(
    id: Uuid,
    label: &'static str,
    socket: Socket,
    event_tx: mpsc::Sender<ChannelEvent>,
    mut cmd_rx: mpsc::Receiver<ChannelCommand>,
) {
    let (mut sink, mut stream) = socket.split();
    let _ = event_tx.send(ChannelEvent::Opened).await;
    info!(conn = %id, channel = label, "Connected");

    let reason = loop {
        tokio::select! {
            // Incoming frame from server
            result = read_frame(&mut stream) => {
                match result {
                    Ok(text) => {
                        debug!(conn = %id, len = text.len(), "Frame received");
                        if event_tx.send(ChannelEvent::Frame(text)).await.is_err() {
                            debug!(conn = %id, "Channel owner went away");
                            break TransportError::ConnectionClosed;
                        }
                    }
                    Err(Error::ConnectionClosed) => {
                        debug!(conn = %id, "Server closed connection");
                        break TransportError::ConnectionClosed;
                    }
                    Err(e) => {
                        warn!(conn = %id, error = %e, "Read error");
                        break e.into();
                    }
                }
            }

            // Outgoing command
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(ChannelCommand::Send(message)) => {
                        if let Err(e) = sink.send(message).await {
                            warn!(conn = %id, error = %e, "Write error");
                            break Error::from(e).into();
                        }
                    }
                    Some(ChannelCommand::Close) | None => {
                        debug!(conn = %id, "Close requested");
                        let _ = sink.close().await;
                        break TransportError::ConnectionClosed;
                    }
                }
            }
        }
    };

    let _ = event_tx.send(ChannelEvent::Closed(reason)).await;
    info!(conn = %id, channel = label, "Disconnected");
}
