//! WebSocket connection to the user service.
//!
//! Outbound envelopes go through an unbounded queue drained by a writer task;
//! inbound frames are decoded by a reader task and published as
//! [`ClientEvent`]s. Nothing here retries or reconnects.

use futures::{SinkExt, StreamExt};
use shared::protocol::{CommandEnvelope, ServerReply};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::{
    config::normalize_server_url,
    error::{SinkError, TransportError},
    router::CommandSink,
};

const EVENT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Connected { server_url: String },
    Reply(ServerReply),
    /// Transport or decoding problem worth showing to the user.
    Error(String),
    Closed,
}

pub struct UserClient {
    server_url: String,
    outbound: mpsc::UnboundedSender<CommandEnvelope>,
}

impl UserClient {
    /// Opens the socket and asks for the user list straight away. The
    /// returned receiver is subscribed before any frame is read, so the
    /// initial list is never missed.
    pub async fn connect(
        server_url: &str,
    ) -> Result<(Self, broadcast::Receiver<ClientEvent>), TransportError> {
        let ws_url = normalize_server_url(server_url)?;
        let (ws_stream, _) = connect_async(ws_url.as_str())
            .await
            .map_err(|source| TransportError::Connect {
                url: ws_url.clone(),
                source: Box::new(source),
            })?;
        info!(url = %ws_url, "connected to user service");

        let (mut ws_writer, mut ws_reader) = ws_stream.split();
        let (events, events_rx) = broadcast::channel(EVENT_CAPACITY);
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<CommandEnvelope>();

        let _ = events.send(ClientEvent::Connected {
            server_url: ws_url.clone(),
        });

        let writer_events = events.clone();
        tokio::spawn(async move {
            while let Some(envelope) = outbound_rx.recv().await {
                let command = envelope.command();
                let text = match envelope.to_json() {
                    Ok(text) => text,
                    Err(err) => {
                        let _ = writer_events.send(ClientEvent::Error(err.to_string()));
                        continue;
                    }
                };
                if let Err(err) = ws_writer.send(Message::Text(text)).await {
                    let _ = writer_events.send(ClientEvent::Error(format!(
                        "websocket send failed for {command}: {err}"
                    )));
                    break;
                }
                debug!(%command, "sent command");
            }
            let _ = ws_writer.close().await;
        });

        let reader_events = events;
        tokio::spawn(async move {
            while let Some(msg) = ws_reader.next().await {
                match msg {
                    Ok(Message::Text(text)) => match ServerReply::parse(&text) {
                        Ok(reply) => {
                            let _ = reader_events.send(ClientEvent::Reply(reply));
                        }
                        Err(err) => {
                            warn!("dropping server frame: {err}");
                            let _ = reader_events.send(ClientEvent::Error(err.to_string()));
                        }
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(err) => {
                        let _ = reader_events.send(ClientEvent::Error(format!(
                            "websocket receive failed: {err}"
                        )));
                        break;
                    }
                }
            }
            info!("user service connection closed");
            let _ = reader_events.send(ClientEvent::Closed);
        });

        let client = Self {
            server_url: ws_url,
            outbound,
        };
        if client.send_command(CommandEnvelope::GetUserList).is_err() {
            warn!("connection closed before the user list was requested");
        }
        Ok((client, events_rx))
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }
}

impl CommandSink for UserClient {
    fn send_command(&self, envelope: CommandEnvelope) -> Result<(), SinkError> {
        self.outbound.send(envelope).map_err(|_| SinkError::Closed)
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
