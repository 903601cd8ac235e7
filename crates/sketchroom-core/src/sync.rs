//! Relay wire protocol and WebSocket client.
//!
//! The relay groups clients into rooms keyed by document id and forwards
//! whole-document snapshots between members (last-write-wins, no merge).
//! The client here runs on a background thread so the editing loop never
//! blocks on the network.

use serde::{Deserialize, Serialize};

/// Messages sent to the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Join the room for a document.
    JoinDocument { document: String },
    /// Leave the current room.
    LeaveDocument,
    /// Publish a full-document snapshot to the room.
    DocumentUpdate { document: String, snapshot: String },
}

/// Messages received from the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Cached room state, sent once on join when an entry exists.
    DocumentState { document: String, snapshot: String },
    /// Snapshot published by another room member.
    DocumentUpdate { document: String, snapshot: String },
    /// Relay-side error.
    Error { message: String },
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Events surfaced by the relay client.
#[derive(Debug, Clone)]
pub enum RelayEvent {
    /// Connected to the relay.
    Connected,
    /// Disconnected from the relay.
    Disconnected,
    /// Cached room state received on join.
    State { document: String, snapshot: String },
    /// Remote update from another room member.
    Update { document: String, snapshot: String },
    /// Transport or relay error.
    Error { message: String },
}

mod client {
    use super::*;
    use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
    use std::thread::{self, JoinHandle};
    use std::time::Duration;
    use tungstenite::{Message, connect};
    use url::Url;

    /// Commands sent to the WebSocket thread.
    enum WsCommand {
        Send(String),
        Close,
    }

    /// WebSocket relay client.
    ///
    /// Uses a background thread for non-blocking operation; events are
    /// drained with [`poll_events`](RelayClient::poll_events).
    pub struct RelayClient {
        state: ConnectionState,
        events: Vec<RelayEvent>,
        /// Channel to send commands to the WebSocket thread.
        cmd_tx: Option<Sender<WsCommand>>,
        /// Channel to receive events from the WebSocket thread.
        event_rx: Option<Receiver<RelayEvent>>,
        /// Handle to the WebSocket thread.
        _thread: Option<JoinHandle<()>>,
    }

    impl RelayClient {
        /// Create a new disconnected client.
        pub fn new() -> Self {
            Self {
                state: ConnectionState::Disconnected,
                events: Vec::new(),
                cmd_tx: None,
                event_rx: None,
                _thread: None,
            }
        }

        /// Connect to a relay server.
        pub fn connect(&mut self, url: &str) -> Result<(), String> {
            if self.cmd_tx.is_some() {
                return Err("Already connected".to_string());
            }

            let parsed_url = Url::parse(url).map_err(|e| format!("Invalid URL: {e}"))?;
            if parsed_url.scheme() != "ws" && parsed_url.scheme() != "wss" {
                return Err(format!(
                    "Invalid WebSocket URL scheme: {}",
                    parsed_url.scheme()
                ));
            }

            self.state = ConnectionState::Connecting;

            let (cmd_tx, cmd_rx) = channel::<WsCommand>();
            let (event_tx, event_rx) = channel::<RelayEvent>();

            let url = url.to_string();

            let handle = thread::spawn(move || {
                log::info!("relay thread: connecting to {url}");

                match connect(&url) {
                    Ok((mut socket, response)) => {
                        log::info!("relay connected, status: {}", response.status());
                        let _ = event_tx.send(RelayEvent::Connected);

                        // Short read timeout keeps the loop responsive to
                        // outgoing commands without spinning.
                        {
                            let stream = socket.get_mut();
                            if let tungstenite::stream::MaybeTlsStream::Plain(tcp) = stream {
                                let _ = tcp.set_read_timeout(Some(Duration::from_millis(50)));
                                let _ = tcp.set_write_timeout(Some(Duration::from_secs(5)));
                            }
                        }

                        loop {
                            match cmd_rx.try_recv() {
                                Ok(WsCommand::Send(msg)) => {
                                    if let Err(e) = socket.send(Message::Text(msg)) {
                                        log::error!("relay send error: {e}");
                                        break;
                                    }
                                }
                                Ok(WsCommand::Close) => {
                                    let _ = socket.close(None);
                                    break;
                                }
                                Err(TryRecvError::Disconnected) => break,
                                Err(TryRecvError::Empty) => {}
                            }

                            match socket.read() {
                                Ok(Message::Text(text)) => {
                                    match serde_json::from_str::<ServerMessage>(&text) {
                                        Ok(server_msg) => {
                                            let event = match server_msg {
                                                ServerMessage::DocumentState {
                                                    document,
                                                    snapshot,
                                                } => RelayEvent::State { document, snapshot },
                                                ServerMessage::DocumentUpdate {
                                                    document,
                                                    snapshot,
                                                } => RelayEvent::Update { document, snapshot },
                                                ServerMessage::Error { message } => {
                                                    RelayEvent::Error { message }
                                                }
                                            };
                                            let _ = event_tx.send(event);
                                        }
                                        Err(e) => {
                                            log::warn!("unparseable relay message: {e}");
                                        }
                                    }
                                }
                                Ok(Message::Ping(data)) => {
                                    let _ = socket.send(Message::Pong(data));
                                }
                                Ok(Message::Close(_)) => break,
                                Ok(_) => {} // Ignore binary, pong
                                Err(tungstenite::Error::Io(ref e))
                                    if e.kind() == std::io::ErrorKind::WouldBlock
                                        || e.kind() == std::io::ErrorKind::TimedOut =>
                                {
                                    continue;
                                }
                                Err(e) => {
                                    log::error!("relay read error: {e}");
                                    break;
                                }
                            }
                        }

                        log::info!("relay thread exiting");
                        let _ = event_tx.send(RelayEvent::Disconnected);
                    }
                    Err(e) => {
                        log::error!("relay connection failed: {e}");
                        let _ = event_tx.send(RelayEvent::Error {
                            message: format!("Connection failed: {e}"),
                        });
                    }
                }
            });

            self.cmd_tx = Some(cmd_tx);
            self.event_rx = Some(event_rx);
            self._thread = Some(handle);

            Ok(())
        }

        /// Disconnect from the relay.
        pub fn disconnect(&mut self) {
            if let Some(tx) = self.cmd_tx.take() {
                let _ = tx.send(WsCommand::Close);
            }
            self.event_rx = None;
            self._thread = None;
            self.state = ConnectionState::Disconnected;
        }

        /// Send a message to the relay. Dropped when not connected.
        pub fn send(&self, message: &ClientMessage) -> Result<(), String> {
            let json = serde_json::to_string(message).map_err(|e| e.to_string())?;
            if let Some(ref tx) = self.cmd_tx {
                tx.send(WsCommand::Send(json))
                    .map_err(|e| format!("Send failed: {e}"))
            } else {
                Err("Not connected".to_string())
            }
        }

        /// Poll for pending events (non-blocking).
        pub fn poll_events(&mut self) -> Vec<RelayEvent> {
            if let Some(ref rx) = self.event_rx {
                while let Ok(event) = rx.try_recv() {
                    match &event {
                        RelayEvent::Connected => self.state = ConnectionState::Connected,
                        RelayEvent::Disconnected => self.state = ConnectionState::Disconnected,
                        RelayEvent::Error { .. } => self.state = ConnectionState::Error,
                        _ => {}
                    }
                    self.events.push(event);
                }
            }

            std::mem::take(&mut self.events)
        }

        /// Get current connection state.
        pub fn state(&self) -> ConnectionState {
            self.state
        }

        /// Check if connected.
        pub fn is_connected(&self) -> bool {
            self.state == ConnectionState::Connected
        }
    }

    impl Default for RelayClient {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Drop for RelayClient {
        fn drop(&mut self) {
            self.disconnect();
        }
    }
}

pub use client::RelayClient;
