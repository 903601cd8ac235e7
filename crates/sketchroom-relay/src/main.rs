//! Sketchroom WebSocket Relay Server
//!
//! Broadcasts whole-document snapshots between clients editing the same
//! document. Each document id maps to a room; the room keeps the most
//! recently published snapshot in an ephemeral cache so late joiners
//! start from the latest state. Last-write-wins: snapshots replace each
//! other wholesale, there is no merging.
//!
//! ## Protocol
//!
//! Messages are JSON with the following format:
//! ```json
//! { "type": "join-document", "document": "doc-id" }
//! { "type": "document-update", "document": "doc-id", "snapshot": "<json>" }
//! { "type": "document-state", "document": "doc-id", "snapshot": "<json>" }
//! ```

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use uuid::Uuid;

/// Server configuration
const CHANNEL_CAPACITY: usize = 256;
const DEFAULT_PORT: u16 = 9000;
/// Unrefreshed cache entries expire after this long; an expired entry
/// behaves as a cache miss on the next join.
const CACHE_TTL: Duration = Duration::from_secs(30 * 60);
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// A message sent by clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Join the room for a document
    JoinDocument { document: String },
    /// Leave the current room
    LeaveDocument,
    /// Publish a full-document snapshot to the room
    DocumentUpdate { document: String, snapshot: String },
}

/// A message sent to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Cached room state, sent once on join when an entry exists
    DocumentState { document: String, snapshot: String },
    /// Snapshot published by another room member
    DocumentUpdate { document: String, snapshot: String },
    /// Error message
    Error { message: String },
}

/// Cached snapshot with its expiry.
struct CacheEntry {
    snapshot: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn fresh(snapshot: String, ttl: Duration) -> Self {
        Self {
            snapshot,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Room state
struct Room {
    /// Broadcast channel for this room
    tx: broadcast::Sender<(String, ServerMessage)>,
    /// Connected peer IDs
    peers: HashSet<String>,
    /// Last published snapshot (for new joiners)
    cache: Option<CacheEntry>,
}

impl Room {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            peers: HashSet::new(),
            cache: None,
        }
    }
}

/// Shared application state
struct AppState {
    /// Active rooms, keyed by document id
    rooms: DashMap<String, Room>,
    /// Cache TTL (configurable for tests)
    ttl: Duration,
}

impl AppState {
    fn new(ttl: Duration) -> Self {
        Self {
            rooms: DashMap::new(),
            ttl,
        }
    }

    /// Add a peer to a room. Returns the broadcast receiver, the cached
    /// snapshot if one exists and is unexpired, and the member count.
    fn join_room(
        &self,
        document: &str,
        peer_id: &str,
    ) -> (
        broadcast::Receiver<(String, ServerMessage)>,
        Option<String>,
        usize,
    ) {
        let mut room = self
            .rooms
            .entry(document.to_string())
            .or_insert_with(Room::new);
        room.peers.insert(peer_id.to_string());
        let rx = room.tx.subscribe();
        // Lazy expiry: a stale entry is a cache miss.
        if room.cache.as_ref().is_some_and(CacheEntry::is_expired) {
            room.cache = None;
        }
        let snapshot = room.cache.as_ref().map(|c| c.snapshot.clone());
        let peer_count = room.peers.len();
        (rx, snapshot, peer_count)
    }

    /// Remove a peer from a room. The cache entry is untouched; empty
    /// rooms with a live cache entry stay until the sweep reaps them.
    fn leave_room(&self, document: &str, peer_id: &str) {
        if let Some(mut room) = self.rooms.get_mut(document) {
            room.peers.remove(peer_id);
            let removable = room.peers.is_empty()
                && room.cache.as_ref().is_none_or(CacheEntry::is_expired);
            if removable {
                drop(room);
                self.rooms.remove(document);
            }
        }
    }

    /// Store a published snapshot, refreshing its expiry.
    fn update_cache(&self, document: &str, snapshot: String) {
        if let Some(mut room) = self.rooms.get_mut(document) {
            room.cache = Some(CacheEntry::fresh(snapshot, self.ttl));
        }
    }

    /// Broadcast a message to a room
    fn broadcast(&self, document: &str, from: &str, msg: ServerMessage) {
        if let Some(room) = self.rooms.get(document) {
            let _ = room.tx.send((from.to_string(), msg));
        }
    }

    /// Drop expired cache entries and abandoned rooms.
    fn sweep(&self) {
        self.rooms.retain(|_, room| {
            if room.cache.as_ref().is_some_and(CacheEntry::is_expired) {
                room.cache = None;
            }
            !room.peers.is_empty() || room.cache.is_some()
        });
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sketchroom_relay=info,tower_http=info".into()),
        )
        .init();

    let state = Arc::new(AppState::new(CACHE_TTL));

    let sweeper = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            sweeper.sweep();
        }
    });

    let app = Router::new()
        .route("/", get(index))
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Sketchroom relay server listening on {}", addr);
    info!("WebSocket endpoint: ws://localhost:{}/ws", port);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

/// Index page
async fn index() -> &'static str {
    "Sketchroom Relay Server - Connect via WebSocket at /ws"
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

/// WebSocket upgrade handler
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let peer_id = Uuid::new_v4().to_string();
    info!("New connection: {}", peer_id);

    let (mut sender, mut receiver) = socket.split();
    let mut current_room: Option<String> = None;
    let mut room_rx: Option<broadcast::Receiver<(String, ServerMessage)>> = None;

    loop {
        tokio::select! {
            // Handle incoming messages from client
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                match client_msg {
                                    ClientMessage::JoinDocument { document } => {
                                        // Leave current room if any
                                        if let Some(ref old_room) = current_room {
                                            state.leave_room(old_room, &peer_id);
                                        }

                                        let (rx, snapshot, peer_count) =
                                            state.join_room(&document, &peer_id);
                                        room_rx = Some(rx);
                                        current_room = Some(document.clone());

                                        info!(
                                            "Peer {} joined document {} ({} members)",
                                            peer_id, document, peer_count
                                        );

                                        // Send cached state, if any (cache miss: the
                                        // joiner keeps its freshly loaded document).
                                        if let Some(snapshot) = snapshot {
                                            let msg = ServerMessage::DocumentState { document, snapshot };
                                            if sender.send(Message::Text(serde_json::to_string(&msg).unwrap().into())).await.is_err() {
                                                break;
                                            }
                                        }
                                    }
                                    ClientMessage::LeaveDocument => {
                                        if let Some(ref room) = current_room {
                                            state.leave_room(room, &peer_id);
                                            info!("Peer {} left document {}", peer_id, room);
                                        }
                                        current_room = None;
                                        room_rx = None;
                                    }
                                    ClientMessage::DocumentUpdate { document, snapshot } => {
                                        match current_room {
                                            Some(ref room) if *room == document => {
                                                // Refresh the cache for late joiners,
                                                // then fan out to the other members.
                                                state.update_cache(&document, snapshot.clone());
                                                state.broadcast(&document, &peer_id, ServerMessage::DocumentUpdate {
                                                    document: document.clone(),
                                                    snapshot,
                                                });
                                            }
                                            _ => {
                                                let err = ServerMessage::Error {
                                                    message: format!("Not joined to document {document}"),
                                                };
                                                let _ = sender.send(Message::Text(serde_json::to_string(&err).unwrap().into())).await;
                                            }
                                        }
                                    }
                                }
                            }
                            Err(e) => {
                                warn!("Invalid message from {}: {}", peer_id, e);
                                let err = ServerMessage::Error {
                                    message: format!("Invalid message: {e}"),
                                };
                                let _ = sender.send(Message::Text(serde_json::to_string(&err).unwrap().into())).await;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        break;
                    }
                    Some(Ok(_)) => {} // Ignore binary, ping/pong
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {}", peer_id, e);
                        break;
                    }
                }
            }

            // Handle broadcast messages from room
            msg = async {
                match &mut room_rx {
                    Some(rx) => rx.recv().await.ok(),
                    None => {
                        // No room joined, just wait forever
                        std::future::pending::<Option<(String, ServerMessage)>>().await
                    }
                }
            } => {
                if let Some((from, server_msg)) = msg {
                    // Don't echo back to sender
                    if from != peer_id {
                        let json = serde_json::to_string(&server_msg).unwrap();
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }
    }

    // Cleanup on disconnect
    if let Some(ref room) = current_room {
        state.leave_room(room, &peer_id);
    }
    info!("Connection closed: {}", peer_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_empty_room_is_cache_miss() {
        let state = AppState::new(CACHE_TTL);
        let (_rx, snapshot, peer_count) = state.join_room("doc", "a");
        assert_eq!(snapshot, None);
        assert_eq!(peer_count, 1);
    }

    #[test]
    fn test_join_after_publish_returns_snapshot() {
        let state = AppState::new(CACHE_TTL);
        let (_rx_a, _, _) = state.join_room("doc", "a");
        state.update_cache("doc", "u1".to_string());

        let (_rx_b, snapshot, peer_count) = state.join_room("doc", "b");
        assert_eq!(snapshot.as_deref(), Some("u1"));
        assert_eq!(peer_count, 2);
    }

    #[test]
    fn test_last_publish_wins() {
        let state = AppState::new(CACHE_TTL);
        let (_rx_a, _, _) = state.join_room("doc", "a");
        state.update_cache("doc", "u1".to_string());
        state.update_cache("doc", "u2".to_string());

        let (_rx_b, snapshot, _) = state.join_room("doc", "b");
        assert_eq!(snapshot.as_deref(), Some("u2"));
    }

    #[test]
    fn test_leave_keeps_cache_for_remaining_members() {
        let state = AppState::new(CACHE_TTL);
        let (_rx_a, _, _) = state.join_room("doc", "a");
        let (_rx_b, _, _) = state.join_room("doc", "b");
        state.update_cache("doc", "u1".to_string());

        state.leave_room("doc", "a");
        let (_rx_c, snapshot, _) = state.join_room("doc", "c");
        assert_eq!(snapshot.as_deref(), Some("u1"));
    }

    #[test]
    fn test_abandoned_room_survives_until_ttl() {
        let state = AppState::new(CACHE_TTL);
        let (_rx_a, _, _) = state.join_room("doc", "a");
        state.update_cache("doc", "u1".to_string());
        state.leave_room("doc", "a");

        // Cache still live: a rejoin picks the snapshot back up.
        let (_rx_b, snapshot, _) = state.join_room("doc", "b");
        assert_eq!(snapshot.as_deref(), Some("u1"));
    }

    #[test]
    fn test_expired_cache_is_a_miss() {
        let state = AppState::new(Duration::from_millis(1));
        let (_rx_a, _, _) = state.join_room("doc", "a");
        state.update_cache("doc", "u1".to_string());
        std::thread::sleep(Duration::from_millis(5));

        let (_rx_b, snapshot, _) = state.join_room("doc", "b");
        assert_eq!(snapshot, None);
    }

    #[test]
    fn test_publish_refreshes_ttl() {
        let state = AppState::new(Duration::from_millis(50));
        let (_rx_a, _, _) = state.join_room("doc", "a");
        state.update_cache("doc", "u1".to_string());
        std::thread::sleep(Duration::from_millis(30));
        state.update_cache("doc", "u2".to_string());
        std::thread::sleep(Duration::from_millis(30));

        // 60ms after u1 but only 30ms after u2: still fresh.
        let (_rx_b, snapshot, _) = state.join_room("doc", "b");
        assert_eq!(snapshot.as_deref(), Some("u2"));
    }

    #[test]
    fn test_sweep_reaps_expired_abandoned_rooms() {
        let state = AppState::new(Duration::from_millis(1));
        let (_rx_a, _, _) = state.join_room("doc", "a");
        state.update_cache("doc", "u1".to_string());
        state.leave_room("doc", "a");
        assert_eq!(state.rooms.len(), 1);

        std::thread::sleep(Duration::from_millis(5));
        state.sweep();
        assert_eq!(state.rooms.len(), 0);
    }

    #[test]
    fn test_sweep_keeps_occupied_rooms() {
        let state = AppState::new(Duration::from_millis(1));
        let (_rx_a, _, _) = state.join_room("doc", "a");
        state.update_cache("doc", "u1".to_string());
        std::thread::sleep(Duration::from_millis(5));

        state.sweep();
        // Member still present: the room stays, only the entry expired.
        assert_eq!(state.rooms.len(), 1);
        let (_rx_b, snapshot, _) = state.join_room("doc", "b");
        assert_eq!(snapshot, None);
    }

    #[tokio::test]
    async fn test_broadcast_skips_sender() {
        let state = AppState::new(CACHE_TTL);
        let (mut rx_a, _, _) = state.join_room("doc", "a");
        let (mut rx_b, _, _) = state.join_room("doc", "b");

        state.broadcast(
            "doc",
            "a",
            ServerMessage::DocumentUpdate {
                document: "doc".to_string(),
                snapshot: "u1".to_string(),
            },
        );

        // Both receivers get the frame; the socket loop drops the one
        // whose peer id matches the sender.
        let (from_a, _) = rx_a.recv().await.unwrap();
        let (from_b, msg) = rx_b.recv().await.unwrap();
        assert_eq!(from_a, "a");
        assert_eq!(from_b, "a");
        assert!(matches!(msg, ServerMessage::DocumentUpdate { .. }));
    }
}
