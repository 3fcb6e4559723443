//! WebSocket Game Server
//!
//! Accepts client connections, parses inbound JSON frames into coordinator
//! actions, and forwards topic publications to subscribers. Watching or
//! registering implicitly subscribes the connection to the room's topics.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::network::protocol::{
    ClientMessage, RegisterReply, RegisterRequest, ServerMessage, WatchReply,
};
use crate::network::topics::TopicBroadcaster;
use crate::session::broadcast::{Destination, Notice};
use crate::session::coordinator::SessionCoordinator;
use crate::session::SessionError;
use crate::store::MemoryStore;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            max_connections: 1000,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables, falling back to defaults
    /// on missing or unparsable values.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let bind_addr = std::env::var("PADDLE_RALLY_BIND")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.bind_addr);
        let max_connections = std::env::var("PADDLE_RALLY_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_connections);
        Self {
            bind_addr,
            max_connections,
            version: defaults.version,
        }
    }
}

/// Transport errors.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to bind to the configured address.
    #[error("failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),
}

/// Per-connection subscription state: one forwarder task per topic.
struct Subscriptions {
    topics: BTreeSet<String>,
    forwarders: Vec<JoinHandle<()>>,
}

impl Subscriptions {
    fn new() -> Self {
        Self {
            topics: BTreeSet::new(),
            forwarders: Vec::new(),
        }
    }

    /// Subscribe the connection to `topic`; duplicate subscriptions are
    /// no-ops.
    fn subscribe(&mut self, broadcaster: &TopicBroadcaster, topic: String, tx: mpsc::Sender<String>) {
        if !self.topics.insert(topic.clone()) {
            return;
        }
        let mut rx = broadcaster.subscribe(&topic);
        self.forwarders.push(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(frame) => {
                        if tx.send(frame).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(topic, skipped, "slow subscriber dropped frames");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));
    }

    /// Subscribe to the three room-wide channels of `game_id`.
    fn subscribe_room(
        &mut self,
        broadcaster: &TopicBroadcaster,
        game_id: &str,
        tx: &mpsc::Sender<String>,
    ) {
        for destination in [
            Destination::Room(game_id.to_owned()),
            Destination::Roster(game_id.to_owned()),
            Destination::Ball(game_id.to_owned()),
        ] {
            self.subscribe(broadcaster, destination.topic(), tx.clone());
        }
    }

    fn abort_all(self) {
        for handle in self.forwarders {
            handle.abort();
        }
    }
}

/// The game server.
pub struct GameServer {
    config: ServerConfig,
    coordinator: Arc<SessionCoordinator<MemoryStore, TopicBroadcaster>>,
    topics: Arc<TopicBroadcaster>,
    clients: Arc<RwLock<BTreeMap<SocketAddr, Instant>>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new game server.
    pub fn new(
        config: ServerConfig,
        coordinator: Arc<SessionCoordinator<MemoryStore, TopicBroadcaster>>,
        topics: Arc<TopicBroadcaster>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            coordinator,
            topics,
            clients: Arc::new(RwLock::new(BTreeMap::new())),
            shutdown_tx,
        }
    }

    /// Run the accept loop until shutdown.
    pub async fn run(&self) -> Result<(), TransportError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!("game server v{} listening on {}", self.config.version, self.config.bind_addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let client_count = self.clients.read().await.len();
                            if client_count >= self.config.max_connections {
                                warn!("connection limit reached, rejecting {addr}");
                                continue;
                            }
                            debug!("new connection from {addr}");
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("accept error: {e}");
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handle a new WebSocket connection on its own task.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let coordinator = self.coordinator.clone();
        let topics = self.topics.clone();
        let clients = self.clients.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("websocket handshake failed for {addr}: {e}");
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<String>(64);

            clients.write().await.insert(addr, Instant::now());

            // Drain outbound frames onto the socket.
            let sender_task = tokio::spawn(async move {
                while let Some(text) = msg_rx.recv().await {
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
            });

            let mut subscriptions = Subscriptions::new();

            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                let client_msg = match ClientMessage::from_json(&text) {
                                    Ok(m) => m,
                                    Err(e) => {
                                        debug!("invalid message from {addr}: {e}");
                                        continue;
                                    }
                                };
                                Self::handle_client_message(
                                    client_msg,
                                    &coordinator,
                                    &topics,
                                    &mut subscriptions,
                                    &msg_tx,
                                ).await;
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("client {addr} disconnected");
                                break;
                            }
                            Some(Err(e)) => {
                                debug!("websocket error for {addr}: {e}");
                                break;
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }

            // Cleanup
            subscriptions.abort_all();
            sender_task.abort();
            clients.write().await.remove(&addr);
            debug!("client {addr} cleaned up");
        });
    }

    /// Dispatch one parsed client message.
    async fn handle_client_message(
        msg: ClientMessage,
        coordinator: &SessionCoordinator<MemoryStore, TopicBroadcaster>,
        topics: &TopicBroadcaster,
        subscriptions: &mut Subscriptions,
        tx: &mpsc::Sender<String>,
    ) {
        match msg {
            ClientMessage::Watch(req) => {
                subscriptions.subscribe_room(topics, &req.game_id, tx);
                let reply = match coordinator.watch(&req.game_id).await {
                    Ok(view) => WatchReply::from_view(view),
                    Err(err) => WatchReply::error(Notice::for_error(&err)),
                };
                Self::send(tx, ServerMessage::Watch(reply)).await;
            }
            ClientMessage::Register(req) => {
                Self::handle_register(req, coordinator, topics, subscriptions, tx).await;
            }
            ClientMessage::Start(req) => {
                // Outcome reaches the client through its subscriptions:
                // the room snapshot on the room topic, errors on the
                // token's message topic.
                if let Err(err) = coordinator
                    .start_vote(&req.game_id, &req.player_id, &req.token)
                    .await
                {
                    debug!(game_id = %req.game_id, "start vote rejected: {err}");
                }
            }
            ClientMessage::Move(req) => {
                if let Err(err) = coordinator
                    .move_player(&req.game_id, &req.player_id, &req.token, req.y)
                    .await
                {
                    debug!(game_id = %req.game_id, "move rejected: {err}");
                }
            }
            ClientMessage::AnimationEnd(req) => {
                match coordinator.tick_animation(&req.game_id).await {
                    // New segments reach subscribers on the ball topic;
                    // a silent tick needs no reply at all.
                    Ok(_) => {}
                    Err(err) => {
                        // No token on this action, so the coordinator
                        // cannot unicast; notify the requester directly.
                        Self::send(tx, ServerMessage::Notice(Notice::for_error(&err))).await;
                    }
                }
            }
        }
    }

    async fn handle_register(
        req: RegisterRequest,
        coordinator: &SessionCoordinator<MemoryStore, TopicBroadcaster>,
        topics: &TopicBroadcaster,
        subscriptions: &mut Subscriptions,
        tx: &mpsc::Sender<String>,
    ) {
        subscriptions.subscribe_room(topics, &req.game_id, tx);
        // Reconnecting clients subscribe to their message channel first so
        // reattach failures reach them.
        if let Some(token) = &req.token {
            let destination = Destination::Messages {
                room_id: req.game_id.clone(),
                token: token.clone(),
            };
            subscriptions.subscribe(topics, destination.topic(), tx.clone());
        }

        match coordinator
            .register_player(&req.game_id, &req.player_id, req.token.as_deref(), &req.team)
            .await
        {
            Ok(view) => {
                let destination = Destination::Messages {
                    room_id: req.game_id.clone(),
                    token: view.token.clone(),
                };
                subscriptions.subscribe(topics, destination.topic(), tx.clone());
                Self::send(tx, ServerMessage::Register(RegisterReply::from_view(view))).await;
            }
            Err(err @ SessionError::PlayerIdAlreadyUsed(_)) => {
                Self::send(
                    tx,
                    ServerMessage::Register(RegisterReply::error(Notice::for_error(&err))),
                )
                .await;
            }
            Err(err) => {
                // Reattach failure; the notice already went out on the
                // supplied token's message topic subscribed above.
                debug!(game_id = %req.game_id, "register rejected: {err}");
            }
        }
    }

    async fn send(tx: &mpsc::Sender<String>, message: ServerMessage) {
        match message.to_json() {
            Ok(text) => {
                let _ = tx.send(text).await;
            }
            Err(e) => error!("failed to serialize reply: {e}"),
        }
    }

    /// Signal the accept loop and all connections to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub async fn connection_count(&self) -> usize {
        self.clients.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.max_connections, 1000);
    }

    #[tokio::test]
    async fn test_server_creation_and_shutdown() {
        let store = Arc::new(MemoryStore::new());
        let topics = Arc::new(TopicBroadcaster::new());
        let coordinator = Arc::new(SessionCoordinator::new(store, topics.clone()));
        let server = GameServer::new(ServerConfig::default(), coordinator, topics);

        assert_eq!(server.connection_count().await, 0);
        server.shutdown();
        // Should not panic
    }
}
