//! Paddle Rally Server
//!
//! Authoritative session server for the Paddle Rally two-team paddle game.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use paddle_rally::network::server::{GameServer, ServerConfig};
use paddle_rally::network::topics::TopicBroadcaster;
use paddle_rally::session::coordinator::SessionCoordinator;
use paddle_rally::store::MemoryStore;
use paddle_rally::VERSION;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Paddle Rally Server v{}", VERSION);

    let config = ServerConfig::from_env();
    let store = Arc::new(MemoryStore::new());
    let topics = Arc::new(TopicBroadcaster::new());
    let coordinator = Arc::new(SessionCoordinator::new(store, topics.clone()));
    let server = GameServer::new(config, coordinator, topics);

    tokio::select! {
        result = server.run() => {
            result.context("server terminated")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
            server.shutdown();
        }
    }

    Ok(())
}
