//! # Paddle Rally Session Server
//!
//! Authoritative session engine for a real-time, two-team paddle-and-ball
//! game played by multiple networked clients per game room.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   PADDLE RALLY SERVER                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  game/           - Room and match rules                      │
//! │  ├── state.rs    - Room, player and score records            │
//! │  ├── ball.rs     - Trajectory segments and bounce math       │
//! │  ├── roster.rs   - Registration and token reattach           │
//! │  ├── motion.rs   - Paddle movement clamping                  │
//! │  └── referee.rs  - Start gating and goal detection           │
//! │                                                              │
//! │  session/        - Room-scoped orchestration                 │
//! │  ├── coordinator.rs - Action handling, persistence, fan-out  │
//! │  ├── broadcast.rs   - Outbound destinations and payloads     │
//! │  └── locks.rs       - Per-room mutual exclusion              │
//! │                                                              │
//! │  store/          - Room/player record repository             │
//! │  ├── mod.rs      - Repository trait                          │
//! │  └── memory.rs   - In-memory key-value store                 │
//! │                                                              │
//! │  network/        - Transport (non-authoritative)             │
//! │  ├── server.rs   - WebSocket server                          │
//! │  ├── protocol.rs - Wire message types                        │
//! │  └── topics.rs   - Topic registry and fan-out                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Authority Model
//!
//! All game state lives in the repository and is mutated only by the
//! [`SessionCoordinator`], one room at a time under a per-room lock.
//! Clients animate the ball locally from trajectory segments handed out by
//! the server and report back when a segment ends; the server alone decides
//! bounces and goals.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod game;
pub mod network;
pub mod session;
pub mod store;

// Re-export commonly used types
pub use game::ball::BallAnimation;
pub use game::state::{Player, PlayerKey, RoomState, Team, TeamsScore};
pub use session::coordinator::SessionCoordinator;
pub use session::SessionError;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Playfield width in game units.
pub const PLAYFIELD_WIDTH: f64 = 1000.0;

/// Playfield height in game units.
pub const PLAYFIELD_HEIGHT: f64 = 750.0;

/// Ball radius in game units.
pub const BALL_RADIUS: f64 = 10.0;

/// Ball speed in game units per second.
pub const BALL_SPEED: f64 = PLAYFIELD_WIDTH / 2.0;

/// Paddle height in game units.
pub const PADDLE_HEIGHT: f64 = 100.0;

/// Horizontal position of the LEFT team's paddle column.
pub const LEFT_TEAM_X: f64 = PLAYFIELD_WIDTH / 20.0;

/// Horizontal position of the RIGHT team's paddle column.
pub const RIGHT_TEAM_X: f64 = PLAYFIELD_WIDTH - LEFT_TEAM_X;
