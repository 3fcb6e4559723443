//! Outbound Broadcast Contract
//!
//! Destinations and payloads the coordinator publishes, independent of the
//! transport that delivers them. Topic strings follow a STOMP-style
//! `/topic/game.{room}` layout.

use serde::{Deserialize, Serialize};

use crate::game::ball::BallAnimation;
use crate::game::state::{Player, RoomState, Team, TeamsScore};
use crate::session::SessionError;

// =============================================================================
// DESTINATIONS
// =============================================================================

/// Where an outbound payload is delivered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Destination {
    /// Room-wide score + ball snapshot channel.
    Room(String),
    /// Room-wide player roster channel.
    Roster(String),
    /// Room-wide ball trajectory channel.
    Ball(String),
    /// Per-player unicast channel, keyed by the player's token.
    Messages {
        /// Addressed room.
        room_id: String,
        /// Token whose owner should receive the payload.
        token: String,
    },
}

impl Destination {
    /// Topic string used by the transport layer.
    pub fn topic(&self) -> String {
        match self {
            Destination::Room(room_id) => format!("/topic/game.{room_id}"),
            Destination::Roster(room_id) => format!("/topic/game.{room_id}.players"),
            Destination::Ball(room_id) => format!("/topic/game.{room_id}.ball"),
            Destination::Messages { room_id, token } => {
                format!("/topic/game.{room_id}.messages.{token}")
            }
        }
    }
}

// =============================================================================
// PAYLOADS
// =============================================================================

/// Player snapshot as published to clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDto {
    /// Composite wire identifier (`player@room`).
    pub id: String,
    /// Assigned side.
    pub team: Team,
    /// Vertical paddle center position.
    pub y: i32,
    /// Ready-to-start flag.
    pub ready_to_start: bool,
}

impl PlayerDto {
    /// Build the wire snapshot of a player record.
    pub fn from_player(player: &Player) -> Self {
        Self {
            id: player.key.wire_id(),
            team: player.team,
            y: player.y,
            ready_to_start: player.ready_to_start,
        }
    }
}

/// Score + ball snapshot of a room.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    /// Goal counters.
    pub teams_score: TeamsScore,
    /// Current ball trajectory segment.
    pub ball_animation: BallAnimation,
}

impl RoomSnapshot {
    /// Snapshot of a room record.
    pub fn from_room(room: &RoomState) -> Self {
        Self {
            teams_score: room.teams_score,
            ball_animation: room.ball_animation,
        }
    }
}

/// Severity of a [`Notice`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NoticeType {
    /// Informational event.
    Info,
    /// Recoverable error addressed to one client.
    Error,
}

/// Status codes carried by notices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoticeCode {
    /// Addressed room does not exist.
    GameNotFound,
    /// Registration id is already taken.
    PlayerIdAlreadyUsed,
    /// Supplied token does not match the issued one.
    InvalidPlayerToken,
    /// Addressed player does not exist.
    PlayerNotFound,
    /// Somebody joined the room.
    NewPlayer,
    /// The match (re)started.
    StartGame,
    /// Controls reminder shown at match start.
    GameControls,
    /// Recipient's team currently leads.
    Winning,
    /// Recipient's team currently trails.
    Losing,
    /// A goal was scored.
    PointScored,
}

/// Status message sent to clients: `{type, code}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Severity.
    #[serde(rename = "type")]
    pub notice_type: NoticeType,
    /// What happened.
    pub code: NoticeCode,
}

impl Notice {
    /// An INFO notice.
    pub fn info(code: NoticeCode) -> Self {
        Self {
            notice_type: NoticeType::Info,
            code,
        }
    }

    /// An ERROR notice.
    pub fn error(code: NoticeCode) -> Self {
        Self {
            notice_type: NoticeType::Error,
            code,
        }
    }

    /// The ERROR notice reporting a session error to its requester.
    pub fn for_error(err: &SessionError) -> Self {
        let code = match err {
            SessionError::GameNotFound(_) => NoticeCode::GameNotFound,
            SessionError::PlayerNotFound(_) => NoticeCode::PlayerNotFound,
            SessionError::InvalidToken => NoticeCode::InvalidPlayerToken,
            SessionError::PlayerIdAlreadyUsed(_) => NoticeCode::PlayerIdAlreadyUsed,
        };
        Self::error(code)
    }
}

/// Any payload the coordinator can publish. Serialized untagged: each topic
/// carries its bare payload, with no envelope of its own.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outbound {
    /// Score + ball snapshot, for the room channel.
    Room(RoomSnapshot),
    /// Player snapshot, for the roster channel.
    Player(PlayerDto),
    /// Ball trajectory segment, for the ball channel.
    Ball(BallAnimation),
    /// Status message, for a unicast channel.
    Notice(Notice),
}

// =============================================================================
// BROADCASTER SEAM
// =============================================================================

/// Fan-out collaborator. Fire-and-forget from the coordinator's point of
/// view: delivery guarantees belong to the implementation.
pub trait Broadcaster: Send + Sync + 'static {
    /// Deliver `payload` to every subscriber of `destination`.
    fn publish(&self, destination: Destination, payload: Outbound);
}
