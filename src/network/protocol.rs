//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket. All frames
//! are JSON. Request and payload bodies use camelCase field names; frame
//! tags are snake_case.

use serde::{Deserialize, Serialize};

use crate::game::ball::BallAnimation;
use crate::game::state::TeamsScore;
use crate::session::broadcast::{Notice, Outbound, PlayerDto};
use crate::session::coordinator::{RegisterView, WatchView};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to a room as a spectator.
    Watch(WatchRequest),

    /// Register in (or reattach to) a room.
    Register(RegisterRequest),

    /// Vote to start the match.
    Start(StartRequest),

    /// Move the paddle.
    Move(MoveRequest),

    /// The client finished animating the current ball segment.
    AnimationEnd(AnimationEndRequest),
}

/// Spectate request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchRequest {
    /// Addressed room.
    pub game_id: String,
}

/// Registration request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Addressed room.
    pub game_id: String,
    /// Client-chosen player identifier.
    pub player_id: String,
    /// Token from an earlier registration, when reconnecting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Team choice (case-insensitive `"left"`, anything else is RIGHT).
    pub team: String,
}

/// Start vote request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    /// Addressed room.
    pub game_id: String,
    /// Acting player.
    pub player_id: String,
    /// Acting player's token.
    pub token: String,
}

/// Paddle move request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    /// Addressed room.
    pub game_id: String,
    /// Acting player.
    pub player_id: String,
    /// Acting player's token.
    pub token: String,
    /// Requested vertical paddle position.
    pub y: i32,
}

/// Segment-ended report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationEndRequest {
    /// Addressed room.
    pub game_id: String,
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client. Serialize-only: the server never
/// parses its own frames.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Fan-out delivery from a subscribed topic.
    Topic(TopicFrame),

    /// Direct reply to a watch request.
    Watch(WatchReply),

    /// Direct reply to a register request.
    Register(RegisterReply),

    /// Direct status notice outside any subscription (e.g. an animation
    /// report for an unknown room).
    Notice(Notice),
}

/// One payload delivered from a subscribed topic.
#[derive(Debug, Clone, Serialize)]
pub struct TopicFrame {
    /// Topic the payload was published to.
    pub destination: String,
    /// The published payload.
    pub body: Outbound,
}

/// Reply to a watch request, mirroring the original watch message shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchReply {
    /// Goal counters, absent on error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teams_score: Option<TeamsScore>,
    /// Ball segment, absent on error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ball_animation: Option<BallAnimation>,
    /// Roster (empty on error).
    pub players: Vec<PlayerDto>,
    /// Error notice, when the room was not found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Notice>,
}

impl WatchReply {
    /// Successful watch reply.
    pub fn from_view(view: WatchView) -> Self {
        Self {
            teams_score: Some(view.teams_score),
            ball_animation: Some(view.ball_animation),
            players: view.players,
            message: None,
        }
    }

    /// Watch reply carrying only an error notice.
    pub fn error(notice: Notice) -> Self {
        Self {
            teams_score: None,
            ball_animation: None,
            players: Vec::new(),
            message: Some(notice),
        }
    }
}

/// Reply to a register request: watch shape plus the issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterReply {
    /// Goal counters, absent on error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teams_score: Option<TeamsScore>,
    /// Ball segment, absent on error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ball_animation: Option<BallAnimation>,
    /// The acting player's token, absent on error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Roster (empty on error).
    pub players: Vec<PlayerDto>,
    /// Error notice, when registration was rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Notice>,
}

impl RegisterReply {
    /// Successful register reply.
    pub fn from_view(view: RegisterView) -> Self {
        Self {
            teams_score: Some(view.teams_score),
            ball_animation: Some(view.ball_animation),
            token: Some(view.token),
            players: view.players,
            message: None,
        }
    }

    /// Register reply carrying only an error notice.
    pub fn error(notice: Notice) -> Self {
        Self {
            teams_score: None,
            ball_animation: None,
            token: None,
            players: Vec::new(),
            message: Some(notice),
        }
    }
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::broadcast::NoticeCode;

    #[test]
    fn test_register_request_wire_shape() {
        let json = r#"{"type":"register","gameId":"g1","playerId":"p1","team":"left"}"#;
        let msg = ClientMessage::from_json(json).unwrap();
        match msg {
            ClientMessage::Register(req) => {
                assert_eq!(req.game_id, "g1");
                assert_eq!(req.player_id, "p1");
                assert!(req.token.is_none());
                assert_eq!(req.team, "left");
            }
            other => panic!("wrong message type: {other:?}"),
        }
    }

    #[test]
    fn test_move_request_roundtrip() {
        let msg = ClientMessage::Move(MoveRequest {
            game_id: "g1".into(),
            player_id: "p1".into(),
            token: "t1".into(),
            y: 420,
        });
        let json = msg.to_json().unwrap();
        assert!(json.contains(r#""type":"move""#));
        assert!(json.contains(r#""playerId":"p1""#));

        match ClientMessage::from_json(&json).unwrap() {
            ClientMessage::Move(req) => assert_eq!(req.y, 420),
            other => panic!("wrong message type: {other:?}"),
        }
    }

    #[test]
    fn test_watch_error_reply_shape() {
        let reply = WatchReply::error(Notice::error(NoticeCode::GameNotFound));
        let json = serde_json::to_string(&reply).unwrap();
        assert!(json.contains(r#""code":"GAME_NOT_FOUND""#));
        assert!(!json.contains("teamsScore"));
        assert!(json.contains(r#""players":[]"#));
    }

    #[test]
    fn test_topic_frame_carries_bare_payload() {
        let frame = ServerMessage::Topic(TopicFrame {
            destination: "/topic/game.g1.ball".into(),
            body: Outbound::Ball(crate::game::ball::BallAnimation::lobby()),
        });
        let json = frame.to_json().unwrap();
        assert!(json.contains(r#""destination":"/topic/game.g1.ball""#));
        assert!(json.contains(r#""startX""#));
    }
}
