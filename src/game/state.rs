//! Room and Player Records
//!
//! The authoritative state of one game room: score, ball trajectory,
//! playing flag, and the roster of registered players. Records are plain
//! values; they are loaded from and written back to the repository by the
//! session coordinator.

use serde::{Deserialize, Serialize};

use crate::game::ball::BallAnimation;

// =============================================================================
// TEAM
// =============================================================================

/// Side of the playfield a player defends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Team {
    /// Defends the left goal line.
    Left,
    /// Defends the right goal line.
    Right,
}

impl Team {
    /// Team choice rule for registration: a case-insensitive `"left"`
    /// selects LEFT, anything else is RIGHT.
    pub fn from_choice(choice: &str) -> Self {
        if choice.eq_ignore_ascii_case("left") {
            Team::Left
        } else {
            Team::Right
        }
    }

    /// The opposing team.
    pub fn opponent(self) -> Self {
        match self {
            Team::Left => Team::Right,
            Team::Right => Team::Left,
        }
    }
}

// =============================================================================
// PLAYER
// =============================================================================

/// Composite player identifier, unique within the store.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerKey {
    /// Room the player registered in.
    pub room_id: String,
    /// Client-chosen player identifier, unique per room.
    pub player_id: String,
}

impl PlayerKey {
    /// Create a key from its parts.
    pub fn new(room_id: impl Into<String>, player_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            player_id: player_id.into(),
        }
    }

    /// Composite wire identifier, e.g. `"p1@g1"`.
    pub fn wire_id(&self) -> String {
        format!("{}@{}", self.player_id, self.room_id)
    }
}

/// One registered player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Identity within the room.
    pub key: PlayerKey,
    /// Side assigned at registration; immutable afterwards.
    pub team: Team,
    /// Opaque bearer secret proving identity across reconnects.
    pub token: String,
    /// Vertical paddle center position.
    pub y: i32,
    /// Whether this player has voted to start the next rally.
    pub ready_to_start: bool,
}

// =============================================================================
// SCORE
// =============================================================================

/// Per-team goal counters. Monotonically non-decreasing; never reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamsScore {
    /// Goals scored by the LEFT team.
    pub left_team_score: u32,
    /// Goals scored by the RIGHT team.
    pub right_team_score: u32,
}

impl TeamsScore {
    /// Credit one goal to `team`.
    pub fn record_goal(&mut self, team: Team) {
        match team {
            Team::Left => self.left_team_score += 1,
            Team::Right => self.right_team_score += 1,
        }
    }

    /// The team currently ahead, or `None` on a tie.
    pub fn leader(&self) -> Option<Team> {
        match self.left_team_score.cmp(&self.right_team_score) {
            std::cmp::Ordering::Greater => Some(Team::Left),
            std::cmp::Ordering::Less => Some(Team::Right),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Total points played, used to alternate the serve side.
    pub fn total(&self) -> u32 {
        self.left_team_score + self.right_team_score
    }
}

// =============================================================================
// ROOM
// =============================================================================

/// Authoritative state of one room. Created on the first registration to
/// an unknown room id; never destroyed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoomState {
    /// Room identifier.
    pub id: String,
    /// Goal counters.
    pub teams_score: TeamsScore,
    /// Current ball trajectory segment (or an idle rest segment).
    pub ball_animation: BallAnimation,
    /// True once a match has been started in this room.
    pub playing: bool,
}

impl RoomState {
    /// A fresh lobby room: zero score, resting ball, not playing.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            teams_score: TeamsScore::default(),
            ball_animation: BallAnimation::lobby(),
            playing: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_choice_rule() {
        assert_eq!(Team::from_choice("left"), Team::Left);
        assert_eq!(Team::from_choice("LEFT"), Team::Left);
        assert_eq!(Team::from_choice("LeFt"), Team::Left);
        assert_eq!(Team::from_choice("right"), Team::Right);
        assert_eq!(Team::from_choice("center"), Team::Right);
        assert_eq!(Team::from_choice(""), Team::Right);
    }

    #[test]
    fn test_wire_id_combines_player_and_room() {
        let key = PlayerKey::new("g1", "p1");
        assert_eq!(key.wire_id(), "p1@g1");
    }

    #[test]
    fn test_score_leader() {
        let mut score = TeamsScore::default();
        assert_eq!(score.leader(), None);

        score.record_goal(Team::Left);
        assert_eq!(score.leader(), Some(Team::Left));

        score.record_goal(Team::Right);
        score.record_goal(Team::Right);
        assert_eq!(score.leader(), Some(Team::Right));
        assert_eq!(score.total(), 3);
    }

    #[test]
    fn test_new_room_is_idle() {
        let room = RoomState::new("g1");
        assert!(!room.playing);
        assert_eq!(room.teams_score.total(), 0);
        assert!(room.ball_animation.is_rest());
    }
}
