//! Player Registration and Reattach
//!
//! Creates new players with freshly issued tokens, and re-authenticates
//! returning players by verbatim token comparison. The roster never touches
//! the store directly: it is handed the current record (if any) and returns
//! the decision; the coordinator persists.

use uuid::Uuid;

use crate::game::state::{Player, PlayerKey, Team};
use crate::session::SessionError;
use crate::PLAYFIELD_HEIGHT;

/// Paddle spawn position: vertically centered.
pub const SPAWN_Y: i32 = PLAYFIELD_HEIGHT as i32 / 2;

/// Create a new player for `key`.
///
/// Fails with [`SessionError::PlayerIdAlreadyUsed`] when a record already
/// exists for the key. The new player gets a fresh uuid-v4 token, the team
/// chosen by the case-insensitive `"left"`-else-RIGHT rule, a centered
/// paddle, and is not ready to start.
pub fn register(
    key: PlayerKey,
    team_choice: &str,
    existing: Option<&Player>,
) -> Result<Player, SessionError> {
    if existing.is_some() {
        return Err(SessionError::PlayerIdAlreadyUsed(key.wire_id()));
    }

    Ok(Player {
        key,
        team: Team::from_choice(team_choice),
        token: Uuid::new_v4().to_string(),
        y: SPAWN_Y,
        ready_to_start: false,
    })
}

/// Re-authenticate a returning player.
///
/// Fails with [`SessionError::PlayerNotFound`] when no record exists, and
/// with [`SessionError::InvalidToken`] when the supplied token differs from
/// the issued one.
pub fn reattach(
    key: &PlayerKey,
    token: &str,
    existing: Option<Player>,
) -> Result<Player, SessionError> {
    let player = existing.ok_or_else(|| SessionError::PlayerNotFound(key.wire_id()))?;
    if player.token != token {
        return Err(SessionError::InvalidToken);
    }
    Ok(player)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_issues_fresh_token() {
        let p1 = register(PlayerKey::new("g1", "p1"), "left", None).unwrap();
        let p2 = register(PlayerKey::new("g1", "p2"), "right", None).unwrap();

        assert_eq!(p1.team, Team::Left);
        assert_eq!(p2.team, Team::Right);
        assert_ne!(p1.token, p2.token);
        assert_eq!(p1.y, SPAWN_Y);
        assert!(!p1.ready_to_start);
    }

    #[test]
    fn test_register_rejects_used_id() {
        let existing = register(PlayerKey::new("g1", "p1"), "left", None).unwrap();
        let result = register(PlayerKey::new("g1", "p1"), "left", Some(&existing));
        assert!(matches!(result, Err(SessionError::PlayerIdAlreadyUsed(_))));
    }

    #[test]
    fn test_reattach_with_issued_token() {
        let player = register(PlayerKey::new("g1", "p1"), "left", None).unwrap();
        let token = player.token.clone();

        let reattached = reattach(&player.key.clone(), &token, Some(player)).unwrap();
        assert_eq!(reattached.token, token);
    }

    #[test]
    fn test_reattach_rejects_wrong_token() {
        let player = register(PlayerKey::new("g1", "p1"), "left", None).unwrap();
        let result = reattach(&player.key.clone(), "not-the-token", Some(player));
        assert!(matches!(result, Err(SessionError::InvalidToken)));
    }

    #[test]
    fn test_reattach_rejects_unknown_player() {
        let key = PlayerKey::new("g1", "ghost");
        let result = reattach(&key, "any-token", None);
        assert!(matches!(result, Err(SessionError::PlayerNotFound(_))));
    }
}
