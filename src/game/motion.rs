//! Paddle Motion
//!
//! Applies a requested vertical paddle position, clamped to the playfield.
//! Pure value-in value-out; persistence belongs to the caller.

use crate::game::state::Player;
use crate::PLAYFIELD_HEIGHT;

/// Lowest allowed paddle center position.
pub const PADDLE_Y_MIN: i32 = 0;

/// Highest allowed paddle center position.
pub const PADDLE_Y_MAX: i32 = PLAYFIELD_HEIGHT as i32;

/// Move `player`'s paddle toward `target_y`, clamped to the playfield's
/// vertical bounds.
pub fn move_to(player: &mut Player, target_y: i32) {
    player.y = target_y.clamp(PADDLE_Y_MIN, PADDLE_Y_MAX);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{PlayerKey, Team};
    use proptest::prelude::*;

    fn test_player() -> Player {
        Player {
            key: PlayerKey::new("g1", "p1"),
            team: Team::Left,
            token: "tok".to_string(),
            y: 375,
            ready_to_start: false,
        }
    }

    #[test]
    fn test_move_within_bounds() {
        let mut player = test_player();
        move_to(&mut player, 200);
        assert_eq!(player.y, 200);
    }

    #[test]
    fn test_move_below_playfield_clamps_to_zero() {
        let mut player = test_player();
        move_to(&mut player, -50);
        assert_eq!(player.y, 0);
    }

    #[test]
    fn test_move_above_playfield_clamps_to_height() {
        let mut player = test_player();
        move_to(&mut player, 10_000);
        assert_eq!(player.y, PADDLE_Y_MAX);
    }

    proptest! {
        #[test]
        fn prop_moved_paddle_always_in_bounds(target in i32::MIN..i32::MAX) {
            let mut player = test_player();
            move_to(&mut player, target);
            prop_assert!(player.y >= PADDLE_Y_MIN);
            prop_assert!(player.y <= PADDLE_Y_MAX);
        }
    }
}
