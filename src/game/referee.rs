//! Match Flow Referee
//!
//! Decides when a room may start playing and what the end of a ball
//! trajectory segment means: another segment, or a goal. Operations here
//! never fail for normal game flow; they return tagged results so the
//! coordinator can decide what to persist and broadcast. Room-not-found and
//! player-not-found are coordinator-level errors, not referee errors.

use crate::game::ball::{
    segment_from, BallAnimation, BALL_Y_MAX, BALL_Y_MIN, BOUNDARY_EPSILON, GOAL_LEFT_X,
    GOAL_RIGHT_X,
};
use crate::game::state::{Player, RoomState, Team};
use crate::{BALL_RADIUS, LEFT_TEAM_X, PADDLE_HEIGHT, RIGHT_TEAM_X};

/// Outcome of advancing the ball past the end of its current segment.
///
/// Tagged so the coordinator's dispatch is exhaustive: each variant carries
/// exactly the data its persistence/broadcast path needs.
#[derive(Clone, Debug, PartialEq)]
pub enum AnimationAdvance {
    /// Nothing visible changed; nothing to persist or broadcast.
    None,
    /// The ball moved on to its next segment without a goal.
    Next(BallAnimation),
    /// The ended segment crossed a goal line undefended.
    Score {
        /// The goal-freeze segment now installed in the room.
        animation: BallAnimation,
        /// The team credited with the goal.
        scoring_team: Team,
    },
}

/// A room may start iff every registered player is ready and both teams
/// have at least one player. Short-circuits on the first non-ready player.
pub fn can_start(players: &[Player]) -> bool {
    let mut left = false;
    let mut right = false;
    for player in players {
        if !player.ready_to_start {
            return false;
        }
        match player.team {
            Team::Left => left = true,
            Team::Right => right = true,
        }
    }
    left && right
}

/// Try to start (or restart) the match in `room`.
///
/// When the roster gates pass, the room is marked playing and a serve
/// segment is installed; returns `true`. Otherwise the ball is forced back
/// to the lobby rest segment, `playing` keeps its prior value, and the
/// function returns `false`.
pub fn start(room: &mut RoomState, players: &[Player]) -> bool {
    if can_start(players) {
        room.playing = true;
        room.ball_animation = BallAnimation::serve(&room.teams_score);
        true
    } else {
        room.ball_animation = BallAnimation::lobby();
        false
    }
}

/// Advance the ball past the end of its current segment.
///
/// Mutates `room` for the `Next` and `Score` outcomes; callers must not
/// persist or broadcast on [`AnimationAdvance::None`].
pub fn advance_animation(room: &mut RoomState, players: &[Player]) -> AnimationAdvance {
    if !room.playing {
        return AnimationAdvance::None;
    }
    let anim = room.ball_animation;
    if anim.is_rest() {
        return AnimationAdvance::None;
    }

    let (end_x, end_y) = anim.end();
    let (mut vx, mut vy) = anim.velocity();

    // A segment ending on a goal line is a goal for the far team.
    if end_x <= GOAL_LEFT_X + BOUNDARY_EPSILON {
        return score(room, end_x, end_y, Team::Right);
    }
    if end_x >= GOAL_RIGHT_X - BOUNDARY_EPSILON {
        return score(room, end_x, end_y, Team::Left);
    }

    // Horizontal walls reflect the vertical velocity.
    if end_y <= BALL_Y_MIN + BOUNDARY_EPSILON {
        vy = vy.abs();
    } else if end_y >= BALL_Y_MAX - BOUNDARY_EPSILON {
        vy = -vy.abs();
    }

    // Paddle columns reflect the horizontal velocity iff a defender covers
    // the crossing point; otherwise the ball continues toward the goal.
    if (end_x - LEFT_TEAM_X).abs() <= BOUNDARY_EPSILON
        && vx < 0.0
        && defended(players, Team::Left, end_y)
    {
        vx = vx.abs();
    } else if (end_x - RIGHT_TEAM_X).abs() <= BOUNDARY_EPSILON
        && vx > 0.0
        && defended(players, Team::Right, end_y)
    {
        vx = -vx.abs();
    }

    let next = segment_from(end_x, end_y, vx, vy);
    room.ball_animation = next;
    AnimationAdvance::Next(next)
}

fn score(room: &mut RoomState, end_x: f64, end_y: f64, scoring_team: Team) -> AnimationAdvance {
    room.teams_score.record_goal(scoring_team);
    let animation = BallAnimation::rest_at(end_x, end_y);
    room.ball_animation = animation;
    AnimationAdvance::Score {
        animation,
        scoring_team,
    }
}

fn defended(players: &[Player], team: Team, y: f64) -> bool {
    let reach = PADDLE_HEIGHT / 2.0 + BALL_RADIUS;
    players
        .iter()
        .any(|p| p.team == team && (p.y as f64 - y).abs() <= reach)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::PlayerKey;

    fn player(id: &str, team: Team, ready: bool, y: i32) -> Player {
        Player {
            key: PlayerKey::new("g1", id),
            team,
            token: format!("tok-{id}"),
            y,
            ready_to_start: ready,
        }
    }

    #[test]
    fn test_can_start_requires_both_teams_ready() {
        assert!(!can_start(&[]));

        let left_only = vec![player("p1", Team::Left, true, 375)];
        assert!(!can_start(&left_only));

        let one_not_ready = vec![
            player("p1", Team::Left, true, 375),
            player("p2", Team::Right, false, 375),
        ];
        assert!(!can_start(&one_not_ready));

        let all_ready = vec![
            player("p1", Team::Left, true, 375),
            player("p2", Team::Right, true, 375),
        ];
        assert!(can_start(&all_ready));
    }

    #[test]
    fn test_flipping_any_player_blocks_start() {
        let mut players = vec![
            player("p1", Team::Left, true, 375),
            player("p2", Team::Left, true, 100),
            player("p3", Team::Right, true, 650),
        ];
        assert!(can_start(&players));

        for i in 0..players.len() {
            players[i].ready_to_start = false;
            assert!(!can_start(&players));
            players[i].ready_to_start = true;
        }
    }

    #[test]
    fn test_start_installs_serve() {
        let mut room = RoomState::new("g1");
        let players = vec![
            player("p1", Team::Left, true, 375),
            player("p2", Team::Right, true, 375),
        ];

        assert!(start(&mut room, &players));
        assert!(room.playing);
        assert!(!room.ball_animation.is_rest());
    }

    #[test]
    fn test_start_denied_forces_lobby_and_keeps_playing_flag() {
        let mut room = RoomState::new("g1");
        room.playing = true;
        room.ball_animation = BallAnimation::serve(&room.teams_score);

        let players = vec![player("p1", Team::Left, false, 375)];
        assert!(!start(&mut room, &players));
        assert!(room.playing, "playing keeps its prior value");
        assert_eq!(room.ball_animation, BallAnimation::lobby());
    }

    #[test]
    fn test_advance_is_none_when_not_playing_or_resting() {
        let mut room = RoomState::new("g1");
        assert_eq!(advance_animation(&mut room, &[]), AnimationAdvance::None);

        room.playing = true;
        // Still the lobby rest segment.
        assert_eq!(advance_animation(&mut room, &[]), AnimationAdvance::None);
    }

    #[test]
    fn test_defended_column_bounces_back() {
        let mut room = RoomState::new("g1");
        let players = vec![
            player("p1", Team::Left, true, 375),
            player("p2", Team::Right, true, 712),
        ];
        start(&mut room, &players);

        // Serve ends on the right column at y=712.5; p2 covers it.
        let advance = advance_animation(&mut room, &players);
        match advance {
            AnimationAdvance::Next(seg) => {
                assert!(seg.end_x < seg.start_x, "bounced back toward the left")
            }
            other => panic!("expected Next, got {other:?}"),
        }
        assert_eq!(room.teams_score.total(), 0);
    }

    #[test]
    fn test_undefended_serve_eventually_scores_for_left() {
        let mut room = RoomState::new("g1");
        // Right team paddle parked far from the serve arrival point.
        let players = vec![
            player("p1", Team::Left, true, 375),
            player("p2", Team::Right, true, 0),
        ];
        start(&mut room, &players);

        for _ in 0..32 {
            match advance_animation(&mut room, &players) {
                AnimationAdvance::Score {
                    scoring_team,
                    animation,
                } => {
                    assert_eq!(scoring_team, Team::Left);
                    assert_eq!(room.teams_score.left_team_score, 1);
                    assert!(animation.is_rest(), "goal freeze installed");
                    // Frozen ball yields no further advances.
                    assert_eq!(advance_animation(&mut room, &players), AnimationAdvance::None);
                    return;
                }
                AnimationAdvance::Next(_) => continue,
                AnimationAdvance::None => panic!("live ball reported None"),
            }
        }
        panic!("serve never resolved into a goal");
    }

    #[test]
    fn test_scores_survive_restart_never_reset() {
        let mut room = RoomState::new("g1");
        let players = vec![
            player("p1", Team::Left, true, 375),
            player("p2", Team::Right, true, 0),
        ];
        start(&mut room, &players);
        loop {
            if let AnimationAdvance::Score { .. } = advance_animation(&mut room, &players) {
                break;
            }
        }
        let before = room.teams_score;

        // Restarting serves again but keeps the counters.
        assert!(start(&mut room, &players));
        assert_eq!(room.teams_score, before);
    }
}
