//! Ball Trajectory Segments
//!
//! The ball's state is one straight-line segment: clients animate it from
//! `(start_x, start_y)` to `(end_x, end_y)` over `time` seconds and report
//! back when the animation ends; the server then computes the next segment.
//! Degenerate segments (start == end) encode the idle phases: the lobby
//! rest and the post-goal freeze.
//!
//! Segments always end on a boundary: the top or bottom wall, a paddle
//! column, or a goal line. Which boundary ends a segment is decided here;
//! what happens at that boundary (bounce, pass, goal) is the referee's call.

use serde::{Deserialize, Serialize};

use crate::{
    BALL_RADIUS, BALL_SPEED, LEFT_TEAM_X, PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH, RIGHT_TEAM_X,
};

use crate::game::state::TeamsScore;

/// Lowest ball center position (radius inset from the top wall).
pub const BALL_Y_MIN: f64 = BALL_RADIUS;

/// Highest ball center position (radius inset from the bottom wall).
pub const BALL_Y_MAX: f64 = PLAYFIELD_HEIGHT - BALL_RADIUS;

/// Left goal line.
pub const GOAL_LEFT_X: f64 = 0.0;

/// Right goal line.
pub const GOAL_RIGHT_X: f64 = PLAYFIELD_WIDTH;

/// Coordinate comparison tolerance for boundary hits.
pub const BOUNDARY_EPSILON: f64 = 1e-6;

/// One straight-line ball trajectory segment.
///
/// Wire shape matches the client: `startX`/`startY`/`endX`/`endY` in game
/// units, `time` in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BallAnimation {
    /// Segment origin.
    pub start_x: f64,
    /// Segment origin.
    pub start_y: f64,
    /// Segment target.
    pub end_x: f64,
    /// Segment target.
    pub end_y: f64,
    /// Seconds the client takes to animate the segment.
    pub time: f64,
}

impl BallAnimation {
    /// A motionless segment at `(x, y)`.
    pub fn rest_at(x: f64, y: f64) -> Self {
        Self {
            start_x: x,
            start_y: y,
            end_x: x,
            end_y: y,
            time: 0.0,
        }
    }

    /// The lobby rest segment: ball parked at the playfield center.
    pub fn lobby() -> Self {
        Self::rest_at(PLAYFIELD_WIDTH / 2.0, PLAYFIELD_HEIGHT / 2.0)
    }

    /// Whether this segment carries no motion (lobby rest or goal freeze).
    pub fn is_rest(&self) -> bool {
        self.time <= 0.0
            || ((self.end_x - self.start_x).abs() < BOUNDARY_EPSILON
                && (self.end_y - self.start_y).abs() < BOUNDARY_EPSILON)
    }

    /// Segment endpoint.
    pub fn end(&self) -> (f64, f64) {
        (self.end_x, self.end_y)
    }

    /// Velocity in units per second. Only meaningful when not at rest.
    pub fn velocity(&self) -> (f64, f64) {
        if self.time <= 0.0 {
            return (0.0, 0.0);
        }
        (
            (self.end_x - self.start_x) / self.time,
            (self.end_y - self.start_y) / self.time,
        )
    }

    /// The serve segment opening a rally: from the center, on a 3-4-5
    /// diagonal at full ball speed. The horizontal side alternates with the
    /// total number of points already played (even totals serve RIGHT).
    pub fn serve(score: &TeamsScore) -> Self {
        let dir = if score.total() % 2 == 0 { 1.0 } else { -1.0 };
        let vx = 0.8 * dir * BALL_SPEED;
        let vy = 0.6 * BALL_SPEED;
        segment_from(PLAYFIELD_WIDTH / 2.0, PLAYFIELD_HEIGHT / 2.0, vx, vy)
    }
}

/// Build the segment from `(x, y)` along `(vx, vy)` up to the first
/// boundary: a horizontal wall, the approached paddle column, or - once the
/// ball is already past that column - the goal line behind it.
pub fn segment_from(x: f64, y: f64, vx: f64, vy: f64) -> BallAnimation {
    let t_wall = if vy > 0.0 {
        (BALL_Y_MAX - y) / vy
    } else if vy < 0.0 {
        (BALL_Y_MIN - y) / vy
    } else {
        f64::INFINITY
    };

    let t_column = if vx > 0.0 {
        let target = if x < RIGHT_TEAM_X - BOUNDARY_EPSILON {
            RIGHT_TEAM_X
        } else {
            GOAL_RIGHT_X
        };
        (target - x) / vx
    } else if vx < 0.0 {
        let target = if x > LEFT_TEAM_X + BOUNDARY_EPSILON {
            LEFT_TEAM_X
        } else {
            GOAL_LEFT_X
        };
        (target - x) / vx
    } else {
        f64::INFINITY
    };

    let t = t_wall.min(t_column);
    if !t.is_finite() || t <= 0.0 {
        // A ball with no usable heading parks where it is.
        return BallAnimation::rest_at(x, y);
    }

    let end_x = (x + vx * t).clamp(GOAL_LEFT_X, GOAL_RIGHT_X);
    let end_y = (y + vy * t).clamp(BALL_Y_MIN, BALL_Y_MAX);

    BallAnimation {
        start_x: x,
        start_y: y,
        end_x,
        end_y,
        time: t,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_lobby_segment_is_rest() {
        let anim = BallAnimation::lobby();
        assert!(anim.is_rest());
        assert_eq!(anim.velocity(), (0.0, 0.0));
    }

    #[test]
    fn test_serve_side_alternates_with_total_points() {
        let even = TeamsScore::default();
        let serve = BallAnimation::serve(&even);
        assert!(serve.end_x > serve.start_x, "even totals serve right");

        let odd = TeamsScore {
            left_team_score: 1,
            right_team_score: 0,
        };
        let serve = BallAnimation::serve(&odd);
        assert!(serve.end_x < serve.start_x, "odd totals serve left");
    }

    #[test]
    fn test_serve_reaches_paddle_column() {
        let serve = BallAnimation::serve(&TeamsScore::default());
        assert!((serve.end_x - RIGHT_TEAM_X).abs() < BOUNDARY_EPSILON);
        assert!(!serve.is_rest());
        // 450 horizontal units at 400 units/s
        assert!((serve.time - 1.125).abs() < 1e-9);
    }

    #[test]
    fn test_segment_stops_at_wall_before_column() {
        // Steep downward heading hits the bottom wall before any column.
        let seg = segment_from(500.0, 700.0, 50.0, 400.0);
        assert!((seg.end_y - BALL_Y_MAX).abs() < BOUNDARY_EPSILON);
        assert!(seg.end_x < RIGHT_TEAM_X);
    }

    #[test]
    fn test_segment_past_column_targets_goal_line() {
        // Already on the left column and still heading left: goal line next.
        let seg = segment_from(LEFT_TEAM_X, 300.0, -400.0, 10.0);
        assert!((seg.end_x - GOAL_LEFT_X).abs() < BOUNDARY_EPSILON);
    }

    #[test]
    fn test_wire_field_names_are_camel_case() {
        let anim = BallAnimation::rest_at(1.0, 2.0);
        let json = serde_json::to_string(&anim).unwrap();
        assert!(json.contains("\"startX\""));
        assert!(json.contains("\"endY\""));
        assert!(json.contains("\"time\""));
    }

    proptest! {
        #[test]
        fn prop_segment_end_stays_in_bounds(
            x in LEFT_TEAM_X..RIGHT_TEAM_X,
            y in BALL_Y_MIN..BALL_Y_MAX,
            angle in 0.0f64..std::f64::consts::TAU,
        ) {
            let vx = BALL_SPEED * angle.cos();
            let vy = BALL_SPEED * angle.sin();
            let seg = segment_from(x, y, vx, vy);
            prop_assert!(seg.end_x >= GOAL_LEFT_X - BOUNDARY_EPSILON);
            prop_assert!(seg.end_x <= GOAL_RIGHT_X + BOUNDARY_EPSILON);
            prop_assert!(seg.end_y >= BALL_Y_MIN - BOUNDARY_EPSILON);
            prop_assert!(seg.end_y <= BALL_Y_MAX + BOUNDARY_EPSILON);
        }
    }
}
