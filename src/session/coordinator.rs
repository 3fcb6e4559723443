//! Session Coordinator
//!
//! Orchestration facade for one server process: receives room-scoped
//! actions, delegates the domain decision to the game rules, persists the
//! resulting records, and emits broadcasts.
//!
//! Every operation runs under the addressed room's lock for its whole
//! read-compute-persist span. Publications are collected into an outbox
//! while locked and emitted only after the lock is released, so a slow
//! subscriber can never extend the critical section; within one call,
//! entity snapshots are queued before the notices derived from them.

use std::sync::Arc;

use tracing::debug;

use crate::game::ball::BallAnimation;
use crate::game::referee::{self, AnimationAdvance};
use crate::game::state::{Player, PlayerKey, RoomState, TeamsScore};
use crate::game::{motion, roster};
use crate::session::broadcast::{
    Broadcaster, Destination, Notice, NoticeCode, Outbound, PlayerDto, RoomSnapshot,
};
use crate::session::locks::RoomLocks;
use crate::session::SessionError;
use crate::store::Repository;

use serde::{Deserialize, Serialize};

/// Room snapshot plus roster, returned to watchers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchView {
    /// Goal counters.
    pub teams_score: TeamsScore,
    /// Current ball trajectory segment.
    pub ball_animation: BallAnimation,
    /// Full roster.
    pub players: Vec<PlayerDto>,
}

/// Registration result: the room snapshot, the acting player's token and
/// the full roster.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterView {
    /// Goal counters.
    pub teams_score: TeamsScore,
    /// Current ball trajectory segment.
    pub ball_animation: BallAnimation,
    /// The acting player's bearer token.
    pub token: String,
    /// Full roster, including the new player.
    pub players: Vec<PlayerDto>,
}

/// Publications queued during a locked section, emitted after release.
type Outbox = Vec<(Destination, Outbound)>;

/// The session coordination facade.
pub struct SessionCoordinator<R, B> {
    store: Arc<R>,
    broadcaster: Arc<B>,
    locks: RoomLocks,
}

impl<R: Repository, B: Broadcaster> SessionCoordinator<R, B> {
    /// Create a coordinator over a store and a broadcaster.
    pub fn new(store: Arc<R>, broadcaster: Arc<B>) -> Self {
        Self {
            store,
            broadcaster,
            locks: RoomLocks::new(),
        }
    }

    /// Read-only room snapshot: score, ball, roster.
    pub async fn watch(&self, room_id: &str) -> Result<WatchView, SessionError> {
        let _guard = self.locks.acquire(room_id).await;

        let room = self
            .store
            .find_room(room_id)
            .ok_or_else(|| SessionError::GameNotFound(room_id.to_owned()))?;
        let players = self.store.find_players_by_room(room_id);

        Ok(WatchView {
            teams_score: room.teams_score,
            ball_animation: room.ball_animation,
            players: players.iter().map(PlayerDto::from_player).collect(),
        })
    }

    /// Register a new player, or reattach a returning one when `token` is
    /// supplied. Creates the room on the first registration to an unknown
    /// id.
    pub async fn register_player(
        &self,
        room_id: &str,
        player_id: &str,
        token: Option<&str>,
        team_choice: &str,
    ) -> Result<RegisterView, SessionError> {
        let mut outbox = Outbox::new();
        let guard = self.locks.acquire(room_id).await;
        let result = self.register_locked(room_id, player_id, token, team_choice, &mut outbox);
        drop(guard);
        self.flush(outbox);
        result
    }

    fn register_locked(
        &self,
        room_id: &str,
        player_id: &str,
        token: Option<&str>,
        team_choice: &str,
        outbox: &mut Outbox,
    ) -> Result<RegisterView, SessionError> {
        let key = PlayerKey::new(room_id, player_id);

        let (room, room_is_new) = match self.store.find_room(room_id) {
            Some(room) => (room, false),
            None => (RoomState::new(room_id), true),
        };

        let (mut player, player_is_new) = match token {
            // `PlayerIdAlreadyUsed` goes back to the caller only: the
            // attempting client never received a token to unicast to.
            None => {
                let created =
                    roster::register(key.clone(), team_choice, self.store.find_player(&key).as_ref())?;
                (created, true)
            }
            Some(supplied) => {
                match roster::reattach(&key, supplied, self.store.find_player(&key)) {
                    Ok(existing) => (existing, false),
                    Err(err) => {
                        outbox.push((
                            Destination::Messages {
                                room_id: room_id.to_owned(),
                                token: supplied.to_owned(),
                            },
                            Outbound::Notice(Notice::for_error(&err)),
                        ));
                        return Err(err);
                    }
                }
            }
        };

        // Late joiners to an active match are auto-ready.
        if room.playing {
            player.ready_to_start = true;
        }

        if player_is_new {
            self.store.insert_player(&player);
        } else {
            self.store.update_player(&player);
        }
        if room_is_new {
            self.store.insert_room(&room);
        }

        let players = self.store.find_players_by_room(room_id);
        debug!(room_id, player = %key.wire_id(), roster = players.len(), "player registered");

        outbox.push((
            Destination::Roster(room_id.to_owned()),
            Outbound::Player(PlayerDto::from_player(&player)),
        ));
        for p in &players {
            self.unicast(outbox, room_id, &p.token, Notice::info(NoticeCode::NewPlayer));
        }

        Ok(RegisterView {
            teams_score: room.teams_score,
            ball_animation: room.ball_animation,
            token: player.token.clone(),
            players: players.iter().map(PlayerDto::from_player).collect(),
        })
    }

    /// Record a start vote: mark the player ready, then start the match if
    /// the whole roster gates pass; otherwise force the ball back to the
    /// lobby rest segment.
    pub async fn start_vote(
        &self,
        room_id: &str,
        player_id: &str,
        token: &str,
    ) -> Result<RoomSnapshot, SessionError> {
        let mut outbox = Outbox::new();
        let guard = self.locks.acquire(room_id).await;
        let result = self.start_locked(room_id, player_id, token, &mut outbox);
        drop(guard);
        self.flush(outbox);
        result
    }

    fn start_locked(
        &self,
        room_id: &str,
        player_id: &str,
        token: &str,
        outbox: &mut Outbox,
    ) -> Result<RoomSnapshot, SessionError> {
        let mut room = self.resolve_room(room_id, token, outbox)?;
        let key = PlayerKey::new(room_id, player_id);
        let mut player = self.resolve_player(&key, token, outbox)?;

        player.ready_to_start = true;
        self.store.update_player(&player);
        outbox.push((
            Destination::Roster(room_id.to_owned()),
            Outbound::Player(PlayerDto::from_player(&player)),
        ));

        let players = self.store.find_players_by_room(room_id);
        let started = referee::start(&mut room, &players);
        self.store.update_room(&room);

        let snapshot = RoomSnapshot::from_room(&room);
        outbox.push((
            Destination::Room(room_id.to_owned()),
            Outbound::Room(snapshot),
        ));

        if started {
            debug!(room_id, "match started");
            let leader = room.teams_score.leader();
            for p in &players {
                self.unicast(outbox, room_id, &p.token, Notice::info(NoticeCode::StartGame));
                self.unicast(outbox, room_id, &p.token, Notice::info(NoticeCode::GameControls));
                if let Some(team) = leader {
                    let code = if p.team == team {
                        NoticeCode::Winning
                    } else {
                        NoticeCode::Losing
                    };
                    self.unicast(outbox, room_id, &p.token, Notice::info(code));
                }
            }
        }

        Ok(snapshot)
    }

    /// Move a player's paddle. Persists the clamped vertical position only.
    pub async fn move_player(
        &self,
        room_id: &str,
        player_id: &str,
        token: &str,
        target_y: i32,
    ) -> Result<PlayerDto, SessionError> {
        let mut outbox = Outbox::new();
        let guard = self.locks.acquire(room_id).await;
        let result = self.move_locked(room_id, player_id, token, target_y, &mut outbox);
        drop(guard);
        self.flush(outbox);
        result
    }

    fn move_locked(
        &self,
        room_id: &str,
        player_id: &str,
        token: &str,
        target_y: i32,
        outbox: &mut Outbox,
    ) -> Result<PlayerDto, SessionError> {
        let key = PlayerKey::new(room_id, player_id);
        let mut player = self.resolve_player(&key, token, outbox)?;

        motion::move_to(&mut player, target_y);
        self.store.update_player_y(&key, player.y);

        let dto = PlayerDto::from_player(&player);
        outbox.push((
            Destination::Roster(room_id.to_owned()),
            Outbound::Player(dto.clone()),
        ));
        Ok(dto)
    }

    /// Advance the ball past the end of its current segment.
    ///
    /// Returns `Ok(None)` when nothing visible changed. On a goal, every
    /// player's ready flag is cleared and persisted before any broadcast
    /// goes out.
    ///
    /// There is no requester token on this action; when the room is
    /// unknown the error is returned for the transport to notify the
    /// requesting client directly.
    pub async fn tick_animation(
        &self,
        room_id: &str,
    ) -> Result<Option<BallAnimation>, SessionError> {
        let mut outbox = Outbox::new();
        let guard = self.locks.acquire(room_id).await;
        let result = self.tick_locked(room_id, &mut outbox);
        drop(guard);
        self.flush(outbox);
        result
    }

    fn tick_locked(
        &self,
        room_id: &str,
        outbox: &mut Outbox,
    ) -> Result<Option<BallAnimation>, SessionError> {
        let mut room = self
            .store
            .find_room(room_id)
            .ok_or_else(|| SessionError::GameNotFound(room_id.to_owned()))?;
        let players = self.store.find_players_by_room(room_id);

        match referee::advance_animation(&mut room, &players) {
            AnimationAdvance::None => Ok(None),
            AnimationAdvance::Next(animation) => {
                self.store.update_room(&room);
                outbox.push((
                    Destination::Ball(room_id.to_owned()),
                    Outbound::Ball(animation),
                ));
                Ok(Some(animation))
            }
            AnimationAdvance::Score {
                animation,
                scoring_team,
            } => {
                debug!(room_id, ?scoring_team, "goal scored");
                self.store.update_room(&room);
                for mut p in players {
                    p.ready_to_start = false;
                    self.store.update_player(&p);
                    outbox.push((
                        Destination::Roster(room_id.to_owned()),
                        Outbound::Player(PlayerDto::from_player(&p)),
                    ));
                    self.unicast(outbox, room_id, &p.token, Notice::info(NoticeCode::PointScored));
                }
                outbox.push((
                    Destination::Ball(room_id.to_owned()),
                    Outbound::Ball(animation),
                ));
                Ok(Some(animation))
            }
        }
    }

    // Private

    fn resolve_room(
        &self,
        room_id: &str,
        token: &str,
        outbox: &mut Outbox,
    ) -> Result<RoomState, SessionError> {
        match self.store.find_room(room_id) {
            Some(room) => Ok(room),
            None => {
                let err = SessionError::GameNotFound(room_id.to_owned());
                self.unicast(outbox, room_id, token, Notice::for_error(&err));
                Err(err)
            }
        }
    }

    fn resolve_player(
        &self,
        key: &PlayerKey,
        token: &str,
        outbox: &mut Outbox,
    ) -> Result<Player, SessionError> {
        match roster::reattach(key, token, self.store.find_player(key)) {
            Ok(player) => Ok(player),
            Err(err) => {
                self.unicast(outbox, &key.room_id, token, Notice::for_error(&err));
                Err(err)
            }
        }
    }

    fn unicast(&self, outbox: &mut Outbox, room_id: &str, token: &str, notice: Notice) {
        outbox.push((
            Destination::Messages {
                room_id: room_id.to_owned(),
                token: token.to_owned(),
            },
            Outbound::Notice(notice),
        ));
    }

    fn flush(&self, outbox: Outbox) {
        for (destination, payload) in outbox {
            self.broadcaster.publish(destination, payload);
        }
    }
}
