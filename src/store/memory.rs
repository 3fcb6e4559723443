//! In-Memory Store
//!
//! `BTreeMap`s behind `RwLock`s; ordered iteration gives a stable roster
//! order on every read. Insert and update are both upserts (last write
//! wins), matching the repository contract.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use crate::game::state::{Player, PlayerKey, RoomState};
use crate::store::Repository;

/// Process-local room/player store.
#[derive(Default)]
pub struct MemoryStore {
    rooms: RwLock<BTreeMap<String, RoomState>>,
    players: RwLock<BTreeMap<PlayerKey, Player>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rooms ever created.
    pub fn room_count(&self) -> usize {
        self.rooms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of registered players across all rooms.
    pub fn player_count(&self) -> usize {
        self.players
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Repository for MemoryStore {
    fn find_room(&self, id: &str) -> Option<RoomState> {
        self.rooms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn insert_room(&self, room: &RoomState) {
        self.rooms
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(room.id.clone(), room.clone());
    }

    fn update_room(&self, room: &RoomState) {
        self.insert_room(room);
    }

    fn find_player(&self, key: &PlayerKey) -> Option<Player> {
        self.players
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn find_players_by_room(&self, room_id: &str) -> Vec<Player> {
        self.players
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|p| p.key.room_id == room_id)
            .cloned()
            .collect()
    }

    fn insert_player(&self, player: &Player) {
        self.players
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(player.key.clone(), player.clone());
    }

    fn update_player(&self, player: &Player) {
        self.insert_player(player);
    }

    fn update_player_y(&self, key: &PlayerKey, y: i32) {
        if let Some(player) = self
            .players
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(key)
        {
            player.y = y;
        }
    }
}
