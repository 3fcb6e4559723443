//! Room/Player Record Repository
//!
//! The single source of truth for room and player records. Semantics are
//! last-write-wins; the coordinator never caches records across calls.

pub mod memory;

pub use memory::MemoryStore;

use crate::game::state::{Player, PlayerKey, RoomState};

/// Key-value repository for room and player records.
///
/// Implementations must be bounded and non-blocking: the coordinator calls
/// them while holding a room lock.
pub trait Repository: Send + Sync + 'static {
    /// Look up a room by id.
    fn find_room(&self, id: &str) -> Option<RoomState>;

    /// Store a newly created room.
    fn insert_room(&self, room: &RoomState);

    /// Write back a mutated room.
    fn update_room(&self, room: &RoomState);

    /// Look up a player by composite key.
    fn find_player(&self, key: &PlayerKey) -> Option<Player>;

    /// All players registered in `room_id`, in key order.
    fn find_players_by_room(&self, room_id: &str) -> Vec<Player>;

    /// Store a newly created player.
    fn insert_player(&self, player: &Player);

    /// Write back a mutated player.
    fn update_player(&self, player: &Player);

    /// Partial update: write only the vertical position of `key`.
    fn update_player_y(&self, key: &PlayerKey, y: i32);
}
