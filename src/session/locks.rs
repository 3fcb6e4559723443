//! Per-Room Mutual Exclusion
//!
//! Actions addressed to the same room read-modify-write shared records, so
//! they must be serialized against each other; actions on different rooms
//! run concurrently. Lock hold time is bounded by one coordinator call, and
//! the coordinator releases the guard before emitting any broadcast.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Keyed async lock registry: one mutex per room id, created on demand.
///
/// Lock cells are never removed; rooms are never destroyed either, and an
/// idle cell is a few dozen bytes.
#[derive(Default)]
pub struct RoomLocks {
    cells: Mutex<BTreeMap<String, Arc<Mutex<()>>>>,
}

impl RoomLocks {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `room_id`, waiting if another action on the
    /// same room is in flight.
    pub async fn acquire(&self, room_id: &str) -> OwnedMutexGuard<()> {
        let cell = {
            let mut cells = self.cells.lock().await;
            Arc::clone(cells.entry(room_id.to_owned()).or_default())
        };
        cell.lock_owned().await
    }
}
