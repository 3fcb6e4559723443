//! Room-Scoped Session Orchestration
//!
//! The [`coordinator::SessionCoordinator`] receives room-addressed actions,
//! consults the game rules, persists through the [`crate::store`] layer and
//! fans results out through the [`broadcast::Broadcaster`] seam. Actions on
//! the same room are serialized by [`locks::RoomLocks`].

pub mod broadcast;
pub mod coordinator;
pub mod locks;

/// Session errors. All four are recoverable-by-client conditions, never
/// process-fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No room exists for the addressed id.
    #[error("game not found: {0}")]
    GameNotFound(String),

    /// No player record exists for the addressed id.
    #[error("player not found: {0}")]
    PlayerNotFound(String),

    /// The supplied token does not match the issued one.
    #[error("invalid player token")]
    InvalidToken,

    /// Registration without a token for an id that is already taken.
    #[error("player id already used: {0}")]
    PlayerIdAlreadyUsed(String),
}
