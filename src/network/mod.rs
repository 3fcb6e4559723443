//! Networking (non-authoritative)
//!
//! WebSocket transport between clients and the session coordinator. The
//! transport holds no game state: it parses inbound frames into coordinator
//! actions and fans coordinator publications out to topic subscribers.

pub mod protocol;
pub mod server;
pub mod topics;
