//! Presence and broadcast chat relay.
//!
//! Tracks the set of currently connected participants and fans out presence
//! changes, chat messages and per-connection acknowledgements over WebSocket.

pub mod protocol;
pub mod relay;
pub mod ui;
