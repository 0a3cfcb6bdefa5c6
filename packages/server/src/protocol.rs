//! Wire protocol for the chat relay.
//!
//! All frames are JSON text messages over the WebSocket, internally tagged
//! with a `type` field. Client frames that fail to parse are logged and
//! skipped by the handler; they never terminate the connection.

use serde::{Deserialize, Serialize};

/// Events sent by a client to the relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Request registration under a display name
    Join { username: String },
    /// Send a chat message to everyone else
    SendMessage { message: String },
}

/// Events pushed by the relay to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Join rejected: the requested name is already registered (private)
    UsernameTaken,
    /// Join accepted, greeting for the new participant (private)
    Welcome { message: String },
    /// A new participant joined (broadcast to everyone else)
    UserJoined { username: String },
    /// Full roster of display names, order-irrelevant (broadcast to all)
    UpdateUsers { users: Vec<String> },
    /// Chat message (broadcast to all but the sender)
    ReceiveMessage {
        username: String,
        message: String,
        timestamp: String,
    },
    /// A participant disconnected (broadcast to the rest)
    UserLeft { username: String },
}

impl ServerEvent {
    /// Serialize for the wire.
    ///
    /// These enums contain only strings and vectors of strings, so
    /// serialization cannot fail.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("server event serialization cannot fail")
    }
}
