//! Presence and broadcast relay.
//!
//! The relay owns the connection registry (connection id -> registered peer)
//! and is the only place that mutates it. Every operation locks the registry
//! and runs to completion before releasing it, so handler execution is
//! serialized even on a multi-threaded runtime. Outbound delivery goes
//! through per-connection unbounded channels, so no operation blocks on a
//! slow receiver.

use std::{collections::HashMap, fmt, sync::Arc};

use tokio::sync::{Mutex, mpsc};
use uuid::Uuid;

use parley_shared::time::{Clock, SystemClock};

use crate::protocol::ServerEvent;

/// Transport-assigned opaque identifier, unique per live connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Channel used to push serialized events to one connection
pub type EventSender = mpsc::UnboundedSender<String>;

/// Outcome of a join request.
///
/// A duplicate name is a normal outcome, not an error: the requester is
/// notified and may retry with a different name on the same connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    NameTaken,
}

/// A registered participant
struct Peer {
    username: String,
    sender: EventSender,
}

/// Single-instance presence and broadcast relay.
///
/// Constructed once at process start; all registry mutation is routed
/// through [`join`](Relay::join), [`send_message`](Relay::send_message) and
/// [`disconnect`](Relay::disconnect).
pub struct Relay {
    clients: Mutex<HashMap<ConnectionId, Peer>>,
    clock: Arc<dyn Clock>,
}

impl Relay {
    /// Create a relay using the system wall clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a relay with an injected clock (used by tests)
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Register a connection under a display name.
    ///
    /// Display names must be unique among currently registered entries. On
    /// conflict the requester alone receives `username-taken`, the provided
    /// sender is dropped and nothing is broadcast. On success the joiner
    /// receives a private `welcome`, everyone else receives `user-joined`,
    /// and the full roster goes out to all registered connections including
    /// the joiner (the delta plus full-roster duplication is deliberate;
    /// clients consume both).
    pub async fn join(
        &self,
        conn: ConnectionId,
        username: &str,
        sender: EventSender,
    ) -> JoinOutcome {
        let mut clients = self.clients.lock().await;

        if clients.values().any(|peer| peer.username == username) {
            tracing::info!("Join rejected for '{}': name '{}' is taken", conn, username);
            Self::push(conn, &sender, &ServerEvent::UsernameTaken);
            return JoinOutcome::NameTaken;
        }

        Self::push(
            conn,
            &sender,
            &ServerEvent::Welcome {
                message: format!("Welcome to the chat, {}!", username),
            },
        );

        clients.insert(
            conn,
            Peer {
                username: username.to_string(),
                sender,
            },
        );
        tracing::info!("Connection '{}' joined as '{}'", conn, username);

        let joined = ServerEvent::UserJoined {
            username: username.to_string(),
        };
        for (id, peer) in clients.iter().filter(|(id, _)| **id != conn) {
            Self::push(*id, &peer.sender, &joined);
        }

        let roster = ServerEvent::UpdateUsers {
            users: clients.values().map(|p| p.username.clone()).collect(),
        };
        for (id, peer) in clients.iter() {
            Self::push(*id, &peer.sender, &roster);
        }

        JoinOutcome::Joined
    }

    /// Fan a chat message out to every registered connection except the
    /// sender.
    ///
    /// The sender exclusion is a correctness requirement: the originating
    /// connection must never receive its own message back. Messages from
    /// unregistered connections (never joined, or already disconnected) are
    /// silently dropped; the only cause is a race between disconnect and an
    /// in-flight send. Returns whether the message was broadcast.
    pub async fn send_message(&self, conn: ConnectionId, body: &str) -> bool {
        let clients = self.clients.lock().await;

        let Some(from) = clients.get(&conn) else {
            tracing::debug!("Dropping message from unregistered connection '{}'", conn);
            return false;
        };

        let event = ServerEvent::ReceiveMessage {
            username: from.username.clone(),
            message: body.to_string(),
            timestamp: self.clock.wall_time(),
        };
        tracing::info!("Broadcasting message from '{}'", from.username);

        for (id, peer) in clients.iter().filter(|(id, _)| **id != conn) {
            Self::push(*id, &peer.sender, &event);
        }

        true
    }

    /// Remove a connection from the registry.
    ///
    /// If it was registered, the remaining connections receive `user-left`
    /// followed by the updated roster. A connection that never completed a
    /// join is a no-op. Returns the display name that was removed, if any.
    pub async fn disconnect(&self, conn: ConnectionId) -> Option<String> {
        let mut clients = self.clients.lock().await;

        let peer = clients.remove(&conn)?;
        tracing::info!("'{}' ('{}') disconnected", peer.username, conn);

        let left = ServerEvent::UserLeft {
            username: peer.username.clone(),
        };
        let roster = ServerEvent::UpdateUsers {
            users: clients.values().map(|p| p.username.clone()).collect(),
        };
        for (id, remaining) in clients.iter() {
            Self::push(*id, &remaining.sender, &left);
            Self::push(*id, &remaining.sender, &roster);
        }

        Some(peer.username)
    }

    /// Display names of all currently registered participants
    pub async fn roster(&self) -> Vec<String> {
        let clients = self.clients.lock().await;
        clients.values().map(|p| p.username.clone()).collect()
    }

    /// Number of currently registered connections
    pub async fn connected_count(&self) -> usize {
        let clients = self.clients.lock().await;
        clients.len()
    }

    // Push failures are tolerated: a closed channel means the connection is
    // on its way out and the disconnect handler will reap it.
    fn push(conn: ConnectionId, sender: &EventSender, event: &ServerEvent) {
        if sender.send(event.to_json()).is_err() {
            tracing::warn!("Failed to push event to connection '{}'", conn);
        }
    }
}

impl Default for Relay {
    fn default() -> Self {
        Self::new()
    }
}
