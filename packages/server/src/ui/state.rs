//! Shared application state.

use std::sync::Arc;

use crate::relay::Relay;

/// Shared application state
pub struct AppState {
    /// The single relay instance owning the connection registry
    pub relay: Arc<Relay>,
}
