//! Error types for the CLI client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The requested display name is already registered on the relay
    #[error("Display name '{0}' is already taken")]
    UsernameTaken(String),

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),
}
