//! Reconnection policy for the CLI client.
//!
//! Pure functions with no side effects, kept separate so they are easy to
//! test.

use crate::error::ClientError;

/// Check if the client should exit immediately based on the error type.
///
/// A taken display name is rejected by the relay itself; reconnecting with
/// the same name would only be rejected again, so the user has to pick a
/// different one.
pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(error, ClientError::UsernameTaken(_))
}

/// Check if the client should attempt to reconnect.
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The current reconnection attempt count (0-indexed)
/// * `max_attempts` - The maximum number of reconnection attempts allowed
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    if should_exit_immediately(error) {
        return false;
    }

    current_attempt < max_attempts
}
