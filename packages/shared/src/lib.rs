//! Shared utilities for the parley chat relay.
//!
//! Cross-cutting concerns used by both the server and the CLI client:
//! logger setup and the wall-clock abstraction.

pub mod logger;
pub mod time;
