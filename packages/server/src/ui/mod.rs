//! Server UI layer: WebSocket and HTTP handlers, router and lifecycle.

pub mod handler;
mod server;
mod signal;
pub mod state;

pub use server::{Server, app};
