//! Presence and broadcast chat relay server.
//!
//! Registers participants under unique display names and fans presence
//! changes and chat messages out to all other connected clients.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin parley-server
//! cargo run --bin parley-server -- --host 0.0.0.0 --port 3000
//! PORT=8080 cargo run --bin parley-server
//! ```

use std::sync::Arc;

use clap::Parser;

use parley_server::{
    relay::Relay,
    ui::{Server, state::AppState},
};
use parley_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "parley-server")]
#[command(about = "Presence and broadcast chat relay", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to (also read from PORT)
    #[arg(short = 'p', long, env = "PORT", default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // One relay instance for the process lifetime; the registry is rebuilt
    // empty on restart.
    let relay = Arc::new(Relay::new());
    let state = Arc::new(AppState { relay });

    let server = Server::new(state);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
