//! Terminal chat client for the parley relay.
//!
//! Connects to the relay, joins under a display name and sends lines from
//! stdin as chat messages. Automatically reconnects on disconnection
//! (max 5 attempts with 5 second interval). A taken display name is
//! rejected by the relay, in which case the client exits so the user can
//! pick another one.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin parley-client -- --username alice
//! cargo run --bin parley-client -- -n bob -u ws://127.0.0.1:3000/ws
//! ```

use clap::Parser;

use parley_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "parley-client")]
#[command(about = "Terminal chat client for the parley relay", long_about = None)]
struct Args {
    /// Display name to join under (must be unique on the relay)
    #[arg(short = 'n', long)]
    username: String,

    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:3000/ws")]
    url: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    if let Err(e) = parley_client::run_client(args.url, args.username).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
