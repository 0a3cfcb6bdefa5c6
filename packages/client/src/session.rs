//! WebSocket client session management.

use futures_util::{SinkExt, StreamExt};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use parley_server::protocol::{ClientEvent, ServerEvent};

use crate::{error::ClientError, formatter::MessageFormatter, ui::redisplay_prompt};

/// How the read side of a session ended
enum SessionEnd {
    /// The relay rejected the requested display name
    UsernameTaken,
    /// The connection dropped or the server closed it
    ConnectionLost,
}

/// Run one WebSocket client session.
///
/// Connects, requests registration under `username`, then relays terminal
/// input to the server and renders incoming events until either side ends
/// the session.
pub async fn run_client_session(url: &str, username: &str) -> Result<(), ClientError> {
    let (ws_stream, _response) = connect_async(url)
        .await
        .map_err(|e| ClientError::Connection(e.to_string()))?;

    tracing::info!("Connected to chat relay");

    let (mut write, mut read) = ws_stream.split();

    // Request registration; the outcome arrives in-band as either a
    // welcome or a username-taken event.
    let join = ClientEvent::Join {
        username: username.to_string(),
    };
    let join_json = serde_json::to_string(&join).expect("join event serialization cannot fail");
    write
        .send(Message::Text(join_json.into()))
        .await
        .map_err(|e| ClientError::Connection(e.to_string()))?;

    let username_for_read = username.to_string();

    // Render incoming events
    let mut read_task = tokio::spawn(async move {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    let event = match serde_json::from_str::<ServerEvent>(text.as_str()) {
                        Ok(event) => event,
                        Err(_) => {
                            print!("{}", MessageFormatter::format_raw_message(text.as_str()));
                            redisplay_prompt(&username_for_read);
                            continue;
                        }
                    };

                    match event {
                        ServerEvent::UsernameTaken => {
                            return SessionEnd::UsernameTaken;
                        }
                        ServerEvent::Welcome { message } => {
                            print!("{}", MessageFormatter::format_welcome(&message));
                        }
                        ServerEvent::UserJoined { username } => {
                            print!("{}", MessageFormatter::format_user_joined(&username));
                        }
                        ServerEvent::UserLeft { username } => {
                            print!("{}", MessageFormatter::format_user_left(&username));
                        }
                        ServerEvent::UpdateUsers { users } => {
                            print!(
                                "{}",
                                MessageFormatter::format_roster(&users, &username_for_read)
                            );
                        }
                        ServerEvent::ReceiveMessage {
                            username,
                            message,
                            timestamp,
                        } => {
                            print!(
                                "{}",
                                MessageFormatter::format_chat_message(
                                    &username, &message, &timestamp
                                )
                            );
                        }
                    }
                    redisplay_prompt(&username_for_read);
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    return SessionEnd::ConnectionLost;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    return SessionEnd::ConnectionLost;
                }
                _ => {}
            }
        }

        SessionEnd::ConnectionLost
    });

    // Channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let username_for_prompt = username.to_string();
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", username_for_prompt);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    // Empty input is skipped at the prompt, but whatever is
                    // sent goes out verbatim; the relay does not validate
                    // message bodies.
                    if !line.is_empty() {
                        rl.add_history_entry(line.as_str()).ok();
                        if input_tx.send(line).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    // Forward terminal input to the relay
    let mut write_task = tokio::spawn(async move {
        let mut write_error = false;

        while let Some(line) = input_rx.recv().await {
            let event = ClientEvent::SendMessage { message: line };
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to serialize message: {}", e);
                    continue;
                }
            };

            if let Err(e) = write.send(Message::Text(json.into())).await {
                tracing::warn!("Failed to send message: {}", e);
                write_error = true;
                break;
            }
        }

        write_error
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            match read_result {
                Ok(SessionEnd::UsernameTaken) => {
                    return Err(ClientError::UsernameTaken(username.to_string()));
                }
                Ok(SessionEnd::ConnectionLost) | Err(_) => {
                    return Err(ClientError::Connection("Connection lost".to_string()));
                }
            }
        }
        write_result = &mut write_task => {
            read_task.abort();
            let write_error = write_result.unwrap_or(false);
            if write_error {
                return Err(ClientError::Connection("Connection lost".to_string()));
            }
        }
    }

    Ok(())
}
