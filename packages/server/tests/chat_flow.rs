//! Integration tests driving the real relay server over WebSocket.
//!
//! Each test serves the application router on an ephemeral port and talks to
//! it through `tokio-tungstenite`, the same way the CLI client does.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use parley_server::{
    protocol::{ClientEvent, ServerEvent},
    relay::Relay,
    ui::{app, state::AppState},
};

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

const EVENT_TIMEOUT: Duration = Duration::from_secs(2);
const SILENCE_WINDOW: Duration = Duration::from_millis(300);

/// Serve the relay on an ephemeral port, returning its address
async fn spawn_relay() -> SocketAddr {
    let relay = Arc::new(Relay::new());
    let state = Arc::new(AppState { relay });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app(state))
            .await
            .expect("test server failed");
    });
    addr
}

async fn connect(addr: SocketAddr) -> WsClient {
    let (ws, _) = connect_async(format!("ws://{}/ws", addr))
        .await
        .expect("failed to connect");
    ws
}

async fn send(ws: &mut WsClient, event: &ClientEvent) {
    let json = serde_json::to_string(event).unwrap();
    ws.send(Message::Text(json.into()))
        .await
        .expect("failed to send frame");
}

async fn send_join(ws: &mut WsClient, username: &str) {
    send(
        ws,
        &ClientEvent::Join {
            username: username.to_string(),
        },
    )
    .await;
}

async fn send_chat(ws: &mut WsClient, message: &str) {
    send(
        ws,
        &ClientEvent::SendMessage {
            message: message.to_string(),
        },
    )
    .await;
}

/// Next text frame parsed as a server event, skipping control frames
async fn next_event(ws: &mut WsClient) -> ServerEvent {
    loop {
        let frame = tokio::time::timeout(EVENT_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for a server event")
            .expect("connection closed while waiting for a server event")
            .expect("websocket error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).expect("unparseable server event");
        }
    }
}

/// Assert that no server event arrives within the silence window
async fn assert_silent(ws: &mut WsClient) {
    let result = tokio::time::timeout(SILENCE_WINDOW, ws.next()).await;
    assert!(result.is_err(), "expected silence, got {:?}", result);
}

fn sorted(mut users: Vec<String>) -> Vec<String> {
    users.sort();
    users
}

#[tokio::test]
async fn test_join_flow_delivers_welcome_delta_and_roster() {
    // given:
    let addr = spawn_relay().await;
    let mut alice = connect(addr).await;
    send_join(&mut alice, "alice").await;
    assert_eq!(
        next_event(&mut alice).await,
        ServerEvent::Welcome {
            message: "Welcome to the chat, alice!".to_string()
        }
    );
    assert_eq!(
        next_event(&mut alice).await,
        ServerEvent::UpdateUsers {
            users: vec!["alice".to_string()]
        }
    );

    // when: bob joins
    let mut bob = connect(addr).await;
    send_join(&mut bob, "bob").await;

    // then: bob receives his private welcome plus the full roster
    assert_eq!(
        next_event(&mut bob).await,
        ServerEvent::Welcome {
            message: "Welcome to the chat, bob!".to_string()
        }
    );
    match next_event(&mut bob).await {
        ServerEvent::UpdateUsers { users } => assert_eq!(sorted(users), vec!["alice", "bob"]),
        other => panic!("expected update-users, got {:?}", other),
    }

    // alice receives the join delta plus the same roster
    assert_eq!(
        next_event(&mut alice).await,
        ServerEvent::UserJoined {
            username: "bob".to_string()
        }
    );
    match next_event(&mut alice).await {
        ServerEvent::UpdateUsers { users } => assert_eq!(sorted(users), vec!["alice", "bob"]),
        other => panic!("expected update-users, got {:?}", other),
    }
}

#[tokio::test]
async fn test_duplicate_name_rejection_and_retry() {
    // given: alice and bob are registered
    let addr = spawn_relay().await;
    let mut alice = connect(addr).await;
    send_join(&mut alice, "alice").await;
    next_event(&mut alice).await; // welcome
    next_event(&mut alice).await; // roster

    let mut bob = connect(addr).await;
    send_join(&mut bob, "bob").await;
    next_event(&mut bob).await; // welcome
    next_event(&mut bob).await; // roster
    next_event(&mut alice).await; // user-joined
    next_event(&mut alice).await; // roster

    // when: a third connection requests "bob"
    let mut charlie = connect(addr).await;
    send_join(&mut charlie, "bob").await;

    // then: only the requester hears about it
    assert_eq!(next_event(&mut charlie).await, ServerEvent::UsernameTaken);
    assert_silent(&mut alice).await;
    assert_silent(&mut bob).await;

    // the rejected connection stays live and may retry with a free name
    send_join(&mut charlie, "charlie").await;
    assert_eq!(
        next_event(&mut charlie).await,
        ServerEvent::Welcome {
            message: "Welcome to the chat, charlie!".to_string()
        }
    );
    match next_event(&mut charlie).await {
        ServerEvent::UpdateUsers { users } => {
            assert_eq!(sorted(users), vec!["alice", "bob", "charlie"]);
        }
        other => panic!("expected update-users, got {:?}", other),
    }
}

#[tokio::test]
async fn test_message_is_delivered_to_others_but_not_echoed() {
    // given:
    let addr = spawn_relay().await;
    let mut alice = connect(addr).await;
    send_join(&mut alice, "alice").await;
    next_event(&mut alice).await;
    next_event(&mut alice).await;

    let mut bob = connect(addr).await;
    send_join(&mut bob, "bob").await;
    next_event(&mut bob).await;
    next_event(&mut bob).await;
    next_event(&mut alice).await;
    next_event(&mut alice).await;

    // when: bob sends "hi"
    send_chat(&mut bob, "hi").await;

    // then: alice receives it with a wall-clock timestamp, bob hears nothing
    match next_event(&mut alice).await {
        ServerEvent::ReceiveMessage {
            username,
            message,
            timestamp,
        } => {
            assert_eq!(username, "bob");
            assert_eq!(message, "hi");
            assert_eq!(timestamp.len(), 8);
            assert_eq!(timestamp.matches(':').count(), 2);
        }
        other => panic!("expected receive-message, got {:?}", other),
    }
    assert_silent(&mut bob).await;
}

#[tokio::test]
async fn test_message_before_join_is_silently_dropped() {
    // given: alice is registered, a second connection never joins
    let addr = spawn_relay().await;
    let mut alice = connect(addr).await;
    send_join(&mut alice, "alice").await;
    next_event(&mut alice).await;
    next_event(&mut alice).await;

    let mut stranger = connect(addr).await;

    // when:
    send_chat(&mut stranger, "can anyone hear me?").await;

    // then: nobody receives anything, including the stranger
    assert_silent(&mut alice).await;
    assert_silent(&mut stranger).await;
}

#[tokio::test]
async fn test_disconnect_broadcasts_user_left_and_updated_roster() {
    // given:
    let addr = spawn_relay().await;
    let mut alice = connect(addr).await;
    send_join(&mut alice, "alice").await;
    next_event(&mut alice).await;
    next_event(&mut alice).await;

    let mut bob = connect(addr).await;
    send_join(&mut bob, "bob").await;
    next_event(&mut bob).await;
    next_event(&mut bob).await;
    next_event(&mut alice).await;
    next_event(&mut alice).await;

    // when: alice closes her connection
    alice.close(None).await.expect("failed to close");

    // then: bob receives exactly one user-left plus the shrunken roster
    assert_eq!(
        next_event(&mut bob).await,
        ServerEvent::UserLeft {
            username: "alice".to_string()
        }
    );
    assert_eq!(
        next_event(&mut bob).await,
        ServerEvent::UpdateUsers {
            users: vec!["bob".to_string()]
        }
    );
    assert_silent(&mut bob).await;
}

#[tokio::test]
async fn test_disconnect_before_join_notifies_nobody() {
    // given:
    let addr = spawn_relay().await;
    let mut alice = connect(addr).await;
    send_join(&mut alice, "alice").await;
    next_event(&mut alice).await;
    next_event(&mut alice).await;

    let mut stranger = connect(addr).await;

    // when: the unjoined connection drops
    stranger.close(None).await.expect("failed to close");

    // then:
    assert_silent(&mut alice).await;
}

#[tokio::test]
async fn test_http_surface_serves_entry_page() {
    // given:
    let addr = spawn_relay().await;
    let client = reqwest::Client::new();

    // when:
    let index = client
        .get(format!("http://{}/", addr))
        .send()
        .await
        .expect("failed to fetch index");

    // then:
    assert!(index.status().is_success());
    let body = index.text().await.unwrap();
    assert!(body.contains("<title>Parley</title>"));
}
