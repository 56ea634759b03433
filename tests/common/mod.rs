//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tracing_subscriber::EnvFilter;

use websock::SocketEvent;

/// Text message that makes the echo server close the connection.
pub const CLOSE_REQUEST: &str = "close-me";

/// Close code the echo server uses for [`CLOSE_REQUEST`].
pub const SERVER_CLOSE_CODE: u16 = 4001;

/// Installs a test subscriber once. Filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Starts a WebSocket echo server on `127.0.0.1:0` and returns its URL.
///
/// Text and binary frames are echoed back. [`CLOSE_REQUEST`] makes the
/// server close with [`SERVER_CLOSE_CODE`].
pub async fn spawn_echo_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind echo server");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let Ok(mut ws) = accept_async(stream).await else {
                    return;
                };

                while let Some(Ok(message)) = ws.next().await {
                    match message {
                        Message::Text(ref text) if text.as_str() == CLOSE_REQUEST => {
                            let frame = CloseFrame {
                                code: CloseCode::from(SERVER_CLOSE_CODE),
                                reason: "requested".into(),
                            };
                            let _ = ws.close(Some(frame)).await;
                            break;
                        }
                        Message::Text(_) | Message::Binary(_) => {
                            if ws.send(message).await.is_err() {
                                break;
                            }
                        }
                        Message::Close(_) => break,
                        _ => {}
                    }
                }
            });
        }
    });

    format!("ws://{addr}")
}

/// Receives the next event that is not `Open`, with a deadline.
pub async fn next_event(events: &mut broadcast::Receiver<SocketEvent>) -> SocketEvent {
    loop {
        let event = timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("event within deadline")
            .expect("event channel open");
        if event != SocketEvent::Open {
            return event;
        }
    }
}
