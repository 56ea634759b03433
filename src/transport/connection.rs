//! WebSocket connection handle and event loop.
//!
//! A [`Connection`] is returned immediately in [`ReadyState::Connecting`].
//! The handshake and all socket I/O run on a spawned tokio task, so opening
//! never blocks the caller.
//!
//! # Event Loop
//!
//! The spawned task handles:
//!
//! - The client handshake, bounded by the connect timeout
//! - Incoming frames from the server (text, binary, close)
//! - Outgoing messages and close requests from the Rust API
//! - Lifecycle state updates and event fan-out

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::timeout;
use tokio_tungstenite::connect_async_with_config;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tracing::{debug, error, info, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::ConnectionId;

use super::event::{CLOSE_ABNORMAL, CLOSE_NORMAL, EventHandler, SocketEvent};
use super::options::ConnectionOptions;
use super::state::ReadyState;

// ============================================================================
// Constants
// ============================================================================

/// Close code reported when the peer closed without a status.
const CLOSE_NO_STATUS: u16 = 1005;

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Write a message to the socket.
    Send(Message),
    /// Send a close frame and stop.
    Close { code: u16, reason: String },
}

// ============================================================================
// Shared
// ============================================================================

/// Installed handler, cloned out of the lock before each call.
type SharedHandler = Arc<dyn Fn(&SocketEvent) + Send + Sync>;

/// State shared between the handle and its event loop.
struct Shared {
    state: watch::Sender<ReadyState>,
    events: broadcast::Sender<SocketEvent>,
    event_handler: Mutex<Option<SharedHandler>>,
}

impl Shared {
    fn state(&self) -> ReadyState {
        *self.state.borrow()
    }

    /// Applies `next` if the lifecycle allows it. Returns whether it did.
    fn transition(&self, next: ReadyState) -> bool {
        self.state.send_if_modified(|current| {
            if current.can_transition_to(next) {
                *current = next;
                true
            } else {
                false
            }
        })
    }

    fn emit(&self, event: SocketEvent) {
        // Called unlocked so the handler may replace or clear itself
        let handler = self.event_handler.lock().clone();
        if let Some(handler) = handler {
            handler(&event);
        }

        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn finish(&self, state: ReadyState, code: u16, reason: String) {
        self.transition(state);
        self.emit(SocketEvent::Close { code, reason });
    }

    fn fail(&self, message: String) {
        self.transition(ReadyState::Errored);
        self.emit(SocketEvent::Error { message });
        self.emit(SocketEvent::Close {
            code: CLOSE_ABNORMAL,
            reason: String::new(),
        });
    }
}

// ============================================================================
// LoopGuard
// ============================================================================

/// Marks the connection errored if the event loop is dropped before it
/// reached a terminal state, e.g. when its runtime shuts down.
struct LoopGuard {
    id: ConnectionId,
    shared: Arc<Shared>,
}

impl Drop for LoopGuard {
    fn drop(&mut self) {
        if !self.shared.state().is_terminal() {
            warn!(id = %self.id, state = %self.shared.state(), "Event loop stopped early");
            self.shared.fail("event loop stopped".to_owned());
        }
    }
}

// ============================================================================
// Connection
// ============================================================================

/// A WebSocket client connection.
///
/// Owns one socket and the task driving it. The socket lives until it is
/// closed by either side, fails, or every handle to it is dropped.
///
/// # Thread Safety
///
/// `Connection` is `Send + Sync` and can be shared across tasks behind an
/// `Arc`. All operations are non-blocking.
pub struct Connection {
    /// Identity of this handle.
    id: ConnectionId,
    /// Address the connection was opened with.
    url: String,
    /// Default wait for [`Connection::wait_open`].
    connect_timeout: Duration,
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    /// State and event fan-out (shared with event loop).
    shared: Arc<Shared>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Connection - Constructor
// ============================================================================

impl Connection {
    /// Creates a connection in [`ReadyState::Connecting`] and spawns its
    /// event loop on `runtime`.
    pub(crate) fn spawn(runtime: &Handle, url: String, options: &ConnectionOptions) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(ReadyState::Connecting);
        let (events, _) = broadcast::channel(options.event_capacity);

        let shared = Arc::new(Shared {
            state,
            events,
            event_handler: Mutex::new(None),
        });

        let id = ConnectionId::new();
        debug!(%id, url = %url, "Opening WebSocket connection");

        runtime.spawn(Self::run_event_loop(
            id,
            url.clone(),
            options.clone(),
            command_rx,
            Arc::clone(&shared),
        ));

        Self {
            id,
            url,
            connect_timeout: options.connect_timeout,
            command_tx,
            shared,
        }
    }
}

// ============================================================================
// Connection - Public API
// ============================================================================

impl Connection {
    /// Returns this handle's identity.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the address this connection targets.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ReadyState {
        self.shared.state()
    }

    /// Returns `true` if messages can be sent.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == ReadyState::Open
    }

    /// Waits for the handshake, bounded by the configured connect timeout.
    ///
    /// # Errors
    ///
    /// See [`Connection::wait_open_timeout`].
    pub async fn wait_open(&self) -> Result<()> {
        self.wait_open_timeout(self.connect_timeout).await
    }

    /// Waits until the connection leaves [`ReadyState::Connecting`].
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if still connecting after `wait`
    /// - [`Error::Connection`] if the connection closed or failed instead
    pub async fn wait_open_timeout(&self, wait: Duration) -> Result<()> {
        let mut state_rx = self.shared.state.subscribe();

        let state = match timeout(wait, state_rx.wait_for(|s| *s != ReadyState::Connecting)).await
        {
            Ok(Ok(state)) => *state,
            Ok(Err(_)) => return Err(Error::ConnectionClosed),
            Err(_) => {
                let timeout_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX);
                return Err(Error::connection_timeout(timeout_ms));
            }
        };

        match state {
            ReadyState::Open => Ok(()),
            other => Err(Error::connection(format!(
                "connection to {} is {other}",
                self.url
            ))),
        }
    }

    /// Waits until the connection is closed or errored and returns that state.
    pub async fn closed(&self) -> ReadyState {
        let mut state_rx = self.shared.state.subscribe();

        match state_rx.wait_for(|s| s.is_terminal()).await {
            Ok(state) => *state,
            Err(_) => self.state(),
        }
    }

    /// Subscribes to events emitted after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SocketEvent> {
        self.shared.events.subscribe()
    }

    /// Sets the event handler callback.
    ///
    /// The handler runs on the event loop task for every event. It may send
    /// on this connection and may replace or clear itself.
    pub fn set_event_handler(&self, handler: EventHandler) {
        let mut guard = self.shared.event_handler.lock();
        *guard = Some(Arc::from(handler));
    }

    /// Clears the event handler.
    pub fn clear_event_handler(&self) {
        let mut guard = self.shared.event_handler.lock();
        *guard = None;
    }

    /// Queues a text message.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] if the connection is not open
    /// - [`Error::ConnectionClosed`] if the event loop has stopped
    pub fn send_text(&self, text: impl Into<String>) -> Result<()> {
        let text: String = text.into();
        self.send_message("send_text", Message::Text(text.into()))
    }

    /// Queues a binary message.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::send_text`].
    pub fn send_binary(&self, data: impl Into<Vec<u8>>) -> Result<()> {
        let data: Vec<u8> = data.into();
        self.send_message("send_binary", Message::Binary(data.into()))
    }

    /// Serializes `value` and queues it as a text message.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if serialization fails
    /// - otherwise same as [`Connection::send_text`]
    pub fn send_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let text = serde_json::to_string(value)?;
        self.send_message("send_json", Message::Text(text.into()))
    }

    /// Closes the connection with a normal close code.
    pub fn close(&self) {
        self.close_with(CLOSE_NORMAL, "");
    }

    /// Closes the connection with the given code and reason.
    ///
    /// No-op if the connection is already closing or finished.
    pub fn close_with(&self, code: u16, reason: impl Into<String>) {
        if !self.shared.transition(ReadyState::Closing) {
            trace!(id = %self.id, state = %self.state(), "Close ignored");
            return;
        }

        let _ = self.command_tx.send(ConnectionCommand::Close {
            code,
            reason: reason.into(),
        });
    }

    fn send_message(&self, operation: &'static str, message: Message) -> Result<()> {
        let state = self.state();
        if state != ReadyState::Open {
            return Err(Error::invalid_state(operation, state));
        }

        self.command_tx
            .send(ConnectionCommand::Send(message))
            .map_err(|_| Error::ConnectionClosed)
    }
}

// ============================================================================
// Connection - Event Loop
// ============================================================================

impl Connection {
    /// Event loop that performs the handshake and then handles socket I/O.
    async fn run_event_loop(
        id: ConnectionId,
        url: String,
        options: ConnectionOptions,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        shared: Arc<Shared>,
    ) {
        let _guard = LoopGuard {
            id,
            shared: Arc::clone(&shared),
        };

        let handshake = timeout(
            options.connect_timeout,
            connect_async_with_config(url.as_str(), Some(options.websocket_config()), false),
        );

        let ws_stream = tokio::select! {
            result = handshake => match result {
                Ok(Ok((ws_stream, response))) => {
                    debug!(%id, status = %response.status(), "WebSocket handshake completed");
                    ws_stream
                }
                Ok(Err(e)) => {
                    warn!(%id, url = %url, error = %e, "WebSocket handshake failed");
                    shared.fail(format!("handshake failed: {e}"));
                    return;
                }
                Err(_) => {
                    warn!(%id, url = %url, timeout_ms = options.connect_timeout_ms(), "WebSocket handshake timed out");
                    shared.fail(format!(
                        "handshake timed out after {}ms",
                        options.connect_timeout_ms()
                    ));
                    return;
                }
            },

            // Sends are rejected until open, so only a close can land here
            command = command_rx.recv() => {
                let Some(ConnectionCommand::Close { code, reason }) = command else {
                    debug!(%id, "All handles dropped before handshake completed");
                    return;
                };
                debug!(%id, code, "Closed before handshake completed");
                shared.finish(ReadyState::Closed, code, reason);
                return;
            }
        };

        // A close may have raced the handshake; it is still queued below.
        if shared.transition(ReadyState::Open) {
            info!(%id, url = %url, "WebSocket connection open");
            shared.emit(SocketEvent::Open);
        }

        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                // Incoming frames from the server
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            trace!(%id, len = text.len(), "Text message received");
                            shared.emit(SocketEvent::Text {
                                data: text.as_str().to_owned(),
                            });
                        }

                        Some(Ok(Message::Binary(data))) => {
                            trace!(%id, len = data.len(), "Binary message received");
                            shared.emit(SocketEvent::Binary {
                                data: data.to_vec(),
                            });
                        }

                        Some(Ok(Message::Close(frame))) => {
                            let (code, reason) = frame.map_or(
                                (CLOSE_NO_STATUS, String::new()),
                                |f| (u16::from(f.code), f.reason.as_str().to_owned()),
                            );
                            debug!(%id, code, "WebSocket closed by remote");
                            shared.finish(ReadyState::Closed, code, reason);
                            break;
                        }

                        Some(Err(e)) => {
                            error!(%id, error = %e, "WebSocket error");
                            shared.fail(e.to_string());
                            break;
                        }

                        None => {
                            debug!(%id, "WebSocket stream ended");
                            shared.finish(ReadyState::Closed, CLOSE_ABNORMAL, String::new());
                            break;
                        }

                        // Ping is answered by tungstenite; Pong and raw frames are ignored
                        _ => {}
                    }
                }

                // Commands from the Rust API
                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Send(message)) => {
                            if let Err(e) = ws_write.send(message).await {
                                warn!(%id, error = %e, "Failed to send message");
                                shared.fail(format!("send failed: {e}"));
                                break;
                            }
                            trace!(%id, "Message sent");
                        }

                        Some(ConnectionCommand::Close { code, reason }) => {
                            debug!(%id, code, "Close requested");
                            let frame = CloseFrame {
                                code: CloseCode::from(code),
                                reason: reason.clone().into(),
                            };
                            if let Err(e) = ws_write.send(Message::Close(Some(frame))).await {
                                debug!(%id, error = %e, "Failed to send close frame");
                            }
                            shared.finish(ReadyState::Closed, code, reason);
                            break;
                        }

                        None => {
                            debug!(%id, "All handles dropped");
                            let _ = ws_write.close().await;
                            shared.finish(ReadyState::Closed, CLOSE_NORMAL, String::new());
                            break;
                        }
                    }
                }
            }
        }

        debug!(%id, state = %shared.state(), "Event loop terminated");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::net::TcpListener;

    /// Listener that accepts TCP but never answers the handshake.
    async fn silent_listener() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let url = format!("ws://{}", listener.local_addr().expect("local addr"));
        (listener, url)
    }

    fn spawn_connection(url: String, options: &ConnectionOptions) -> Connection {
        Connection::spawn(&Handle::current(), url, options)
    }

    #[tokio::test]
    async fn test_starts_connecting() {
        let (_listener, url) = silent_listener().await;
        let connection = spawn_connection(url.clone(), &ConnectionOptions::default());

        assert_eq!(connection.state(), ReadyState::Connecting);
        assert_eq!(connection.url(), url);
        assert!(!connection.is_open());
    }

    #[tokio::test]
    async fn test_send_before_open_rejected() {
        let (_listener, url) = silent_listener().await;
        let connection = spawn_connection(url, &ConnectionOptions::default());

        let err = connection.send_text("too early").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidState {
                state: ReadyState::Connecting,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_handshake_timeout_errors() {
        let (_listener, url) = silent_listener().await;
        let options = ConnectionOptions::new().with_connect_timeout(Duration::from_millis(100));
        let connection = spawn_connection(url, &options);
        let mut events = connection.subscribe();

        let err = connection
            .wait_open_timeout(Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Connection { .. }), "got {err:?}");
        assert_eq!(connection.closed().await, ReadyState::Errored);

        let first = events.recv().await.expect("error event");
        assert!(matches!(first, SocketEvent::Error { ref message } if message.contains("timed out")));
        let second = events.recv().await.expect("close event");
        assert_eq!(
            second,
            SocketEvent::Close {
                code: CLOSE_ABNORMAL,
                reason: String::new()
            }
        );
    }

    #[tokio::test]
    async fn test_wait_open_timeout_shorter_than_handshake() {
        let (_listener, url) = silent_listener().await;
        let connection = spawn_connection(url, &ConnectionOptions::default());

        let err = connection
            .wait_open_timeout(Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(connection.state(), ReadyState::Connecting);
    }

    #[tokio::test]
    async fn test_close_before_open() {
        let (_listener, url) = silent_listener().await;
        let connection = spawn_connection(url, &ConnectionOptions::default());
        let mut events = connection.subscribe();

        connection.close_with(4000, "bye");
        assert_eq!(connection.state(), ReadyState::Closing);
        assert_eq!(connection.closed().await, ReadyState::Closed);

        let event = events.recv().await.expect("close event");
        assert_eq!(
            event,
            SocketEvent::Close {
                code: 4000,
                reason: "bye".into()
            }
        );
    }

    #[tokio::test]
    async fn test_close_twice_is_noop() {
        let (_listener, url) = silent_listener().await;
        let connection = spawn_connection(url, &ConnectionOptions::default());

        connection.close();
        connection.close();
        assert_eq!(connection.closed().await, ReadyState::Closed);

        connection.close();
        assert_eq!(connection.state(), ReadyState::Closed);
    }

    #[tokio::test]
    async fn test_refused_connection_errors() {
        let (listener, url) = silent_listener().await;
        drop(listener);

        let connection = spawn_connection(url, &ConnectionOptions::default());
        assert!(connection.wait_open().await.is_err());
        assert_eq!(connection.closed().await, ReadyState::Errored);
    }

    #[tokio::test]
    async fn test_debug_includes_state() {
        let (_listener, url) = silent_listener().await;
        let connection = spawn_connection(url, &ConnectionOptions::default());
        let debug = format!("{connection:?}");
        assert!(debug.contains("Connecting"));
        assert!(debug.contains(&connection.id().to_string()));
    }
}
