//! websock - One WebSocket connection per process.
//!
//! This library guarantees that however many call sites ask for a
//! connection, at most one socket is opened and every caller shares the
//! same handle.
//!
//! # Architecture
//!
//! - **Slot**: [`ConnectionSlot`] holds zero or one handle, bound once
//! - **Provider**: [`SocketProvider`] opens handles; [`TungsteniteProvider`]
//!   is the tokio-tungstenite client
//! - **Handle**: [`Connection`] owns the socket and a background event loop
//!
//! Key design principles:
//!
//! - Acquisition is lazy and idempotent; the first address wins
//! - Opening never blocks; handshake results arrive as state and events
//! - A failed `open` leaves the slot empty so the next call can retry
//!
//! # Quick Start
//!
//! ```no_run
//! use websock::{Result, SocketEvent};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let connection = websock::acquire("ws://127.0.0.1:9001")?;
//!     let mut events = connection.subscribe();
//!
//!     connection.wait_open().await?;
//!     connection.send_text("hello")?;
//!
//!     // Any other call site gets the same handle
//!     let same = websock::acquire("ws://ignored:1")?;
//!     assert_eq!(same.id(), connection.id());
//!
//!     while let Ok(event) = events.recv().await {
//!         if let SocketEvent::Text { data } = event {
//!             println!("received: {data}");
//!             break;
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`error`] | Error types and [`Result`] alias |
//! | [`global`] | Process-wide [`acquire`] |
//! | [`identifiers`] | [`ConnectionId`] |
//! | [`singleton`] | [`ConnectionSlot`] |
//! | [`transport`] | Provider, connection handle, events, options |
//!
//! # Features
//!
//! - `tls`: enables `wss://` through rustls with webpki roots

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Process-wide connection slot.
pub mod global;

/// Type-safe identifiers.
pub mod identifiers;

/// Lazy single-handle slot.
pub mod singleton;

/// WebSocket transport layer.
///
/// Socket provider, connection handle and its event loop.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Error types
pub use error::{Error, Result};

// Process-wide access
pub use global::{acquire, current};

// Identifier types
pub use identifiers::ConnectionId;

// Slot
pub use singleton::ConnectionSlot;

// Transport types
pub use transport::{
    Connection, ConnectionOptions, EventHandler, ReadyState, SocketEvent, SocketProvider,
    TungsteniteProvider,
};
