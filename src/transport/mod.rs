//! WebSocket transport layer.
//!
//! This module provides the socket provider consumed by the connection
//! slot, and the connection handle it produces.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐  open(address)  ┌─────────────────────┐
//! │  ConnectionSlot  │────────────────►│ TungsteniteProvider │
//! └──────────────────┘                 └──────────┬──────────┘
//!                                                 │ spawn
//!                                      ┌──────────▼──────────┐   WebSocket   ┌────────┐
//!                                      │ Connection + loop   │◄─────────────►│ Server │
//!                                      └─────────────────────┘               └────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `TungsteniteProvider::open` - Validate address, return handle in `Connecting`
//! 2. Event loop performs the handshake (bounded by `connect_timeout`)
//! 3. `Open` - Send messages, receive events
//! 4. `Connection::close` or remote close - `Closed`; failures end in `Errored`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Connection handle and event loop |
//! | `event` | Event notifications |
//! | `options` | Connection options |
//! | `provider` | `SocketProvider` trait and tungstenite provider |
//! | `state` | Lifecycle state |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection handle and event loop.
pub mod connection;

/// Connection event notifications.
pub mod event;

/// Connection options.
pub mod options;

/// Socket providers.
pub mod provider;

/// Connection lifecycle state.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::Connection;
pub use event::{CLOSE_ABNORMAL, CLOSE_NORMAL, EventHandler, SocketEvent};
pub use options::ConnectionOptions;
pub use provider::{SocketProvider, TungsteniteProvider};
pub use state::ReadyState;
