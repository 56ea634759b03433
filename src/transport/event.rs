//! Connection event notifications.
//!
//! Events are pushed from the connection's event loop to every subscriber
//! and to the optional [`EventHandler`].
//!
//! | Event | Emitted when |
//! |-------|--------------|
//! | `Open` | Handshake completed |
//! | `Text` / `Binary` | Data frame received |
//! | `Error` | Handshake or I/O failure |
//! | `Close` | Connection finished, always the last event |

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;

// ============================================================================
// Constants
// ============================================================================

/// Close code for a normal closure (RFC 6455 Section 7.4.1).
pub const CLOSE_NORMAL: u16 = 1000;

/// Close code reported when no close frame was received.
pub const CLOSE_ABNORMAL: u16 = 1006;

// ============================================================================
// Types
// ============================================================================

/// Event handler callback type.
///
/// Called on the event loop task for each event, before it is broadcast.
/// Must not block.
pub type EventHandler = Box<dyn Fn(&SocketEvent) + Send + Sync>;

// ============================================================================
// SocketEvent
// ============================================================================

/// A notification from a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SocketEvent {
    /// The connection is open.
    Open,

    /// A text message arrived.
    Text {
        /// Message payload.
        data: String,
    },

    /// A binary message arrived.
    Binary {
        /// Message payload.
        data: Vec<u8>,
    },

    /// The connection failed.
    Error {
        /// Failure description.
        message: String,
    },

    /// The connection is finished.
    Close {
        /// Close code.
        code: u16,
        /// Close reason, possibly empty.
        reason: String,
    },
}

impl SocketEvent {
    /// Returns `true` for the final event of a connection.
    #[inline]
    #[must_use]
    pub fn is_close(&self) -> bool {
        matches!(self, Self::Close { .. })
    }

    /// Returns the text payload, if this is a text message.
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { data } => Some(data),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
