//! Process-wide connection.
//!
//! One static [`ConnectionSlot`] backed by a default
//! [`TungsteniteProvider`]. Every call to [`acquire`] anywhere in the
//! process returns the same [`Connection`].
//!
//! The connection's event loop runs on the tokio runtime that was current
//! during the first successful `acquire`, so make that call from the
//! runtime that lives as long as the process.
//!
//! Code that needs its own options, or tests that need a fresh slot, should
//! build a [`ConnectionSlot`] directly instead.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::error::Result;
use crate::singleton::ConnectionSlot;
use crate::transport::{Connection, TungsteniteProvider};

// ============================================================================
// Slot
// ============================================================================

static SLOT: Lazy<ConnectionSlot<TungsteniteProvider>> = Lazy::new(ConnectionSlot::default);

// ============================================================================
// Public API
// ============================================================================

/// Returns the process-wide connection, opening it to `address` on first use.
///
/// Later calls return the same connection and ignore `address`.
///
/// # Errors
///
/// Provider errors from the first call are returned unchanged and leave the
/// slot empty:
///
/// - [`Error::InvalidAddress`](crate::Error::InvalidAddress) if `address` is not a WebSocket URL
/// - [`Error::Runtime`](crate::Error::Runtime) if called outside a tokio runtime
pub fn acquire(address: &str) -> Result<Arc<Connection>> {
    SLOT.acquire(address)
}

/// Returns the process-wide connection if one was acquired.
#[must_use]
pub fn current() -> Option<Arc<Connection>> {
    SLOT.get()
}

/// Returns the address the process-wide connection was opened with.
#[must_use]
pub fn address() -> Option<String> {
    SLOT.address()
}
