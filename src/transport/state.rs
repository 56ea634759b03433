//! Connection lifecycle state.
//!
//! ```text
//! Connecting ──► Open ──► Closing ──► Closed
//!     │           │  └──────────────► Closed   (remote close)
//!     │           └─────────────────► Errored
//!     ├─────────────────► Closing     (close before open)
//!     └─────────────────► Errored     (handshake failed)
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::Serialize;

// ============================================================================
// ReadyState
// ============================================================================

/// Lifecycle state of a connection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadyState {
    /// Handshake in progress.
    Connecting,
    /// Messages can be sent and received.
    Open,
    /// Close requested locally, close frame in flight.
    Closing,
    /// Closed cleanly, either side.
    Closed,
    /// Handshake or I/O failure.
    Errored,
}

impl ReadyState {
    /// Returns `true` once the connection can never carry messages again.
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Errored)
    }

    /// Returns `true` if a transition from `self` to `next` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Connecting, Self::Open | Self::Closing | Self::Errored)
                | (Self::Open, Self::Closing | Self::Closed | Self::Errored)
                | (Self::Closing, Self::Closed | Self::Errored)
        )
    }

    /// Lowercase name of the state.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
            Self::Errored => "errored",
        }
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(ReadyState::Closed.is_terminal());
        assert!(ReadyState::Errored.is_terminal());
        assert!(!ReadyState::Connecting.is_terminal());
        assert!(!ReadyState::Open.is_terminal());
        assert!(!ReadyState::Closing.is_terminal());
    }

    #[test]
    fn test_forward_transitions() {
        assert!(ReadyState::Connecting.can_transition_to(ReadyState::Open));
        assert!(ReadyState::Connecting.can_transition_to(ReadyState::Errored));
        assert!(ReadyState::Open.can_transition_to(ReadyState::Closing));
        assert!(ReadyState::Open.can_transition_to(ReadyState::Closed));
        assert!(ReadyState::Closing.can_transition_to(ReadyState::Closed));
    }

    #[test]
    fn test_no_way_back() {
        assert!(!ReadyState::Open.can_transition_to(ReadyState::Connecting));
        assert!(!ReadyState::Closed.can_transition_to(ReadyState::Open));
        assert!(!ReadyState::Errored.can_transition_to(ReadyState::Closed));
        assert!(!ReadyState::Open.can_transition_to(ReadyState::Open));
    }

    #[test]
    fn test_display() {
        assert_eq!(ReadyState::Connecting.to_string(), "connecting");
        assert_eq!(ReadyState::Errored.to_string(), "errored");
    }
}
