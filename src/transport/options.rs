//! Connection options.
//!
//! Provides a type-safe interface for tuning how the provider opens
//! connections.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use websock::ConnectionOptions;
//!
//! let options = ConnectionOptions::new()
//!     .with_connect_timeout(Duration::from_secs(5))
//!     .with_event_capacity(64)
//!     .with_max_message_size(1 << 20);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default handshake timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of buffered events per subscriber.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

// ============================================================================
// ConnectionOptions
// ============================================================================

/// Options applied to every connection a provider opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Maximum time allowed for the TCP connect plus WebSocket handshake.
    pub connect_timeout: Duration,

    /// Broadcast buffer size. Slow subscribers lag past this many events.
    pub event_capacity: usize,

    /// Maximum incoming message size. `None` keeps tungstenite's default.
    pub max_message_size: Option<usize>,

    /// Maximum incoming frame size. `None` keeps tungstenite's default.
    pub max_frame_size: Option<usize>,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ConnectionOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            max_message_size: None,
            max_frame_size: None,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ConnectionOptions {
    /// Sets the handshake timeout.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the event broadcast buffer size.
    #[inline]
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Sets the maximum incoming message size in bytes.
    #[inline]
    #[must_use]
    pub fn with_max_message_size(mut self, bytes: usize) -> Self {
        self.max_message_size = Some(bytes);
        self
    }

    /// Sets the maximum incoming frame size in bytes.
    #[inline]
    #[must_use]
    pub fn with_max_frame_size(mut self, bytes: usize) -> Self {
        self.max_frame_size = Some(bytes);
        self
    }
}

// ============================================================================
// Validation & Conversion
// ============================================================================

impl ConnectionOptions {
    /// Checks the options for values that can never work.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a zero timeout, zero event capacity,
    /// or a frame limit larger than the message limit.
    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout.is_zero() {
            return Err(Error::config("connect_timeout must be greater than zero"));
        }

        if self.event_capacity == 0 {
            return Err(Error::config("event_capacity must be greater than zero"));
        }

        if let (Some(message), Some(frame)) = (self.max_message_size, self.max_frame_size)
            && frame > message
        {
            return Err(Error::config(format!(
                "max_frame_size ({frame}) exceeds max_message_size ({message})"
            )));
        }

        Ok(())
    }

    /// Builds the tungstenite protocol configuration.
    #[must_use]
    pub(crate) fn websocket_config(&self) -> WebSocketConfig {
        let mut config = WebSocketConfig::default();
        if let Some(bytes) = self.max_message_size {
            config = config.max_message_size(Some(bytes));
        }
        if let Some(bytes) = self.max_frame_size {
            config = config.max_frame_size(Some(bytes));
        }
        config
    }

    /// Connect timeout in whole milliseconds, for error reporting.
    #[inline]
    pub(crate) fn connect_timeout_ms(&self) -> u64 {
        u64::try_from(self.connect_timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ConnectionOptions::default();
        assert_eq!(options.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(options.event_capacity, DEFAULT_EVENT_CAPACITY);
        assert!(options.max_message_size.is_none());
        assert!(options.max_frame_size.is_none());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let options = ConnectionOptions::new()
            .with_connect_timeout(Duration::from_millis(250))
            .with_event_capacity(8)
            .with_max_message_size(4096)
            .with_max_frame_size(1024);

        assert_eq!(options.connect_timeout, Duration::from_millis(250));
        assert_eq!(options.event_capacity, 8);
        assert_eq!(options.max_message_size, Some(4096));
        assert_eq!(options.max_frame_size, Some(1024));
        assert_eq!(options.connect_timeout_ms(), 250);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = ConnectionOptions::new()
            .with_connect_timeout(Duration::ZERO)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("connect_timeout"));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = ConnectionOptions::new()
            .with_event_capacity(0)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("event_capacity"));
    }

    #[test]
    fn test_frame_larger_than_message_rejected() {
        let result = ConnectionOptions::new()
            .with_max_message_size(10)
            .with_max_frame_size(20)
            .validate();
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_websocket_config_limits() {
        let config = ConnectionOptions::new()
            .with_max_message_size(2048)
            .with_max_frame_size(512)
            .websocket_config();
        assert_eq!(config.max_message_size, Some(2048));
        assert_eq!(config.max_frame_size, Some(512));
    }
}
