//! Socket providers.
//!
//! A [`SocketProvider`] turns an address into a connection handle. The
//! singleton holder only ever talks to this trait, so tests can swap in a
//! closure and count calls.
//!
//! # Example
//!
//! ```ignore
//! use websock::{SocketProvider, TungsteniteProvider};
//!
//! let provider = TungsteniteProvider::default();
//! let connection = provider.open("ws://127.0.0.1:9001")?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use tokio::runtime::Handle;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

use super::connection::Connection;
use super::options::ConnectionOptions;

// ============================================================================
// SocketProvider
// ============================================================================

/// Opens connection handles.
///
/// `open` must not block. Providers that connect asynchronously return a
/// handle right away and report handshake failures through the handle.
pub trait SocketProvider: Send + Sync {
    /// Handle type produced by this provider.
    type Handle: Send + Sync;

    /// Opens a connection to `address`.
    ///
    /// # Errors
    ///
    /// Whatever the provider cannot do synchronously, e.g. a malformed
    /// address.
    fn open(&self, address: &str) -> Result<Self::Handle>;
}

impl<F, H> SocketProvider for F
where
    F: Fn(&str) -> Result<H> + Send + Sync,
    H: Send + Sync,
{
    type Handle = H;

    fn open(&self, address: &str) -> Result<H> {
        self(address)
    }
}

// ============================================================================
// TungsteniteProvider
// ============================================================================

/// Opens WebSocket client connections with tokio-tungstenite.
///
/// Each connection's event loop is spawned on the tokio runtime that is
/// current when [`SocketProvider::open`] is called.
#[derive(Debug, Clone, Default)]
pub struct TungsteniteProvider {
    options: ConnectionOptions,
}

impl TungsteniteProvider {
    /// Creates a provider with validated options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the options are invalid.
    pub fn new(options: ConnectionOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    /// Returns the options applied to new connections.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }
}

impl SocketProvider for TungsteniteProvider {
    type Handle = Connection;

    /// Validates `address` and starts connecting in the background.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidAddress`] if `address` is not a `ws://` or `wss://` URL
    /// - [`Error::Runtime`] if called outside a tokio runtime
    fn open(&self, address: &str) -> Result<Connection> {
        let url = parse_address(address)?;
        let runtime = Handle::try_current().map_err(|e| Error::runtime(e.to_string()))?;

        debug!(url = %url, "Provider opening connection");

        Ok(Connection::spawn(&runtime, address.to_owned(), &self.options))
    }
}

/// Parses and checks a WebSocket address.
fn parse_address(address: &str) -> Result<Url> {
    let url = Url::parse(address).map_err(|e| Error::invalid_address(address, e.to_string()))?;

    match url.scheme() {
        "ws" | "wss" => {}
        other => {
            return Err(Error::invalid_address(
                address,
                format!("unsupported scheme '{other}', expected ws or wss"),
            ));
        }
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(Error::invalid_address(address, "missing host"));
    }

    Ok(url)
}

// ============================================================================
// Tests
// ============================================================================
