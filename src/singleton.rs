//! Connection slot: at most one handle, acquired lazily.
//!
//! [`ConnectionSlot`] holds either nothing or exactly one handle produced by
//! its [`SocketProvider`]. The first successful [`ConnectionSlot::acquire`]
//! binds it; every later call returns that same handle and ignores its
//! address argument.
//!
//! ```text
//!   acquire(addr)
//!        │
//!   ┌────▼────┐  bound   ┌──────────────────────┐
//!   │  slot?  ├─────────►│ return bound handle  │
//!   └────┬────┘          └──────────────────────┘
//!        │ empty
//!   ┌────▼──────────────┐  Err  ┌──────────────────────────┐
//!   │ provider.open()   ├──────►│ return error, slot empty │
//!   └────┬──────────────┘       └──────────────────────────┘
//!        │ Ok
//!   ┌────▼──────────────┐
//!   │ store, return it  │
//!   └───────────────────┘
//! ```
//!
//! The check and the store happen under one lock, so concurrent first
//! callers on different threads still produce a single `open` call.
//!
//! A slot is an ordinary value. Hold it wherever the application keeps
//! shared context; [`crate::global`] keeps one in a static for callers that
//! want process-wide access.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::Result;
use crate::transport::SocketProvider;

// ============================================================================
// Bound
// ============================================================================

/// Contents of a bound slot.
struct Bound<H> {
    /// Address the handle was opened with.
    address: String,
    handle: Arc<H>,
}

// ============================================================================
// ConnectionSlot
// ============================================================================

/// Holds at most one connection handle for its whole lifetime.
///
/// Once bound, the slot is never replaced or emptied. Callers receive
/// `Arc` clones of the stored handle; the slot keeps its own reference, so
/// the handle outlives every caller's copy.
pub struct ConnectionSlot<P: SocketProvider> {
    provider: P,
    slot: Mutex<Option<Bound<P::Handle>>>,
}

impl<P: SocketProvider> ConnectionSlot<P> {
    /// Creates an empty slot backed by `provider`.
    #[must_use]
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            slot: Mutex::new(None),
        }
    }

    /// Returns the bound handle, opening it with `address` if the slot is
    /// empty.
    ///
    /// `address` only matters for the call that binds the slot. After that
    /// it is ignored, even if it differs from the bound address.
    ///
    /// # Errors
    ///
    /// Returns the provider's error unchanged. The slot stays empty, so a
    /// later call retries `open`.
    pub fn acquire(&self, address: &str) -> Result<Arc<P::Handle>> {
        let mut slot = self.slot.lock();

        if let Some(bound) = slot.as_ref() {
            if bound.address != address {
                debug!(
                    bound = %bound.address,
                    requested = %address,
                    "Slot already bound, requested address ignored"
                );
            }
            return Ok(Arc::clone(&bound.handle));
        }

        let handle = Arc::new(self.provider.open(address)?);
        *slot = Some(Bound {
            address: address.to_owned(),
            handle: Arc::clone(&handle),
        });

        Ok(handle)
    }

    /// Returns the bound handle without opening one.
    #[must_use]
    pub fn get(&self) -> Option<Arc<P::Handle>> {
        self.slot
            .lock()
            .as_ref()
            .map(|bound| Arc::clone(&bound.handle))
    }

    /// Returns `true` once a handle is stored.
    #[inline]
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Returns the address the slot was bound with.
    #[must_use]
    pub fn address(&self) -> Option<String> {
        self.slot.lock().as_ref().map(|bound| bound.address.clone())
    }

    /// Returns the provider backing this slot.
    #[inline]
    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P: SocketProvider + Default> Default for ConnectionSlot<P> {
    fn default() -> Self {
        Self::new(P::default())
    }
}

impl<P: SocketProvider> fmt::Debug for ConnectionSlot<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSlot")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
