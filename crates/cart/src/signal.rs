//! Cross-tab change signaling.
//!
//! Whenever a mutation succeeds, the originating tab publishes a
//! [`CartChanged`] event and writes the sentinel key through the shared
//! persistence layer. Sibling tabs in server-authoritative mode re-fetch
//! the server cart when they observe a foreign event. Any transport
//! satisfying "a write wakes other observers" works; this implementation
//! uses a `tokio::sync::broadcast` channel.

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Default buffered event capacity per subscriber.
const DEFAULT_CAPACITY: usize = 16;

/// Identity of one tab (one `CartStore` instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabId(Uuid);

impl TabId {
    /// Generate a fresh tab identity.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A cart-changed notification. The payload carries only the origin (so
/// tabs can ignore their own writes) and a timestamp.
#[derive(Debug, Clone)]
pub struct CartChanged {
    pub origin: TabId,
    pub at: DateTime<Utc>,
}

/// Publish/subscribe bus shared by the tabs of one origin.
#[derive(Debug, Clone)]
pub struct SignalBus {
    tx: broadcast::Sender<CartChanged>,
}

impl SignalBus {
    /// Create a bus buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish a change event. Having no subscribers is not an error.
    pub fn publish(&self, origin: TabId) -> CartChanged {
        let event = CartChanged {
            origin,
            at: Utc::now(),
        };
        let _ = self.tx.send(event.clone());
        event
    }

    /// Subscribe to change events published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartChanged> {
        self.tx.subscribe()
    }

    /// Sentinel value written alongside each publish. Observers key off the
    /// change itself, not the content.
    #[must_use]
    pub fn sentinel_value(event: &CartChanged) -> String {
        event.at.timestamp_millis().to_string()
    }
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
