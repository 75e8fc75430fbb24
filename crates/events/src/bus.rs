//! Change feed backed by a `tokio::sync::broadcast` channel.
//!
//! [`ChangeBus`] is the publish/subscribe hub for [`ChangeEvent`]s. It is
//! designed to be shared via `Arc<ChangeBus>` between the engine and any
//! number of views.

use serde::Serialize;
use tokio::sync::broadcast;
use waypoint_core::types::{DbId, FetchState};

// ---------------------------------------------------------------------------
// ChangeEvent
// ---------------------------------------------------------------------------

/// A change to the pin/photo graph that subscribers may want to render.
#[derive(Debug, Clone, Serialize)]
pub enum ChangeEvent {
    /// A pin's fetch lifecycle moved to a new state.
    PinStateChanged { pin_id: DbId, state: FetchState },

    /// A placeholder photo row was created.
    PhotoInserted { pin_id: DbId, photo_id: DbId },

    /// A photo's cached image became available.
    PhotoUpdated { pin_id: DbId, photo_id: DbId },

    /// A photo row was removed.
    PhotoRemoved { pin_id: DbId, photo_id: DbId },

    /// Every photo in the pin's collection finished loading.
    CollectionLoaded { pin_id: DbId, photo_count: i64 },
}

// ---------------------------------------------------------------------------
// ChangeBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out change bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`ChangeEvent`].
pub struct ChangeBus {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: ChangeEvent) {
        // Ignore the SendError — it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
