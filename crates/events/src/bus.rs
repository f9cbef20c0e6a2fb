//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`ZoneEvent`]s. It is
//! shared across the application inside the app state and lives for the
//! whole process.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use zonal_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Event kinds
// ---------------------------------------------------------------------------

/// Known event kinds, dot-separated so subscribers can route on prefixes.
pub mod kinds {
    pub const ZONE_CREATED: &str = "zone.created";
    pub const ZONE_UPDATED: &str = "zone.updated";
    pub const ZONE_DELETED: &str = "zone.deleted";
    pub const ZONE_LOCKED: &str = "zone.locked";
    pub const ZONE_RELEASED: &str = "zone.released";
    pub const CATEGORY_CREATED: &str = "category.created";
    pub const CATEGORY_DELETED: &str = "category.deleted";
}

// ---------------------------------------------------------------------------
// ZoneEvent
// ---------------------------------------------------------------------------

/// A domain event describing a committed change.
///
/// Constructed via [`ZoneEvent::new`] and enriched with the builder methods
/// [`with_zone`](ZoneEvent::with_zone), [`with_actor`](ZoneEvent::with_actor),
/// and [`with_payload`](ZoneEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneEvent {
    /// Dot-separated event name from [`kinds`], e.g. `"zone.created"`.
    pub event_type: String,

    /// The zone the event concerns, when there is one.
    pub zone_id: Option<DbId>,

    /// The category the event concerns (category lifecycle events only).
    pub category_id: Option<DbId>,

    /// Opaque id of the user whose request caused the event.
    pub actor: Option<String>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC), after its transaction committed.
    pub occurred_at: Timestamp,
}

impl ZoneEvent {
    /// Create a new event with only the required `event_type`.
    ///
    /// All optional fields default to `None` / empty object.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            zone_id: None,
            category_id: None,
            actor: None,
            payload: serde_json::Value::Object(Default::default()),
            occurred_at: chrono::Utc::now(),
        }
    }

    /// Attach the subject zone to the event.
    pub fn with_zone(mut self, zone_id: DbId) -> Self {
        self.zone_id = Some(zone_id);
        self
    }

    /// Attach the subject category to the event.
    pub fn with_category(mut self, category_id: DbId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Attach the acting user to the event.
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`ZoneEvent`].
///
/// # Usage
///
/// ```rust
/// use zonal_events::bus::{kinds, EventBus, ZoneEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(ZoneEvent::new(kinds::ZONE_CREATED).with_zone(42));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<ZoneEvent>,
}

impl EventBus {
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
    /// The committed mutation the event describes is unaffected either way.
    pub fn publish(&self, event: ZoneEvent) {
        // A SendError only means there are zero receivers right now.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<ZoneEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
