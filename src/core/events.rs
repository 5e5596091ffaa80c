//! Console lifecycle events
//!
//! The EventBus lets page code observe what the controller did (a modal
//! opened, a save went through, the session expired) without hooking into
//! the controller itself. It uses `tokio::sync::broadcast`, so any number of
//! observers can subscribe and publishing never blocks.
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut rx = console.events().subscribe();
//! console.open_create("client").await?;
//!
//! if let Ok(envelope) = rx.try_recv() {
//!     println!("{}", envelope.event.name());
//! }
//! ```

use crate::core::entity::{EntityName, FormMode, RecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Something observable the controller did
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConsoleEvent {
    /// A fresh form fragment was installed in the entity modal
    ModalOpened {
        entity: EntityName,
        id: Option<RecordId>,
        mode: FormMode,
    },
    /// The server answered a submission with a new fragment
    ModalRerendered { entity: Option<EntityName> },
    /// The entity modal was hidden
    ModalClosed,
    /// The server accepted a create/update
    SubmissionSaved {
        entity: Option<EntityName>,
        mode: FormMode,
    },
    /// The server reported field errors
    FieldErrorsReported { fields: Vec<String> },
    /// The server refused with an explanation
    SubmissionRejected { message: String },
    /// The session is gone; the login overlay was shown
    AuthenticationRequired { status: Option<u16> },
    /// A record was deleted
    RecordDeleted { entity: EntityName, id: RecordId },
    /// A response arrived after a newer request had started
    StaleResponseDropped { generation: u64, current: u64 },
    /// The server attached a warning to a fragment
    ServerWarning { message: String },
    /// The login overlay succeeded
    LoggedIn { redirect_url: String },
}

impl ConsoleEvent {
    /// Short machine name of the event
    pub fn name(&self) -> &'static str {
        match self {
            ConsoleEvent::ModalOpened { .. } => "modal_opened",
            ConsoleEvent::ModalRerendered { .. } => "modal_rerendered",
            ConsoleEvent::ModalClosed => "modal_closed",
            ConsoleEvent::SubmissionSaved { .. } => "submission_saved",
            ConsoleEvent::FieldErrorsReported { .. } => "field_errors_reported",
            ConsoleEvent::SubmissionRejected { .. } => "submission_rejected",
            ConsoleEvent::AuthenticationRequired { .. } => "authentication_required",
            ConsoleEvent::RecordDeleted { .. } => "record_deleted",
            ConsoleEvent::StaleResponseDropped { .. } => "stale_response_dropped",
            ConsoleEvent::ServerWarning { .. } => "server_warning",
            ConsoleEvent::LoggedIn { .. } => "logged_in",
        }
    }

    /// The entity this event relates to, when known
    pub fn entity(&self) -> Option<&EntityName> {
        match self {
            ConsoleEvent::ModalOpened { entity, .. } | ConsoleEvent::RecordDeleted { entity, .. } => {
                Some(entity)
            }
            ConsoleEvent::ModalRerendered { entity } | ConsoleEvent::SubmissionSaved { entity, .. } => {
                entity.as_ref()
            }
            _ => None,
        }
    }
}

/// Envelope wrapping a console event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: ConsoleEvent,
}

impl EventEnvelope {
    pub fn new(event: ConsoleEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Broadcast-based event bus
///
/// The bus is cheap to clone (Arc internally).
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    ///
    /// The capacity determines how many events can be buffered before
    /// slow receivers start losing events (lagged).
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers
    ///
    /// Never fails: with no subscribers the event is simply dropped.
    /// Returns the number of receivers that will receive the event.
    pub fn publish(&self, event: ConsoleEvent) -> usize {
        tracing::trace!(event = event.name(), "publishing console event");
        let envelope = EventEnvelope::new(event);
        self.sender.send(envelope).unwrap_or(0)
    }

    /// Subscribe to events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> EntityName {
        EntityName::parse("client").unwrap()
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = ConsoleEvent::ModalOpened {
            entity: client(),
            id: RecordId::parse("42"),
            mode: FormMode::Update,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "modal_opened");
        assert_eq!(json["entity"], "client");
        assert_eq!(json["id"], "42");
        assert_eq!(json["mode"], "update");
    }

    #[test]
    fn test_event_entity_accessor() {
        let deleted = ConsoleEvent::RecordDeleted {
            entity: client(),
            id: RecordId::parse("1").unwrap(),
        };
        assert_eq!(deleted.entity(), Some(&client()));
        assert_eq!(ConsoleEvent::ModalClosed.entity(), None);
        assert_eq!(deleted.name(), "record_deleted");
    }

    #[tokio::test]
    async fn test_event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        let receivers = bus.publish(ConsoleEvent::ModalClosed);
        assert_eq!(receivers, 1);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.event, ConsoleEvent::ModalClosed);
        assert!(!received.id.is_nil());
    }

    #[test]
    fn test_event_bus_publish_without_subscribers() {
        let bus = EventBus::default();
        assert_eq!(bus.publish(ConsoleEvent::ModalClosed), 0);
    }

    #[test]
    fn test_event_bus_clone_shares_channel() {
        let bus = EventBus::new(16);
        let _rx = bus.subscribe();
        let bus2 = bus.clone();
        assert_eq!(bus2.receiver_count(), 1);
    }
}
