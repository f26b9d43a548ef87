//! Jury event types and broadcast bus
//!
//! Events are fire-and-forget notifications for SSE clients. They mirror the
//! live progress tracker and are never a source of truth.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Jury pipeline event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JuryEvent {
    /// New evaluation session created for a hackathon
    SessionCreated {
        session_id: Uuid,
        hackathon_id: Uuid,
        total_candidates: usize,
        timestamp: DateTime<Utc>,
    },

    /// A layer began processing its surviving candidates
    LayerStarted {
        session_id: Uuid,
        layer: u8,
        total_candidates: usize,
        timestamp: DateTime<Utc>,
    },

    /// A layer's results were committed
    LayerCompleted {
        session_id: Uuid,
        layer: u8,
        processed: usize,
        eliminated: usize,
        advanced: usize,
        timestamp: DateTime<Utc>,
    },

    /// A layer run aborted (load or persistence failure)
    LayerFailed {
        session_id: Uuid,
        layer: u8,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// Final layer aggregated; winners available
    SessionCompleted {
        session_id: Uuid,
        total_winners: usize,
        timestamp: DateTime<Utc>,
    },

    /// Session results wiped and returned to PENDING
    SessionReset {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },
}

impl JuryEvent {
    /// SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            JuryEvent::SessionCreated { .. } => "SessionCreated",
            JuryEvent::LayerStarted { .. } => "LayerStarted",
            JuryEvent::LayerCompleted { .. } => "LayerCompleted",
            JuryEvent::LayerFailed { .. } => "LayerFailed",
            JuryEvent::SessionCompleted { .. } => "SessionCompleted",
            JuryEvent::SessionReset { .. } => "SessionReset",
        }
    }

    /// Session the event belongs to
    pub fn session_id(&self) -> Uuid {
        match self {
            JuryEvent::SessionCreated { session_id, .. }
            | JuryEvent::LayerStarted { session_id, .. }
            | JuryEvent::LayerCompleted { session_id, .. }
            | JuryEvent::LayerFailed { session_id, .. }
            | JuryEvent::SessionCompleted { session_id, .. }
            | JuryEvent::SessionReset { session_id, .. } => *session_id,
        }
    }
}

/// Broadcast bus for [`JuryEvent`]s
///
/// Slow subscribers lose the oldest events once `capacity` is exceeded.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<JuryEvent>,
    capacity: usize,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<JuryEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring the case where nobody is listening
    pub fn emit_lossy(&self, event: JuryEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("No SSE subscribers for jury event");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let session_id = Uuid::new_v4();

        bus.emit_lossy(JuryEvent::SessionReset {
            session_id,
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.session_id(), session_id);
        assert_eq!(event.event_type(), "SessionReset");
    }

    #[test]
    fn test_emit_without_subscribers_is_harmless() {
        let bus = EventBus::new(4);
        bus.emit_lossy(JuryEvent::SessionCompleted {
            session_id: Uuid::new_v4(),
            total_winners: 0,
            timestamp: Utc::now(),
        });
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.capacity(), 4);
    }

    #[test]
    fn test_serialized_with_type_tag() {
        let event = JuryEvent::LayerStarted {
            session_id: Uuid::nil(),
            layer: 2,
            total_candidates: 7,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "LayerStarted");
        assert_eq!(json["layer"], 2);
    }
}
