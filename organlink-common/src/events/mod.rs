//! Event types for the OrganLink event system
//!
//! Provides shared event definitions and the EventBus used by the
//! coordination server. Events are broadcast in-process and serialized
//! for SSE transmission to connected dashboards.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// OrganLink event types
///
/// Every state change a dashboard cares about flows through this enum so
/// SSE clients get one tagged stream instead of per-endpoint polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OrganLinkEvent {
    /// A donor registration was submitted (status starts at pending).
    DonorRegistered {
        donor_id: Uuid,
        blood_type: String,
        organs: Vec<String>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A recipient registration was submitted.
    RecipientRegistered {
        recipient_id: Uuid,
        blood_type: String,
        required_organ: String,
        urgency_level: i64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A hospital registration was submitted.
    HospitalRegistered {
        hospital_id: Uuid,
        name: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A doctor registration was submitted under an approved hospital.
    DoctorRegistered {
        doctor_id: Uuid,
        hospital_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An administrator approved or rejected a pending entity.
    ///
    /// Triggers:
    /// - SSE: refresh pending-approvals views
    /// - Ledger: hospital verification / donor badge minting side effects
    ApprovalDecided {
        entity_type: String,
        entity_id: Uuid,
        decision: String,
        reviewer: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A donor toggled their availability flag.
    DonorAvailabilityChanged {
        donor_id: Uuid,
        available: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The matching pass persisted a new pending match.
    ///
    /// Triggers:
    /// - SSE: update match lists and recent-matches dashboard
    MatchProposed {
        match_id: Uuid,
        donor_id: Uuid,
        recipient_id: Uuid,
        organ: String,
        score: i64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A pending match was marked completed.
    MatchCompleted {
        match_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A pending match was rejected.
    MatchRejected {
        match_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A match was written to the ledger and received a transaction hash.
    LedgerRecorded {
        match_id: Uuid,
        tx_hash: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl OrganLinkEvent {
    /// Get event type as string for filtering
    pub fn event_type(&self) -> &str {
        match self {
            OrganLinkEvent::DonorRegistered { .. } => "DonorRegistered",
            OrganLinkEvent::RecipientRegistered { .. } => "RecipientRegistered",
            OrganLinkEvent::HospitalRegistered { .. } => "HospitalRegistered",
            OrganLinkEvent::DoctorRegistered { .. } => "DoctorRegistered",
            OrganLinkEvent::ApprovalDecided { .. } => "ApprovalDecided",
            OrganLinkEvent::DonorAvailabilityChanged { .. } => "DonorAvailabilityChanged",
            OrganLinkEvent::MatchProposed { .. } => "MatchProposed",
            OrganLinkEvent::MatchCompleted { .. } => "MatchCompleted",
            OrganLinkEvent::MatchRejected { .. } => "MatchRejected",
            OrganLinkEvent::LedgerRecorded { .. } => "LedgerRecorded",
        }
    }
}

/// Broadcast channel carrying OrganLink events to all subscribers.
///
/// Slow subscribers that fall more than `capacity` events behind receive
/// a lag error and resume from the most recent event.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<OrganLinkEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<OrganLinkEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if none are listening.
    pub fn emit(
        &self,
        event: OrganLinkEvent,
    ) -> Result<usize, broadcast::error::SendError<OrganLinkEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: OrganLinkEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> OrganLinkEvent {
        OrganLinkEvent::MatchProposed {
            match_id: Uuid::new_v4(),
            donor_id: Uuid::new_v4(),
            recipient_id: Uuid::new_v4(),
            organ: "Kidney".to_string(),
            score: 90,
            timestamp: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn subscriber_receives_emitted_event() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit(sample_event()).unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.event_type(), "MatchProposed");
    }

    #[tokio::test]
    async fn all_subscribers_receive_each_event() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.emit(sample_event()).unwrap();

        assert_eq!(rx1.recv().await.unwrap().event_type(), "MatchProposed");
        assert_eq!(rx2.recv().await.unwrap().event_type(), "MatchProposed");
    }

    #[test]
    fn emit_without_subscribers_errors_but_lossy_does_not() {
        let bus = EventBus::new(16);
        assert!(bus.emit(sample_event()).is_err());
        bus.emit_lossy(sample_event());
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let event = OrganLinkEvent::MatchCompleted {
            match_id: Uuid::nil(),
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "MatchCompleted");
        assert_eq!(
            json["match_id"],
            "00000000-0000-0000-0000-000000000000"
        );
    }
}
