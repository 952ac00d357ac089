//! Outbox record model.
//!
//! An outbox record is created once, in the same atomic transaction as its
//! aggregate, observed any number of times by the relay and mutated at most
//! once (PENDING → SENT). It is never deleted by this core; expiry is
//! external housekeeping.

use chrono::{DateTime, Utc};

use crate::person::Person;
use crate::shared_kernel::OutboxId;

/// Event type emitted for person creation.
pub const EVENT_PERSON_CREATED: &str = "PersonCreated";
/// Aggregate type of person-owned events.
pub const AGGREGATE_PERSON: &str = "Person";

/// Status of an outbox record.
///
/// `Failed` is representable and decodable but never produced by the writer
/// or the relay; records stuck there belong to external housekeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboxStatus {
    Pending,
    Sent,
    Failed,
}

impl OutboxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Sent => "SENT",
            Self::Failed => "FAILED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(Self::Pending),
            "SENT" => Some(Self::Sent),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutboxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutboxRecord {
    pub id: OutboxId,
    pub event_type: String,
    pub aggregate_type: String,
    pub aggregate_id: String,
    /// Durable snapshot the bus receives; immutable once written.
    pub payload_json: String,
    pub status: OutboxStatus,
    pub occurred_at_utc: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    /// Incremented only on a successful CAS transition to SENT.
    pub attempts: i32,
    pub idempotency_key: Option<String>,
}

impl OutboxRecord {
    /// Builds the pending record for a freshly created person.
    pub fn person_created(person: &Person) -> Result<Self, serde_json::Error> {
        let payload_json = serde_json::to_string(&person.created_event())?;
        Ok(Self {
            id: OutboxId::generate(),
            event_type: EVENT_PERSON_CREATED.to_string(),
            aggregate_type: AGGREGATE_PERSON.to_string(),
            aggregate_id: person.id.as_str().to_string(),
            payload_json,
            status: OutboxStatus::Pending,
            occurred_at_utc: Utc::now(),
            sent_at: None,
            attempts: 0,
            idempotency_key: None,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.status == OutboxStatus::Pending
    }

    pub fn is_sent(&self) -> bool {
        self.status == OutboxStatus::Sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::person::NewPerson;

    fn person() -> Person {
        NewPerson {
            first_name: Some("Alexandre".to_string()),
            last_name: Some("Borges".to_string()),
            ..Default::default()
        }
        .into_person()
        .unwrap()
    }

    #[test]
    fn person_created_record_starts_pending() {
        let person = person();
        let record = OutboxRecord::person_created(&person).unwrap();

        assert!(record.is_pending());
        assert_eq!(record.event_type, "PersonCreated");
        assert_eq!(record.aggregate_type, "Person");
        assert_eq!(record.aggregate_id, person.id.as_str());
        assert_eq!(record.attempts, 0);
        assert!(record.sent_at.is_none());
    }

    #[test]
    fn payload_is_the_projection_json() {
        let record = OutboxRecord::person_created(&person()).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&record.payload_json).unwrap();

        assert_eq!(payload["firstName"], "Alexandre");
        assert_eq!(payload["lastName"], "Borges");
        assert!(payload.get("phoneNumber").is_none());
    }

    #[test]
    fn status_round_trips_through_wire_form() {
        for status in [OutboxStatus::Pending, OutboxStatus::Sent, OutboxStatus::Failed] {
            assert_eq!(OutboxStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OutboxStatus::parse("COMPLETED"), None);
    }
}
