//! Event bus port.
//!
//! The bus accepts a list of entries and reports a per-entry accept/reject
//! result; a rejected entry never fails the whole request. Transport-level
//! failures surface as [`EventBusError`] instead.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventBusError {
    #[error("Failed to publish events: {0}")]
    Publish(String),
    #[error("Connection error: {0}")]
    Connection(String),
}

impl From<EventBusError> for crate::shared_kernel::DomainError {
    fn from(err: EventBusError) -> Self {
        Self::TransientBus {
            message: err.to_string(),
        }
    }
}

/// One entry of a publish request.
#[derive(Debug, Clone)]
pub struct EventEntry {
    pub detail_type: String,
    pub source: String,
    /// Opaque JSON detail; for outbox events this is the stored payload.
    pub detail_json: String,
    /// Referenced resources, e.g. the aggregate id.
    pub resources: Vec<String>,
    pub time: DateTime<Utc>,
}

/// Per-entry publish result: either an assigned event id or an error.
#[derive(Debug, Clone)]
pub struct EventEntryResult {
    pub event_id: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

impl EventEntryResult {
    pub fn accepted(event_id: impl Into<String>) -> Self {
        Self {
            event_id: Some(event_id.into()),
            error_code: None,
            error_message: None,
        }
    }

    pub fn rejected(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            event_id: None,
            error_code: Some(code.into()),
            error_message: Some(message.into()),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.error_code.is_none()
    }
}

/// Response to a publish request; `entries` matches the request order.
#[derive(Debug, Clone)]
pub struct PutEventsResponse {
    pub failed_entry_count: usize,
    pub entries: Vec<EventEntryResult>,
}

#[async_trait]
pub trait EventBus: Send + Sync {
    async fn put_events(
        &self,
        entries: Vec<EventEntry>,
    ) -> Result<PutEventsResponse, EventBusError>;
}
