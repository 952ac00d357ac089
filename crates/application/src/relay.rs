//! Outbox Relay Processor
//!
//! Consumes change-capture batches, publishes eligible records to the event
//! bus and performs the conditional PENDING → SENT transition. Items are
//! processed independently: one item's failure never blocks the others, and
//! the batch result names exactly the items that need redelivery.
//!
//! Correctness under concurrent duplicate deliveries relies solely on the
//! CAS-guarded transition, never on mutual exclusion between instances.
//! A publish that succeeds right before a crash leaves the record PENDING;
//! it is retried only if the capture source redelivers it, which is the
//! at-least-once contract. There is no background sweep.

use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use person_domain::capture::{ChangeBatch, ChangeRecord, RelayBatchResult};
use person_domain::event_bus::{EventBus, EventEntry};
use person_domain::mappers::outbox as outbox_mapper;
use person_domain::outbox::{CasOutcome, OutboxRepository, OutboxStatus};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::deadline::Deadline;

/// Configuration for the relay processor.
///
/// The event source identity is injected at construction, never read from
/// the process environment at call time.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Source identifier stamped on every published entry.
    pub event_source: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            event_source: "person.service".to_string(),
        }
    }
}

enum ItemOutcome {
    Done,
    Retry(String),
}

pub struct OutboxRelayProcessor {
    event_bus: Arc<dyn EventBus>,
    outbox: Arc<dyn OutboxRepository>,
    config: RelayConfig,
}

impl OutboxRelayProcessor {
    pub fn new(
        event_bus: Arc<dyn EventBus>,
        outbox: Arc<dyn OutboxRepository>,
        config: RelayConfig,
    ) -> Self {
        Self {
            event_bus,
            outbox,
            config,
        }
    }

    /// Processes one capture batch and returns exactly the items that need
    /// redelivery. Item-level errors never propagate as a batch failure.
    pub async fn process_batch(&self, batch: ChangeBatch, deadline: Deadline) -> RelayBatchResult {
        let mut stream = batch
            .records
            .into_iter()
            .map(|record| self.process_record(record, deadline))
            .collect::<FuturesUnordered<_>>();

        let mut failed_item_ids = Vec::new();
        while let Some(outcome) = stream.next().await {
            if let ItemOutcome::Retry(item_id) = outcome {
                failed_item_ids.push(item_id);
            }
        }

        if !failed_item_ids.is_empty() {
            warn!(
                failed = failed_item_ids.len(),
                "batch items deferred for redelivery"
            );
        }

        RelayBatchResult { failed_item_ids }
    }

    async fn process_record(&self, record: ChangeRecord, deadline: Deadline) -> ItemOutcome {
        let ChangeRecord { item_id, new_image } = record;

        if deadline.expired() {
            // Untouched items stay PENDING and are simply redelivered.
            warn!(item_id = %item_id, "deadline margin reached, deferring item");
            return ItemOutcome::Retry(item_id);
        }

        let snapshot = match outbox_mapper::from_item(&new_image) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(item_id = %item_id, error = %e, "undecodable capture snapshot");
                return ItemOutcome::Retry(item_id);
            }
        };

        // Carried-status guard: a record already advanced by a prior delivery
        // of the same or a racing notification is a success, no side effect.
        if snapshot.status != OutboxStatus::Pending {
            debug!(
                outbox_id = %snapshot.id,
                status = %snapshot.status,
                "skipping record that is no longer pending"
            );
            return ItemOutcome::Done;
        }

        let entry = EventEntry {
            detail_type: snapshot.event_type.clone(),
            source: self.config.event_source.clone(),
            detail_json: snapshot.payload_json.clone(),
            resources: vec![snapshot.aggregate_id.clone()],
            time: Utc::now(),
        };

        let response = match timeout(
            deadline.remaining_until_margin(),
            self.event_bus.put_events(vec![entry]),
        )
        .await
        {
            Err(_) => {
                warn!(outbox_id = %snapshot.id, "deadline reached while publishing");
                return ItemOutcome::Retry(item_id);
            }
            Ok(Err(e)) => {
                warn!(outbox_id = %snapshot.id, error = %e, "event bus publish failed");
                return ItemOutcome::Retry(item_id);
            }
            Ok(Ok(response)) => response,
        };

        if response.failed_entry_count > 0 {
            let result = response.entries.first();
            warn!(
                outbox_id = %snapshot.id,
                error_code = result.and_then(|r| r.error_code.as_deref()).unwrap_or("unknown"),
                error_message = result.and_then(|r| r.error_message.as_deref()).unwrap_or(""),
                "bus rejected entry, leaving record pending"
            );
            return ItemOutcome::Retry(item_id);
        }

        match timeout(
            deadline.remaining_until_margin(),
            self.outbox.mark_sent(snapshot.id.as_str(), Utc::now()),
        )
        .await
        {
            Err(_) => {
                // Cancelled between publish and mark: the record stays
                // PENDING and the whole publish+mark sequence is retried.
                warn!(outbox_id = %snapshot.id, "deadline reached before mark-sent");
                ItemOutcome::Retry(item_id)
            }
            Ok(Ok(CasOutcome::Applied)) => {
                debug!(outbox_id = %snapshot.id, "record marked sent");
                ItemOutcome::Done
            }
            Ok(Ok(CasOutcome::PreconditionNotMet)) => {
                // Lost the race to a concurrent duplicate delivery; the
                // desired end state already holds.
                debug!(outbox_id = %snapshot.id, "mark-sent lost race, record already sent");
                ItemOutcome::Done
            }
            Ok(Err(e)) => {
                warn!(outbox_id = %snapshot.id, error = %e, "mark-sent failed");
                ItemOutcome::Retry(item_id)
            }
        }
    }
}
