//! Outbox repository port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::outbox::OutboxRecord;
use crate::shared_kernel::Result;
use crate::store::{Item, TransactWriteItem};

/// Outcome of the conditional PENDING → SENT transition.
///
/// Losing the race against a concurrent duplicate delivery is an ordinary
/// branch of the state machine: the desired end state already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    /// This caller applied the transition.
    Applied,
    /// The record was no longer PENDING.
    PreconditionNotMet,
}

#[async_trait]
pub trait OutboxRepository: Send + Sync {
    /// Conditional put inserting `record` as PENDING, guarded by the record
    /// id not existing yet. Meant to run inside the writer's multi-item
    /// transaction next to the aggregate put.
    fn build_put_pending(&self, record: &OutboxRecord) -> TransactWriteItem;

    /// Conditional PENDING → SENT transition: sets the sent timestamp and
    /// increments the attempt counter only when the stored status is still
    /// PENDING. Once SENT the record is terminal and never mutated again.
    async fn mark_sent(&self, outbox_id: &str, now: DateTime<Utc>) -> Result<CasOutcome>;

    async fn find_by_id(&self, outbox_id: &str) -> Result<Option<OutboxRecord>>;

    /// Number of records still PENDING, for monitoring.
    async fn count_pending(&self) -> Result<u64>;

    /// Raw attribute snapshots of every stored record, for capture-style
    /// consumers that need the full item image.
    async fn snapshots(&self) -> Result<Vec<Item>>;
}
