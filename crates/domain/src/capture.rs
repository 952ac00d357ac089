//! Change-capture delivery contract.
//!
//! The capture source delivers batches of notifications, each carrying the
//! full attribute snapshot of a newly inserted outbox record. Delivery is
//! at-least-once and ordered only within a partition; the consumer reports
//! the failed subset of a batch so redelivery is scoped to exactly those
//! items.

use crate::store::Item;

/// One captured insert.
#[derive(Debug, Clone)]
pub struct ChangeRecord {
    /// Delivery identifier reported back on failure for scoped redelivery.
    pub item_id: String,
    /// Full attribute snapshot of the newly inserted record.
    pub new_image: Item,
}

/// A batch of captured inserts.
#[derive(Debug, Clone, Default)]
pub struct ChangeBatch {
    pub records: Vec<ChangeRecord>,
}

impl ChangeBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Items of a batch that did not reach a terminal or no-op outcome. Exactly
/// these are redelivered; everything else is considered durably processed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelayBatchResult {
    pub failed_item_ids: Vec<String>,
}

impl RelayBatchResult {
    pub fn all_succeeded(&self) -> bool {
        self.failed_item_ids.is_empty()
    }
}
