//! Store-backed outbox repository.
//!
//! The PENDING → SENT transition is a conditional update guarded by the
//! stored status still being PENDING; a lost race comes back as
//! `CasOutcome::PreconditionNotMet`, never as an error.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use person_domain::mappers::outbox as outbox_mapper;
use person_domain::outbox::{CasOutcome, OutboxRecord, OutboxRepository, OutboxStatus};
use person_domain::shared_kernel::{DomainError, Result};
use person_domain::store::{
    AttributeValue, Item, ItemStore, Precondition, TransactWriteItem, Update, WriteOutcome,
};

pub struct StoreOutboxRepository {
    table: Arc<dyn ItemStore>,
}

impl StoreOutboxRepository {
    pub fn new(table: Arc<dyn ItemStore>) -> Self {
        Self { table }
    }
}

#[async_trait]
impl OutboxRepository for StoreOutboxRepository {
    fn build_put_pending(&self, record: &OutboxRecord) -> TransactWriteItem {
        TransactWriteItem::ConditionalPut {
            table: self.table.table_name().to_string(),
            item: outbox_mapper::to_item(record),
            precondition: Precondition::AttributeNotExists(outbox_mapper::ID.to_string()),
        }
    }

    async fn mark_sent(&self, outbox_id: &str, now: DateTime<Utc>) -> Result<CasOutcome> {
        let guard = Precondition::FieldEquals(
            outbox_mapper::STATUS.to_string(),
            AttributeValue::s(OutboxStatus::Pending.as_str()),
        );
        let updates = vec![
            Update::Set(
                outbox_mapper::STATUS.to_string(),
                AttributeValue::s(OutboxStatus::Sent.as_str()),
            ),
            Update::Set(
                outbox_mapper::SENT_AT.to_string(),
                AttributeValue::s(now.to_rfc3339()),
            ),
            Update::Increment(outbox_mapper::ATTEMPTS.to_string(), 1),
        ];

        match self
            .table
            .update_if(outbox_id, guard, updates)
            .await
            .map_err(DomainError::from)?
        {
            WriteOutcome::Applied => Ok(CasOutcome::Applied),
            WriteOutcome::PreconditionNotMet => Ok(CasOutcome::PreconditionNotMet),
        }
    }

    async fn find_by_id(&self, outbox_id: &str) -> Result<Option<OutboxRecord>> {
        let Some(item) = self.table.get(outbox_id).await.map_err(DomainError::from)? else {
            return Ok(None);
        };
        Ok(Some(outbox_mapper::from_item(&item)?))
    }

    async fn count_pending(&self) -> Result<u64> {
        let items = self.table.scan().await.map_err(DomainError::from)?;
        Ok(items
            .iter()
            .filter(|item| {
                item.get(outbox_mapper::STATUS).and_then(AttributeValue::as_s)
                    == Some(OutboxStatus::Pending.as_str())
            })
            .count() as u64)
    }

    async fn snapshots(&self) -> Result<Vec<Item>> {
        self.table.scan().await.map_err(DomainError::from)
    }
}
