//! Key-value store ports.
//!
//! Conditional (precondition-guarded) writes are the only coordination
//! primitive the service relies on: per-id mutual exclusion on create and a
//! compare-and-swap on the outbox status transition. A failed precondition is
//! a typed outcome, not an error; callers decide what it means.

pub mod attribute;

pub use attribute::{AttributeValue, Item};

use async_trait::async_trait;

/// Precondition guarding a conditional write.
#[derive(Debug, Clone, PartialEq)]
pub enum Precondition {
    /// Always holds.
    None,
    /// The named attribute must exist on the stored item.
    AttributeExists(String),
    /// The named attribute must not exist (also holds when there is no item).
    AttributeNotExists(String),
    /// The named attribute must equal the given value.
    FieldEquals(String, AttributeValue),
}

impl Precondition {
    /// Evaluates this precondition against the currently stored item, if any.
    pub fn holds(&self, current: Option<&Item>) -> bool {
        match self {
            Self::None => true,
            Self::AttributeExists(name) => current.is_some_and(|item| item.contains_key(name)),
            Self::AttributeNotExists(name) => current.is_none_or(|item| !item.contains_key(name)),
            Self::FieldEquals(name, expected) => {
                current.and_then(|item| item.get(name)) == Some(expected)
            }
        }
    }
}

/// A single mutation applied by a conditional update.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// Sets the attribute to the given value.
    Set(String, AttributeValue),
    /// Adds to a number attribute, treating a missing attribute as zero.
    Increment(String, i64),
}

/// Outcome of a conditional write. The not-met branch is an ordinary value so
/// expected races never travel as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied,
    PreconditionNotMet,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("item is missing the key attribute of table {table}")]
    MissingKey { table: String },

    #[error("transaction cancelled: precondition failed for item {index}")]
    TransactCancelled { index: usize },

    #[error("transient store failure: {message}")]
    Transient { message: String },
}

impl From<StoreError> for crate::shared_kernel::DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Transient { message } => Self::TransientStore { message },
            other => Self::Infrastructure {
                message: other.to_string(),
            },
        }
    }
}

/// Handle to one table of the store.
#[async_trait]
pub trait ItemStore: Send + Sync {
    fn table_name(&self) -> &str;

    /// Conditional put of a full item, keyed by the table's key attribute.
    async fn put(&self, item: Item, precondition: Precondition)
    -> Result<WriteOutcome, StoreError>;

    async fn get(&self, key: &str) -> Result<Option<Item>, StoreError>;

    /// Conditional in-place update; the mutations apply only when the
    /// precondition holds against the current item.
    async fn update_if(
        &self,
        key: &str,
        precondition: Precondition,
        updates: Vec<Update>,
    ) -> Result<WriteOutcome, StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Full snapshot of the table.
    async fn scan(&self) -> Result<Vec<Item>, StoreError>;
}

/// One element of a multi-item transaction.
#[derive(Debug, Clone)]
pub enum TransactWriteItem {
    ConditionalPut {
        table: String,
        item: Item,
        precondition: Precondition,
    },
    ConditionalUpdate {
        table: String,
        key: String,
        precondition: Precondition,
        updates: Vec<Update>,
    },
}

/// Multi-item, all-or-nothing transaction across tables.
#[async_trait]
pub trait TransactWrite: Send + Sync {
    /// Applies every item atomically. If any precondition fails the whole
    /// transaction aborts with [`StoreError::TransactCancelled`] and no item
    /// is persisted.
    async fn transact_write(&self, items: Vec<TransactWriteItem>) -> Result<(), StoreError>;
}
