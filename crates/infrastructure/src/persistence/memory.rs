//! In-memory conditional key-value store engine.
//!
//! Provides the same conditional-write and multi-item transaction semantics
//! as the production store, backed by process memory. A single engine mutex
//! makes `transact_write` genuinely all-or-nothing: preconditions for every
//! item are checked against a consistent snapshot before anything is applied.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use person_domain::store::{
    AttributeValue, Item, ItemStore, Precondition, StoreError, TransactWrite, TransactWriteItem,
    Update, WriteOutcome,
};

#[derive(Default)]
struct Tables {
    tables: HashMap<String, Table>,
}

struct Table {
    key_attribute: String,
    items: HashMap<String, Item>,
}

/// The engine. Cheap to clone; clones share the same tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table keyed by `key_attribute` and returns its handle.
    /// Creating an existing table is a no-op returning a fresh handle.
    pub fn create_table(&self, name: &str, key_attribute: &str) -> MemoryTable {
        let mut inner = self.inner.lock().unwrap();
        inner.tables.entry(name.to_string()).or_insert_with(|| Table {
            key_attribute: key_attribute.to_string(),
            items: HashMap::new(),
        });
        MemoryTable {
            name: name.to_string(),
            store: self.clone(),
        }
    }
}

impl Tables {
    fn table(&mut self, name: &str) -> Result<&mut Table, StoreError> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| StoreError::TableNotFound(name.to_string()))
    }

    fn check_put(
        &mut self,
        table: &str,
        item: &Item,
        precondition: &Precondition,
    ) -> Result<WriteOutcome, StoreError> {
        let table_name = table.to_string();
        let table = self.table(table)?;
        let key = item
            .get(&table.key_attribute)
            .and_then(AttributeValue::as_s)
            .ok_or(StoreError::MissingKey { table: table_name })?;

        if precondition.holds(table.items.get(key)) {
            Ok(WriteOutcome::Applied)
        } else {
            Ok(WriteOutcome::PreconditionNotMet)
        }
    }

    fn apply_put(&mut self, table: &str, item: Item) -> Result<(), StoreError> {
        let table_name = table.to_string();
        let table = self.table(table)?;
        let key = item
            .get(&table.key_attribute)
            .and_then(AttributeValue::as_s)
            .ok_or(StoreError::MissingKey { table: table_name })?
            .to_string();
        table.items.insert(key, item);
        Ok(())
    }

    fn check_update(
        &mut self,
        table: &str,
        key: &str,
        precondition: &Precondition,
    ) -> Result<WriteOutcome, StoreError> {
        let table = self.table(table)?;
        if precondition.holds(table.items.get(key)) {
            Ok(WriteOutcome::Applied)
        } else {
            Ok(WriteOutcome::PreconditionNotMet)
        }
    }

    fn apply_update(
        &mut self,
        table: &str,
        key: &str,
        updates: &[Update],
    ) -> Result<(), StoreError> {
        let table = self.table(table)?;
        let key_attribute = table.key_attribute.clone();
        let item = table.items.entry(key.to_string()).or_insert_with(|| {
            let mut item = Item::new();
            item.insert(key_attribute, AttributeValue::s(key));
            item
        });

        for update in updates {
            match update {
                Update::Set(name, value) => {
                    item.insert(name.clone(), value.clone());
                }
                Update::Increment(name, delta) => {
                    // A missing attribute counts as zero.
                    let current = item.get(name).and_then(AttributeValue::as_n).unwrap_or(0);
                    item.insert(name.clone(), AttributeValue::n(current + delta));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TransactWrite for MemoryStore {
    async fn transact_write(&self, items: Vec<TransactWriteItem>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();

        // Check every precondition against the same snapshot first; nothing
        // is applied unless all of them hold.
        for (index, entry) in items.iter().enumerate() {
            let outcome = match entry {
                TransactWriteItem::ConditionalPut {
                    table,
                    item,
                    precondition,
                } => inner.check_put(table, item, precondition)?,
                TransactWriteItem::ConditionalUpdate {
                    table,
                    key,
                    precondition,
                    ..
                } => inner.check_update(table, key, precondition)?,
            };
            if outcome == WriteOutcome::PreconditionNotMet {
                return Err(StoreError::TransactCancelled { index });
            }
        }

        for entry in items {
            match entry {
                TransactWriteItem::ConditionalPut { table, item, .. } => {
                    inner.apply_put(&table, item)?;
                }
                TransactWriteItem::ConditionalUpdate {
                    table, key, updates, ..
                } => {
                    inner.apply_update(&table, &key, &updates)?;
                }
            }
        }
        Ok(())
    }
}

/// Handle to one table of a [`MemoryStore`].
#[derive(Clone)]
pub struct MemoryTable {
    name: String,
    store: MemoryStore,
}

#[async_trait]
impl ItemStore for MemoryTable {
    fn table_name(&self) -> &str {
        &self.name
    }

    async fn put(
        &self,
        item: Item,
        precondition: Precondition,
    ) -> Result<WriteOutcome, StoreError> {
        let mut inner = self.store.inner.lock().unwrap();
        match inner.check_put(&self.name, &item, &precondition)? {
            WriteOutcome::Applied => {
                inner.apply_put(&self.name, item)?;
                Ok(WriteOutcome::Applied)
            }
            WriteOutcome::PreconditionNotMet => Ok(WriteOutcome::PreconditionNotMet),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<Item>, StoreError> {
        let mut inner = self.store.inner.lock().unwrap();
        Ok(inner.table(&self.name)?.items.get(key).cloned())
    }

    async fn update_if(
        &self,
        key: &str,
        precondition: Precondition,
        updates: Vec<Update>,
    ) -> Result<WriteOutcome, StoreError> {
        let mut inner = self.store.inner.lock().unwrap();
        match inner.check_update(&self.name, key, &precondition)? {
            WriteOutcome::Applied => {
                inner.apply_update(&self.name, key, &updates)?;
                Ok(WriteOutcome::Applied)
            }
            WriteOutcome::PreconditionNotMet => Ok(WriteOutcome::PreconditionNotMet),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut inner = self.store.inner.lock().unwrap();
        inner.table(&self.name)?.items.remove(key);
        Ok(())
    }

    async fn scan(&self) -> Result<Vec<Item>, StoreError> {
        let mut inner = self.store.inner.lock().unwrap();
        Ok(inner.table(&self.name)?.items.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(key: &str, status: &str) -> Item {
        let mut item = Item::new();
        item.insert("Id".to_string(), AttributeValue::s(key));
        item.insert("status".to_string(), AttributeValue::s(status));
        item
    }

    fn not_exists() -> Precondition {
        Precondition::AttributeNotExists("Id".to_string())
    }

    #[tokio::test]
    async fn conditional_put_rejects_duplicate_key() {
        let store = MemoryStore::new();
        let table = store.create_table("Persons", "Id");

        let first = table.put(item("p-1", "x"), not_exists()).await.unwrap();
        let second = table.put(item("p-1", "y"), not_exists()).await.unwrap();

        assert_eq!(first, WriteOutcome::Applied);
        assert_eq!(second, WriteOutcome::PreconditionNotMet);

        let stored = table.get("p-1").await.unwrap().unwrap();
        assert_eq!(
            stored.get("status").and_then(AttributeValue::as_s),
            Some("x")
        );
    }

    #[tokio::test]
    async fn update_if_is_a_cas() {
        let store = MemoryStore::new();
        let table = store.create_table("OutboxEvents", "Id");
        table.put(item("obx-1", "PENDING"), not_exists()).await.unwrap();

        let guard = Precondition::FieldEquals("status".to_string(), AttributeValue::s("PENDING"));
        let updates = vec![
            Update::Set("status".to_string(), AttributeValue::s("SENT")),
            Update::Increment("attempts".to_string(), 1),
        ];

        let first = table
            .update_if("obx-1", guard.clone(), updates.clone())
            .await
            .unwrap();
        let second = table.update_if("obx-1", guard, updates).await.unwrap();

        assert_eq!(first, WriteOutcome::Applied);
        assert_eq!(second, WriteOutcome::PreconditionNotMet);

        let stored = table.get("obx-1").await.unwrap().unwrap();
        assert_eq!(
            stored.get("status").and_then(AttributeValue::as_s),
            Some("SENT")
        );
        // Applied exactly once, starting from the missing-attribute zero.
        assert_eq!(
            stored.get("attempts").and_then(AttributeValue::as_n),
            Some(1)
        );
    }

    #[tokio::test]
    async fn transact_write_is_all_or_nothing() {
        let store = MemoryStore::new();
        let persons = store.create_table("Persons", "Id");
        let outbox = store.create_table("OutboxEvents", "Id");

        // Seed a conflicting outbox record so the second item fails.
        outbox.put(item("obx-1", "PENDING"), not_exists()).await.unwrap();

        let result = store
            .transact_write(vec![
                TransactWriteItem::ConditionalPut {
                    table: "Persons".to_string(),
                    item: item("p-1", "x"),
                    precondition: not_exists(),
                },
                TransactWriteItem::ConditionalPut {
                    table: "OutboxEvents".to_string(),
                    item: item("obx-1", "PENDING"),
                    precondition: not_exists(),
                },
            ])
            .await;

        assert!(matches!(
            result,
            Err(StoreError::TransactCancelled { index: 1 })
        ));
        // The first item must not have been written.
        assert!(persons.get("p-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn transact_write_applies_all_items_on_success() {
        let store = MemoryStore::new();
        let persons = store.create_table("Persons", "Id");
        let outbox = store.create_table("OutboxEvents", "Id");

        store
            .transact_write(vec![
                TransactWriteItem::ConditionalPut {
                    table: "Persons".to_string(),
                    item: item("p-1", "x"),
                    precondition: not_exists(),
                },
                TransactWriteItem::ConditionalPut {
                    table: "OutboxEvents".to_string(),
                    item: item("obx-1", "PENDING"),
                    precondition: not_exists(),
                },
            ])
            .await
            .unwrap();

        assert!(persons.get("p-1").await.unwrap().is_some());
        assert!(outbox.get("obx-1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_removes_the_item() {
        let store = MemoryStore::new();
        let table = store.create_table("Persons", "Id");
        table.put(item("p-1", "x"), not_exists()).await.unwrap();

        table.delete("p-1").await.unwrap();
        assert!(table.get("p-1").await.unwrap().is_none());
        // Deleting an absent key is a no-op.
        table.delete("p-1").await.unwrap();
    }

    #[tokio::test]
    async fn unknown_table_is_an_error() {
        let store = MemoryStore::new();
        let result = store
            .transact_write(vec![TransactWriteItem::ConditionalPut {
                table: "Nope".to_string(),
                item: item("p-1", "x"),
                precondition: Precondition::None,
            }])
            .await;

        assert!(matches!(result, Err(StoreError::TableNotFound(_))));
    }
}
