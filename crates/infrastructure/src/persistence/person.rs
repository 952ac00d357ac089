//! Store-backed person repository.

use std::sync::Arc;

use async_trait::async_trait;
use person_domain::mappers::person as person_mapper;
use person_domain::person::{Person, PersonRepository};
use person_domain::shared_kernel::{DomainError, Result};
use person_domain::store::{ItemStore, Precondition, TransactWriteItem};

pub struct StorePersonRepository {
    table: Arc<dyn ItemStore>,
}

impl StorePersonRepository {
    pub fn new(table: Arc<dyn ItemStore>) -> Self {
        Self { table }
    }
}

#[async_trait]
impl PersonRepository for StorePersonRepository {
    fn build_put_new(&self, person: &Person) -> TransactWriteItem {
        TransactWriteItem::ConditionalPut {
            table: self.table.table_name().to_string(),
            item: person_mapper::to_item(person),
            precondition: Precondition::AttributeNotExists(person_mapper::ID.to_string()),
        }
    }

    async fn get(&self, id: &str) -> Result<Option<Person>> {
        let Some(item) = self.table.get(id).await.map_err(DomainError::from)? else {
            return Ok(None);
        };
        Ok(Some(person_mapper::from_item(&item)?))
    }

    async fn list(&self) -> Result<Vec<Person>> {
        let items = self.table.scan().await.map_err(DomainError::from)?;
        items
            .iter()
            .map(|item| person_mapper::from_item(item).map_err(DomainError::from))
            .collect()
    }
}
