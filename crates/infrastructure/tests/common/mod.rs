//! Shared in-memory test stack: store engine, repositories, bus, writer and
//! relay wired the way production wiring would.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use person_application::create_person::CreatePersonUseCase;
use person_application::deadline::Deadline;
use person_application::relay::OutboxRelayProcessor;
use person_domain::capture::{ChangeBatch, ChangeRecord};
use person_domain::mappers::outbox as outbox_mapper;
use person_domain::mappers::person as person_mapper;
use person_domain::outbox::OutboxRecord;
use person_domain::outbox::OutboxRepository;
use person_domain::store::AttributeValue;
use person_infrastructure::capture::{CapturePump, CapturePumpConfig};
use person_infrastructure::config::ServiceConfig;
use person_infrastructure::messaging::MemoryEventBus;
use person_infrastructure::persistence::{
    MemoryStore, MemoryTable, StoreOutboxRepository, StorePersonRepository,
};

pub struct TestStack {
    pub config: ServiceConfig,
    pub store: MemoryStore,
    pub person_table: MemoryTable,
    pub outbox_table: MemoryTable,
    pub persons: Arc<StorePersonRepository>,
    pub outbox: Arc<StoreOutboxRepository>,
    pub bus: Arc<MemoryEventBus>,
    pub create_person: CreatePersonUseCase,
    pub processor: Arc<OutboxRelayProcessor>,
}

impl TestStack {
    pub fn new() -> Self {
        let config = ServiceConfig::default();
        let store = MemoryStore::new();
        let person_table = store.create_table(&config.person_table, person_mapper::ID);
        let outbox_table = store.create_table(&config.outbox_table, outbox_mapper::ID);

        let persons = Arc::new(StorePersonRepository::new(Arc::new(person_table.clone())));
        let outbox = Arc::new(StoreOutboxRepository::new(Arc::new(outbox_table.clone())));
        let bus = Arc::new(MemoryEventBus::new());

        let create_person =
            CreatePersonUseCase::new(Arc::new(store.clone()), persons.clone(), outbox.clone());
        let processor = Arc::new(OutboxRelayProcessor::new(
            bus.clone(),
            outbox.clone(),
            config.relay_config(),
        ));

        Self {
            config,
            store,
            person_table,
            outbox_table,
            persons,
            outbox,
            bus,
            create_person,
            processor,
        }
    }

    /// A fresh pump over the same store; creating a second one simulates a
    /// relay restart (its acknowledgment state starts empty).
    pub fn pump(&self) -> CapturePump {
        CapturePump::new(
            self.outbox.clone(),
            self.processor.clone(),
            CapturePumpConfig {
                poll_interval: Duration::from_millis(10),
                ..Default::default()
            },
        )
    }

    /// The outbox record belonging to `person_id`, read directly from the
    /// store.
    pub async fn outbox_record_for(&self, person_id: &str) -> Option<OutboxRecord> {
        let snapshots = self.outbox.snapshots().await.unwrap();
        snapshots
            .iter()
            .find(|item| {
                item.get(outbox_mapper::AGGREGATE_ID)
                    .and_then(AttributeValue::as_s)
                    == Some(person_id)
            })
            .map(|item| outbox_mapper::from_item(item).unwrap())
    }

    /// A capture batch carrying the current snapshot of every outbox record,
    /// the shape a stream engine would deliver.
    pub async fn capture_batch(&self) -> ChangeBatch {
        let records = self
            .outbox
            .snapshots()
            .await
            .unwrap()
            .into_iter()
            .map(|new_image| {
                let item_id = new_image
                    .get(outbox_mapper::ID)
                    .and_then(AttributeValue::as_s)
                    .unwrap()
                    .to_string();
                ChangeRecord { item_id, new_image }
            })
            .collect();
        ChangeBatch { records }
    }
}

pub fn deadline() -> Deadline {
    Deadline::after(Duration::from_secs(30))
}
