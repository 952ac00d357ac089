//! Create Person with Transactional Outbox
//!
//! Atomic person creation: the person record and its PersonCreated outbox
//! record are persisted in one all-or-nothing transaction of two conditional
//! puts. The relay publishes the event afterwards; this use case never
//! touches the bus, which eliminates the dual-write problem:
//! - save() can no longer succeed while publish() fails
//! - either both records exist, or neither does

use std::sync::Arc;

use person_domain::outbox::{OutboxRecord, OutboxRepository};
use person_domain::person::{NewPerson, Person, PersonRepository};
use person_domain::shared_kernel::{DomainError, Result};
use person_domain::store::{StoreError, TransactWrite};
use tokio::time::timeout;
use tracing::debug;

use crate::deadline::Deadline;

pub struct CreatePersonUseCase {
    store: Arc<dyn TransactWrite>,
    persons: Arc<dyn PersonRepository>,
    outbox: Arc<dyn OutboxRepository>,
}

impl CreatePersonUseCase {
    pub fn new(
        store: Arc<dyn TransactWrite>,
        persons: Arc<dyn PersonRepository>,
        outbox: Arc<dyn OutboxRepository>,
    ) -> Self {
        Self {
            store,
            persons,
            outbox,
        }
    }

    /// Creates the person and its PENDING outbox record atomically.
    ///
    /// Validation happens before any store call. A duplicate id aborts the
    /// whole transaction with `DomainError::Conflict`; no partial state is
    /// ever observable. On success the persisted entity is re-read so the
    /// caller sees store-side normalization, not the local copy.
    pub async fn execute(&self, input: NewPerson, deadline: Deadline) -> Result<Person> {
        if deadline.expired() {
            return Err(DomainError::TransientStore {
                message: "deadline budget exhausted before write".to_string(),
            });
        }

        let person = input.into_person()?;
        let record = OutboxRecord::person_created(&person)?;

        let items = vec![
            self.persons.build_put_new(&person),
            self.outbox.build_put_pending(&record),
        ];

        match timeout(
            deadline.remaining_until_margin(),
            self.store.transact_write(items),
        )
        .await
        {
            // The transaction is all-or-nothing, so a cancelled call never
            // leaves partial state behind.
            Err(_) => {
                return Err(DomainError::TransientStore {
                    message: "deadline reached during transactional write".to_string(),
                });
            }
            Ok(Ok(())) => {}
            Ok(Err(StoreError::TransactCancelled { .. })) => {
                return Err(DomainError::Conflict {
                    id: person.id.to_string(),
                });
            }
            Ok(Err(other)) => return Err(other.into()),
        }

        debug!(
            person_id = %person.id,
            outbox_id = %record.id,
            event_type = %record.event_type,
            "person and outbox record persisted atomically"
        );

        self.persons
            .get(person.id.as_str())
            .await?
            .ok_or_else(|| DomainError::NotFound {
                id: person.id.to_string(),
            })
    }
}
