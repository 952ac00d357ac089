//! In-Memory EventBus - TEST ONLY
//!
//! Records accepted entries and supports per-entry and transport-level
//! failure injection, so tests can exercise the relay's failure isolation
//! without a running bus.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use person_domain::event_bus::{
    EventBus, EventBusError, EventEntry, EventEntryResult, PutEventsResponse,
};
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryEventBus {
    published: Mutex<Vec<EventEntry>>,
    rejected_resources: Mutex<HashSet<String>>,
    fail_transport: AtomicBool,
}

impl MemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects any entry referencing `resource` with a per-entry error.
    pub fn reject_resource(&self, resource: &str) {
        self.rejected_resources
            .lock()
            .unwrap()
            .insert(resource.to_string());
    }

    pub fn clear_rejections(&self) {
        self.rejected_resources.lock().unwrap().clear();
    }

    /// Makes the next requests fail at the transport level.
    pub fn fail_transport(&self, fail: bool) {
        self.fail_transport.store(fail, Ordering::SeqCst);
    }

    /// Entries accepted so far, in publish order.
    pub fn published(&self) -> Vec<EventEntry> {
        self.published.lock().unwrap().clone()
    }

    pub fn published_count(&self) -> usize {
        self.published.lock().unwrap().len()
    }
}

#[async_trait]
impl EventBus for MemoryEventBus {
    async fn put_events(
        &self,
        entries: Vec<EventEntry>,
    ) -> Result<PutEventsResponse, EventBusError> {
        if self.fail_transport.load(Ordering::SeqCst) {
            return Err(EventBusError::Connection(
                "injected transport failure".to_string(),
            ));
        }

        let rejected = self.rejected_resources.lock().unwrap().clone();
        let mut results = Vec::with_capacity(entries.len());
        let mut failed_entry_count = 0;

        for entry in entries {
            let is_rejected = entry.resources.iter().any(|r| rejected.contains(r));
            if is_rejected {
                failed_entry_count += 1;
                results.push(EventEntryResult::rejected(
                    "InternalFailure",
                    "injected entry failure",
                ));
            } else {
                results.push(EventEntryResult::accepted(Uuid::new_v4().to_string()));
                self.published.lock().unwrap().push(entry);
            }
        }

        Ok(PutEventsResponse {
            failed_entry_count,
            entries: results,
        })
    }
}
