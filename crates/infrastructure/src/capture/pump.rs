//! Polling change-capture pump.
//!
//! Stand-in for an external change-capture stream: scans the outbox store,
//! delivers batches of full attribute snapshots to the relay processor and
//! redelivers exactly the failed subset. Acknowledgment state is held in
//! memory only, so a restarted pump redelivers everything it cannot prove
//! processed, which keeps delivery at-least-once as the capture contract
//! requires. The relay's carried-status guard and CAS make that harmless.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use person_application::deadline::Deadline;
use person_application::relay::OutboxRelayProcessor;
use person_domain::capture::{ChangeBatch, ChangeRecord, RelayBatchResult};
use person_domain::mappers::outbox as outbox_mapper;
use person_domain::outbox::OutboxRepository;
use person_domain::shared_kernel::Result;
use person_domain::store::AttributeValue;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Configuration for the capture pump.
#[derive(Debug, Clone)]
pub struct CapturePumpConfig {
    /// Maximum number of snapshots delivered in a single batch
    pub batch_size: usize,
    /// How often to poll the outbox store
    pub poll_interval: Duration,
    /// Deadline budget handed to the relay per batch
    pub batch_budget: Duration,
}

impl Default for CapturePumpConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            poll_interval: Duration::from_millis(500),
            batch_budget: Duration::from_secs(30),
        }
    }
}

pub struct CapturePump {
    outbox: Arc<dyn OutboxRepository>,
    processor: Arc<OutboxRelayProcessor>,
    config: CapturePumpConfig,
    acked: Mutex<HashSet<String>>,
    shutdown: broadcast::Sender<()>,
}

impl CapturePump {
    pub fn new(
        outbox: Arc<dyn OutboxRepository>,
        processor: Arc<OutboxRelayProcessor>,
        config: CapturePumpConfig,
    ) -> Self {
        let (shutdown, _) = broadcast::channel(1);
        Self {
            outbox,
            processor,
            config,
            acked: Mutex::new(HashSet::new()),
            shutdown,
        }
    }

    /// One poll cycle: builds a batch of not-yet-acknowledged snapshots and
    /// relays it. Failed items stay unacknowledged and reappear in a later
    /// batch; everything else is considered durably processed.
    pub async fn poll_once(&self) -> Result<RelayBatchResult> {
        let snapshots = self.outbox.snapshots().await?;

        let mut records = Vec::new();
        {
            let acked = self.acked.lock().unwrap();
            for new_image in snapshots {
                let Some(id) = new_image
                    .get(outbox_mapper::ID)
                    .and_then(AttributeValue::as_s)
                    .map(str::to_string)
                else {
                    continue;
                };
                if acked.contains(&id) {
                    continue;
                }
                records.push(ChangeRecord {
                    item_id: id,
                    new_image,
                });
                if records.len() >= self.config.batch_size {
                    break;
                }
            }
        }

        if records.is_empty() {
            return Ok(RelayBatchResult::default());
        }

        let delivered: Vec<String> = records.iter().map(|r| r.item_id.clone()).collect();
        info!(batch = delivered.len(), "📦 delivering capture batch");

        let result = self
            .processor
            .process_batch(
                ChangeBatch { records },
                Deadline::after(self.config.batch_budget),
            )
            .await;

        let mut acked = self.acked.lock().unwrap();
        for item_id in delivered {
            if !result.failed_item_ids.contains(&item_id) {
                acked.insert(item_id);
            }
        }

        Ok(result)
    }

    /// Runs the pump until [`shutdown`] is called.
    ///
    /// [`shutdown`]: CapturePump::shutdown
    pub async fn run(&self) {
        info!("🚀 capture pump starting");
        let mut shutdown = self.shutdown.subscribe();

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("capture pump shutting down");
                    return;
                }
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }

            match self.poll_once().await {
                Ok(result) if !result.all_succeeded() => {
                    warn!(
                        failed = result.failed_item_ids.len(),
                        "items deferred for redelivery"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, "capture poll failed");
                }
            }
        }
    }

    pub fn shutdown(&self) {
        // Nothing to do when the run loop was never started.
        let _ = self.shutdown.send(());
    }
}
