//! NATS JetStream EventBus implementation.
//!
//! Publishes each entry to its own subject and maps the per-entry JetStream
//! acknowledgment onto the per-entry result contract: a rejected entry never
//! fails the whole request, only transport-level faults do.

use std::time::Duration;

use async_nats::jetstream::Context as JetStreamContext;
use async_nats::jetstream::stream::Config as StreamConfig;
use async_nats::ConnectOptions;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use person_domain::event_bus::{
    EventBus, EventBusError, EventEntry, EventEntryResult, PutEventsResponse,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// NATS connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NatsConfig {
    /// NATS server URLs
    #[serde(default = "default_urls")]
    pub urls: Vec<String>,
    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connection_timeout_secs: u64,
    /// Request timeout in seconds (None = no timeout)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: Option<u64>,
    /// Client connection name
    #[serde(default)]
    pub name: Option<String>,
    /// Subject prefix published entries land under
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
    /// Stream ensured to cover the subject prefix
    #[serde(default = "default_stream_name")]
    pub stream_name: String,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            urls: default_urls(),
            connection_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
            name: Some("person-service".to_string()),
            subject_prefix: default_subject_prefix(),
            stream_name: default_stream_name(),
        }
    }
}

fn default_urls() -> Vec<String> {
    vec!["nats://localhost:4222".to_string()]
}

const fn default_connect_timeout() -> u64 {
    5
}

fn default_request_timeout() -> Option<u64> {
    Some(30)
}

fn default_subject_prefix() -> String {
    "events".to_string()
}

fn default_stream_name() -> String {
    "PERSON_EVENTS".to_string()
}

/// Wire envelope for one published entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusEnvelope {
    pub detail_type: String,
    pub source: String,
    /// Opaque JSON detail, passed through untouched
    pub detail: String,
    pub resources: Vec<String>,
    pub time: DateTime<Utc>,
}

impl BusEnvelope {
    fn from_entry(entry: &EventEntry) -> Self {
        Self {
            detail_type: entry.detail_type.clone(),
            source: entry.source.clone(),
            detail: entry.detail_json.clone(),
            resources: entry.resources.clone(),
            time: entry.time,
        }
    }
}

pub struct NatsEventBus {
    jetstream: JetStreamContext,
    subject_prefix: String,
}

impl NatsEventBus {
    /// Connects to NATS and wraps the client in a JetStream context.
    pub async fn connect(config: &NatsConfig) -> Result<Self, EventBusError> {
        let mut options = ConnectOptions::new()
            .connection_timeout(Duration::from_secs(config.connection_timeout_secs));
        if let Some(secs) = config.request_timeout_secs {
            options = options.request_timeout(Some(Duration::from_secs(secs)));
        }
        if let Some(name) = &config.name {
            options = options.name(name);
        }

        let client = options
            .connect(config.urls.join(","))
            .await
            .map_err(|e| EventBusError::Connection(e.to_string()))?;

        Ok(Self {
            jetstream: async_nats::jetstream::new(client),
            subject_prefix: config.subject_prefix.clone(),
        })
    }

    /// Ensures a stream covering the configured subject prefix exists.
    pub async fn ensure_stream(&self, config: &NatsConfig) -> Result<(), EventBusError> {
        self.jetstream
            .get_or_create_stream(StreamConfig {
                name: config.stream_name.clone(),
                subjects: vec![format!("{}.>", self.subject_prefix).into()],
                ..Default::default()
            })
            .await
            .map_err(|e| EventBusError::Connection(e.to_string()))?;
        Ok(())
    }

    fn subject_for(&self, entry: &EventEntry) -> String {
        format!(
            "{}.{}.{}",
            self.subject_prefix, entry.source, entry.detail_type
        )
    }
}

#[async_trait]
impl EventBus for NatsEventBus {
    async fn put_events(
        &self,
        entries: Vec<EventEntry>,
    ) -> Result<PutEventsResponse, EventBusError> {
        let mut results = Vec::with_capacity(entries.len());
        let mut failed_entry_count = 0;

        for entry in entries {
            let subject = self.subject_for(&entry);
            let payload = match serde_json::to_vec(&BusEnvelope::from_entry(&entry)) {
                Ok(payload) => payload,
                Err(e) => {
                    failed_entry_count += 1;
                    results.push(EventEntryResult::rejected(
                        "SerializationError",
                        e.to_string(),
                    ));
                    continue;
                }
            };

            let ack = match self.jetstream.publish(subject.clone(), payload.into()).await {
                Ok(ack_future) => ack_future.await,
                Err(e) => Err(e),
            };

            match ack {
                Ok(ack) => {
                    debug!(
                        subject = %subject,
                        stream = %ack.stream,
                        sequence = ack.sequence,
                        "entry accepted by jetstream"
                    );
                    results.push(EventEntryResult::accepted(format!(
                        "{}:{}",
                        ack.stream, ack.sequence
                    )));
                }
                Err(e) => {
                    warn!(subject = %subject, error = %e, "jetstream publish failed");
                    failed_entry_count += 1;
                    results.push(EventEntryResult::rejected("PublishError", e.to_string()));
                }
            }
        }

        Ok(PutEventsResponse {
            failed_entry_count,
            entries: results,
        })
    }
}
