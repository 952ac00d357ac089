//! Service configuration.
//!
//! Layered sources: serde defaults, optional `config/{default,<RUN_MODE>}`
//! files, then `PERSON_`-prefixed environment variables. Consumers receive
//! explicit values (table names, bus identity, relay tuning) at
//! construction; nothing reads the environment at call time.

use std::env;

use person_application::relay::RelayConfig;
use serde::Deserialize;

use crate::capture::CapturePumpConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_person_table")]
    pub person_table: String,
    #[serde(default = "default_outbox_table")]
    pub outbox_table: String,
    #[serde(default = "default_event_bus_name")]
    pub event_bus_name: String,
    #[serde(default = "default_event_source")]
    pub event_source: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_relay_batch_size")]
    pub relay_batch_size: usize,
    #[serde(default = "default_relay_poll_interval_ms")]
    pub relay_poll_interval_ms: u64,
    #[serde(default = "default_relay_batch_budget_ms")]
    pub relay_batch_budget_ms: u64,
}

fn default_person_table() -> String {
    "Persons".to_string()
}

fn default_outbox_table() -> String {
    "OutboxEvents".to_string()
}

fn default_event_bus_name() -> String {
    "Person-dev-bus".to_string()
}

fn default_event_source() -> String {
    "person.service".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_relay_batch_size() -> usize {
    50
}

fn default_relay_poll_interval_ms() -> u64 {
    500
}

fn default_relay_batch_budget_ms() -> u64 {
    30_000
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            person_table: default_person_table(),
            outbox_table: default_outbox_table(),
            event_bus_name: default_event_bus_name(),
            event_source: default_event_source(),
            log_level: default_log_level(),
            relay_batch_size: default_relay_batch_size(),
            relay_poll_interval_ms: default_relay_poll_interval_ms(),
            relay_batch_budget_ms: default_relay_batch_budget_ms(),
        }
    }
}

impl ServiceConfig {
    pub fn new() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("PERSON"))
            .build()?;

        s.try_deserialize()
    }

    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            event_source: self.event_source.clone(),
        }
    }

    pub fn capture_pump_config(&self) -> CapturePumpConfig {
        CapturePumpConfig {
            batch_size: self.relay_batch_size,
            poll_interval: std::time::Duration::from_millis(self.relay_poll_interval_ms),
            batch_budget: std::time::Duration::from_millis(self.relay_batch_budget_ms),
        }
    }
}
