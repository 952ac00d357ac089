//! Infrastructure adapters for the person service: the conditional
//! key-value store engine, store-backed repositories, event-bus adapters,
//! the polling change-capture pump, configuration and telemetry.

pub mod capture;
pub mod config;
pub mod messaging;
pub mod persistence;
pub mod telemetry;
