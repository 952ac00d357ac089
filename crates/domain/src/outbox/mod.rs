//! Outbox model and port for the transactional outbox pattern.

pub mod model;
pub mod repository;

pub use model::{OutboxRecord, OutboxStatus};
pub use repository::{CasOutcome, OutboxRepository};
