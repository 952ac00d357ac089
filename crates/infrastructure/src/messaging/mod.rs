//! Event-bus adapters.

pub mod memory;
pub mod nats;

pub use memory::MemoryEventBus;
pub use nats::{NatsConfig, NatsEventBus};
