//! Persistence adapters: the in-memory conditional key-value engine and the
//! store-backed repositories.

pub mod memory;
pub mod outbox;
pub mod person;

pub use memory::{MemoryStore, MemoryTable};
pub use outbox::StoreOutboxRepository;
pub use person::StorePersonRepository;
