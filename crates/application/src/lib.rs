//! Application layer: the transactional writer and the outbox relay
//! processor, plus the deadline budget they both honor.

pub mod create_person;
pub mod deadline;
pub mod relay;

pub use create_person::CreatePersonUseCase;
pub use deadline::Deadline;
pub use relay::{OutboxRelayProcessor, RelayConfig};
