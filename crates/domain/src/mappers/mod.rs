//! Pure mappings between domain types and stored attribute items.
//!
//! Encoding is sparse: optional fields that are empty or whitespace-only are
//! omitted, never stored as empty strings. Decoding reports which required
//! attribute was missing or malformed instead of guessing.

pub mod outbox;
pub mod person;

/// Decode failure for a stored item.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("missing required attribute: {0}")]
    Missing(&'static str),

    #[error("invalid value for attribute: {0}")]
    Invalid(&'static str),
}

impl From<MapError> for crate::shared_kernel::DomainError {
    fn from(err: MapError) -> Self {
        Self::Infrastructure {
            message: err.to_string(),
        }
    }
}
