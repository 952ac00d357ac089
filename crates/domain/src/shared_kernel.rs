use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errores del dominio
#[derive(thiserror::Error, Debug)]
pub enum DomainError {
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Duplicate id: {id}")]
    Conflict { id: String },

    #[error("Not found: {id}")]
    NotFound { id: String },

    #[error("Transient store error: {message}")]
    TransientStore { message: String },

    #[error("Transient bus error: {message}")]
    TransientBus { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Infrastructure error: {message}")]
    Infrastructure { message: String },
}

pub type Result<T> = std::result::Result<T, DomainError>;

/// Identifier of a person record. Rendered without hyphens so it matches the
/// wire format callers already store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub String);

impl PersonId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PersonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an outbox record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutboxId(pub String);

impl OutboxId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OutboxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
