use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
    #[error("Task queue unavailable: {0}")]
    QueueUnavailable(String),
    #[error("Mail transport error: {0}")]
    Transport(String),
    #[error("Status store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Task {0} already has a terminal status")]
    AlreadyTerminal(Uuid),
    #[error("Task not found: {0}")]
    NotFound(Uuid),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
