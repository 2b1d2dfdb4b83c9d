use thiserror::Error;

use deskvoice_core::OperationError;

pub mod knowledge;
pub mod ticket;

pub use knowledge::SqlKnowledgeRepository;
pub use ticket::SqlTicketRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("no ticket numbers left for prefix {0}")]
    SequenceExhausted(String),
}

/// Takes the write lock up front so concurrent writers wait on the busy
/// timeout instead of failing when a read snapshot cannot be upgraded.
pub(crate) const BEGIN_WRITE: &str = "BEGIN IMMEDIATE";

impl From<RepositoryError> for OperationError {
    fn from(error: RepositoryError) -> Self {
        OperationError::Storage(error.to_string())
    }
}
