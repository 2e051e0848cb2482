use thiserror::Error;
use uuid::Uuid;

/// Error type that captures every failure surfaced by the finance core.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid start date: {0}")]
    InvalidStartDate(String),
    #[error("Invalid transfer: {0}")]
    InvalidTransfer(String),
    #[error("Recurring series already exists: {0}")]
    DuplicateSeries(Uuid),
    #[error("Recurring series not found: {0}")]
    SeriesNotFound(Uuid),
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),
    #[error("Category not found: {0}")]
    CategoryNotFound(String),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(Uuid),
    #[error("Coordinator not initialized: missing {0}")]
    CoordinatorNotInitialized(&'static str),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Persistence error: {0}")]
    Storage(String),
}

/// Broad failure classes; each one implies a different caller policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed caller input. Never retried.
    Validation,
    /// Caller's view of state no longer matches; refresh and retry the command.
    Lookup,
    /// Lifecycle ordering bug upstream.
    Setup,
    /// Repository failure. In-memory state may be ahead of persisted state.
    Persistence,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InvalidAmount(_)
            | CoreError::InvalidStartDate(_)
            | CoreError::InvalidTransfer(_)
            | CoreError::DuplicateSeries(_) => ErrorKind::Validation,
            CoreError::SeriesNotFound(_)
            | CoreError::AccountNotFound(_)
            | CoreError::CategoryNotFound(_)
            | CoreError::TransactionNotFound(_) => ErrorKind::Lookup,
            CoreError::CoordinatorNotInitialized(_) => ErrorKind::Setup,
            CoreError::Io(_) | CoreError::Serde(_) | CoreError::Storage(_) => {
                ErrorKind::Persistence
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(
            CoreError::InvalidAmount("zero".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            CoreError::DuplicateSeries(Uuid::nil()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            CoreError::SeriesNotFound(Uuid::nil()).kind(),
            ErrorKind::Lookup
        );
        assert_eq!(
            CoreError::CoordinatorNotInitialized("store").kind(),
            ErrorKind::Setup
        );
        assert_eq!(
            CoreError::Storage("disk full".into()).kind(),
            ErrorKind::Persistence
        );
    }

    #[test]
    fn messages_include_identifiers() {
        let id = Uuid::new_v4();
        let message = CoreError::TransactionNotFound(id).to_string();
        assert!(message.contains(&id.to_string()), "unexpected: {message}");
    }
}
