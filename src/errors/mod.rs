/// Error handling for the notification hub
///
/// The hub itself never propagates errors to callers of `dispatch`; these
/// types describe failures of collaborators (stores, configuration, server
/// startup) so they can be logged with context.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HubError {
    #[error("Storage error: {0}")] Storage(String),

    #[error("Database error: {0}")] Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")] Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")] Config(String),

    #[error("IO error: {0}")] Io(#[from] std::io::Error),

    #[error("Lock poisoned: {0}")] LockPoisoned(String),

    #[error("Background task failed: {0}")] Task(String),
}

impl HubError {
    pub fn storage(message: impl Into<String>) -> Self {
        HubError::Storage(message.into())
    }
}

impl From<tokio::task::JoinError> for HubError {
    fn from(err: tokio::task::JoinError) -> Self {
        HubError::Task(err.to_string())
    }
}

pub type HubResult<T> = Result<T, HubError>;
