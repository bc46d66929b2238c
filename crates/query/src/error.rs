use storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    #[error("index corruption: {0}")]
    IndexCorruption(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type QueryResult<T> = Result<T, QueryError>;

pub(crate) fn malformed<T>(message: impl Into<String>) -> QueryResult<T> {
    Err(QueryError::MalformedRequest(message.into()))
}
