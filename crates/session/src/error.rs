use salon_storage::StorageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session storage unavailable: {0}")]
    StorageUnavailable(StorageError),

    #[error("Session storage error: {0}")]
    Storage(StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StorageError> for SessionError {
    fn from(err: StorageError) -> Self {
        if err.is_unavailable() {
            SessionError::StorageUnavailable(err)
        } else {
            SessionError::Storage(err)
        }
    }
}
