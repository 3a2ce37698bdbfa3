use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage quota exceeded writing {key} (limit {limit} bytes)")]
    QuotaExceeded { key: String, limit: usize },

    #[error("Corrupt storage: {0}")]
    Corrupt(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Redis connection error: {0}")]
    Redis(#[from] redis::RedisError),
}

impl StorageError {
    /// True when the backend itself cannot be reached or written,
    /// as opposed to holding bad data.
    pub fn is_unavailable(&self) -> bool {
        match self {
            StorageError::Unavailable(_)
            | StorageError::QuotaExceeded { .. }
            | StorageError::Io(_) => true,
            StorageError::Redis(e) => {
                e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal()
            }
            StorageError::Corrupt(_) | StorageError::Serialization(_) => false,
        }
    }
}
