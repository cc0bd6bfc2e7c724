//! Cache error types.

use tessera_core::TesseraError;
use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-related errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Redis command error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Redis pool error.
    #[error("Redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    /// Payload could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Operation against a key holding the wrong kind of value.
    #[error("WRONGTYPE operation against key '{key}' holding the wrong kind of value")]
    WrongType { key: String },

    /// Stored value cannot be used by the requested operation.
    #[error("Invalid stored value for key '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Caller broke an operation precondition.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Store cannot be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl CacheError {
    /// Returns true if retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            CacheError::Redis(e) => e.is_io_error() || e.is_timeout() || e.is_connection_dropped(),
            CacheError::Pool(_) | CacheError::Unavailable(_) => true,
            _ => false,
        }
    }

    /// Returns true if the error is a caller contract violation.
    pub fn is_precondition(&self) -> bool {
        matches!(self, CacheError::InvalidArgument(_))
    }
}

impl From<TesseraError> for CacheError {
    fn from(err: TesseraError) -> Self {
        match err {
            TesseraError::Configuration(msg) => CacheError::Configuration(msg),
            other => CacheError::Unavailable(other.to_string()),
        }
    }
}

impl From<CacheError> for TesseraError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Serialization(e) => TesseraError::Serialization(e.to_string()),
            CacheError::InvalidArgument(msg) => TesseraError::Validation(msg),
            CacheError::Configuration(msg) => TesseraError::Configuration(msg),
            other => TesseraError::Cache(other.to_string()),
        }
    }
}
