//! Redis connection management and store error types.

use redis::aio::ConnectionManager;
use thiserror::Error;

/// Storage error types.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis connection error: {0}")]
    Connection(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Redis connection pool. ConnectionManager multiplexes internally and is
/// Clone, so callers clone it to get a mutable handle for each operation.
pub type RedisPool = ConnectionManager;

