//! Redis error types.

use distlock_core::StoreError;
use thiserror::Error;

/// Result type for Redis operations.
pub type Result<T> = std::result::Result<T, RedisError>;

/// Redis errors.
#[derive(Debug, Error)]
pub enum RedisError {
    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Command error (unexpected reply).
    #[error("Command error: {0}")]
    Command(String),

    /// Timeout error.
    #[error("Operation timed out")]
    Timeout,

    /// Underlying Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

impl RedisError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Timeout => true,
            Self::Redis(e) => is_transient(e),
            Self::Config(_) | Self::Command(_) => false,
        }
    }

    /// Check if this error indicates connection loss.
    pub fn is_connection_error(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Redis(e) => e.is_connection_dropped() || e.is_connection_refusal(),
            _ => false,
        }
    }
}

fn is_transient(e: &redis::RedisError) -> bool {
    e.is_timeout() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_io_error()
}

impl From<RedisError> for StoreError {
    fn from(err: RedisError) -> Self {
        match err {
            RedisError::Timeout => StoreError::Timeout,
            RedisError::Connection(msg) => StoreError::Connection(msg),
            RedisError::Config(msg) | RedisError::Command(msg) => StoreError::Command(msg),
            RedisError::Redis(e) if e.is_timeout() => StoreError::Timeout,
            RedisError::Redis(e) if is_transient(&e) => StoreError::Connection(e.to_string()),
            RedisError::Redis(e) => StoreError::Backend(Box::new(e)),
        }
    }
}
