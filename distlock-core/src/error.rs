//! Error types for lock acquisition and release.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type for lock operations.
pub type LockResult<T> = Result<T, LockError>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store operation that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    /// Atomic set-if-absent with expiry (acquire).
    SetIfAbsent,
    /// Atomic compare-and-delete (release).
    CompareAndDelete,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreOperation::SetIfAbsent => write!(f, "set-if-absent"),
            StoreOperation::CompareAndDelete => write!(f, "compare-and-delete"),
        }
    }
}

/// Lock errors
#[derive(Debug, Error)]
pub enum LockError {
    /// The lock stayed held by someone else for the whole acquisition budget.
    #[error("Acquire lock timeout: resource '{resource}' still held after {timeout:?}")]
    AcquireTimeout {
        /// Contended resource name
        resource: String,
        /// Configured acquisition budget
        timeout: Duration,
    },

    /// The backing store failed; never retried internally.
    #[error("Store error during {operation} on key '{key}': {source}")]
    Store {
        /// Operation that failed
        operation: StoreOperation,
        /// Lock key the operation targeted
        key: String,
        /// Underlying store error
        #[source]
        source: StoreError,
    },

    /// Release was called on a lock with no store handle bound.
    #[error("Lock has no store handle bound")]
    NoStore,

    /// Acquisition was cancelled before the lock was obtained.
    #[error("Acquire cancelled for resource '{resource}'")]
    Cancelled {
        /// Contended resource name
        resource: String,
    },
}

impl LockError {
    /// Wrap a store error with the operation and key it happened on.
    pub fn store(operation: StoreOperation, key: impl Into<String>, source: StoreError) -> Self {
        Self::Store {
            operation,
            key: key.into(),
            source,
        }
    }

    /// Check if this error is an acquisition timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::AcquireTimeout { .. })
    }

    /// Check if this error came from the backing store.
    pub fn is_store_error(&self) -> bool {
        matches!(self, Self::Store { .. })
    }
}

/// Errors reported by a [`LockStore`](crate::LockStore) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Command error.
    #[error("Command error: {0}")]
    Command(String),

    /// Timeout error.
    #[error("Operation timed out")]
    Timeout,

    /// Any other backend failure.
    #[error("Backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Create a new connection error
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a new command error
    pub fn command<S: Into<String>>(msg: S) -> Self {
        Self::Command(msg.into())
    }

    /// Check if the caller could reasonably retry the whole operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout)
    }
}
