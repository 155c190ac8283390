//! Error types for the sync engine.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Error, Debug, Clone)]
pub enum SyncError {
    /// Credential or token failure at the remote platform.
    ///
    /// Aborts the pass without retry; the cursor keeps its window so the
    /// next cycle retries after the operator fixes the credentials.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The remote platform throttled the request.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// The record store rejected an operation outright.
    ///
    /// Per-record upsert failures are reported through `UpsertOutcome`
    /// instead; this variant covers batch-level store faults.
    #[error("store error: {0}")]
    Store(String),

    /// A sync cycle is already in flight for this namespace.
    ///
    /// Control-level signal returned to the caller, not a fault.
    #[error("sync is already running")]
    AlreadyRunning,

    /// Invalid engine or collaborator configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates a store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Returns true if the failure is transient and the same window will
    /// naturally be retried on the next cycle.
    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::RateLimited(_) => true,
            SyncError::Transport { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors() {
        assert!(SyncError::RateLimited("slow down".into()).is_transient());
        assert!(SyncError::transport_retryable("connection reset").is_transient());
        assert!(!SyncError::transport_fatal("invalid certificate").is_transient());
        assert!(!SyncError::Auth("bad token".into()).is_transient());
        assert!(!SyncError::AlreadyRunning.is_transient());
    }

    #[test]
    fn error_display() {
        let err = SyncError::AlreadyRunning;
        assert_eq!(err.to_string(), "sync is already running");

        let err = SyncError::Auth("refresh token revoked".into());
        assert!(err.to_string().contains("refresh token revoked"));
    }
}
