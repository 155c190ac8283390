//! Error types for the control surface.

use fieldsync_engine::SyncError;
use thiserror::Error;

/// Result type for control-surface operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors returned to the front door.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The request body or parameters were malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The webhook signature did not verify.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// A sync cycle is already in flight; retry later or force.
    #[error("sync is already running")]
    AlreadyRunning,

    /// The engine failed underneath the control surface.
    #[error("engine error: {0}")]
    Engine(String),
}

impl From<SyncError> for ServerError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::AlreadyRunning => Self::AlreadyRunning,
            other => Self::Engine(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_running_maps_to_its_own_variant() {
        let err: ServerError = SyncError::AlreadyRunning.into();
        assert!(matches!(err, ServerError::AlreadyRunning));

        let err: ServerError = SyncError::Auth("denied".into()).into();
        assert!(matches!(err, ServerError::Engine(_)));
    }
}
