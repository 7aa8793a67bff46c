use thiserror::Error;

use crate::api::ApiError;
use crate::storage::StorageError;

/// Why a session could not be restored or a stored field read.
///
/// Every variant means the caller must send the user through login again.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No session stored")]
    NoSession,

    #[error("Stored session is malformed: {0}")]
    MalformedSession(#[from] serde_json::Error),

    #[error("Access token rejected: {0}")]
    AuthRejected(String),

    #[error("Refresh token rejected: {0}")]
    RefreshFailed(String),

    #[error("Refreshed access token rejected: {0}")]
    RetryAfterRefreshFailed(String),

    #[error("No {0} stored")]
    MissingToken(&'static str),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// Nothing usable was stored
    pub fn is_no_session(&self) -> bool {
        matches!(
            self,
            SessionError::NoSession | SessionError::MalformedSession(_) | SessionError::MissingToken(_)
        )
    }

    /// Failure that might not recur: the network or the local store broke,
    /// rather than the server rejecting the credentials.
    pub fn is_transient(&self) -> bool {
        match self {
            SessionError::Api(e) => !e.is_rejection(),
            SessionError::Storage(_) => true,
            _ => false,
        }
    }
}
