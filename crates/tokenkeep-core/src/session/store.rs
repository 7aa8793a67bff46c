use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::config::{Config, RestoreMode, StorageBackend};
use crate::error::SessionError;
use crate::storage::{FileStorage, KeyringStorage, Storage};

use super::data::{Credentials, Session, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, SESSION_KEY};

/// Loads, validates and refreshes the persisted session.
pub struct SessionStore {
    storage: Arc<dyn Storage>,
    api: ApiClient,
    mode: RestoreMode,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn Storage>, api: ApiClient) -> Self {
        Self {
            storage,
            api,
            mode: RestoreMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: RestoreMode) -> Self {
        self.mode = mode;
        self
    }

    /// Build the storage backend and API client named by `config`
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let storage: Arc<dyn Storage> = match config.storage_backend {
            StorageBackend::File => Arc::new(FileStorage::new(config.storage_dir()?)),
            StorageBackend::Keyring => Arc::new(KeyringStorage::default()),
        };
        let api = ApiClient::from_config(config)?;
        Ok(Self::new(storage, api).with_mode(config.restore_mode))
    }

    pub fn mode(&self) -> RestoreMode {
        self.mode
    }

    // ===== Composite Record =====

    /// Restore the stored session, refreshing the access token at most once.
    ///
    /// Any error means there is no usable session. The record is removed
    /// only when the refresh token itself is rejected.
    pub async fn restore_session(&self) -> Result<Session, SessionError> {
        match self.try_restore().await {
            Ok(session) => {
                info!(mode = ?self.mode, "Session restored");
                Ok(session)
            }
            Err(e) => {
                if e.is_transient() {
                    error!(error = %e, "Session restore failed");
                } else if e.is_no_session() {
                    debug!(error = %e, "No session to restore");
                } else {
                    warn!(error = %e, "Session restore rejected");
                }
                Err(e)
            }
        }
    }

    async fn try_restore(&self) -> Result<Session, SessionError> {
        let stored = self.load_session()?;

        if self.mode == RestoreMode::TrustLocal {
            return Ok(stored);
        }

        let err = match self.api.fetch_me(&stored.access_token).await {
            Ok(user) => return Ok(stored.with_user(user)),
            Err(e) => e,
        };

        if !err.is_token_expired() {
            return Err(match err {
                ApiError::Rejected { message, .. } => SessionError::AuthRejected(message),
                other => other.into(),
            });
        }

        debug!("Access token expired, refreshing");
        let access_token = match self.api.refresh(&stored.refresh_token).await {
            Ok(token) => token,
            Err(e) if e.is_rejection() => {
                self.clear_session()?;
                return Err(SessionError::RefreshFailed(e.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        self.persist_session(&access_token, &stored.refresh_token)?;

        match self.api.fetch_me(&access_token).await {
            Ok(user) => Ok(Session::new(access_token, stored.refresh_token).with_user(user)),
            Err(e) if e.is_rejection() => Err(SessionError::RetryAfterRefreshFailed(e.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Read and parse the stored record without contacting the server
    pub fn load_session(&self) -> Result<Session, SessionError> {
        let json = self.storage.get(SESSION_KEY)?.ok_or(SessionError::NoSession)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Overwrite the stored record. Any cached profile is dropped.
    pub fn persist_session(&self, access_token: &str, refresh_token: &str) -> Result<(), SessionError> {
        let json = serde_json::to_string(&Session::new(access_token, refresh_token))?;
        self.storage.set(SESSION_KEY, &json)?;
        Ok(())
    }

    pub fn clear_session(&self) -> Result<(), SessionError> {
        self.storage.remove(SESSION_KEY)?;
        Ok(())
    }

    // ===== Split Keys =====

    pub fn get_access_token(&self) -> Result<String, SessionError> {
        self.get_token(ACCESS_TOKEN_KEY)
    }

    pub fn get_refresh_token(&self) -> Result<String, SessionError> {
        self.get_token(REFRESH_TOKEN_KEY)
    }

    /// Both split-key tokens; fails if either is missing
    pub fn credentials(&self) -> Result<Credentials, SessionError> {
        Ok(Credentials {
            access_token: self.get_access_token()?,
            refresh_token: self.get_refresh_token()?,
        })
    }

    fn get_token(&self, key: &'static str) -> Result<String, SessionError> {
        self.storage.get(key)?.ok_or(SessionError::MissingToken(key))
    }

    pub fn set_tokens(&self, access_token: &str, refresh_token: &str) -> Result<(), SessionError> {
        self.set_access_token(access_token)?;
        self.set_refresh_token(refresh_token)
    }

    pub fn set_access_token(&self, access_token: &str) -> Result<(), SessionError> {
        self.storage.set(ACCESS_TOKEN_KEY, access_token)?;
        Ok(())
    }

    pub fn set_refresh_token(&self, refresh_token: &str) -> Result<(), SessionError> {
        self.storage.set(REFRESH_TOKEN_KEY, refresh_token)?;
        Ok(())
    }

    pub fn clear_tokens(&self) -> Result<(), SessionError> {
        self.storage.remove(ACCESS_TOKEN_KEY)?;
        self.storage.remove(REFRESH_TOKEN_KEY)?;
        Ok(())
    }
}
