//! Core library for tokenkeep.
//!
//! Persists an authentication session in a key-value store and keeps it
//! usable by validating the access token against an identity endpoint and
//! refreshing it once when the server reports it expired.

pub mod api;
pub mod config;
pub mod error;
pub mod session;
pub mod storage;

pub use api::{ApiClient, ApiError};
pub use config::{Config, RestoreMode, StorageBackend};
pub use error::SessionError;
pub use session::{Credentials, Session, SessionStore};
pub use storage::{FileStorage, KeyringStorage, MemoryStorage, Storage, StorageError};
