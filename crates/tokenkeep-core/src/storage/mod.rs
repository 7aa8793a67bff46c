//! Persistent key-value storage backends.
//!
//! This module provides:
//! - `Storage`: the narrow get/set/remove interface the session store needs
//! - `MemoryStorage`: in-process map, used by tests and short-lived tools
//! - `FileStorage`: a single JSON file on disk, the durable default
//! - `KeyringStorage`: one OS keychain entry per key
//!
//! Values are plain strings. Callers serialize structured records themselves.

pub mod file;
pub mod keychain;
pub mod memory;

use thiserror::Error;

pub use self::file::FileStorage;
pub use self::keychain::KeyringStorage;
pub use self::memory::MemoryStorage;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keychain(#[from] ::keyring::Error),

    #[error("Storage lock poisoned")]
    Poisoned,
}

/// String-keyed persistent store.
///
/// `remove` must succeed when the key is already absent.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
