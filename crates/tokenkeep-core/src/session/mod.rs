//! Session persistence and restoration.
//!
//! This module provides:
//! - `Session`: tokens plus the cached user profile, stored under `"user"`
//! - `Credentials`: the split-key token pair
//! - `SessionStore`: restore with a single automatic refresh, plus setters
//!   and getters for the persisted fields
//!
//! An expired access token is refreshed once per restore. If the refresh
//! token is rejected the stored record is deleted.

pub mod data;
pub mod store;

pub use data::{Credentials, Session, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, SESSION_KEY};
pub use store::SessionStore;
