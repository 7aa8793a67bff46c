//! REST API client module for the identity service.
//!
//! This module provides the `ApiClient` for validating an access token
//! against the identity endpoint and exchanging a refresh token for a new
//! access token.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::{ApiError, EXPIRED_TOKEN_ERROR};
