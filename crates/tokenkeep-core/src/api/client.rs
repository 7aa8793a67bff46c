//! API client for the identity and token refresh endpoints.

use std::time::Duration;

use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::Config;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Path of the identity ("me") endpoint
const ME_PATH: &str = "/api/v1/me";

/// Path of the token refresh endpoint
const REFRESH_PATH: &str = "/api/v1/auth/refresh";

#[derive(Debug, Deserialize)]
struct MeResponse {
    user: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
}

/// API client for the identity service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client against `base_url` with a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(&config.api_base_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch the profile of the user owning `access_token`
    pub async fn fetch_me(&self, access_token: &str) -> Result<Value, ApiError> {
        let url = self.url(ME_PATH);

        let response = self
            .client
            .get(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .bearer_auth(access_token)
            .send()
            .await?;

        let me: MeResponse = Self::parse_response(response).await?;
        debug!(url = %url, "Identity endpoint accepted access token");
        Ok(me.user)
    }

    /// Exchange `refresh_token` for a new access token
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, ApiError> {
        let url = self.url(REFRESH_PATH);

        let response = self
            .client
            .post(&url)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;

        let refreshed: RefreshResponse = Self::parse_response(response).await?;
        debug!(url = %url, "Refresh endpoint issued new access token");
        Ok(refreshed.access_token)
    }

    /// Check the status, then decode the body of a successful response.
    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::from_status(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}
