use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Storage key holding the composite session record
pub const SESSION_KEY: &str = "user";

/// Storage key for the access token in the split-key layout
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Storage key for the refresh token in the split-key layout
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Tokens plus the cached user profile.
///
/// Stored as `{ "accessToken", "refreshToken", "user"? }`. `user` is only
/// filled in after the identity endpoint has returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
}

impl Session {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            user: None,
        }
    }

    pub fn with_user(mut self, user: Value) -> Self {
        self.user = Some(user);
        self
    }
}

/// Token pair as kept under two independent storage keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
}
