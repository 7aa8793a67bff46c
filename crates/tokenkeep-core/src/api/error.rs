use thiserror::Error;

/// Error string the identity endpoint uses for an expired access token
pub const EXPIRED_TOKEN_ERROR: &str = "expired token";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access token expired")]
    TokenExpired,

    #[error("Request rejected with status {status}: {message}")]
    Rejected {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(serde::Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Map a non-2xx response to an error.
    ///
    /// Only a JSON body whose `error` field is exactly `"expired token"` is
    /// treated as an expired token, whatever the status code.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody { error: Some(error) }) => {
                if error == EXPIRED_TOKEN_ERROR {
                    return ApiError::TokenExpired;
                }
                Self::truncate_body(&error)
            }
            _ => Self::truncate_body(body),
        };
        ApiError::Rejected { status, message }
    }

    pub fn is_token_expired(&self) -> bool {
        matches!(self, ApiError::TokenExpired)
    }

    /// Server-side rejection, as opposed to a transport or payload problem
    pub fn is_rejection(&self) -> bool {
        matches!(self, ApiError::TokenExpired | ApiError::Rejected { .. })
    }
}
