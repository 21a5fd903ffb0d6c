//! Flow error types.

use thiserror::Error;

pub type FoursquareResult<T> = Result<T, FoursquareError>;

#[derive(Debug, Error)]
pub enum FoursquareError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("missing authorization code")]
    MissingAuthorizationCode,

    #[error("token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("invalid token response: {0}")]
    InvalidTokenResponse(String),

    #[error("profile request failed: {0}")]
    ProfileRequestFailed(String),

    #[error("invalid profile response: {0}")]
    InvalidProfileResponse(String),

    #[error("state protection failed: {0}")]
    StateProtection(String),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),
}
