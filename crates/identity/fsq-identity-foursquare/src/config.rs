//! Flow configuration.

use std::time::Duration;

use crate::error::{FoursquareError, FoursquareResult};

/// Authentication type tag carried by the identities this flow produces.
pub const AUTHENTICATION_TYPE: &str = "Foursquare";

const AUTHORIZATION_ENDPOINT: &str = "https://foursquare.com/oauth2/authenticate";
const TOKEN_ENDPOINT: &str = "https://foursquare.com/oauth2/access_token";
const PROFILE_ENDPOINT: &str = "https://api.foursquare.com/v2/users/self";

// Foursquare versions its API by date; profile parsing assumes this shape.
const API_VERSION: &str = "20130910";

const DEFAULT_CALLBACK_PATH: &str = "/signin-foursquare";
const DEFAULT_BACKCHANNEL_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_STATE_TTL: Duration = Duration::from_secs(600);

/// Immutable configuration for [`crate::FoursquareFlow`].
///
/// Constructed once with [`FoursquareOptions::new`] plus the `with_*`
/// builders; the flow validates it at construction and never mutates it.
#[derive(Debug, Clone)]
pub struct FoursquareOptions {
    pub client_id: String,
    pub client_secret: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub profile_endpoint: String,
    pub api_version: String,
    /// Inbound path that receives the provider callback, compared
    /// case-insensitively.
    pub callback_path: String,
    /// Requested scopes, space-joined on the wire.
    pub scope: Vec<String>,
    pub backchannel_timeout: Duration,
    /// Prebuilt HTTP client for the backchannel. Supply one to customize
    /// transport concerns such as proxies or certificate validation;
    /// otherwise a client with `backchannel_timeout` is built.
    pub backchannel: Option<reqwest::Client>,
    pub authentication_type: String,
    /// Display caption for sign-in buttons.
    pub caption: String,
    /// Authentication type the final identity is re-tagged with before the
    /// sign-in grant. No grant is recorded when unset.
    pub sign_in_as: Option<String>,
    /// How long an encoded state value stays decodable.
    pub state_ttl: Duration,
}

impl FoursquareOptions {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            authorization_endpoint: AUTHORIZATION_ENDPOINT.to_string(),
            token_endpoint: TOKEN_ENDPOINT.to_string(),
            profile_endpoint: PROFILE_ENDPOINT.to_string(),
            api_version: API_VERSION.to_string(),
            callback_path: DEFAULT_CALLBACK_PATH.to_string(),
            scope: Vec::new(),
            backchannel_timeout: DEFAULT_BACKCHANNEL_TIMEOUT,
            backchannel: None,
            authentication_type: AUTHENTICATION_TYPE.to_string(),
            caption: AUTHENTICATION_TYPE.to_string(),
            sign_in_as: None,
            state_ttl: DEFAULT_STATE_TTL,
        }
    }

    pub fn with_authorization_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.authorization_endpoint = endpoint.into();
        self
    }

    pub fn with_token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = endpoint.into();
        self
    }

    pub fn with_profile_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.profile_endpoint = endpoint.into();
        self
    }

    pub fn with_callback_path(mut self, path: impl Into<String>) -> Self {
        self.callback_path = path.into();
        self
    }

    pub fn with_scope(mut self, scope: Vec<String>) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_backchannel_timeout(mut self, timeout: Duration) -> Self {
        self.backchannel_timeout = timeout;
        self
    }

    pub fn with_backchannel(mut self, client: reqwest::Client) -> Self {
        self.backchannel = Some(client);
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }

    pub fn with_sign_in_as(mut self, authentication_type: impl Into<String>) -> Self {
        self.sign_in_as = Some(authentication_type.into());
        self
    }

    pub fn with_state_ttl(mut self, ttl: Duration) -> Self {
        self.state_ttl = ttl;
        self
    }

    /// Rejects unusable configuration before any flow is constructed.
    pub fn validate(&self) -> FoursquareResult<()> {
        if self.client_id.trim().is_empty() {
            return Err(FoursquareError::Config(
                "the client id must be provided".to_string(),
            ));
        }
        if self.client_secret.trim().is_empty() {
            return Err(FoursquareError::Config(
                "the client secret must be provided".to_string(),
            ));
        }
        Ok(())
    }
}
