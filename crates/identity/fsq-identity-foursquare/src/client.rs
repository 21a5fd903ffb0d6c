//! Backchannel calls to the provider's token and profile endpoints.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use url::Url;

use crate::config::FoursquareOptions;
use crate::error::{FoursquareError, FoursquareResult};
use crate::profile::FoursquareProfile;

/// Parsed token endpoint response. The access token stays optional here;
/// the flow decides what an empty one means.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenExchange {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl TokenExchange {
    /// The access token, if present and non-blank.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

/// Shared outbound HTTP client for the token exchange and profile fetch.
///
/// One instance serves all concurrent flows; `reqwest::Client` pools
/// connections internally. Dropping a call's future aborts the outbound
/// request, which is how the host's request cancellation propagates here.
#[derive(Clone)]
pub struct Backchannel {
    http: Client,
    token_endpoint: String,
    profile_endpoint: String,
    api_version: String,
    client_id: String,
    client_secret: String,
}

impl Backchannel {
    pub fn new(options: &FoursquareOptions) -> FoursquareResult<Self> {
        let http = match &options.backchannel {
            Some(client) => client.clone(),
            None => Client::builder()
                .timeout(options.backchannel_timeout)
                .build()
                .map_err(FoursquareError::Http)?,
        };

        Ok(Self {
            http,
            token_endpoint: options.token_endpoint.clone(),
            profile_endpoint: options.profile_endpoint.clone(),
            api_version: options.api_version.clone(),
            client_id: options.client_id.clone(),
            client_secret: options.client_secret.clone(),
        })
    }

    /// Trades an authorization code for an access token. The redirect URI
    /// must be exactly the one sent at challenge time; the provider
    /// validates it.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> FoursquareResult<TokenExchange> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
            ("code", code),
        ];

        let response = self
            .http
            .post(&self.token_endpoint)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, "token exchange failed");
            return Err(FoursquareError::TokenExchangeFailed(format!(
                "{status}: {body}"
            )));
        }

        let exchange: TokenExchange = response
            .json()
            .await
            .map_err(|e| FoursquareError::InvalidTokenResponse(e.to_string()))?;

        debug!("exchanged authorization code for access token");
        Ok(exchange)
    }

    /// Fetches the authenticated user's profile and unwraps the
    /// `response.user` envelope.
    pub async fn fetch_profile(&self, access_token: &str) -> FoursquareResult<FoursquareProfile> {
        let mut url = Url::parse(&self.profile_endpoint)?;
        url.query_pairs_mut()
            .append_pair("oauth_token", access_token)
            .append_pair("v", &self.api_version);

        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, "profile request failed");
            return Err(FoursquareError::ProfileRequestFailed(format!(
                "{status}: {body}"
            )));
        }

        let document: serde_json::Value = response
            .json()
            .await
            .map_err(|e| FoursquareError::InvalidProfileResponse(e.to_string()))?;

        let user = document
            .get("response")
            .and_then(|response| response.get("user"))
            .filter(|user| user.is_object())
            .cloned()
            .ok_or_else(|| {
                FoursquareError::InvalidProfileResponse(
                    "document is missing the response.user envelope".to_string(),
                )
            })?;

        debug!("retrieved user profile");
        Ok(FoursquareProfile::from_user(user))
    }
}
