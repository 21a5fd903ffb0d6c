//! Per-login CSRF correlation marker (OAuth2 §10.12).
//!
//! A random token is minted at challenge time, stored in a short-lived
//! cookie on the browser, and embedded in the encrypted state. At callback
//! time the two must match; the cookie is cleared on every validation
//! attempt so a marker can never be validated twice.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::warn;

use crate::state::FlowState;
use crate::types::{FlowRequest, FlowResponse, SetCookie};

const TOKEN_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct CorrelationGuard {
    cookie_name: String,
    cookie_ttl: Duration,
}

impl CorrelationGuard {
    pub fn new(authentication_type: &str, cookie_ttl: Duration) -> Self {
        Self {
            cookie_name: format!(".correlation.{authentication_type}"),
            cookie_ttl,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Mints a fresh token and arranges for the browser to present it back
    /// on the callback.
    pub fn issue(&self, request: &FlowRequest, response: &mut FlowResponse) -> String {
        let mut bytes = [0u8; TOKEN_LEN];
        OsRng.fill_bytes(&mut bytes);
        let token = URL_SAFE_NO_PAD.encode(bytes);

        response.append_cookie(SetCookie {
            name: self.cookie_name.clone(),
            value: token.clone(),
            path: "/".to_string(),
            max_age: Some(self.cookie_ttl.as_secs() as i64),
            http_only: true,
            secure: request.is_https(),
        });

        token
    }

    /// Compares the browser's marker against the token embedded in the
    /// state, consuming the marker either way.
    pub fn validate(
        &self,
        request: &FlowRequest,
        response: &mut FlowResponse,
        state: &FlowState,
    ) -> bool {
        let Some(presented) = request.cookies.get(&self.cookie_name) else {
            warn!(cookie = %self.cookie_name, "correlation cookie is missing");
            return false;
        };

        // Single use: the marker is gone after the first attempt, pass or fail.
        response.expire_cookie(&self.cookie_name);

        if *presented != state.correlation_token {
            warn!(cookie = %self.cookie_name, "correlation cookie does not match the state");
            return false;
        }

        true
    }
}
