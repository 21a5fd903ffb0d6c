//! Framework-neutral HTTP boundary types.
//!
//! The host adapts its own request/response machinery to these snapshots.
//! [`FlowRequest`] captures what the flow needs to know about the inbound
//! request; [`FlowResponse`] collects the directives (status, redirect,
//! cookies, sign-in grant) the host must apply when the flow returns.

use std::collections::HashMap;

use fsq_identity_core::Identity;
use url::form_urlencoded;

use crate::state::FlowState;

/// Snapshot of the inbound HTTP request.
#[derive(Debug, Clone, Default)]
pub struct FlowRequest {
    pub scheme: String,
    /// Host header value, including a port when non-default.
    pub host: String,
    /// Mount prefix of the application, empty when mounted at the root.
    pub path_base: String,
    pub path: String,
    /// Raw query string without the leading `?`.
    pub query: String,
    pub cookies: HashMap<String, String>,
}

impl FlowRequest {
    pub fn is_https(&self) -> bool {
        self.scheme.eq_ignore_ascii_case("https")
    }

    /// Reconstructs the full URL of this request.
    pub fn uri(&self) -> String {
        if self.query.is_empty() {
            format!("{}://{}{}{}", self.scheme, self.host, self.path_base, self.path)
        } else {
            format!(
                "{}://{}{}{}?{}",
                self.scheme, self.host, self.path_base, self.path, self.query
            )
        }
    }

    pub fn query_values(&self, name: &str) -> Vec<String> {
        form_urlencoded::parse(self.query.as_bytes())
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .collect()
    }

    /// The query parameter's value when it appears exactly once; zero or
    /// multiple occurrences count as absent.
    pub fn single_query_value(&self, name: &str) -> Option<String> {
        let mut values = self.query_values(name);
        if values.len() == 1 { values.pop() } else { None }
    }
}

/// A cookie directive for the host to apply to its response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    pub path: String,
    /// `Some(0)` expires the cookie immediately; `None` makes it a session
    /// cookie.
    pub max_age: Option<i64>,
    pub http_only: bool,
    pub secure: bool,
}

/// Sign-in recorded by the flow for the host's session primitive.
#[derive(Debug, Clone)]
pub struct SignInGrant {
    pub identity: Identity,
    pub properties: Option<FlowState>,
}

/// Directives collected while the flow handles a request.
#[derive(Debug)]
pub struct FlowResponse {
    pub status: u16,
    pub location: Option<String>,
    pub cookies: Vec<SetCookie>,
    pub grant: Option<SignInGrant>,
}

impl Default for FlowResponse {
    fn default() -> Self {
        Self {
            status: 200,
            location: None,
            cookies: Vec::new(),
            grant: None,
        }
    }
}

impl FlowResponse {
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn redirect(&mut self, location: impl Into<String>) {
        self.status = 302;
        self.location = Some(location.into());
    }

    pub fn append_cookie(&mut self, cookie: SetCookie) {
        self.cookies.push(cookie);
    }

    pub fn expire_cookie(&mut self, name: &str) {
        self.cookies.push(SetCookie {
            name: name.to_string(),
            value: String::new(),
            path: "/".to_string(),
            max_age: Some(0),
            http_only: true,
            secure: false,
        });
    }

    /// Last directive recorded for the named cookie, if any.
    pub fn cookie(&self, name: &str) -> Option<&SetCookie> {
        self.cookies.iter().rev().find(|cookie| cookie.name == name)
    }
}

/// Result of processing a callback: either a signed-in identity, an
/// attempted-but-rejected flow with its decoded properties preserved for
/// diagnostics, or no usable state at all.
#[derive(Debug, Clone)]
pub enum AuthenticationOutcome {
    Failed,
    Rejected { properties: FlowState },
    SignedIn { identity: Identity, properties: FlowState },
}

impl AuthenticationOutcome {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::SignedIn { identity, .. } => Some(identity),
            _ => None,
        }
    }

    pub fn properties(&self) -> Option<&FlowState> {
        match self {
            Self::Rejected { properties } | Self::SignedIn { properties, .. } => Some(properties),
            Self::Failed => None,
        }
    }
}
