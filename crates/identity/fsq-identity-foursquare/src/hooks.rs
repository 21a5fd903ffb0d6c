//! Host collaboration points invoked during the callback transition.

use async_trait::async_trait;
use fsq_identity_core::Identity;

use crate::profile::FoursquareProfile;
use crate::state::FlowState;

/// Context handed to [`FoursquareHooks::authenticated`] after the profile
/// fetch, before the flow finalizes. The hook may enrich or replace the
/// identity.
#[derive(Debug)]
pub struct AuthenticatedContext {
    pub profile: FoursquareProfile,
    pub access_token: String,
    pub identity: Identity,
    pub properties: FlowState,
}

/// Context handed to [`FoursquareHooks::return_endpoint`] just before the
/// final redirect. The hook may rewrite the redirect target, swap the
/// sign-in type, or mark the request handled to take over the response.
#[derive(Debug)]
pub struct ReturnEndpointContext {
    pub identity: Option<Identity>,
    pub properties: Option<FlowState>,
    pub sign_in_as: Option<String>,
    pub redirect_uri: Option<String>,
    pub handled: bool,
}

impl ReturnEndpointContext {
    pub fn mark_handled(&mut self) {
        self.handled = true;
    }
}

#[async_trait]
pub trait FoursquareHooks: Send + Sync {
    async fn authenticated(&self, _context: &mut AuthenticatedContext) {}

    async fn return_endpoint(&self, _context: &mut ReturnEndpointContext) {}
}

/// Default hooks that leave the flow untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

#[async_trait]
impl FoursquareHooks for NoopHooks {}
