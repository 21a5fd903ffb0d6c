//! The challenge/callback orchestrator.

use std::sync::Arc;

use tracing::{debug, warn};
use url::Url;

use fsq_identity_core::{Identity, claim_types};

use crate::client::Backchannel;
use crate::config::FoursquareOptions;
use crate::correlation::CorrelationGuard;
use crate::error::{FoursquareError, FoursquareResult};
use crate::hooks::{AuthenticatedContext, FoursquareHooks, NoopHooks, ReturnEndpointContext};
use crate::profile::FoursquareProfile;
use crate::state::{FlowState, StateCodec, StateKey};
use crate::types::{AuthenticationOutcome, FlowRequest, FlowResponse, SignInGrant};

/// Provider-namespaced claim carrying the stable Foursquare user id.
pub const FOURSQUARE_ID_CLAIM: &str = "urn:foursquare:id";
/// Provider-namespaced claim carrying the display name.
pub const FOURSQUARE_NAME_CLAIM: &str = "urn:foursquare:name";

/// Drives one Foursquare login: [`FoursquareFlow::challenge`] redirects an
/// unauthenticated request to the provider, [`FoursquareFlow::invoke`]
/// processes the provider's callback.
///
/// One instance serves all requests; per-login state travels in the
/// encrypted `state` parameter and the correlation cookie, never in the
/// flow itself.
pub struct FoursquareFlow {
    options: FoursquareOptions,
    codec: StateCodec,
    guard: CorrelationGuard,
    backchannel: Backchannel,
    hooks: Arc<dyn FoursquareHooks>,
}

impl FoursquareFlow {
    pub fn new(options: FoursquareOptions, key: StateKey) -> FoursquareResult<Self> {
        Self::with_hooks(options, key, Arc::new(NoopHooks))
    }

    pub fn with_hooks(
        options: FoursquareOptions,
        key: StateKey,
        hooks: Arc<dyn FoursquareHooks>,
    ) -> FoursquareResult<Self> {
        options.validate()?;

        let codec = StateCodec::new(&key, options.state_ttl);
        let guard = CorrelationGuard::new(&options.authentication_type, options.state_ttl);
        let backchannel = Backchannel::new(&options)?;

        Ok(Self {
            options,
            codec,
            guard,
            backchannel,
            hooks,
        })
    }

    pub fn options(&self) -> &FoursquareOptions {
        &self.options
    }

    /// Turns a 401 response into a redirect to the provider's consent page,
    /// defaulting the post-login return target to the current request URL.
    /// Responses with any other status are left untouched.
    pub fn challenge(
        &self,
        request: &FlowRequest,
        response: &mut FlowResponse,
    ) -> FoursquareResult<()> {
        self.challenge_with_return_url(request, response, None)
    }

    /// Same as [`FoursquareFlow::challenge`] with an explicit post-login
    /// return target.
    pub fn challenge_with_return_url(
        &self,
        request: &FlowRequest,
        response: &mut FlowResponse,
        return_url: Option<String>,
    ) -> FoursquareResult<()> {
        if response.status != 401 {
            return Ok(());
        }
        debug!("applying response challenge");

        let return_url = return_url.unwrap_or_else(|| request.uri());
        let redirect_uri = self.redirect_uri(request);

        let correlation_token = self.guard.issue(request, response);
        let state = FlowState::new(Some(return_url), correlation_token);
        let protected = self.codec.encode(&state)?;

        let mut authorization_url = Url::parse(&self.options.authorization_endpoint)?;
        {
            let mut pairs = authorization_url.query_pairs_mut();
            pairs.append_pair("client_id", &self.options.client_id);
            pairs.append_pair("response_type", "code");
            pairs.append_pair("redirect_uri", &redirect_uri);
            pairs.append_pair("state", &protected);
            if !self.options.scope.is_empty() {
                // OAuth2 §3.3: space separated
                pairs.append_pair("scope", &self.options.scope.join(" "));
            }
        }

        response.redirect(authorization_url);
        Ok(())
    }

    /// True when the inbound request targets the configured callback path.
    pub fn handles(&self, request: &FlowRequest) -> bool {
        request.path.eq_ignore_ascii_case(&self.options.callback_path)
    }

    /// Processes the provider callback when the request targets the
    /// callback path. Returns whether the request was fully handled.
    ///
    /// Never fails: every error past construction collapses into an
    /// outcome, so the host framework sees no faults from this path.
    pub async fn invoke(&self, request: &FlowRequest, response: &mut FlowResponse) -> bool {
        if !self.handles(request) {
            return false;
        }
        self.invoke_return_path(request, response).await
    }

    async fn invoke_return_path(&self, request: &FlowRequest, response: &mut FlowResponse) -> bool {
        debug!("processing return path");

        let outcome = self.authenticate(request, response).await;
        let (identity, mut properties) = match outcome {
            AuthenticationOutcome::SignedIn {
                identity,
                properties,
            } => (Some(identity), Some(properties)),
            AuthenticationOutcome::Rejected { properties } => (None, Some(properties)),
            AuthenticationOutcome::Failed => (None, None),
        };

        // The return target is consumed here so it cannot leak into the
        // sign-in grant's round-trip properties.
        let redirect_uri = properties
            .as_mut()
            .and_then(|properties| properties.return_url.take());

        let mut context = ReturnEndpointContext {
            identity,
            properties,
            sign_in_as: self.options.sign_in_as.clone(),
            redirect_uri,
            handled: false,
        };
        self.hooks.return_endpoint(&mut context).await;

        if let (Some(sign_in_as), Some(identity)) = (&context.sign_in_as, context.identity.take())
        {
            let identity = if identity.authentication_type == *sign_in_as {
                identity
            } else {
                identity.into_authentication_type(sign_in_as.clone())
            };
            response.grant = Some(SignInGrant {
                identity,
                properties: context.properties.clone(),
            });
        }

        if !context.handled {
            if let Some(location) = context.redirect_uri.take() {
                response.redirect(location);
                context.handled = true;
            }
        }

        context.handled
    }

    /// The callback state machine: state decode, correlation check, token
    /// exchange, profile fetch, identity construction. Failures collapse
    /// into [`AuthenticationOutcome`] variants instead of escaping.
    pub async fn authenticate(
        &self,
        request: &FlowRequest,
        response: &mut FlowResponse,
    ) -> AuthenticationOutcome {
        debug!("authenticating callback");

        let state_param = request.single_query_value("state");
        let Some(state) = state_param
            .as_deref()
            .and_then(|protected| self.codec.decode(protected))
        else {
            warn!("callback carried no usable state parameter");
            return AuthenticationOutcome::Failed;
        };

        // OAuth2 §10.12 CSRF
        if !self.guard.validate(request, response, &state) {
            return AuthenticationOutcome::Rejected { properties: state };
        }

        match self.run_callback_steps(request, &state).await {
            Ok(identity) => AuthenticationOutcome::SignedIn {
                identity,
                properties: state,
            },
            Err(error) => {
                warn!(%error, "authentication failed");
                AuthenticationOutcome::Rejected { properties: state }
            }
        }
    }

    async fn run_callback_steps(
        &self,
        request: &FlowRequest,
        state: &FlowState,
    ) -> FoursquareResult<Identity> {
        let code = request
            .single_query_value("code")
            .ok_or(FoursquareError::MissingAuthorizationCode)?;

        let redirect_uri = self.redirect_uri(request);
        let exchange = self.backchannel.exchange_code(&code, &redirect_uri).await?;

        let Some(access_token) = exchange.access_token() else {
            warn!("access token was not found");
            return Err(FoursquareError::InvalidTokenResponse(
                "access token missing from response".to_string(),
            ));
        };

        let profile = self.backchannel.fetch_profile(access_token).await?;
        let identity = self.build_identity(&profile)?;

        let mut context = AuthenticatedContext {
            access_token: access_token.to_string(),
            profile,
            identity,
            properties: state.clone(),
        };
        self.hooks.authenticated(&mut context).await;

        Ok(context.identity)
    }

    fn build_identity(&self, profile: &FoursquareProfile) -> FoursquareResult<Identity> {
        let id = profile
            .id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                FoursquareError::InvalidProfileResponse(
                    "user document is missing a stable id".to_string(),
                )
            })?;
        let name = profile.display_name();

        let mut identity = Identity::new(self.options.authentication_type.clone());
        identity.add_claim(claim_types::NAME_IDENTIFIER, id);
        identity.add_claim(claim_types::NAME, &name);
        identity.add_claim(FOURSQUARE_ID_CLAIM, id);
        identity.add_claim(FOURSQUARE_NAME_CLAIM, &name);
        if let Some(email) = profile.email.as_deref().filter(|email| !email.trim().is_empty()) {
            identity.add_claim(claim_types::EMAIL, email);
        }

        Ok(identity)
    }

    /// The exact redirect URI sent to the provider, recomputed identically
    /// at challenge and callback time because the provider compares them.
    fn redirect_uri(&self, request: &FlowRequest) -> String {
        format!(
            "{}://{}{}{}",
            request.scheme, request.host, request.path_base, self.options.callback_path
        )
    }
}
