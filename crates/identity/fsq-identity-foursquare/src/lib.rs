//! Foursquare OAuth2 sign-in flow.
//!
//! This crate drives the provider side of a "Log in with Foursquare" button:
//! it redirects an unauthenticated request to Foursquare's consent page,
//! processes the callback, exchanges the authorization code for an access
//! token, fetches the user's profile, and hands the host a normalized claims
//! identity. Host-framework concerns (routing, session issuance) stay with
//! the caller, which invokes [`FoursquareFlow::challenge`] and
//! [`FoursquareFlow::invoke`] at the appropriate points of its request
//! lifecycle.

mod client;
mod config;
mod correlation;
mod error;
mod flow;
mod hooks;
mod profile;
mod state;
mod types;


pub use client::{Backchannel, TokenExchange};
pub use config::FoursquareOptions;
pub use correlation::CorrelationGuard;
pub use error::{FoursquareError, FoursquareResult};
pub use flow::{FOURSQUARE_ID_CLAIM, FOURSQUARE_NAME_CLAIM, FoursquareFlow};
pub use hooks::{AuthenticatedContext, FoursquareHooks, NoopHooks, ReturnEndpointContext};
pub use profile::FoursquareProfile;
pub use state::{FlowState, StateCodec, StateKey};
pub use types::{AuthenticationOutcome, FlowRequest, FlowResponse, SetCookie, SignInGrant};

// Re-export common types for convenience
pub use fsq_identity_core::{Claim, Identity, claim_types};
