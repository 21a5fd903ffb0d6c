//! Core claim and identity types shared between sign-in flows and their hosts.

use serde::{Deserialize, Serialize};

/// Claim type URIs understood by claims-aware hosts.
pub mod claim_types {
    pub const NAME_IDENTIFIER: &str =
        "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier";
    pub const NAME: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name";
    pub const EMAIL: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress";
}

/// A single (type, value) attribute describing the authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub claim_type: String,
    pub value: String,
}

impl Claim {
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }
}

/// Normalized set of claims handed to the host application at sign-in,
/// tagged with the authentication type that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub authentication_type: String,
    pub claims: Vec<Claim>,
}

impl Identity {
    pub fn new(authentication_type: impl Into<String>) -> Self {
        Self {
            authentication_type: authentication_type.into(),
            claims: Vec::new(),
        }
    }

    pub fn add_claim(&mut self, claim_type: impl Into<String>, value: impl Into<String>) {
        self.claims.push(Claim::new(claim_type, value));
    }

    pub fn with_claim(
        mut self,
        claim_type: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.add_claim(claim_type, value);
        self
    }

    /// First claim value of the given type, if any.
    pub fn claim(&self, claim_type: &str) -> Option<&str> {
        self.claims
            .iter()
            .find(|claim| claim.claim_type == claim_type)
            .map(|claim| claim.value.as_str())
    }

    pub fn name(&self) -> Option<&str> {
        self.claim(claim_types::NAME)
    }

    pub fn name_identifier(&self) -> Option<&str> {
        self.claim(claim_types::NAME_IDENTIFIER)
    }

    /// Re-tags the identity with a different authentication type, keeping
    /// the claims as they are.
    pub fn into_authentication_type(self, authentication_type: impl Into<String>) -> Self {
        Self {
            authentication_type: authentication_type.into(),
            claims: self.claims,
        }
    }
}
