//! Encrypted state round-tripping for the challenge/callback hop.
//!
//! The `state` wire parameter carries the post-login return URL and the
//! CSRF correlation token through the provider redirect. It is sealed with
//! AES-256-GCM so the browser can hold it without reading or reworking it;
//! decoding fails closed on any corruption, wrong key, or expiry.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use aes_gcm::Aes256Gcm;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead, KeyInit, Payload};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FoursquareError, FoursquareResult};

// Associated data binding ciphertexts to this flow; a state sealed for
// another purpose or flow version will not open here.
const PURPOSE: &[u8] = b"fsq-identity-foursquare:state:v1";
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Transient state created at challenge time and consumed exactly once at
/// callback time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowState {
    /// Where to send the browser after a completed sign-in.
    pub return_url: Option<String>,
    pub correlation_token: String,
    pub issued_at: DateTime<Utc>,
    /// Host-supplied values round-tripped verbatim.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl FlowState {
    pub fn new(return_url: Option<String>, correlation_token: impl Into<String>) -> Self {
        Self {
            return_url,
            correlation_token: correlation_token.into(),
            issued_at: Utc::now(),
            extra: BTreeMap::new(),
        }
    }
}

/// AES-256 key material for the state codec. Constructed explicitly and
/// injected into the flow; immutable afterwards.
#[derive(Clone)]
pub struct StateKey([u8; KEY_LEN]);

impl StateKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> FoursquareResult<Self> {
        if bytes.len() != KEY_LEN {
            return Err(FoursquareError::Config(format!(
                "state key must be {KEY_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    /// Fresh key from OS entropy. States sealed under a previous key stop
    /// decoding, which ends any in-flight logins.
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        Self(key)
    }
}

impl fmt::Debug for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateKey").finish_non_exhaustive()
    }
}

/// Seals and opens [`FlowState`] values for the wire.
#[derive(Clone)]
pub struct StateCodec {
    cipher: Aes256Gcm,
    ttl: chrono::Duration,
}

impl StateCodec {
    pub fn new(key: &StateKey, ttl: Duration) -> Self {
        let cipher = Aes256Gcm::new(GenericArray::from_slice(&key.0));
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        Self { cipher, ttl }
    }

    /// Seals the state into an opaque URL-safe string.
    pub fn encode(&self, state: &FlowState) -> FoursquareResult<String> {
        let plaintext = serde_json::to_vec(state)?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = GenericArray::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(
                nonce,
                Payload {
                    msg: &plaintext,
                    aad: PURPOSE,
                },
            )
            .map_err(|_| FoursquareError::StateProtection("encryption failed".to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(sealed))
    }

    /// Opens a sealed state. Returns `None` on any failure so callers treat
    /// every bad input, tampered or expired or foreign, the same way.
    pub fn decode(&self, protected: &str) -> Option<FlowState> {
        let raw = URL_SAFE_NO_PAD.decode(protected.as_bytes()).ok()?;
        if raw.len() <= NONCE_LEN {
            return None;
        }
        let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);

        let plaintext = self
            .cipher
            .decrypt(
                GenericArray::from_slice(nonce_bytes),
                Payload {
                    msg: ciphertext,
                    aad: PURPOSE,
                },
            )
            .ok()?;

        let state: FlowState = serde_json::from_slice(&plaintext).ok()?;

        if Utc::now().signed_duration_since(state.issued_at) > self.ttl {
            debug!("state value expired");
            return None;
        }

        Some(state)
    }
}
