//! # Federated Login Claims
//!
//! Parsing and boundary validation for the identity provider's signed
//! token. The token arrives as a standard three-segment JWT; this module
//! extracts and validates the payload claims exactly once, producing a
//! [`Claims`] value the rest of the crate can trust without re-checking.
//!
//! ## What is deliberately NOT done here
//!
//! The token's signature is not verified locally. The external proof
//! service verifies it against the provider's published keys when building
//! the proof artifact, and the ledger verifies the proof. This client's job
//! is only to *bind* to the token: the `nonce` claim inside it must match
//! the nonce this client generated, which is checked by the session layer.

use serde::Deserialize;
use thiserror::Error;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

/// Errors raised while turning a raw identity token into [`Claims`].
///
/// All of these are fatal for the login attempt; there is nothing to retry.
#[derive(Debug, Error)]
pub enum IdentityDerivationError {
    /// The token does not have the three dot-separated JWT segments.
    #[error("malformed identity token: expected three segments")]
    MalformedToken,

    /// The payload segment is not valid base64url.
    #[error("malformed identity token: payload is not base64url")]
    PayloadDecode,

    /// The payload decoded but is not a JSON object we understand.
    #[error("malformed identity token: payload is not valid JSON ({0})")]
    PayloadParse(String),

    /// A required claim is absent or empty.
    #[error("identity token is missing required claim '{0}'")]
    MissingClaim(&'static str),
}

/// Validated claims from a federated identity token.
///
/// `iss`, `aud`, `sub`, and `nonce` are guaranteed non-empty. The triple
/// (`iss`, `aud`, `sub`) fully determines the user's chain address;
/// `nonce` ties the token to one specific ephemeral session key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Token issuer (the identity provider).
    pub iss: String,
    /// Audience (this application's client ID at the provider).
    pub aud: String,
    /// The provider's stable subject identifier for the user.
    pub sub: String,
    /// The login nonce this client supplied before the OAuth round-trip.
    pub nonce: String,
    /// Optional display email. A UI hint, never an identity input.
    pub email: Option<String>,
}

/// The raw payload shape as providers actually emit it. `aud` may be a
/// single string or an array (RFC 7519 allows both).
#[derive(Deserialize)]
struct RawClaims {
    iss: Option<String>,
    aud: Option<AudClaim>,
    sub: Option<String>,
    nonce: Option<String>,
    email: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AudClaim {
    One(String),
    Many(Vec<String>),
}

impl Claims {
    /// Parse and validate the payload of a raw identity token.
    ///
    /// Required-field checks happen here and only here; downstream code
    /// (address derivation, nonce binding, recovery keys) takes a `Claims`
    /// and never re-validates.
    pub fn from_id_token(token: &str) -> Result<Self, IdentityDerivationError> {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 {
            return Err(IdentityDerivationError::MalformedToken);
        }

        let payload_bytes = URL_SAFE_NO_PAD
            .decode(segments[1])
            .map_err(|_| IdentityDerivationError::PayloadDecode)?;
        let raw: RawClaims = serde_json::from_slice(&payload_bytes)
            .map_err(|e| IdentityDerivationError::PayloadParse(e.to_string()))?;

        let iss = require(raw.iss, "iss")?;
        let sub = require(raw.sub, "sub")?;
        let nonce = require(raw.nonce, "nonce")?;
        let aud = match raw.aud {
            Some(AudClaim::One(a)) if !a.is_empty() => a,
            // Multi-audience tokens bind to the first entry, which is the
            // requesting client per provider convention.
            Some(AudClaim::Many(list)) => list
                .into_iter()
                .find(|a| !a.is_empty())
                .ok_or(IdentityDerivationError::MissingClaim("aud"))?,
            _ => return Err(IdentityDerivationError::MissingClaim("aud")),
        };

        Ok(Self {
            iss,
            aud,
            sub,
            nonce,
            email: raw.email.filter(|e| !e.is_empty()),
        })
    }
}

fn require(
    value: Option<String>,
    name: &'static str,
) -> Result<String, IdentityDerivationError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(IdentityDerivationError::MissingClaim(name)),
    }
}
