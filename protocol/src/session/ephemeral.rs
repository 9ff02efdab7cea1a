//! # Ephemeral Sessions
//!
//! A login in Veilcast is not a row in a database; it is a short-lived
//! keypair cryptographically welded to an identity token. The welding is
//! the nonce: `bind_nonce(public_key, max_epoch, randomness)` is supplied
//! to the identity provider before the OAuth round-trip, comes back signed
//! inside the token, and from then on any attempt to swap the key, the
//! epoch bound, or the randomness under that token is detectable by
//! recomputation.
//!
//! The [`SessionManager`] owns the choreography: `begin_login` produces
//! the challenge, `complete_login` verifies the returned token's binding
//! and derives the address, `logout` tears everything down.

use chrono::{DateTime, Utc};
use rand::RngCore;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::chain::epoch::{EpochError, EpochSource};
use crate::chain::primitives::bind_nonce;
use crate::config::{EPOCH_VALIDITY_WINDOW, RANDOMNESS_LENGTH};
use crate::crypto::keys::Keypair;
use crate::identity::address::ChainAddress;
use crate::identity::claims::{Claims, IdentityDerivationError};
use crate::identity::derive::DerivedIdentity;
use crate::session::store::{ProfileHints, SessionStore};

/// Errors from session management.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No usable session exists. Sign in first.
    #[error("no active session; sign in first")]
    Invalid,

    /// The nonce binding check failed: the stored ephemeral material does
    /// not match the identity token. The session has been discarded; a
    /// fresh sign-in is the only way forward. Never downgraded, never
    /// retried automatically.
    #[error("session binding check failed; sign in again")]
    NonceMismatch,

    /// The session's epoch bound has passed and the session was discarded.
    #[error("session expired; sign in again")]
    Expired,

    /// The chain epoch could not be determined. Retryable; the login flow
    /// aborts rather than guessing an epoch bound.
    #[error(transparent)]
    EpochSource(#[from] EpochError),

    /// The identity token could not be parsed or validated.
    #[error(transparent)]
    Identity(#[from] IdentityDerivationError),
}

// ---------------------------------------------------------------------------
// EphemeralSession
// ---------------------------------------------------------------------------

/// Everything one login leaves in the session scope.
///
/// Created at login initiation, replaced wholesale on refresh, destroyed
/// on logout or detected invalidity; never field-mutated in place.
/// Invariant: `nonce` is a pure function of (public key, `max_epoch`,
/// `randomness`). [`recompute_nonce`](Self::recompute_nonce) re-derives it
/// from stored data; if the result ever disagrees with the stored value or
/// with the token's embedded nonce, the session is untrustworthy.
#[derive(Clone)]
pub struct EphemeralSession {
    /// The per-login keypair. The private half never leaves this scope.
    pub keypair: Keypair,
    /// Last epoch (inclusive-exclusive bound) at which this session may
    /// sign.
    pub max_epoch: u64,
    /// 128-bit login randomness mixed into the nonce.
    pub randomness: [u8; RANDOMNESS_LENGTH],
    /// The nonce handed to the identity provider.
    pub nonce: String,
    /// The raw identity token, present once the OAuth round-trip returns.
    pub id_token: Option<String>,
    /// When this session was created.
    pub created_at: DateTime<Utc>,
}

impl EphemeralSession {
    /// Re-derive the nonce from stored material.
    pub fn recompute_nonce(&self) -> String {
        bind_nonce(&self.keypair.public_key(), self.max_epoch, &self.randomness)
    }

    /// Whether the stored nonce still matches a fresh recomputation.
    pub fn is_consistent(&self) -> bool {
        self.recompute_nonce() == self.nonce
    }
}

impl fmt::Debug for EphemeralSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The raw token is sensitive (it is a bearer credential until it
        // expires) and the keypair guards itself; print neither.
        f.debug_struct("EphemeralSession")
            .field("public_key", &self.keypair.public_key())
            .field("max_epoch", &self.max_epoch)
            .field("has_token", &self.id_token.is_some())
            .field("created_at", &self.created_at)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// SessionManager
// ---------------------------------------------------------------------------

/// The challenge handed to the identity provider at login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginChallenge {
    /// The binding nonce to embed in the OAuth request.
    pub nonce: String,
    /// The epoch bound the session was issued under.
    pub max_epoch: u64,
}

/// The result of a completed login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// The derived chain address.
    pub address: ChainAddress,
    /// The validated claims from the token.
    pub claims: Claims,
}

/// Orchestrates the ephemeral-session login flow against a store and an
/// epoch source.
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    epoch_source: Arc<dyn EpochSource>,
}

impl SessionManager {
    /// Create a manager over the given store and epoch source.
    pub fn new(store: Arc<dyn SessionStore>, epoch_source: Arc<dyn EpochSource>) -> Self {
        Self {
            store,
            epoch_source,
        }
    }

    /// Start a login: generate the ephemeral keypair and the binding nonce.
    ///
    /// The store is written only after the epoch fetch succeeds; a caller
    /// that abandons the await leaves no partial session behind. An
    /// unreachable epoch source aborts the flow with an error; there is no
    /// fallback epoch to guess.
    pub async fn begin_login(&self) -> Result<LoginChallenge, SessionError> {
        let keypair = Keypair::generate();
        let mut randomness = [0u8; RANDOMNESS_LENGTH];
        rand::rngs::OsRng.fill_bytes(&mut randomness);

        let current_epoch = self.epoch_source.current_epoch().await?;
        let max_epoch = current_epoch + EPOCH_VALIDITY_WINDOW;
        let nonce = bind_nonce(&keypair.public_key(), max_epoch, &randomness);

        let session = EphemeralSession {
            keypair,
            max_epoch,
            randomness,
            nonce: nonce.clone(),
            id_token: None,
            created_at: Utc::now(),
        };
        self.store.store_session(session);

        tracing::debug!(max_epoch, "login challenge issued");
        Ok(LoginChallenge { nonce, max_epoch })
    }

    /// Finish a login with the token the identity provider returned.
    ///
    /// Verifies the token's embedded nonce against both the stored nonce
    /// and a fresh recomputation from stored material, attaches the token
    /// to the session, derives the chain address, and persists the
    /// durable profile hints. On a binding failure the session is
    /// discarded before the error is returned; a poisoned session must
    /// not survive to be retried.
    pub fn complete_login(&self, id_token: &str) -> Result<LoginOutcome, SessionError> {
        let mut session = self.store.session().ok_or(SessionError::Invalid)?;
        let claims = Claims::from_id_token(id_token)?;

        let recomputed = session.recompute_nonce();
        if claims.nonce != recomputed || session.nonce != recomputed {
            self.store.clear_session();
            tracing::warn!("nonce binding check failed at login completion");
            return Err(SessionError::NonceMismatch);
        }

        session.id_token = Some(id_token.to_string());
        let identity = DerivedIdentity::from_claims(claims.clone());
        self.store.store_session(session);
        self.store.store_profile(ProfileHints {
            address: identity.address,
            email: claims.email.clone(),
        });

        tracing::info!(address = %identity.address, "login completed");
        Ok(LoginOutcome {
            address: identity.address,
            claims,
        })
    }

    /// Tear down the session and the durable hints.
    pub fn logout(&self) {
        self.store.clear_session();
        self.store.clear_profile();
        tracing::info!("session cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::epoch::{FixedEpochSource, UnreachableEpochSource};
    use crate::session::store::MemorySessionStore;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine as _;
    use serde_json::json;

    fn token(nonce: &str, sub: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(
            json!({
                "iss": "https://accounts.example.com",
                "aud": "veilcast-web",
                "sub": sub,
                "nonce": nonce,
                "email": "voter@example.com",
            })
            .to_string()
            .as_bytes(),
        );
        format!("{header}.{payload}.sig")
    }

    fn manager() -> (Arc<MemorySessionStore>, Arc<FixedEpochSource>, SessionManager) {
        let store = Arc::new(MemorySessionStore::new());
        let epoch = Arc::new(FixedEpochSource::new(90));
        let manager = SessionManager::new(store.clone(), epoch.clone());
        (store, epoch, manager)
    }

    #[tokio::test]
    async fn begin_login_sets_epoch_bound_and_stores_session() {
        let (store, _epoch, manager) = manager();
        let challenge = manager.begin_login().await.unwrap();

        assert_eq!(challenge.max_epoch, 100);
        let session = store.session().unwrap();
        assert_eq!(session.nonce, challenge.nonce);
        assert!(session.id_token.is_none());
        assert!(session.is_consistent());
    }

    #[tokio::test]
    async fn begin_login_aborts_without_store_write_on_epoch_failure() {
        let store = Arc::new(MemorySessionStore::new());
        let manager = SessionManager::new(store.clone(), Arc::new(UnreachableEpochSource));

        let err = manager.begin_login().await.unwrap_err();
        assert!(matches!(err, SessionError::EpochSource(_)));
        assert!(store.session().is_none(), "no partial session on failure");
    }

    #[tokio::test]
    async fn complete_login_binds_token_and_derives_address() {
        let (store, _epoch, manager) = manager();
        let challenge = manager.begin_login().await.unwrap();

        let outcome = manager.complete_login(&token(&challenge.nonce, "user-1")).unwrap();

        let session = store.session().unwrap();
        assert!(session.id_token.is_some());
        let profile = store.profile().unwrap();
        assert_eq!(profile.address, outcome.address);
        assert_eq!(profile.email.as_deref(), Some("voter@example.com"));
    }

    #[tokio::test]
    async fn complete_login_rejects_foreign_nonce_and_clears_session() {
        let (store, _epoch, manager) = manager();
        manager.begin_login().await.unwrap();

        let err = manager
            .complete_login(&token("some-other-nonce", "user-1"))
            .unwrap_err();
        assert!(matches!(err, SessionError::NonceMismatch));
        assert!(store.session().is_none(), "poisoned session discarded");
    }

    #[tokio::test]
    async fn complete_login_without_begin_is_invalid() {
        let (_store, _epoch, manager) = manager();
        assert!(matches!(
            manager.complete_login(&token("n", "user-1")),
            Err(SessionError::Invalid)
        ));
    }

    #[tokio::test]
    async fn tampered_session_fails_recomputation() {
        let (store, _epoch, manager) = manager();
        let challenge = manager.begin_login().await.unwrap();

        // Substitute the stored keypair, keeping everything else. The
        // recomputed nonce no longer matches the token's.
        let mut session = store.session().unwrap();
        session.keypair = Keypair::generate();
        store.store_session(session);

        let err = manager
            .complete_login(&token(&challenge.nonce, "user-1"))
            .unwrap_err();
        assert!(matches!(err, SessionError::NonceMismatch));
    }

    #[tokio::test]
    async fn malformed_token_is_identity_error() {
        let (_store, _epoch, manager) = manager();
        manager.begin_login().await.unwrap();
        assert!(matches!(
            manager.complete_login("not-a-token"),
            Err(SessionError::Identity(_))
        ));
    }

    #[tokio::test]
    async fn logout_clears_both_scopes() {
        let (store, _epoch, manager) = manager();
        let challenge = manager.begin_login().await.unwrap();
        manager.complete_login(&token(&challenge.nonce, "user-1")).unwrap();

        manager.logout();
        assert!(store.session().is_none());
        assert!(store.profile().is_none());
    }

    #[tokio::test]
    async fn relogin_replaces_session_wholesale() {
        let (store, _epoch, manager) = manager();
        let first = manager.begin_login().await.unwrap();
        let second = manager.begin_login().await.unwrap();

        assert_ne!(first.nonce, second.nonce, "fresh key and randomness");
        assert_eq!(store.session().unwrap().nonce, second.nonce);
    }
}
