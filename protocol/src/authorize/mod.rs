//! # Proof & Signature Assembly
//!
//! Turning "the user clicked submit" into an artifact the ledger will
//! accept. The assembly is a strict sequence; every step is a hard
//! precondition for the next:
//!
//! 1. Load the ephemeral session (no session, no signature).
//! 2. Recompute the binding nonce from stored material and compare it to
//!    the nonce inside the stored identity token. This is the tripwire
//!    for a stale or substituted ephemeral key, and it fires *before* any
//!    signature exists that could silently fail on-chain or bind to the
//!    wrong key.
//! 3. Ask the external proof service for the artifact.
//! 4. Sign the transaction bytes with the ephemeral private key.
//! 5. Recompute the address-binding seed from the same claims and
//!    assemble the package.
//! 6. Cross-check the recomputed address against the one the user has
//!    been shown. A mismatch is an advisory, not a failure; the ledger
//!    enforces signature validity regardless.
//!
//! Only step 3 is retryable. Steps 1 and 2 failing mean the user signs in
//! again, full stop.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::chain::prover::{ProofArtifact, ProofClient, ProofRequest, ProverError};
use crate::crypto::keys::Signature;
use crate::identity::address::{AddressSeed, ChainAddress};
use crate::identity::claims::{Claims, IdentityDerivationError};
use crate::identity::derive;
use crate::session::store::SessionStore;

/// Errors from signature assembly.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No session, or a session that never completed login.
    #[error("no active session; sign in first")]
    SessionInvalid,

    /// The binding check between stored material and the identity token
    /// failed. The session has been discarded; re-authentication is the
    /// only recovery. Never retried automatically.
    #[error("session binding check failed; sign in again")]
    NonceMismatch,

    /// The proof service call failed. Retryable; nothing local changed.
    #[error(transparent)]
    Prover(#[from] ProverError),

    /// The stored identity token no longer parses. Fatal for this session.
    #[error(transparent)]
    Identity(#[from] IdentityDerivationError),
}

/// The on-chain authorization artifact: proof, seed, bound, signature.
///
/// Built once per transaction and handed to the submission path (or the
/// gas sponsorship endpoint); never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignaturePackage {
    /// The external proof artifact, verbatim.
    pub proof: ProofArtifact,
    /// The claim-bound address seed.
    pub address_seed: AddressSeed,
    /// The session's epoch bound.
    pub max_epoch: u64,
    /// Ed25519 signature over the transaction bytes.
    pub ephemeral_signature: Signature,
}

/// Advisory produced when the recomputed address differs from the one the
/// user has been shown. Surfaced, never blocking: the ledger will judge
/// the signature on its own merits either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressMismatch {
    /// The address from the durable profile (what the UI displayed).
    pub displayed: ChainAddress,
    /// The address freshly derived from the token claims.
    pub derived: ChainAddress,
}

impl fmt::Display for AddressMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "derived address {} differs from displayed address {}",
            self.derived, self.displayed
        )
    }
}

/// A completed authorization: the package plus any advisory.
#[derive(Debug, Clone)]
pub struct Authorization {
    /// The artifact to attach to the transaction.
    pub package: SignaturePackage,
    /// Present when step 6's cross-check disagreed.
    pub address_warning: Option<AddressMismatch>,
}

/// Assembles signature packages from the stored session and the proof
/// service.
pub struct SignatureAssembler {
    store: Arc<dyn SessionStore>,
    proof_client: Arc<dyn ProofClient>,
}

impl SignatureAssembler {
    /// Create an assembler over the given store and proof client.
    pub fn new(store: Arc<dyn SessionStore>, proof_client: Arc<dyn ProofClient>) -> Self {
        Self {
            store,
            proof_client,
        }
    }

    /// Produce an authorization for the given transaction bytes.
    pub async fn authorize(&self, transaction_bytes: &[u8]) -> Result<Authorization, AuthError> {
        // Step 1: a session with a completed login.
        let session = self.store.session().ok_or(AuthError::SessionInvalid)?;
        let id_token = session
            .id_token
            .clone()
            .ok_or(AuthError::SessionInvalid)?;

        // Step 2: the binding check. The recomputation must agree with
        // both the stored nonce and the token's embedded nonce; either
        // mismatch means the stored material and the token no longer
        // describe the same login.
        let claims = Claims::from_id_token(&id_token)?;
        let recomputed = session.recompute_nonce();
        if recomputed != session.nonce || recomputed != claims.nonce {
            self.store.clear_session();
            tracing::warn!("nonce binding check failed during authorization");
            return Err(AuthError::NonceMismatch);
        }

        // Step 3: the proof artifact. The only retryable step.
        let salt = derive::derive_salt(&claims);
        let request = ProofRequest {
            ephemeral_public_key: session.keypair.public_key().to_base64(),
            max_epoch: session.max_epoch,
            randomness: hex::encode(session.randomness),
            salt: hex::encode(salt),
            id_token,
        };
        let proof = self.proof_client.request_proof(&request).await?;

        // Step 4: the ephemeral signature over the transaction bytes.
        let ephemeral_signature = session.keypair.sign(transaction_bytes);

        // Step 5: the seed, recomputed from the same claims.
        let address_seed = derive::derive_address_seed(&claims);
        let package = SignaturePackage {
            proof,
            address_seed,
            max_epoch: session.max_epoch,
            ephemeral_signature,
        };

        // Step 6: advisory address cross-check.
        let derived = derive::derive_address(&claims);
        let address_warning = self.store.profile().and_then(|profile| {
            (profile.address != derived).then(|| {
                let warning = AddressMismatch {
                    displayed: profile.address,
                    derived,
                };
                tracing::warn!(%warning, "address cross-check mismatch");
                warning
            })
        });

        Ok(Authorization {
            package,
            address_warning,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::epoch::FixedEpochSource;
    use crate::chain::prover::{CannedProofClient, FailingProofClient};
    use crate::crypto::keys::Keypair;
    use crate::session::ephemeral::SessionManager;
    use crate::session::store::{MemorySessionStore, ProfileHints, SessionStore};
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine as _;
    use serde_json::json;

    fn token(nonce: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(
            json!({
                "iss": "https://accounts.example.com",
                "aud": "veilcast-web",
                "sub": "user-1",
                "nonce": nonce,
            })
            .to_string()
            .as_bytes(),
        );
        format!("{header}.{payload}.sig")
    }

    async fn logged_in_store() -> Arc<MemorySessionStore> {
        let store = Arc::new(MemorySessionStore::new());
        let manager = SessionManager::new(store.clone(), Arc::new(FixedEpochSource::new(90)));
        let challenge = manager.begin_login().await.unwrap();
        manager.complete_login(&token(&challenge.nonce)).unwrap();
        store
    }

    fn canned() -> Arc<CannedProofClient> {
        Arc::new(CannedProofClient::new(ProofArtifact::from_json(
            json!({"points": ["a", "b", "c"]}),
        )))
    }

    #[tokio::test]
    async fn full_assembly_produces_verifiable_package() {
        let store = logged_in_store().await;
        let proof_client = canned();
        let assembler = SignatureAssembler::new(store.clone(), proof_client.clone());

        let tx = b"submit response to campaign 7";
        let auth = assembler.authorize(tx).await.unwrap();

        assert_eq!(auth.package.max_epoch, 100);
        assert!(auth.address_warning.is_none());

        // The signature verifies against the session's ephemeral key.
        let session = store.session().unwrap();
        assert!(session
            .keypair
            .public_key()
            .verify(tx, &auth.package.ephemeral_signature));

        // The proof service saw exactly the stored session material.
        let request = proof_client.last_request().unwrap();
        assert_eq!(request.max_epoch, 100);
        assert_eq!(request.randomness, hex::encode(session.randomness));
        assert_eq!(
            request.ephemeral_public_key,
            session.keypair.public_key().to_base64()
        );
        assert_eq!(request.salt.len(), 32, "16-byte salt, hex encoded");
    }

    #[tokio::test]
    async fn no_session_is_invalid() {
        let assembler =
            SignatureAssembler::new(Arc::new(MemorySessionStore::new()), canned());
        assert!(matches!(
            assembler.authorize(b"tx").await,
            Err(AuthError::SessionInvalid)
        ));
    }

    #[tokio::test]
    async fn incomplete_login_is_invalid() {
        // A session that never received its token cannot authorize.
        let store = Arc::new(MemorySessionStore::new());
        let manager = SessionManager::new(store.clone(), Arc::new(FixedEpochSource::new(90)));
        manager.begin_login().await.unwrap();

        let assembler = SignatureAssembler::new(store, canned());
        assert!(matches!(
            assembler.authorize(b"tx").await,
            Err(AuthError::SessionInvalid)
        ));
    }

    #[tokio::test]
    async fn substituted_key_trips_binding_check_and_clears_session() {
        let store = logged_in_store().await;

        // Swap the ephemeral keypair underneath the stored token, as a
        // compromised or confused storage layer might.
        let mut session = store.session().unwrap();
        session.keypair = Keypair::generate();
        store.store_session(session);

        let assembler = SignatureAssembler::new(store.clone(), canned());
        assert!(matches!(
            assembler.authorize(b"tx").await,
            Err(AuthError::NonceMismatch)
        ));
        assert!(store.session().is_none(), "poisoned session discarded");
    }

    #[tokio::test]
    async fn prover_failure_is_retryable_and_preserves_session() {
        let store = logged_in_store().await;
        let assembler = SignatureAssembler::new(store.clone(), Arc::new(FailingProofClient));

        assert!(matches!(
            assembler.authorize(b"tx").await,
            Err(AuthError::Prover(ProverError::Transport(_)))
        ));
        // Nothing local changed; the caller may retry as-is.
        assert!(store.session().is_some());
    }

    #[tokio::test]
    async fn address_mismatch_is_surfaced_but_not_fatal() {
        let store = logged_in_store().await;
        store.store_profile(ProfileHints {
            address: ChainAddress::from_bytes([0xEE; 32]),
            email: None,
        });

        let assembler = SignatureAssembler::new(store, canned());
        let auth = assembler.authorize(b"tx").await.unwrap();

        let warning = auth.address_warning.expect("mismatch must be surfaced");
        assert_eq!(warning.displayed, ChainAddress::from_bytes([0xEE; 32]));
        assert_ne!(warning.displayed, warning.derived);
    }

    #[tokio::test]
    async fn package_serializes_to_camel_case_json() {
        let store = logged_in_store().await;
        let assembler = SignatureAssembler::new(store, canned());
        let auth = assembler.authorize(b"tx").await.unwrap();

        let v = serde_json::to_value(&auth.package).unwrap();
        assert!(v.get("addressSeed").is_some());
        assert!(v.get("maxEpoch").is_some());
        assert!(v.get("ephemeralSignature").is_some());
        assert!(v.get("proof").is_some());
    }
}
