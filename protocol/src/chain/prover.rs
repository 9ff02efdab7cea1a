//! # Proof Service Client
//!
//! The external zero-knowledge proof service turns (ephemeral public key,
//! epoch bound, randomness, salt, identity token) into a proof artifact the
//! ledger can verify. The service's internals are a black box to this
//! client; we never verify the proof locally, and we never need to. The
//! ledger is the verifier of record.
//!
//! Failures here are the one *retryable* class in the authorization flow:
//! a proof request that dies on the network can simply be issued again,
//! because nothing about it mutates local state.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors from the proof service.
#[derive(Debug, Error)]
pub enum ProverError {
    /// The service could not be reached. Retryable.
    #[error("proof service unreachable: {0}")]
    Transport(String),

    /// The service answered with a non-success status. Retryable unless
    /// the status indicates a rejected input (4xx), in which case the
    /// session material itself is suspect.
    #[error("proof service returned {status}: {message}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Response body or status text.
        message: String,
    },

    /// The service answered 200 with a payload that is not JSON.
    #[error("malformed proof service response")]
    MalformedResponse,
}

/// The inputs the proof service consumes, in its wire shape.
///
/// Everything in here is already public or already held by the identity
/// provider; the ephemeral *private* key never leaves this client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProofRequest {
    /// Base64 of the ephemeral Ed25519 public key.
    pub ephemeral_public_key: String,
    /// The session's epoch bound.
    pub max_epoch: u64,
    /// Hex of the 128-bit login randomness.
    pub randomness: String,
    /// Hex of the 128-bit identity salt. The service rejects any other
    /// width.
    pub salt: String,
    /// The raw identity token whose nonce binds all of the above.
    pub id_token: String,
}

/// An opaque proof artifact.
///
/// Whatever JSON the service produced, carried verbatim into the signature
/// package. This client neither inspects nor re-verifies it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProofArtifact(serde_json::Value);

impl ProofArtifact {
    /// Wrap a raw JSON value as an artifact (test fixtures, mostly).
    pub fn from_json(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// The artifact as JSON.
    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }
}

impl fmt::Debug for ProofArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The artifact embeds no secrets, but it is large and noisy.
        write!(f, "ProofArtifact(..)")
    }
}

/// Anything that can produce proof artifacts.
#[async_trait]
pub trait ProofClient: Send + Sync {
    /// Request a proof artifact for the given session material.
    async fn request_proof(&self, request: &ProofRequest) -> Result<ProofArtifact, ProverError>;
}

// ---------------------------------------------------------------------------
// HttpProofClient
// ---------------------------------------------------------------------------

/// Production proof client: POSTs the request as JSON to the service.
pub struct HttpProofClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpProofClient {
    /// Create a client pointed at the proof service URL.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ProofClient for HttpProofClient {
    async fn request_proof(&self, request: &ProofRequest) -> Result<ProofArtifact, ProverError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| ProverError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProverError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|_| ProverError::MalformedResponse)?;
        Ok(ProofArtifact(value))
    }
}

// ---------------------------------------------------------------------------
// CannedProofClient
// ---------------------------------------------------------------------------

/// Deterministic proof client for tests: returns a fixed artifact and
/// records the last request so assertions can check exactly what material
/// was sent to the service.
pub struct CannedProofClient {
    artifact: ProofArtifact,
    last_request: Mutex<Option<ProofRequest>>,
}

impl CannedProofClient {
    /// Create a client that always answers with `artifact`.
    pub fn new(artifact: ProofArtifact) -> Self {
        Self {
            artifact,
            last_request: Mutex::new(None),
        }
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<ProofRequest> {
        self.last_request.lock().clone()
    }
}

#[async_trait]
impl ProofClient for CannedProofClient {
    async fn request_proof(&self, request: &ProofRequest) -> Result<ProofArtifact, ProverError> {
        *self.last_request.lock() = Some(request.clone());
        Ok(self.artifact.clone())
    }
}

/// A proof client that always fails with a transport error, for exercising
/// the retryable path in tests.
pub struct FailingProofClient;

#[async_trait]
impl ProofClient for FailingProofClient {
    async fn request_proof(&self, _request: &ProofRequest) -> Result<ProofArtifact, ProverError> {
        Err(ProverError::Transport("connection reset".to_string()))
    }
}
