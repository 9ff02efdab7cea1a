//! # Chain Epoch Source
//!
//! The ledger's logical clock. Ephemeral sessions are valid for a window
//! of epochs, so both the login flow and the lifecycle monitor need to ask
//! "what epoch is it now?". That question is the entire interface.
//!
//! The trait exists so tests can pin time: [`FixedEpochSource`] lets a test
//! walk a session from fresh to expiring to expired without a network or a
//! clock in sight.

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

use super::rpc::{RpcRequest, RpcResponse};

/// Errors from the epoch source.
///
/// All of these are retryable from the caller's perspective; none of them
/// invalidate a session by themselves. A login attempt that hits one fails
/// loudly rather than guessing an epoch.
#[derive(Debug, Error)]
pub enum EpochError {
    /// The RPC node could not be reached.
    #[error("epoch source unreachable: {0}")]
    Transport(String),

    /// The node answered with a JSON-RPC error.
    #[error("epoch rpc error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// JSON-RPC error message.
        message: String,
    },

    /// The node answered 200 but the payload made no sense.
    #[error("malformed epoch response")]
    MalformedResponse,
}

/// Anything that can report the ledger's current epoch.
#[async_trait]
pub trait EpochSource: Send + Sync {
    /// The current epoch number.
    async fn current_epoch(&self) -> Result<u64, EpochError>;
}

// ---------------------------------------------------------------------------
// HttpEpochSource
// ---------------------------------------------------------------------------

/// Production epoch source: asks a ledger RPC node via JSON-RPC 2.0.
///
/// Expects `veil_getEpoch` to return `{ "epoch": <u64> }`.
pub struct HttpEpochSource {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpEpochSource {
    /// Create a source pointed at the given RPC endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl EpochSource for HttpEpochSource {
    async fn current_epoch(&self) -> Result<u64, EpochError> {
        let request = RpcRequest::new(1, "veil_getEpoch", json!([]));

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| EpochError::Transport(e.to_string()))?;

        let rpc: RpcResponse = response
            .json()
            .await
            .map_err(|_| EpochError::MalformedResponse)?;

        if let Some(err) = rpc.error {
            return Err(EpochError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        rpc.result
            .as_ref()
            .and_then(|r| r.get("epoch"))
            .and_then(serde_json::Value::as_u64)
            .ok_or(EpochError::MalformedResponse)
    }
}

// ---------------------------------------------------------------------------
// FixedEpochSource
// ---------------------------------------------------------------------------

/// Deterministic epoch source for tests: always reports the value it was
/// last given. `set` lets a test advance the chain one assertion at a time.
pub struct FixedEpochSource {
    epoch: AtomicU64,
}

impl FixedEpochSource {
    /// Create a source pinned to the given epoch.
    pub fn new(epoch: u64) -> Self {
        Self {
            epoch: AtomicU64::new(epoch),
        }
    }

    /// Move the chain to a new epoch.
    pub fn set(&self, epoch: u64) {
        self.epoch.store(epoch, Ordering::SeqCst);
    }
}

#[async_trait]
impl EpochSource for FixedEpochSource {
    async fn current_epoch(&self) -> Result<u64, EpochError> {
        Ok(self.epoch.load(Ordering::SeqCst))
    }
}

/// An epoch source that always fails, for exercising the unreachable-node
/// paths in tests.
pub struct UnreachableEpochSource;

#[async_trait]
impl EpochSource for UnreachableEpochSource {
    async fn current_epoch(&self) -> Result<u64, EpochError> {
        Err(EpochError::Transport("connection refused".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_source_reports_and_advances() {
        let source = FixedEpochSource::new(41);
        assert_eq!(source.current_epoch().await.unwrap(), 41);
        source.set(42);
        assert_eq!(source.current_epoch().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn unreachable_source_fails() {
        let err = UnreachableEpochSource.current_epoch().await.unwrap_err();
        assert!(matches!(err, EpochError::Transport(_)));
    }
}
