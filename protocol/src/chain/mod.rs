//! # Chain Interfaces
//!
//! Everything this client knows about the outside world, behind narrow
//! seams:
//!
//! - **epoch** — The ledger's logical clock ([`EpochSource`]).
//! - **prover** — The external proof service ([`ProofClient`]).
//! - **rpc** — The JSON-RPC 2.0 envelope the epoch client speaks.
//! - **primitives** — The ledger's fixed derivation schemes (addresses,
//!   seeds, nonce binding). Deterministic and consensus-critical; not
//!   configurable.
//!
//! Both network seams ship deterministic test doubles
//! ([`FixedEpochSource`], [`CannedProofClient`]) so every flow in this
//! crate can run under test with pinned epochs and canned proofs.

pub mod epoch;
pub mod primitives;
pub mod prover;
pub mod rpc;

pub use epoch::{EpochError, EpochSource, FixedEpochSource, HttpEpochSource};
pub use primitives::{bind_nonce, derive_address_seed, derive_chain_address};
pub use prover::{
    CannedProofClient, HttpProofClient, ProofArtifact, ProofClient, ProofRequest, ProverError,
};
