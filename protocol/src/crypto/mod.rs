//! # Cryptographic Primitives
//!
//! Low-level building blocks for the identity and secrecy subsystem:
//!
//! - **hash** — SHA-256 (interop-constrained derivations) and BLAKE3
//!   (domain-separated internal derivations).
//! - **keys** — Ed25519 keypairs for ephemeral sessions and wallet-based
//!   recovery keys.
//! - **envelope** — password-based authenticated encryption (PBKDF2 +
//!   AES-256-GCM), the content encryption engine.
//!
//! Nothing here talks to the network and nothing here persists state;
//! these are pure primitives the higher layers compose.

pub mod envelope;
pub mod hash;
pub mod keys;

pub use envelope::{decrypt, encrypt, EncryptedBlob, EncryptionError};
pub use hash::{blake3_hash, domain_separated_hash, domain_separated_multi, sha256, sha256_multi};
pub use keys::{KeyError, Keypair, PublicKey, Signature};
