//! # Protocol Configuration & Constants
//!
//! Every magic number in Veilcast lives here. If you're hardcoding a
//! constant somewhere else, you're doing it wrong and you owe the team
//! coffee.
//!
//! Several of these values are contracts with external systems (the proof
//! service, the ledger's address scheme). Changing those is not a refactor,
//! it is a migration.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The full version string, assembled at compile time so we don't allocate
/// for something this trivial at runtime.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Identity Derivation
// ---------------------------------------------------------------------------

/// Width of the identity salt in bytes (128 bits).
///
/// The external proof service accepts exactly this width as its salt input;
/// a wider or narrower value is rejected downstream. Treat this as a hard
/// invariant, not a tunable.
pub const SALT_LENGTH: usize = 16;

/// The claim the address derivation binds to. Identity on the ledger hangs
/// off the federated provider's stable subject identifier.
pub const BINDING_CLAIM: &str = "sub";

/// Chain addresses are 32 bytes, rendered as `0x`-prefixed hex.
pub const ADDRESS_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Ephemeral Sessions
// ---------------------------------------------------------------------------

/// How many epochs past the current one an ephemeral session stays valid.
/// The epoch bound is `current_epoch + EPOCH_VALIDITY_WINDOW` at login.
pub const EPOCH_VALIDITY_WINDOW: u64 = 10;

/// When `epoch_bound - current_epoch` drops to this value or below, the
/// lifecycle monitor starts advising a refresh. Non-fatal until zero.
pub const REFRESH_THRESHOLD_EPOCHS: u64 = 3;

/// Lifecycle monitor poll cadence. Epochs advance on the order of hours,
/// so five minutes gives plenty of warning without hammering the RPC node.
pub const MONITOR_POLL_INTERVAL: Duration = Duration::from_secs(300);

/// Width of the login randomness in bytes (128 bits). Mixed into the nonce
/// so two logins with the same key and epoch still produce distinct nonces.
pub const RANDOMNESS_LENGTH: usize = 16;

/// Width of the truncated nonce digest before encoding. 160 bits is what
/// the ledger's nonce-binding scheme emits.
pub const NONCE_DIGEST_LENGTH: usize = 20;

// ---------------------------------------------------------------------------
// Signature Scheme
// ---------------------------------------------------------------------------

/// Ed25519 secret keys are 32 bytes.
pub const SIGNING_KEY_LENGTH: usize = 32;

/// Ed25519 public keys are 32 bytes.
pub const VERIFYING_KEY_LENGTH: usize = 32;

/// Ed25519 signatures are 64 bytes. If yours isn't, something has gone
/// terribly wrong.
pub const SIGNATURE_LENGTH: usize = 64;

// ---------------------------------------------------------------------------
// Content Encryption
// ---------------------------------------------------------------------------

/// AES-256-GCM key length in bytes.
pub const AES_KEY_LENGTH: usize = 32;

/// AES-256-GCM nonce (IV) length in bytes. 96 bits is the standard and the
/// only length you should use. 12 bytes. Not 16. Not 8. Twelve.
pub const AES_NONCE_LENGTH: usize = 12;

/// AES-256-GCM authentication tag length in bytes.
pub const AES_TAG_LENGTH: usize = 16;

/// PBKDF2-HMAC-SHA512 iteration count for password key stretching.
///
/// Campaign passwords are low-entropy by nature (humans pick them, or they
/// are shared in the clear among participants), so the KDF has to hurt.
/// 100,000 iterations of a wide hash keeps offline guessing expensive while
/// staying under ~100ms on commodity hardware.
pub const KDF_ITERATIONS: u32 = 100_000;

// ---------------------------------------------------------------------------
// Password Recovery
// ---------------------------------------------------------------------------

/// Campaign and response seeds are 256-bit public random values.
pub const SEED_LENGTH: usize = 32;

/// The fixed message wallet-based users sign to derive their personal key.
///
/// The signature over this exact string, hashed, is the stable per-wallet
/// secret that replaces the federated subject claim. Changing one byte here
/// orphans every wallet-derived password in existence.
pub const PERSONAL_KEY_MESSAGE: &[u8] = b"veilcast.personal-key.v1";
