//! # Deterministic Password Recovery
//!
//! One campaign, one shared password, zero databases storing it. The
//! password exists in exactly two regenerable forms:
//!
//! - **Creator path** — The creator never stores the password at all. It
//!   *is* `SHA-256(campaign_seed ‖ creator_key)`, and the creator key is
//!   re-derivable from the creator's identity on any device: the stable
//!   federated subject claim, or (for wallet users) a hash of a signature
//!   over a fixed message. Same identity, same seed, same password,
//!   forever.
//! - **Participant path** — At response time the password is sealed under
//!   the participant's personal key (same two derivation options) into a
//!   [`ResponseSeed`] and parked publicly on the ledger. Any later device
//!   re-derives the personal key and opens the seed.
//!
//! Both seeds are public. Compromising a seed without controlling the
//! corresponding identity reveals nothing about the password.
//!
//! ## Failure semantics, deliberately split
//!
//! "I don't have an identity right now" (logged out, wallet disconnected,
//! not the creator) is an *expected* outcome: [`AutoRecovery::Unavailable`],
//! and the UI falls back to manual password entry. "I have an identity and
//! it is wrong", or a tampered blob, is a hard
//! [`EncryptionError::Integrity`] from the decrypt call underneath. The
//! two are never collapsed into one another.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{PERSONAL_KEY_MESSAGE, SEED_LENGTH};
use crate::crypto::envelope::{decrypt, encrypt, EncryptedBlob, EncryptionError};
use crate::crypto::hash::{sha256, sha256_multi};
use crate::crypto::keys::Keypair;
use crate::identity::address::ChainAddress;
use crate::identity::claims::Claims;
use crate::identity::derive;

// ---------------------------------------------------------------------------
// Seeds
// ---------------------------------------------------------------------------

/// The public 256-bit random anchor of a campaign's password.
///
/// Persisted on the ledger next to the campaign, visible to everyone, and
/// useless to everyone who isn't the creator.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CampaignSeed([u8; SEED_LENGTH]);

impl CampaignSeed {
    /// Draw a fresh random seed.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SEED_LENGTH];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Construct from raw bytes.
    pub fn from_bytes(bytes: [u8; SEED_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Parse from hex.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let arr: [u8; SEED_LENGTH] = bytes
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self(arr))
    }

    /// Lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; SEED_LENGTH] {
        &self.0
    }
}

impl fmt::Display for CampaignSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for CampaignSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CampaignSeed({})", &self.to_hex()[..16])
    }
}

impl Serialize for CampaignSeed {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CampaignSeed {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        CampaignSeed::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A participant's public escrow of the campaign password: an
/// [`EncryptedBlob`] keyed by that participant's personal key, persisted
/// on the ledger with their response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseSeed {
    blob: EncryptedBlob,
}

impl ResponseSeed {
    /// The encoded blob string as stored on the ledger.
    pub fn encoded(&self) -> String {
        self.blob.encode()
    }

    /// Parse from the stored string form.
    pub fn from_encoded(encoded: &str) -> Result<Self, EncryptionError> {
        Ok(Self {
            blob: EncryptedBlob::decode(encoded)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Recovery keys
// ---------------------------------------------------------------------------

/// An identity-bound secret used to derive or unseal campaign passwords.
///
/// Never persisted, never transmitted; re-derived from the identity on
/// every device, which is the entire trick.
#[derive(Clone, PartialEq, Eq)]
pub struct RecoveryKey {
    material: Vec<u8>,
}

impl RecoveryKey {
    /// Derive from the federated subject claim (token-based login).
    ///
    /// The subject is stable across logins by provider contract, which is
    /// exactly the determinism guarantee identity derivation already
    /// leans on.
    pub fn from_subject(sub: &str) -> Self {
        Self {
            material: sub.as_bytes().to_vec(),
        }
    }

    /// Derive from a wallet keypair (wallet-based login).
    ///
    /// Ed25519 signatures are deterministic, so signing the fixed
    /// [`PERSONAL_KEY_MESSAGE`] always yields the same bytes for the same
    /// wallet; their hash is the key material.
    pub fn from_wallet(keypair: &Keypair) -> Self {
        let signature = keypair.sign(PERSONAL_KEY_MESSAGE);
        Self {
            material: sha256(signature.as_bytes()).to_vec(),
        }
    }

    /// The key as an envelope passphrase (hex, so arbitrary bytes survive
    /// the string-typed encryption API).
    fn as_passphrase(&self) -> String {
        hex::encode(&self.material)
    }
}

impl fmt::Debug for RecoveryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Key material stays out of logs.
        write!(f, "RecoveryKey(..)")
    }
}

// ---------------------------------------------------------------------------
// Password derivation
// ---------------------------------------------------------------------------

/// Derive the campaign password from its seed and a recovery key.
///
/// `hex(SHA-256(seed ‖ key))`. Pure: identical inputs always produce the
/// identical password, which is what lets a creator regenerate it on any
/// device instead of remembering it.
pub fn generate_password_from_seed(seed: &CampaignSeed, key: &RecoveryKey) -> String {
    hex::encode(sha256_multi(&[seed.as_bytes(), &key.material]))
}

// ---------------------------------------------------------------------------
// Auto-recovery
// ---------------------------------------------------------------------------

/// Why automatic recovery was not attempted. These are expected outcomes,
/// not errors; the caller falls back to manual password entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    /// No identity is present (expired login, no wallet connected).
    NoIdentity,
    /// The caller's address is not the campaign's recorded creator.
    NotCreator,
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::NoIdentity => write!(f, "no identity available"),
            UnavailableReason::NotCreator => write!(f, "caller is not the campaign creator"),
        }
    }
}

/// The outcome of an automatic recovery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoRecovery {
    /// The password was regenerated or unsealed.
    Recovered(String),
    /// Recovery was not attempted; fall back to manual entry.
    Unavailable(UnavailableReason),
}

impl AutoRecovery {
    /// The password, if recovery succeeded.
    pub fn password(&self) -> Option<&str> {
        match self {
            AutoRecovery::Recovered(p) => Some(p),
            AutoRecovery::Unavailable(_) => None,
        }
    }
}

/// The caller's current identity, as recovery sees it: an address to
/// compare against creators, and a key to derive or unseal with.
pub struct CallerIdentity {
    /// The caller's chain address.
    pub address: ChainAddress,
    key: RecoveryKey,
}

impl CallerIdentity {
    /// Build from validated federated-login claims.
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            address: derive::derive_address(claims),
            key: RecoveryKey::from_subject(&claims.sub),
        }
    }

    /// Build from a wallet: the wallet's native chain address plus the
    /// signature-derived key.
    pub fn from_wallet(address: ChainAddress, keypair: &Keypair) -> Self {
        Self {
            address,
            key: RecoveryKey::from_wallet(keypair),
        }
    }

    /// The identity's recovery key.
    pub fn key(&self) -> &RecoveryKey {
        &self.key
    }
}

/// Creator path: regenerate the campaign password from its public seed.
///
/// Short-circuits to `Unavailable` (not an error) when no identity is
/// present or when the caller is not the recorded creator; the derivation
/// itself cannot fail. This function never touches a ciphertext, so it
/// has no hard failure mode at all.
pub fn recover_creator_password(
    seed: &CampaignSeed,
    creator_address: &ChainAddress,
    caller: Option<&CallerIdentity>,
) -> AutoRecovery {
    let Some(caller) = caller else {
        return AutoRecovery::Unavailable(UnavailableReason::NoIdentity);
    };
    if caller.address != *creator_address {
        return AutoRecovery::Unavailable(UnavailableReason::NotCreator);
    }
    AutoRecovery::Recovered(generate_password_from_seed(seed, &caller.key))
}

/// Participant path, write side: seal the campaign password under the
/// participant's personal key for later recovery on any device.
pub fn escrow_password(
    password: &str,
    key: &RecoveryKey,
) -> Result<ResponseSeed, EncryptionError> {
    Ok(ResponseSeed {
        blob: encrypt(password, &key.as_passphrase())?,
    })
}

/// Unseal a response seed with an explicit recovery key.
///
/// The key-level building block of the participant path: the matching key
/// returns exactly the escrowed password; any other key (or a tampered
/// blob) fails closed with [`EncryptionError::Integrity`]. There is no way
/// to get a plausible-but-wrong password out of this function.
pub fn unseal_response_seed(
    seed: &ResponseSeed,
    key: &RecoveryKey,
) -> Result<String, EncryptionError> {
    decrypt(&seed.blob, &key.as_passphrase())
}

/// Participant path, read side: unseal the campaign password.
///
/// A missing identity is the soft `Unavailable` outcome. A *present*
/// identity that fails to open the seed (wrong account, tampered blob) is
/// the hard [`EncryptionError::Integrity`] from the decrypt underneath,
/// surfaced as-is.
pub fn recover_participant_password(
    seed: &ResponseSeed,
    caller: Option<&CallerIdentity>,
) -> Result<AutoRecovery, EncryptionError> {
    let Some(caller) = caller else {
        return Ok(AutoRecovery::Unavailable(UnavailableReason::NoIdentity));
    };
    unseal_response_seed(seed, &caller.key).map(AutoRecovery::Recovered)
}
