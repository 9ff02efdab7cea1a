//! # Chain Addresses & Address Seeds
//!
//! A [`ChainAddress`] is the ledger-visible identity of a participant:
//! 32 bytes, rendered as `0x`-prefixed hex. It is derived deterministically
//! from federated-login claims (see [`crate::identity::derive`]) and is
//! never a secret; anyone may know anyone's address.
//!
//! An [`AddressSeed`] is the claim-bound value that, combined with the
//! external proof artifact, makes an ephemeral signature acceptable to the
//! ledger. Also non-secret, also deterministic.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::ADDRESS_LENGTH;

/// Errors that can occur parsing an address string.
#[derive(Debug, Error)]
pub enum AddressParseError {
    /// The string is not valid hex (after the optional `0x` prefix).
    #[error("invalid hex in address")]
    InvalidHex,

    /// The decoded payload has an unexpected length.
    #[error("invalid address length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// Expected number of bytes.
        expected: usize,
        /// Actual number of bytes decoded.
        got: usize,
    },
}

// ---------------------------------------------------------------------------
// ChainAddress
// ---------------------------------------------------------------------------

/// A 32-byte ledger address, displayed as `0x`-prefixed hex.
///
/// # Examples
///
/// ```
/// use veilcast_protocol::identity::address::ChainAddress;
///
/// let addr = ChainAddress::from_bytes([0xab; 32]);
/// assert!(addr.to_hex().starts_with("0x"));
/// assert_eq!(ChainAddress::from_hex(&addr.to_hex()).unwrap(), addr);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainAddress([u8; ADDRESS_LENGTH]);

impl ChainAddress {
    /// Construct from raw bytes.
    pub fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse an address string. The `0x` prefix is accepted but optional.
    pub fn from_hex(s: &str) -> Result<Self, AddressParseError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|_| AddressParseError::InvalidHex)?;
        if bytes.len() != ADDRESS_LENGTH {
            return Err(AddressParseError::InvalidLength {
                expected: ADDRESS_LENGTH,
                got: bytes.len(),
            });
        }
        let mut arr = [0u8; ADDRESS_LENGTH];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Display for ChainAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for ChainAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainAddress({})", self.to_hex())
    }
}

impl Serialize for ChainAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for ChainAddress {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            ChainAddress::from_hex(&s).map_err(serde::de::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            if bytes.len() != ADDRESS_LENGTH {
                return Err(serde::de::Error::custom(format!(
                    "expected {ADDRESS_LENGTH}-byte address, got {}",
                    bytes.len()
                )));
            }
            let mut arr = [0u8; ADDRESS_LENGTH];
            arr.copy_from_slice(&bytes);
            Ok(ChainAddress(arr))
        }
    }
}

// ---------------------------------------------------------------------------
// AddressSeed
// ---------------------------------------------------------------------------

/// The claim-bound seed carried inside a signature package.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AddressSeed([u8; 32]);

impl AddressSeed {
    /// Construct from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex, no prefix (the form the sponsorship endpoint takes).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for AddressSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for AddressSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AddressSeed({})", &self.to_hex()[..16])
    }
}

impl Serialize for AddressSeed {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for AddressSeed {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
            let arr: [u8; 32] = bytes
                .try_into()
                .map_err(|_| serde::de::Error::custom("expected 32-byte address seed"))?;
            Ok(AddressSeed(arr))
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            let arr: [u8; 32] = bytes
                .try_into()
                .map_err(|_| serde::de::Error::custom("expected 32-byte address seed"))?;
            Ok(AddressSeed(arr))
        }
    }
}
