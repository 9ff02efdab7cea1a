//! # Hashing Utilities
//!
//! Two hash functions, two jobs, no more:
//!
//! - **SHA-256** — Identity salt derivation and password derivation. The
//!   external proof service and the on-ledger contracts both expect SHA-256
//!   here, so this is an interop constraint, not a preference.
//!
//! - **BLAKE3** — The ledger's own derivation primitives (addresses, nonce
//!   binding) and anything Veilcast-internal. The `derive_key` mode gives
//!   proper domain separation by construction.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of the input data.
///
/// # Example
///
/// ```
/// use veilcast_protocol::crypto::hash::sha256;
///
/// let digest = sha256(b"veilcast");
/// assert_eq!(digest.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// SHA-256 over multiple byte slices without concatenation overhead.
///
/// Feeding the parts sequentially into the hasher is identical to hashing
/// their concatenation, so `sha256_multi(&[a, b]) == sha256(a ‖ b)`.
/// Callers that need unambiguous field boundaries must add their own
/// framing; salt derivation deliberately uses plain concatenation because
/// that is the format the proof service fixed.
pub fn sha256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Compute the BLAKE3 hash of the input data.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Compute a domain-separated hash using BLAKE3 with a context string.
///
/// Uses BLAKE3's built-in `derive_key` mode: the context string selects a
/// distinct internal IV, so the same data hashed under two contexts can
/// never collide. Don't prepend tags manually; this is the supported way.
pub fn domain_separated_hash(context: &str, data: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    hasher.update(data);
    *hasher.finalize().as_bytes()
}

/// Domain-separated BLAKE3 over multiple fields, each length-prefixed.
///
/// Every part is preceded by its length as a little-endian `u64`, which
/// keeps field boundaries unambiguous: `["ab", "c"]` and `["a", "bc"]`
/// hash differently. The ledger's derivation primitives are specified over
/// framed fields, so this is the building block they all share.
pub fn domain_separated_multi(context: &str, parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    for part in parts {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        // SHA-256 of the empty string, the canonical test vector.
        let digest = sha256(b"");
        let expected =
            hex::decode("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
                .unwrap();
        assert_eq!(digest.as_slice(), expected.as_slice());
    }

    #[test]
    fn sha256_deterministic() {
        assert_eq!(sha256(b"veilcast"), sha256(b"veilcast"));
    }

    #[test]
    fn test_sha256_multi_matches_concatenation() {
        let multi = sha256_multi(&[b"hello", b" world"]);
        let single = sha256(b"hello world");
        assert_eq!(multi, single);
    }

    #[test]
    fn blake3_deterministic() {
        assert_eq!(blake3_hash(b"veilcast"), blake3_hash(b"veilcast"));
    }

    #[test]
    fn test_domain_separation() {
        // Same data, different contexts = different hashes. That is the
        // whole point.
        let data = b"same data";
        assert_ne!(
            domain_separated_hash("context-a", data),
            domain_separated_hash("context-b", data)
        );
    }

    #[test]
    fn test_domain_separated_is_not_plain_blake3() {
        let data = b"test data";
        assert_ne!(blake3_hash(data), domain_separated_hash("veilcast-test", data));
    }

    #[test]
    fn test_multi_framing_disambiguates_boundaries() {
        // Length prefixes mean shifting bytes between adjacent fields
        // changes the digest, unlike naive concatenation.
        let a = domain_separated_multi("ctx", &[b"ab", b"c"]);
        let b = domain_separated_multi("ctx", &[b"a", b"bc"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_multi_deterministic() {
        let a = domain_separated_multi("ctx", &[b"one", b"two", b"three"]);
        let b = domain_separated_multi("ctx", &[b"one", b"two", b"three"]);
        assert_eq!(a, b);
    }
}
