//! # Identity Derivation
//!
//! The pure mapping from federated-login claims to a chain identity.
//! Nothing here touches the network, the clock, or any store; equal claims
//! in, bit-identical identity out, forever. This determinism is the whole
//! account system: there is no user database to "log back in" against,
//! only the guarantee that the same (iss, aud, sub) triple always lands on
//! the same address.

use crate::chain::primitives;
use crate::config::{BINDING_CLAIM, SALT_LENGTH};
use crate::crypto::hash::sha256_multi;
use crate::identity::address::{AddressSeed, ChainAddress};
use crate::identity::claims::Claims;

/// Derive the 128-bit identity salt from validated claims.
///
/// `salt = SHA-256(iss ‖ aud ‖ sub)[..16]`. The truncation to 16 bytes is
/// the proof service's fixed input width; it rejects anything else, so the
/// width here is an interop invariant. Plain concatenation (no framing) is
/// likewise part of the fixed format.
pub fn derive_salt(claims: &Claims) -> [u8; SALT_LENGTH] {
    let digest = sha256_multi(&[
        claims.iss.as_bytes(),
        claims.aud.as_bytes(),
        claims.sub.as_bytes(),
    ]);
    let mut salt = [0u8; SALT_LENGTH];
    salt.copy_from_slice(&digest[..SALT_LENGTH]);
    salt
}

/// Derive the address-binding seed for these claims.
pub fn derive_address_seed(claims: &Claims) -> AddressSeed {
    primitives::derive_address_seed(&derive_salt(claims), BINDING_CLAIM, &claims.sub, &claims.aud)
}

/// Derive the chain address for these claims.
///
/// # Example
///
/// ```
/// use veilcast_protocol::identity::claims::Claims;
/// use veilcast_protocol::identity::derive::derive_address;
///
/// let claims = Claims {
///     iss: "https://accounts.example.com".into(),
///     aud: "veilcast-web".into(),
///     sub: "user-1".into(),
///     nonce: "n".into(),
///     email: None,
/// };
/// // Determinism across calls (and across devices, and across months).
/// assert_eq!(derive_address(&claims), derive_address(&claims));
/// ```
pub fn derive_address(claims: &Claims) -> ChainAddress {
    primitives::derive_chain_address(
        &derive_salt(claims),
        BINDING_CLAIM,
        &claims.sub,
        &claims.aud,
        &claims.iss,
    )
}

/// A fully derived chain identity: claims plus everything computed from
/// them. Recomputed on demand, never persisted; the address is not a
/// secret and needs no write-once storage.
#[derive(Debug, Clone)]
pub struct DerivedIdentity {
    /// The validated claims this identity was derived from.
    pub claims: Claims,
    /// The 128-bit salt the proof service consumes.
    pub salt: [u8; SALT_LENGTH],
    /// The seed bound into signature packages.
    pub address_seed: AddressSeed,
    /// The ledger-visible address.
    pub address: ChainAddress,
}

impl DerivedIdentity {
    /// Derive everything from validated claims.
    pub fn from_claims(claims: Claims) -> Self {
        let salt = derive_salt(&claims);
        let address_seed = derive_address_seed(&claims);
        let address = derive_address(&claims);
        Self {
            claims,
            salt,
            address_seed,
            address,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn claims(sub: &str) -> Claims {
        Claims {
            iss: "https://accounts.example.com".into(),
            aud: "veilcast-web".into(),
            sub: sub.into(),
            nonce: "unused-here".into(),
            email: None,
        }
    }

    #[test]
    fn salt_is_deterministic_and_16_bytes() {
        let c = claims("user-1");
        assert_eq!(derive_salt(&c), derive_salt(&c));
        assert_eq!(derive_salt(&c).len(), 16);
    }

    #[test]
    fn salt_matches_manual_construction() {
        // Pin the exact format: SHA-256 of the plain concatenation,
        // truncated to 16 bytes. A regression here bricks every account.
        let c = claims("user-1");
        let concat = format!("{}{}{}", c.iss, c.aud, c.sub);
        let expected = &crate::crypto::hash::sha256(concat.as_bytes())[..16];
        assert_eq!(derive_salt(&c), expected);
    }

    #[test]
    fn address_deterministic_across_derivations() {
        let c = claims("user-1");
        assert_eq!(derive_address(&c), derive_address(&c));
        assert_eq!(
            DerivedIdentity::from_claims(c.clone()).address,
            derive_address(&c)
        );
    }

    #[test]
    fn distinct_subjects_never_collide_at_test_scale() {
        let mut seen = HashSet::new();
        for i in 0..1000 {
            let addr = derive_address(&claims(&format!("user-{i}")));
            assert!(seen.insert(addr), "collision at subject {i}");
        }
    }

    #[test]
    fn nonce_and_email_do_not_affect_identity() {
        // Only the (iss, aud, sub) triple is identity-bearing.
        let mut a = claims("user-1");
        let mut b = claims("user-1");
        a.nonce = "one".into();
        b.nonce = "two".into();
        b.email = Some("voter@example.com".into());
        assert_eq!(derive_address(&a), derive_address(&b));
        assert_eq!(derive_address_seed(&a), derive_address_seed(&b));
    }

    #[test]
    fn different_audience_changes_address() {
        let a = claims("user-1");
        let mut b = claims("user-1");
        b.aud = "other-app".into();
        assert_ne!(derive_address(&a), derive_address(&b));
    }
}
