//! # Ledger Derivation Primitives
//!
//! The ledger defines three deterministic derivations that every client
//! must reproduce bit-exactly: the address-binding seed, the chain address
//! itself, and the login nonce that ties an ephemeral key to an identity
//! token. This module is Veilcast's implementation of those fixed schemes;
//! it mirrors what the on-ledger verifier computes and is not a place for
//! creativity. Change a context string or a field order here and every
//! existing account becomes unreachable.
//!
//! All three use domain-separated BLAKE3 over length-prefixed fields
//! (see [`crate::crypto::hash::domain_separated_multi`]).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use crate::config::{NONCE_DIGEST_LENGTH, SALT_LENGTH};
use crate::crypto::hash::domain_separated_multi;
use crate::crypto::keys::PublicKey;
use crate::identity::address::{AddressSeed, ChainAddress};

/// Domain context for address-binding seed derivation.
const ADDRESS_SEED_DOMAIN: &str = "veilcast.ledger.address-seed.v1";

/// Domain context for chain address derivation.
const ADDRESS_DOMAIN: &str = "veilcast.ledger.address.v1";

/// Domain context for login nonce binding.
const NONCE_DOMAIN: &str = "veilcast.ledger.nonce.v1";

/// Derive the address-binding seed from the identity salt and the bound
/// claim.
///
/// Deterministic: equal inputs give bit-identical seeds on every device
/// and in every session. The seed is public; it carries no secret.
pub fn derive_address_seed(
    salt: &[u8; SALT_LENGTH],
    claim_name: &str,
    claim_value: &str,
    aud: &str,
) -> AddressSeed {
    let digest = domain_separated_multi(
        ADDRESS_SEED_DOMAIN,
        &[salt, claim_name.as_bytes(), claim_value.as_bytes(), aud.as_bytes()],
    );
    AddressSeed::from_bytes(digest)
}

/// Derive a chain address from the identity salt and claims.
///
/// The issuer participates here (unlike in the seed) so that the same
/// subject at two providers maps to two distinct addresses.
pub fn derive_chain_address(
    salt: &[u8; SALT_LENGTH],
    claim_name: &str,
    claim_value: &str,
    aud: &str,
    iss: &str,
) -> ChainAddress {
    let digest = domain_separated_multi(
        ADDRESS_DOMAIN,
        &[
            salt,
            claim_name.as_bytes(),
            claim_value.as_bytes(),
            aud.as_bytes(),
            iss.as_bytes(),
        ],
    );
    ChainAddress::from_bytes(digest)
}

/// Bind an ephemeral public key, epoch bound, and login randomness into
/// the nonce embedded in the identity token.
///
/// This is the anti-substitution mechanism: the provider signs the nonce
/// into the token, so a token obtained for one ephemeral key can never be
/// combined with a different key, epoch bound, or randomness. The output
/// is a 160-bit digest, base64url-encoded without padding, which is the
/// shape OAuth `nonce` parameters expect.
pub fn bind_nonce(public_key: &PublicKey, max_epoch: u64, randomness: &[u8]) -> String {
    let digest = domain_separated_multi(
        NONCE_DOMAIN,
        &[
            public_key.as_bytes(),
            &max_epoch.to_be_bytes(),
            randomness,
        ],
    );
    URL_SAFE_NO_PAD.encode(&digest[..NONCE_DIGEST_LENGTH])
}
