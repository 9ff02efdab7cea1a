//! # Password-Based Authenticated Encryption
//!
//! The content encryption engine: field-level symmetric encryption keyed by
//! a campaign password. Used to hide campaign texts and response answers
//! from anyone who doesn't hold the password, while the ciphertext itself
//! sits on a public ledger.
//!
//! Per call: a fresh 16-byte salt and 12-byte IV are drawn from the OS
//! CSPRNG (never reused across calls, even for the same password), the
//! password is stretched to a 256-bit key with PBKDF2-HMAC-SHA512 at
//! 100,000 iterations, and the plaintext is sealed with AES-256-GCM.
//!
//! ## Nonce management
//!
//! GCM is notoriously unforgiving about nonce reuse. Because the key is
//! itself re-derived under a fresh salt on every call, even an IV collision
//! across calls would land under distinct keys; the random 96-bit IV on top
//! of that puts reuse firmly out of reach.
//!
//! ## Wire format
//!
//! A blob is one base64 string over `salt ‖ iv ‖ ciphertext‖tag`. It is
//! self-describing: everything needed to decrypt (except the password) is
//! inside. Decryption is fail-closed; a wrong password or a single flipped
//! bit anywhere in the blob fails tag verification and returns an error.
//! There is no code path that yields partial or corrupted plaintext.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha512;
use std::fmt;
use thiserror::Error;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::config::{
    AES_KEY_LENGTH, AES_NONCE_LENGTH, AES_TAG_LENGTH, KDF_ITERATIONS, SALT_LENGTH,
};

/// Errors from the content encryption engine.
///
/// `Integrity` covers both "wrong password" and "tampered blob" on purpose.
/// The difference between the two is none of an attacker's business, and
/// GCM cannot distinguish them anyway.
#[derive(Debug, Error)]
pub enum EncryptionError {
    /// Authentication-tag verification failed: wrong password or the blob
    /// was modified. Fatal for this call; never downgraded or retried
    /// automatically.
    #[error("decryption failed: wrong password or corrupted data")]
    Integrity,

    /// The blob string is not a well-formed envelope (bad base64, or too
    /// short to contain salt + IV + tag). Distinct from `Integrity` so
    /// storage corruption is tellable from a wrong password at call sites
    /// that care.
    #[error("malformed encrypted blob")]
    MalformedBlob,

    /// Decryption produced bytes that are not valid UTF-8. Only reachable
    /// if the blob was produced by something other than [`encrypt`].
    #[error("decrypted payload is not valid text")]
    InvalidPlaintext,

    /// The cipher rejected the encryption request. Effectively unreachable
    /// with well-formed inputs, but crypto code doesn't get to assume.
    #[error("encryption failed")]
    EncryptFailed,
}

// ---------------------------------------------------------------------------
// EncryptedBlob
// ---------------------------------------------------------------------------

/// A self-describing authenticated ciphertext.
///
/// Immutable once produced; the exact originating password is the only way
/// back to the plaintext. Serializes (human-readable) as the single base64
/// string described in the module docs.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedBlob {
    salt: [u8; SALT_LENGTH],
    iv: [u8; AES_NONCE_LENGTH],
    /// Ciphertext with the 16-byte GCM tag appended.
    ciphertext: Vec<u8>,
}

impl EncryptedBlob {
    /// Encode as a single base64 string: `base64(salt ‖ iv ‖ ct‖tag)`.
    pub fn encode(&self) -> String {
        let mut buf =
            Vec::with_capacity(SALT_LENGTH + AES_NONCE_LENGTH + self.ciphertext.len());
        buf.extend_from_slice(&self.salt);
        buf.extend_from_slice(&self.iv);
        buf.extend_from_slice(&self.ciphertext);
        BASE64.encode(buf)
    }

    /// Parse an encoded blob.
    ///
    /// Validates base64 and the minimum structural length (salt + IV +
    /// tag). Anything shorter cannot possibly decrypt and is rejected as
    /// [`EncryptionError::MalformedBlob`] before any key derivation runs.
    pub fn decode(encoded: &str) -> Result<Self, EncryptionError> {
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|_| EncryptionError::MalformedBlob)?;
        if bytes.len() < SALT_LENGTH + AES_NONCE_LENGTH + AES_TAG_LENGTH {
            return Err(EncryptionError::MalformedBlob);
        }
        let mut salt = [0u8; SALT_LENGTH];
        salt.copy_from_slice(&bytes[..SALT_LENGTH]);
        let mut iv = [0u8; AES_NONCE_LENGTH];
        iv.copy_from_slice(&bytes[SALT_LENGTH..SALT_LENGTH + AES_NONCE_LENGTH]);
        let ciphertext = bytes[SALT_LENGTH + AES_NONCE_LENGTH..].to_vec();
        Ok(Self {
            salt,
            iv,
            ciphertext,
        })
    }

    /// The per-blob salt. Exposed for tests and diagnostics; not secret.
    pub fn salt(&self) -> &[u8; SALT_LENGTH] {
        &self.salt
    }

    /// The per-blob IV. Not secret.
    pub fn iv(&self) -> &[u8; AES_NONCE_LENGTH] {
        &self.iv
    }
}

impl fmt::Display for EncryptedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl fmt::Debug for EncryptedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptedBlob({} bytes)", self.ciphertext.len())
    }
}

impl serde::Serialize for EncryptedBlob {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> serde::Deserialize<'de> for EncryptedBlob {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::Deserialize;
        let s = String::deserialize(deserializer)?;
        EncryptedBlob::decode(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Key derivation
// ---------------------------------------------------------------------------

/// Stretch a password into a 256-bit AES key under the given salt.
///
/// PBKDF2-HMAC-SHA512 with [`KDF_ITERATIONS`] rounds. Deliberately slow;
/// this runs once per field encryption/decryption and that is the point.
fn derive_key(password: &str, salt: &[u8; SALT_LENGTH]) -> [u8; AES_KEY_LENGTH] {
    let mut key = [0u8; AES_KEY_LENGTH];
    pbkdf2_hmac::<Sha512>(password.as_bytes(), salt, KDF_ITERATIONS, &mut key);
    key
}

// ---------------------------------------------------------------------------
// Encrypt / Decrypt
// ---------------------------------------------------------------------------

/// Encrypt a text field under a password.
///
/// Draws a fresh salt and IV, so encrypting the same plaintext twice with
/// the same password yields unrelated blobs.
///
/// # Example
///
/// ```
/// use veilcast_protocol::crypto::envelope::{encrypt, decrypt};
///
/// let blob = encrypt("what is your favorite validator?", "hunter2").unwrap();
/// let back = decrypt(&blob, "hunter2").unwrap();
/// assert_eq!(back, "what is your favorite validator?");
/// ```
pub fn encrypt(plaintext: &str, password: &str) -> Result<EncryptedBlob, EncryptionError> {
    let mut salt = [0u8; SALT_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    let mut iv = [0u8; AES_NONCE_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut iv);

    let key = derive_key(password, &salt);
    let cipher =
        Aes256Gcm::new_from_slice(&key).map_err(|_| EncryptionError::EncryptFailed)?;
    let nonce = Nonce::from_slice(&iv);

    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|_| EncryptionError::EncryptFailed)?;

    Ok(EncryptedBlob {
        salt,
        iv,
        ciphertext,
    })
}

/// Decrypt a blob with a password.
///
/// Fail-closed: any wrong password or any modification to the blob fails
/// tag verification and returns [`EncryptionError::Integrity`]. No partial
/// plaintext ever escapes.
pub fn decrypt(blob: &EncryptedBlob, password: &str) -> Result<String, EncryptionError> {
    let key = derive_key(password, &blob.salt);
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| EncryptionError::Integrity)?;
    let nonce = Nonce::from_slice(&blob.iv);

    let plaintext = cipher
        .decrypt(nonce, blob.ciphertext.as_slice())
        .map_err(|_| EncryptionError::Integrity)?;

    String::from_utf8(plaintext).map_err(|_| EncryptionError::InvalidPlaintext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let blob = encrypt("the quick brown fox", "correct horse battery staple").unwrap();
        let back = decrypt(&blob, "correct horse battery staple").unwrap();
        assert_eq!(back, "the quick brown fox");
    }

    #[test]
    fn test_empty_plaintext_roundtrip() {
        // An empty field is a valid field.
        let blob = encrypt("", "pw").unwrap();
        assert_eq!(decrypt(&blob, "pw").unwrap(), "");
    }

    #[test]
    fn test_unicode_roundtrip() {
        let text = "¿cuál es tu validador favorito? 🗳️";
        let blob = encrypt(text, "contraseña").unwrap();
        assert_eq!(decrypt(&blob, "contraseña").unwrap(), text);
    }

    #[test]
    fn test_wrong_password_fails_closed() {
        let blob = encrypt("secret ballot", "right").unwrap();
        assert!(matches!(
            decrypt(&blob, "wrong"),
            Err(EncryptionError::Integrity)
        ));
    }

    #[test]
    fn test_fresh_salt_and_iv_per_call() {
        // Same plaintext, same password, two calls: salt, IV, and
        // ciphertext must all differ.
        let a = encrypt("message", "pw").unwrap();
        let b = encrypt("message", "pw").unwrap();
        assert_ne!(a.salt(), b.salt());
        assert_ne!(a.iv(), b.iv());
        assert_ne!(a.encode(), b.encode());
    }

    #[test]
    fn test_tampered_blob_fails_closed() {
        // Flip one byte in each structural region: salt, IV, ciphertext
        // body, and auth tag. Every variant must fail.
        let blob = encrypt("tamper target", "pw").unwrap();
        let raw = BASE64.decode(blob.encode()).unwrap();

        for index in [0, SALT_LENGTH, SALT_LENGTH + AES_NONCE_LENGTH, raw.len() - 1] {
            let mut corrupted = raw.clone();
            corrupted[index] ^= 0x01;
            let reparsed = EncryptedBlob::decode(&BASE64.encode(&corrupted)).unwrap();
            assert!(
                matches!(decrypt(&reparsed, "pw"), Err(EncryptionError::Integrity)),
                "flip at byte {index} should fail tag verification"
            );
        }
    }

    #[test]
    fn test_blob_encode_decode_identity() {
        let blob = encrypt("roundtrip", "pw").unwrap();
        let reparsed = EncryptedBlob::decode(&blob.encode()).unwrap();
        assert_eq!(blob, reparsed);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            EncryptedBlob::decode("not base64 at all!!"),
            Err(EncryptionError::MalformedBlob)
        ));
    }

    #[test]
    fn test_decode_rejects_truncated() {
        // Valid base64, but shorter than salt + IV + tag.
        let short = BASE64.encode([0u8; 20]);
        assert!(matches!(
            EncryptedBlob::decode(&short),
            Err(EncryptionError::MalformedBlob)
        ));
    }

    #[test]
    fn test_blob_serde_roundtrip() {
        let blob = encrypt("serde me", "pw").unwrap();
        let json = serde_json::to_string(&blob).unwrap();
        let back: EncryptedBlob = serde_json::from_str(&json).unwrap();
        assert_eq!(decrypt(&back, "pw").unwrap(), "serde me");
    }

    #[test]
    fn test_key_derivation_deterministic() {
        let salt = [7u8; SALT_LENGTH];
        assert_eq!(derive_key("pw", &salt), derive_key("pw", &salt));
        assert_ne!(derive_key("pw", &salt), derive_key("pw2", &salt));
    }
}
