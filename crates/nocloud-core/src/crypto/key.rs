//! Cipher key derivation.
//!
//! The file encryption key is `base64url(hex(MD5(passphrase)))`, interpreted
//! as a Fernet key. Decoding that text yields the 32 ASCII hex digits, which
//! split into a 16-byte signing key and a 16-byte AES-128 key. The two-stage
//! encoding must be reproduced exactly so existing `.crypt` files stay
//! readable.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use md5::{Digest, Md5};
use zeroize::{Zeroizing, ZeroizeOnDrop};

use super::passphrase::Passphrase;

/// Length of the decoded Fernet key in bytes.
pub const KEY_LENGTH: usize = 32;

/// Length of each half of the key (signing, encryption).
const HALF_LENGTH: usize = KEY_LENGTH / 2;

/// A symmetric key derived from a passphrase.
///
/// Key material is zeroized from memory when dropped.
#[derive(Clone, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_LENGTH],
}

impl DerivedKey {
    pub(crate) fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self { key: bytes }
    }

    /// HMAC-SHA256 signing key (first half).
    pub fn signing_key(&self) -> &[u8] {
        &self.key[..HALF_LENGTH]
    }

    /// AES-128 encryption key (second half).
    pub fn encryption_key(&self) -> &[u8] {
        &self.key[HALF_LENGTH..]
    }

    /// The key in its textual Fernet form (base64url, padded).
    pub fn to_base64(&self) -> Zeroizing<String> {
        Zeroizing::new(URL_SAFE.encode(self.key))
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Derive the file encryption key from a passphrase.
///
/// Deterministic: the same passphrase always yields the same key.
///
/// # Examples
///
/// ```
/// use nocloud_core::crypto::{derive_cipher_key, Passphrase};
///
/// let key = derive_cipher_key(&Passphrase::from("pw1"));
/// assert_eq!(
///     key.to_base64().as_str(),
///     "NmU2ZmRmOTU2ZDA0Mjg5MzU0ZGNmMTYxOWUyOGZlNzc="
/// );
/// ```
pub fn derive_cipher_key(passphrase: &Passphrase) -> DerivedKey {
    let digest = Md5::digest(passphrase.as_bytes());
    let hex_digest = Zeroizing::new(hex::encode(digest));

    let mut key = [0u8; KEY_LENGTH];
    key.copy_from_slice(hex_digest.as_bytes());
    DerivedKey::from_bytes(key)
}

/// Process-lifetime cache of derived keys.
///
/// Entries are keyed by the BLAKE3 fingerprint of the passphrase, so the
/// passphrase itself is never retained. The cache is an explicit value owned
/// by the caller and can be shared across worker threads.
#[derive(Default)]
pub struct KeyCache {
    keys: Mutex<HashMap<[u8; 32], DerivedKey>>,
}

impl KeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached key for `passphrase`, deriving it on first use.
    pub fn get_or_derive(&self, passphrase: &Passphrase) -> DerivedKey {
        let fingerprint = *blake3::hash(passphrase.as_bytes()).as_bytes();
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        keys.entry(fingerprint)
            .or_insert_with(|| {
                tracing::debug!("deriving cipher key");
                derive_cipher_key(passphrase)
            })
            .clone()
    }

    /// Number of cached keys.
    pub fn len(&self) -> usize {
        self.keys.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached key.
    pub fn clear(&self) {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
