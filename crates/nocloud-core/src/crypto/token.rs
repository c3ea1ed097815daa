//! Authenticated ciphertext framing.
//!
//! A token is the Fernet layout, base64url encoded (padded):
//!
//! ```text
//! version (1) | timestamp (8, big endian) | IV (16) | ciphertext (16n) | HMAC-SHA256 (32)
//! ```
//!
//! The ciphertext is AES-128-CBC with PKCS7 padding. The HMAC covers every
//! byte before it. Any parsing, verification or padding failure surfaces as
//! [`NoCloudError::Authentication`].

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::key::DerivedKey;
use crate::error::{NoCloudError, Result};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type HmacSha256 = Hmac<Sha256>;

/// Format version byte.
pub const VERSION: u8 = 0x80;

/// Initialization vector length.
pub const IV_LENGTH: usize = 16;

const TIMESTAMP_LENGTH: usize = 8;
const TAG_LENGTH: usize = 32;
const BLOCK_LENGTH: usize = 16;
const HEADER_LENGTH: usize = 1 + TIMESTAMP_LENGTH + IV_LENGTH;
const MIN_LENGTH: usize = HEADER_LENGTH + BLOCK_LENGTH + TAG_LENGTH;

/// A parsed, not yet verified, cipher token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherToken {
    timestamp: u64,
    iv: [u8; IV_LENGTH],
    ciphertext: Vec<u8>,
    tag: [u8; TAG_LENGTH],
}

impl CipherToken {
    /// Encrypt and sign `plaintext`.
    ///
    /// The caller supplies the timestamp and a fresh random IV.
    pub fn seal(
        plaintext: &[u8],
        key: &DerivedKey,
        timestamp: u64,
        iv: [u8; IV_LENGTH],
    ) -> Result<Self> {
        let ciphertext = Aes128CbcEnc::new_from_slices(key.encryption_key(), &iv)
            .map_err(|e| NoCloudError::Crypto(format!("Failed to create cipher: {}", e)))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        let mut token = Self {
            timestamp,
            iv,
            ciphertext,
            tag: [0u8; TAG_LENGTH],
        };
        let mac = token.mac(key)?;
        token.tag.copy_from_slice(&mac.finalize().into_bytes());
        Ok(token)
    }

    /// Verify the tag, then decrypt.
    ///
    /// The tag comparison is constant time and happens before any decryption.
    pub fn open(&self, key: &DerivedKey) -> Result<Vec<u8>> {
        self.verify(key)?;

        Aes128CbcDec::new_from_slices(key.encryption_key(), &self.iv)
            .map_err(|_| NoCloudError::Authentication)?
            .decrypt_padded_vec_mut::<Pkcs7>(&self.ciphertext)
            .map_err(|_| NoCloudError::Authentication)
    }

    /// Check the tag without decrypting.
    pub fn verify(&self, key: &DerivedKey) -> Result<()> {
        self.mac(key)?
            .verify_slice(&self.tag)
            .map_err(|_| NoCloudError::Authentication)
    }

    /// Seconds since the Unix epoch at which the token was produced.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.timestamp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// Parse the textual (base64url) form.
    ///
    /// Surrounding ASCII whitespace is ignored.
    pub fn decode(text: &[u8]) -> Result<Self> {
        let bytes = URL_SAFE
            .decode(text.trim_ascii())
            .map_err(|_| NoCloudError::Authentication)?;
        Self::from_bytes(&bytes)
    }

    /// The textual (base64url) form.
    pub fn encode(&self) -> String {
        URL_SAFE.encode(self.to_bytes())
    }

    /// Parse the raw binary layout.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MIN_LENGTH || bytes[0] != VERSION {
            return Err(NoCloudError::Authentication);
        }
        let (signed, tag) = bytes.split_at(bytes.len() - TAG_LENGTH);
        let ciphertext = &signed[HEADER_LENGTH..];
        if ciphertext.len() % BLOCK_LENGTH != 0 {
            return Err(NoCloudError::Authentication);
        }

        let mut timestamp = [0u8; TIMESTAMP_LENGTH];
        timestamp.copy_from_slice(&signed[1..1 + TIMESTAMP_LENGTH]);
        let mut iv = [0u8; IV_LENGTH];
        iv.copy_from_slice(&signed[1 + TIMESTAMP_LENGTH..HEADER_LENGTH]);
        let mut tag_bytes = [0u8; TAG_LENGTH];
        tag_bytes.copy_from_slice(tag);

        Ok(Self {
            timestamp: u64::from_be_bytes(timestamp),
            iv,
            ciphertext: ciphertext.to_vec(),
            tag: tag_bytes,
        })
    }

    /// The raw binary layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.signed_bytes();
        bytes.extend_from_slice(&self.tag);
        bytes
    }

    fn signed_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LENGTH + self.ciphertext.len() + TAG_LENGTH);
        bytes.push(VERSION);
        bytes.extend_from_slice(&self.timestamp.to_be_bytes());
        bytes.extend_from_slice(&self.iv);
        bytes.extend_from_slice(&self.ciphertext);
        bytes
    }

    fn mac(&self, key: &DerivedKey) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(key.signing_key())
            .map_err(|e| NoCloudError::Crypto(format!("Failed to create HMAC: {}", e)))?;
        mac.update(&self.signed_bytes());
        Ok(mac)
    }
}
