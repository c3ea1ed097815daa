//! Passphrase-based file encryption.
//!
//! Thin wrappers around [`CipherToken`] that pick a timestamp and a random IV
//! and return the textual token ready to be written to a `.crypt` file.

use chrono::{DateTime, Utc};

use crate::crypto::token::IV_LENGTH;
use crate::crypto::{derive_cipher_key, CipherToken, DerivedKey, Passphrase};
use crate::error::{NoCloudError, Result};

/// Encrypt data with a key derived from `passphrase`.
///
/// # Examples
///
/// ```
/// use nocloud_core::crypto::Passphrase;
/// use nocloud_core::encryption::{decrypt, encrypt};
///
/// let passphrase = Passphrase::from("pw1");
/// let encrypted = encrypt(b"hello world", &passphrase).unwrap();
/// assert_eq!(decrypt(&encrypted, &passphrase).unwrap(), b"hello world");
/// ```
pub fn encrypt(data: &[u8], passphrase: &Passphrase) -> Result<Vec<u8>> {
    encrypt_with_key(data, &derive_cipher_key(passphrase))
}

/// Encrypt data with an already derived key.
pub fn encrypt_with_key(data: &[u8], key: &DerivedKey) -> Result<Vec<u8>> {
    let mut iv = [0u8; IV_LENGTH];
    getrandom::getrandom(&mut iv)
        .map_err(|e| NoCloudError::Crypto(format!("Failed to generate IV: {}", e)))?;

    let token = CipherToken::seal(data, key, current_timestamp(), iv)?;
    Ok(token.encode().into_bytes())
}

/// Decrypt a token with a key derived from `passphrase`.
///
/// # Errors
///
/// Returns `NoCloudError::Authentication` if the passphrase is wrong or the
/// token is corrupted. The two cases are indistinguishable.
pub fn decrypt(encrypted_data: &[u8], passphrase: &Passphrase) -> Result<Vec<u8>> {
    decrypt_with_key(encrypted_data, &derive_cipher_key(passphrase))
}

/// Decrypt a token with an already derived key.
pub fn decrypt_with_key(encrypted_data: &[u8], key: &DerivedKey) -> Result<Vec<u8>> {
    CipherToken::decode(encrypted_data)?.open(key)
}

/// When an authenticated token was produced.
pub fn token_issued_at(encrypted_data: &[u8], key: &DerivedKey) -> Result<DateTime<Utc>> {
    let token = CipherToken::decode(encrypted_data)?;
    token.verify(key)?;
    token
        .issued_at()
        .ok_or_else(|| NoCloudError::Crypto("Token timestamp out of range".to_string()))
}

fn current_timestamp() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let passphrase = Passphrase::from("pw1");
        let encrypted = encrypt(b"hello world", &passphrase).unwrap();
        let decrypted = decrypt(&encrypted, &passphrase).unwrap();
        assert_eq!(decrypted, b"hello world");
    }

    #[test]
    fn test_wrong_passphrase_fails_decryption() {
        let encrypted = encrypt(b"hello world", &Passphrase::from("pw1")).unwrap();
        let result = decrypt(&encrypted, &Passphrase::from("pw2"));
        assert!(matches!(result, Err(NoCloudError::Authentication)));
    }

    #[test]
    fn test_encrypted_data_different_from_plaintext() {
        let plaintext = b"secret data";
        let encrypted = encrypt(plaintext, &Passphrase::from("pw1")).unwrap();
        assert_ne!(encrypted.as_slice(), plaintext);
        assert!(!encrypted.is_empty());
    }

    #[test]
    fn test_same_plaintext_different_tokens() {
        let passphrase = Passphrase::from("pw1");
        let first = encrypt(b"same plaintext", &passphrase).unwrap();
        let second = encrypt(b"same plaintext", &passphrase).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_output_is_url_safe_text() {
        let encrypted = encrypt(&[0xff; 100], &Passphrase::from("pw1")).unwrap();
        assert!(encrypted
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'=')));
    }

    #[test]
    fn test_empty_data_encryption() {
        let passphrase = Passphrase::from("pw1");
        let encrypted = encrypt(b"", &passphrase).unwrap();
        assert_eq!(decrypt(&encrypted, &passphrase).unwrap(), b"");
    }

    #[test]
    fn test_large_data_encryption() {
        let passphrase = Passphrase::from("test-passphrase-secure-123");
        let plaintext = vec![0x42u8; 1024 * 1024];
        let encrypted = encrypt(&plaintext, &passphrase).unwrap();
        assert_eq!(decrypt(&encrypted, &passphrase).unwrap(), plaintext);
    }

    #[test]
    fn test_token_issued_at_is_recent() {
        let key = derive_cipher_key(&Passphrase::from("pw1"));
        let before = Utc::now().timestamp();
        let encrypted = encrypt_with_key(b"data", &key).unwrap();
        let issued = token_issued_at(&encrypted, &key).unwrap().timestamp();
        assert!(issued >= before && issued <= Utc::now().timestamp());
    }

    #[test]
    fn test_token_issued_at_requires_valid_key() {
        let encrypted = encrypt(b"data", &Passphrase::from("pw1")).unwrap();
        let other = derive_cipher_key(&Passphrase::from("pw2"));
        assert!(matches!(
            token_issued_at(&encrypted, &other),
            Err(NoCloudError::Authentication)
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_round_trip(plaintext in proptest::collection::vec(any::<u8>(), 0..512), passphrase in ".{0,24}") {
            let passphrase = Passphrase::from(passphrase);
            let encrypted = encrypt(&plaintext, &passphrase).unwrap();
            prop_assert_eq!(decrypt(&encrypted, &passphrase).unwrap(), plaintext);
        }

        #[test]
        fn prop_single_bit_flip_is_rejected(
            plaintext in proptest::collection::vec(any::<u8>(), 0..128),
            position in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let key = derive_cipher_key(&Passphrase::from("tamper"));
            let encrypted = encrypt_with_key(&plaintext, &key).unwrap();
            let mut raw = CipherToken::decode(&encrypted).unwrap().to_bytes();
            let index = position.index(raw.len());
            raw[index] ^= 1 << bit;

            let result = CipherToken::from_bytes(&raw).and_then(|token| token.open(&key));
            prop_assert!(matches!(result, Err(NoCloudError::Authentication)));
        }

        #[test]
        fn prop_single_bit_flip_in_text_is_rejected(
            plaintext in proptest::collection::vec(any::<u8>(), 0..128),
            position in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let passphrase = Passphrase::from("tamper");
            let mut encrypted = encrypt(&plaintext, &passphrase).unwrap();
            let index = position.index(encrypted.len());
            encrypted[index] ^= 1 << bit;

            prop_assert!(matches!(
                decrypt(&encrypted, &passphrase),
                Err(NoCloudError::Authentication)
            ));
        }

        #[test]
        fn prop_wrong_key_is_rejected(plaintext in proptest::collection::vec(any::<u8>(), 0..128), suffix in "[a-z]{1,8}") {
            let encrypted = encrypt(&plaintext, &Passphrase::from("k1")).unwrap();
            let wrong = Passphrase::from(format!("k1{}", suffix));
            prop_assert!(matches!(decrypt(&encrypted, &wrong), Err(NoCloudError::Authentication)));
        }
    }
}
