//! Cryptographic primitives for nocloud.
//!
//! Two independent pieces live here:
//! - **Password derivation**: reproducible per-service passwords from a
//!   master password (PBKDF2-HMAC-SHA512, see [`digest`])
//! - **Cipher keys and tokens**: the passphrase-derived Fernet key and the
//!   authenticated token framing used for `.crypt` files (see [`key`] and
//!   [`token`])
//!
//! Nothing in this module performs I/O.
//!
//! ## Threat Model
//!
//! We defend against:
//! - Theft of `.crypt` files or of the remote bucket holding them
//! - Tampering with stored ciphertext
//!
//! We do NOT defend against:
//! - Offline brute force of weak passphrases (the cipher key is a single MD5)
//! - Compromised OS / keylogger

pub mod digest;
pub mod key;
pub mod passphrase;
pub mod token;

pub use digest::{
    derive_password_digest, CharacterClass, CharacterClasses, DigestSpec, PasswordDigest,
};
pub use key::{derive_cipher_key, DerivedKey, KeyCache};
pub use passphrase::Passphrase;
pub use token::CipherToken;
