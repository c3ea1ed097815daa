//! In-memory passphrase handling.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

/// A user-supplied secret: the file encryption passphrase or the master
/// password used for password derivation.
///
/// The value lives only in process memory, is zeroized on drop and never
/// appears in `Debug` output. It is always hashed as UTF-8 bytes.
pub struct Passphrase(SecretString);

impl Passphrase {
    /// Wrap a secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::from(value.into()))
    }

    /// Borrow the secret text.
    ///
    /// Avoid storing or logging this value.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// The UTF-8 bytes fed to hash functions.
    pub fn as_bytes(&self) -> &[u8] {
        self.expose().as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }
}

impl From<String> for Passphrase {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Passphrase {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase([REDACTED])")
    }
}
