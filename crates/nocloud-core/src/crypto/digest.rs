//! Reproducible password derivation.
//!
//! A password is a pure function of (service, username, master password,
//! iterations, character classes, length):
//!
//! 1. `h1 = PBKDF2-HMAC-SHA512(username, salt = master, iterations)`
//! 2. `h2 = PBKDF2-HMAC-SHA512(service, salt = h1, iterations)`
//! 3. each of the last `length` bytes of `h2` indexes the alphabet modulo its
//!    length.
//!
//! The argument order, the class order and the per-class repetition counts
//! are part of the output format. Changing any of them changes every password
//! ever generated.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use zeroize::{Zeroizing, ZeroizeOnDrop};

use super::passphrase::Passphrase;
use crate::error::{NoCloudError, Result};

/// Default PBKDF2 iteration count.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Default password length.
pub const DEFAULT_LENGTH: usize = 32;

/// Default character classes, in letter form.
pub const DEFAULT_CHARACTERS: &str = "ludp";

/// Output size of PBKDF2-HMAC-SHA512 as used here.
pub const HASH_LENGTH: usize = 64;

/// Longest password that can be derived from one hash chain.
pub const MAX_LENGTH: usize = HASH_LENGTH;

const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";
const PUNCTUATION: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// A class of characters a derived password may contain.
///
/// Declaration order is alphabet order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterClass {
    Lower,
    Upper,
    Digit,
    Punctuation,
}

impl CharacterClass {
    pub const ALL: [CharacterClass; 4] = [
        CharacterClass::Lower,
        CharacterClass::Upper,
        CharacterClass::Digit,
        CharacterClass::Punctuation,
    ];

    /// Characters belonging to the class.
    pub fn characters(&self) -> &'static str {
        match self {
            Self::Lower => LOWERCASE,
            Self::Upper => UPPERCASE,
            Self::Digit => DIGITS,
            Self::Punctuation => PUNCTUATION,
        }
    }

    /// How many times the class is repeated in the alphabet.
    fn repetitions(&self) -> usize {
        match self {
            Self::Lower | Self::Upper | Self::Digit => 3,
            Self::Punctuation => 2,
        }
    }

    /// Single-letter code used on the command line and in YAML files.
    pub fn letter(&self) -> char {
        match self {
            Self::Lower => 'l',
            Self::Upper => 'u',
            Self::Digit => 'd',
            Self::Punctuation => 'p',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'l' => Some(Self::Lower),
            'u' => Some(Self::Upper),
            'd' => Some(Self::Digit),
            'p' => Some(Self::Punctuation),
            _ => None,
        }
    }
}

/// A set of character classes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CharacterClasses(BTreeSet<CharacterClass>);

impl CharacterClasses {
    /// Every class: lower, upper, digit and punctuation.
    pub fn all() -> Self {
        CharacterClass::ALL.into_iter().collect()
    }

    pub fn only(class: CharacterClass) -> Self {
        std::iter::once(class).collect()
    }

    pub fn contains(&self, class: CharacterClass) -> bool {
        self.0.contains(&class)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = CharacterClass> + '_ {
        self.0.iter().copied()
    }

    /// Build the weighted alphabet for the selected classes.
    pub fn alphabet(&self) -> String {
        self.iter()
            .map(|class| class.characters().repeat(class.repetitions()))
            .collect()
    }
}

impl FromIterator<CharacterClass> for CharacterClasses {
    fn from_iter<I: IntoIterator<Item = CharacterClass>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromStr for CharacterClasses {
    type Err = NoCloudError;

    /// Parse the letter form, e.g. `"ludp"` or `"ld"`.
    fn from_str(value: &str) -> Result<Self> {
        value
            .chars()
            .map(|letter| {
                CharacterClass::from_letter(letter).ok_or_else(|| {
                    NoCloudError::InvalidSpec(format!(
                        "unknown character class '{}' (use l, u, d, p)",
                        letter
                    ))
                })
            })
            .collect()
    }
}

impl fmt::Display for CharacterClasses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for class in self.iter() {
            write!(f, "{}", class.letter())?;
        }
        Ok(())
    }
}

/// Input parameters fully determining a derived password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestSpec {
    pub service: String,
    pub username: String,
    pub iterations: u32,
    pub character_classes: CharacterClasses,
    pub length: usize,
}

impl DigestSpec {
    /// Create a spec with default iterations, classes and length.
    pub fn new(service: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            username: username.into(),
            iterations: DEFAULT_ITERATIONS,
            character_classes: CharacterClasses::all(),
            length: DEFAULT_LENGTH,
        }
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_character_classes(mut self, classes: CharacterClasses) -> Self {
        self.character_classes = classes;
        self
    }

    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    /// Check the spec can produce a password.
    ///
    /// # Errors
    ///
    /// Returns `NoCloudError::InvalidSpec` if:
    /// - service or username is empty
    /// - iterations is zero
    /// - no character class is selected
    /// - length is zero or larger than [`MAX_LENGTH`]
    pub fn validate(&self) -> Result<()> {
        if self.service.is_empty() {
            return Err(NoCloudError::InvalidSpec("missing service".to_string()));
        }
        if self.username.is_empty() {
            return Err(NoCloudError::InvalidSpec("missing username".to_string()));
        }
        if self.iterations == 0 {
            return Err(NoCloudError::InvalidSpec(
                "iterations must be at least 1".to_string(),
            ));
        }
        if self.character_classes.is_empty() {
            return Err(NoCloudError::InvalidSpec("invalid characters".to_string()));
        }
        if self.length == 0 {
            return Err(NoCloudError::InvalidSpec("invalid length".to_string()));
        }
        if self.length > MAX_LENGTH {
            return Err(NoCloudError::InvalidSpec(format!(
                "length must be at most {} (got {})",
                MAX_LENGTH, self.length
            )));
        }
        Ok(())
    }
}

/// A derived password, zeroized on drop.
#[derive(Clone, PartialEq, Eq, ZeroizeOnDrop)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest([REDACTED])")
    }
}

/// PBKDF2-HMAC-SHA512 with a 64-byte output.
///
/// `iterations` must be at least 1; [`DigestSpec::validate`] guarantees it.
pub(crate) fn sha512_hash(message: &[u8], salt: &[u8], iterations: u32) -> Zeroizing<[u8; HASH_LENGTH]> {
    let mut output = Zeroizing::new([0u8; HASH_LENGTH]);
    pbkdf2_hmac::<Sha512>(message, salt, iterations, output.as_mut_slice());
    output
}

/// Map the trailing `length` bytes of `hashed` into the ASCII `alphabet`.
pub(crate) fn map_to_alphabet(hashed: &[u8], alphabet: &[u8], length: usize) -> Result<String> {
    if alphabet.is_empty() {
        return Err(NoCloudError::InvalidSpec(
            "at least one character class is required".into(),
        ));
    }
    let start = hashed.len().saturating_sub(length);
    Ok(hashed[start..]
        .iter()
        .map(|&byte| alphabet[byte as usize % alphabet.len()] as char)
        .collect())
}

/// Derive the password described by `spec` from the master password.
///
/// # Errors
///
/// Returns `NoCloudError::InvalidSpec` if the spec fails [`DigestSpec::validate`].
///
/// # Examples
///
/// ```
/// use nocloud_core::crypto::{derive_password_digest, CharacterClass, CharacterClasses, DigestSpec, Passphrase};
///
/// let spec = DigestSpec::new("example.com", "root@example.com")
///     .with_iterations(1)
///     .with_character_classes(CharacterClasses::only(CharacterClass::Lower))
///     .with_length(16);
/// let digest = derive_password_digest(&spec, &Passphrase::from("correct-horse")).unwrap();
/// assert_eq!(digest.as_str(), "ewxkphvthbatkchb");
/// ```
pub fn derive_password_digest(spec: &DigestSpec, master: &Passphrase) -> Result<PasswordDigest> {
    spec.validate()?;

    tracing::debug!(
        service = %spec.service,
        iterations = spec.iterations,
        length = spec.length,
        "deriving password"
    );

    let h1 = sha512_hash(spec.username.as_bytes(), master.as_bytes(), spec.iterations);
    let h2 = sha512_hash(spec.service.as_bytes(), h1.as_slice(), spec.iterations);

    let alphabet = spec.character_classes.alphabet();
    map_to_alphabet(h2.as_slice(), alphabet.as_bytes(), spec.length).map(PasswordDigest)
}
