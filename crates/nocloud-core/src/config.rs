//! YAML configuration documents.
//!
//! Two kinds of documents are read: password entries (one document per
//! version of a credential) and remote storage settings. Either file may be
//! encrypted, in which case it carries the `.crypt` suffix and is decrypted
//! in memory before parsing.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::crypto::digest::{DEFAULT_ITERATIONS, DEFAULT_LENGTH};
use crate::crypto::{CharacterClasses, DigestSpec, Passphrase};
use crate::encryption::decrypt;
use crate::error::{NoCloudError, Result};
use crate::fs::{find_in_path, is_encrypted};

/// Remote configuration file names, in lookup order.
pub const CONFIG_CANDIDATES: &[&str] = &[".no-cloud.yml.crypt", ".no-cloud.yml"];

/// Region used by S3-compatible drivers when none is configured.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Parse every document of a YAML stream.
pub fn load_documents<T: DeserializeOwned>(data: &[u8]) -> Result<Vec<T>> {
    serde_yml::Deserializer::from_slice(data)
        .map(|document| T::deserialize(document).map_err(NoCloudError::from))
        .collect()
}

/// Parse document `version` (0-based) of a YAML stream.
pub fn load_document<T: DeserializeOwned>(data: &[u8], version: usize) -> Result<T> {
    let document = serde_yml::Deserializer::from_slice(data)
        .nth(version)
        .ok_or_else(|| NoCloudError::Config(format!("Document {} not found", version)))?;
    Ok(T::deserialize(document)?)
}

/// Read document `version` of the file at `path`.
///
/// `.crypt` files are decrypted first; `passphrase` is only called for them.
///
/// # Errors
///
/// - `NoCloudError::Io` if the file cannot be read
/// - `NoCloudError::Authentication` if decryption fails
/// - `NoCloudError::Config` if the document is missing or malformed
pub fn load_configuration<T, F>(path: &Path, version: usize, passphrase: F) -> Result<T>
where
    T: DeserializeOwned,
    F: FnOnce() -> Result<Passphrase>,
{
    let mut data = fs::read(path)?;
    if is_encrypted(path) {
        let passphrase = passphrase()?;
        data = decrypt(&data, &passphrase)?;
    }
    tracing::debug!(path = %path.display(), version, "loading configuration");
    load_document(&data, version)
}

/// Find the remote configuration governing `start`.
///
/// Returns the configuration root (the directory holding the file) and the
/// file path.
pub fn discover(start: &Path) -> Option<(PathBuf, PathBuf)> {
    find_in_path(start, CONFIG_CANDIDATES).map(|(root, name)| {
        let file = root.join(name);
        (root, file)
    })
}

/// Fallback values for password derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestDefaults {
    pub iterations: u32,
    pub characters: String,
    pub length: usize,
}

impl Default for DigestDefaults {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            characters: crate::crypto::digest::DEFAULT_CHARACTERS.to_string(),
            length: DEFAULT_LENGTH,
        }
    }
}

/// One version of a stored credential.
///
/// ```yaml
/// service: example.com
/// username: root@example.com
/// iterations: 110000
/// comment: >
///   Updated on 2016-12-18
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordEntry {
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characters: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl PasswordEntry {
    /// Layer `other` on top of `self`; fields set in `other` win.
    pub fn overlay(self, other: PasswordEntry) -> PasswordEntry {
        PasswordEntry {
            service: if other.service.is_empty() {
                self.service
            } else {
                other.service
            },
            username: if other.username.is_empty() {
                self.username
            } else {
                other.username
            },
            iterations: other.iterations.or(self.iterations),
            characters: other.characters.or(self.characters),
            length: other.length.or(self.length),
            comment: other.comment.or(self.comment),
        }
    }

    /// Resolve into a validated digest spec, filling gaps from `defaults`.
    pub fn to_spec(&self, defaults: &DigestDefaults) -> Result<DigestSpec> {
        let characters = self.characters.as_deref().unwrap_or(&defaults.characters);
        let classes: CharacterClasses = characters.parse()?;

        let spec = DigestSpec::new(self.service.clone(), self.username.clone())
            .with_iterations(self.iterations.unwrap_or(defaults.iterations))
            .with_character_classes(classes)
            .with_length(self.length.unwrap_or(defaults.length));
        spec.validate()?;
        Ok(spec)
    }

    /// The comment with surrounding whitespace removed.
    pub fn comment(&self) -> &str {
        self.comment.as_deref().map(str::trim).unwrap_or_default()
    }
}

/// Remote storage settings, selected by the `driver` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "driver", rename_all = "lowercase")]
pub enum RemoteConfig {
    S3(S3Settings),
    Minio(S3Settings),
    Local { path: PathBuf },
}

impl RemoteConfig {
    pub fn driver(&self) -> &'static str {
        match self {
            RemoteConfig::S3(_) => "s3",
            RemoteConfig::Minio(_) => "minio",
            RemoteConfig::Local { .. } => "local",
        }
    }

    /// Check driver-specific requirements serde cannot express.
    pub fn validate(&self) -> Result<()> {
        match self {
            RemoteConfig::S3(settings) => settings.validate(),
            RemoteConfig::Minio(settings) => {
                settings.validate()?;
                if settings.endpoint.as_deref().unwrap_or_default().is_empty() {
                    return Err(NoCloudError::Config(
                        "`endpoint` not found in configuration".to_string(),
                    ));
                }
                Ok(())
            }
            RemoteConfig::Local { path } => {
                if path.as_os_str().is_empty() {
                    return Err(NoCloudError::Config(
                        "`path` not found in configuration".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Sample documents printed by `nocloud remote`.
    pub fn sample() -> &'static str {
        SAMPLE_CONFIGURATION
    }
}

/// Credentials and location of an S3-compatible bucket.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Settings {
    pub bucket: String,
    pub key: String,
    pub secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl S3Settings {
    fn validate(&self) -> Result<()> {
        for (name, value) in [("bucket", &self.bucket), ("key", &self.key), ("secret", &self.secret)] {
            if value.is_empty() {
                return Err(NoCloudError::Config(format!(
                    "`{}` not found in configuration",
                    name
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for S3Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Settings")
            .field("bucket", &self.bucket)
            .field("key", &self.key)
            .field("secret", &"[REDACTED]")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

const SAMPLE_CONFIGURATION: &str = "\
Configuring push/pull commands.

Place the configuration in `.no-cloud.yml` (or encrypt it into
`.no-cloud.yml.crypt`) at the root of the tree to synchronize.

Sample configuration for S3:

    driver: s3
    bucket: bucket-xyz
    region: eu-west-1
    key: PRIVATE_KEY
    secret: SECRET

Sample configuration for MinIO:

    driver: minio
    endpoint: https://minio.example.com
    bucket: bucket-xyz
    key: PRIVATE_KEY
    secret: SECRET

Sample configuration for a local directory:

    driver: local
    path: /mnt/backup/vault
";
