use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use nocloud_core::config::DigestDefaults;
use nocloud_core::crypto::digest::{DEFAULT_CHARACTERS, DEFAULT_ITERATIONS, DEFAULT_LENGTH};
use nocloud_core::fs::{IgnoreSet, DEFAULT_IGNORE_PATTERNS, DEFAULT_MODE};

/// User configuration, read from `$XDG_CONFIG_HOME/nocloud/config.toml`.
///
/// Every section is optional; missing values fall back to built-in defaults.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct NoCloudConfig {
    #[serde(default)]
    pub password: PasswordSection,
    #[serde(default)]
    pub files: FilesSection,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordSection {
    pub iterations: u32,
    pub characters: String,
    pub length: usize,
}

impl Default for PasswordSection {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            characters: DEFAULT_CHARACTERS.to_string(),
            length: DEFAULT_LENGTH,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesSection {
    /// Octal mode string, e.g. "600"
    pub mode: String,
    pub ignore: Vec<String>,
}

impl Default for FilesSection {
    fn default() -> Self {
        Self {
            mode: format!("{:o}", DEFAULT_MODE),
            ignore: DEFAULT_IGNORE_PATTERNS
                .iter()
                .map(|pattern| pattern.to_string())
                .collect(),
        }
    }
}

impl NoCloudConfig {
    pub fn digest_defaults(&self) -> DigestDefaults {
        DigestDefaults {
            iterations: self.password.iterations,
            characters: self.password.characters.clone(),
            length: self.password.length,
        }
    }

    pub fn file_mode(&self) -> anyhow::Result<u32> {
        u32::from_str_radix(self.files.mode.trim_start_matches("0o"), 8)
            .map_err(|_| anyhow::anyhow!("Invalid file mode in config: {}", self.files.mode))
    }

    pub fn ignore_set(&self) -> anyhow::Result<IgnoreSet> {
        Ok(IgnoreSet::new(&self.files.ignore)?)
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

/// Read the configuration at `path`, or the defaults if it does not exist.
pub fn load_config(path: &Path) -> anyhow::Result<NoCloudConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no user config, using defaults");
        return Ok(NoCloudConfig::default());
    }
    read_config(path)
}

pub fn read_config(path: &Path) -> anyhow::Result<NoCloudConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("nocloud"));
        }
    }
    Ok(home_dir()?.join(".config").join("nocloud"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}
