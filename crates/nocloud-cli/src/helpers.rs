//! Input and path helper functions for the CLI.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use dialoguer::Password;

use nocloud_core::crypto::Passphrase;

use crate::constants::PASSPHRASE_ENV;

/// Prompt for a passphrase, or read it from NOCLOUD_PASSPHRASE.
pub fn prompt_passphrase(prompt: &str) -> anyhow::Result<Passphrase> {
    if let Some(value) = passphrase_from_env() {
        return Ok(value);
    }
    ensure_terminal()?;
    Password::new()
        .with_prompt(prompt)
        .interact()
        .map(Passphrase::from)
        .map_err(|e| anyhow::anyhow!("Failed to read passphrase: {}", e))
}

/// Prompt for a passphrase with confirmation, or read it from NOCLOUD_PASSPHRASE.
pub fn prompt_new_passphrase(prompt: &str) -> anyhow::Result<Passphrase> {
    if let Some(value) = passphrase_from_env() {
        return Ok(value);
    }
    ensure_terminal()?;
    Password::new()
        .with_prompt(prompt)
        .with_confirmation("Confirmation", "Passphrases do not match")
        .interact()
        .map(Passphrase::from)
        .map_err(|e| anyhow::anyhow!("Failed to read passphrase: {}", e))
}

fn passphrase_from_env() -> Option<Passphrase> {
    std::env::var(PASSPHRASE_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(Passphrase::from)
}

fn ensure_terminal() -> anyhow::Result<()> {
    if std::io::stdin().is_terminal() {
        return Ok(());
    }
    Err(anyhow::anyhow!(
        "No passphrase provided and no TTY available. Set {}.",
        PASSPHRASE_ENV
    ))
}

/// Absolute form of `path` with symlinks resolved in its existing prefix.
pub fn absolute_path(path: &Path) -> anyhow::Result<PathBuf> {
    let absolute = std::path::absolute(path)
        .map_err(|e| anyhow::anyhow!("Cannot resolve {}: {}", path.display(), e))?;

    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_owned());
                existing = parent;
            }
            _ => break,
        }
    }

    let mut resolved = existing
        .canonicalize()
        .unwrap_or_else(|_| existing.to_path_buf());
    for name in missing.iter().rev() {
        resolved.push(name);
    }
    Ok(resolved)
}
