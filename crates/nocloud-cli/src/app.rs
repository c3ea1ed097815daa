//! Application context for the nocloud CLI.
//!
//! Bundles the parsed arguments with the lazily-loaded user configuration.

use std::path::PathBuf;

use once_cell::unsync::OnceCell;

use nocloud_core::config::DigestDefaults;
use nocloud_core::crypto::{DerivedKey, KeyCache, Passphrase};
use nocloud_core::fs::IgnoreSet;

use crate::cli::Cli;
use crate::config::{default_config_path, load_config, NoCloudConfig};
use crate::ui::{DisplayFlags, UiContext};

pub struct AppContext<'a> {
    cli: &'a Cli,
    config: OnceCell<NoCloudConfig>,
    keys: KeyCache,
}

impl<'a> AppContext<'a> {
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config: OnceCell::new(),
            keys: KeyCache::new(),
        }
    }

    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// UI context for a command, honoring the global display flags.
    pub fn ui_context(&self, json: bool) -> UiContext {
        UiContext::from_env(DisplayFlags {
            json,
            quiet: self.cli.quiet,
            no_color: self.cli.no_color,
            ascii: self.cli.ascii,
        })
    }

    /// Path of the user configuration file (`--config` or the XDG default).
    pub fn config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.cli.config {
            Some(path) => Ok(path.clone()),
            None => default_config_path(),
        }
    }

    /// The user configuration, loaded on first use.
    pub fn config(&self) -> anyhow::Result<&NoCloudConfig> {
        self.config
            .get_or_try_init(|| load_config(&self.config_path()?))
    }

    pub fn digest_defaults(&self) -> anyhow::Result<DigestDefaults> {
        Ok(self.config()?.digest_defaults())
    }

    pub fn file_mode(&self) -> anyhow::Result<u32> {
        self.config()?.file_mode()
    }

    pub fn ignore_set(&self) -> anyhow::Result<IgnoreSet> {
        self.config()?.ignore_set()
    }

    /// Cipher key for `passphrase`, derived once per process.
    pub fn cipher_key(&self, passphrase: &Passphrase) -> DerivedKey {
        self.keys.get_or_derive(passphrase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_explicit_config_path_wins() {
        let cli = Cli::try_parse_from(["nocloud", "--config", "/tmp/custom.toml", "remote"])
            .expect("parse");
        let ctx = AppContext::new(&cli);
        assert_eq!(
            ctx.config_path().expect("path"),
            PathBuf::from("/tmp/custom.toml")
        );
    }

    #[test]
    fn test_missing_config_gives_defaults() {
        let cli = Cli::try_parse_from([
            "nocloud",
            "--config",
            "/nonexistent/nocloud/config.toml",
            "remote",
        ])
        .expect("parse");
        let ctx = AppContext::new(&cli);
        assert_eq!(ctx.file_mode().expect("mode"), 0o600);
        assert!(ctx.ignore_set().expect("ignore").is_ignored(".git"));
    }
}
