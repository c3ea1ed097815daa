//! # nocloud core
//!
//! Core library for nocloud - a personal file vault without a cloud provider
//! in the trust path.
//!
//! This crate holds everything the `nocloud` command line does, independent of
//! the CLI itself.
//!
//! ## Architecture
//!
//! - **crypto**: password derivation, cipher keys and token framing
//! - **encryption**: passphrase-based encrypt/decrypt of byte buffers
//! - **vault**: `.crypt` file encryption and decryption, in batches
//! - **fs**: traversal, vault file naming, modes and atomic writes
//! - **config**: YAML password entries and remote settings
//! - **remote**: push/pull of vault files to object storage
//! - **audit**: clear files and loose permissions
//! - **rename**: batch renaming with a substitution pattern

pub mod audit;
pub mod config;
pub mod crypto;
pub mod encryption;
pub mod error;
pub mod fs;
pub mod remote;
pub mod rename;
pub mod vault;

pub use error::{NoCloudError, Result};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
