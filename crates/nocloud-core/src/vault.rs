//! File-level encryption and decryption.
//!
//! Each file is handled independently: `notes.txt` becomes `notes.txt.crypt`
//! and back. Batches run on the rayon thread pool; results come back in input
//! order and a failure on one file never aborts the others.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::crypto::DerivedKey;
use crate::encryption::{decrypt_with_key, encrypt_with_key};
use crate::error::{NoCloudError, Result};
use crate::fs::{decrypted_path, encrypted_path, is_encrypted, write_atomic, DEFAULT_MODE};

/// Options shared by encryption and decryption runs.
#[derive(Debug, Clone, Copy)]
pub struct VaultOptions {
    /// Report what would happen without touching any file.
    pub dry_run: bool,
    /// Keep the source file after writing its counterpart.
    pub keep: bool,
    /// Mode applied to written files.
    pub mode: u32,
}

impl Default for VaultOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            keep: false,
            mode: DEFAULT_MODE,
        }
    }
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileAction {
    /// The counterpart was written to `destination`.
    Written { destination: PathBuf },
    /// Dry run: the counterpart would be written to `destination`.
    Planned { destination: PathBuf },
    /// The file was not eligible (already encrypted / not encrypted).
    Skipped,
}

/// Per-file result of a batch run.
#[derive(Debug)]
pub struct FileOutcome {
    pub source: PathBuf,
    pub result: Result<FileAction>,
}

impl FileOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Encrypt one file into its `.crypt` sibling.
///
/// Already encrypted files are skipped.
pub fn encrypt_file(path: &Path, key: &DerivedKey, options: &VaultOptions) -> Result<FileAction> {
    if is_encrypted(path) {
        return Ok(FileAction::Skipped);
    }
    let destination = encrypted_path(path);
    if options.dry_run {
        return Ok(FileAction::Planned { destination });
    }

    let data = fs::read(path)?;
    let encrypted = encrypt_with_key(&data, key)?;
    write_atomic(&destination, &encrypted, options.mode)?;

    if !options.keep {
        fs::remove_file(path)?;
    }
    tracing::debug!(source = %path.display(), destination = %destination.display(), "encrypted");
    Ok(FileAction::Written { destination })
}

/// Decrypt one `.crypt` file next to itself.
///
/// Files without the `.crypt` suffix are skipped. Nothing is written when
/// authentication fails.
pub fn decrypt_file(path: &Path, key: &DerivedKey, options: &VaultOptions) -> Result<FileAction> {
    if !is_encrypted(path) {
        return Ok(FileAction::Skipped);
    }
    let destination = decrypted_path(path).ok_or_else(|| {
        NoCloudError::InvalidInput(format!("Cannot derive output path for {}", path.display()))
    })?;
    if options.dry_run {
        return Ok(FileAction::Planned { destination });
    }

    let data = fs::read(path)?;
    let decrypted = decrypt_with_key(&data, key)?;
    write_atomic(&destination, &decrypted, options.mode)?;

    if !options.keep {
        fs::remove_file(path)?;
    }
    tracing::debug!(source = %path.display(), destination = %destination.display(), "decrypted");
    Ok(FileAction::Written { destination })
}

/// Encrypt many files in parallel.
///
/// `on_done` runs on the worker thread as soon as each file finishes.
pub fn encrypt_files<D>(
    paths: &[PathBuf],
    key: &DerivedKey,
    options: &VaultOptions,
    on_done: D,
) -> Vec<FileOutcome>
where
    D: Fn(&FileOutcome) + Sync,
{
    run_batch(paths, |path| encrypt_file(path, key, options), on_done)
}

/// Decrypt many files in parallel.
///
/// `on_done` runs on the worker thread as soon as each file finishes.
pub fn decrypt_files<D>(
    paths: &[PathBuf],
    key: &DerivedKey,
    options: &VaultOptions,
    on_done: D,
) -> Vec<FileOutcome>
where
    D: Fn(&FileOutcome) + Sync,
{
    run_batch(paths, |path| decrypt_file(path, key, options), on_done)
}

fn run_batch<F, D>(paths: &[PathBuf], operation: F, on_done: D) -> Vec<FileOutcome>
where
    F: Fn(&Path) -> Result<FileAction> + Sync,
    D: Fn(&FileOutcome) + Sync,
{
    paths
        .par_iter()
        .map(|path| {
            let result = operation(path);
            if let Err(err) = &result {
                tracing::warn!(path = %path.display(), error = %err, "file operation failed");
            }
            let outcome = FileOutcome {
                source: path.clone(),
                result,
            };
            on_done(&outcome);
            outcome
        })
        .collect()
}
