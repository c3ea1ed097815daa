use std::path::PathBuf;

use nocloud_core::fs::{is_encrypted, list_files};
use nocloud_core::vault::{decrypt_files, encrypt_files, FileOutcome, VaultOptions};
use nocloud_core::NoCloudError;

use crate::app::AppContext;
use crate::cli::CryptArgs;
use crate::errors::from_core;
use crate::helpers::{prompt_new_passphrase, prompt_passphrase};
use crate::ui::{badge, summary, Badge, FileProgress, UiContext};

#[derive(Clone, Copy)]
enum Direction {
    Encrypt,
    Decrypt,
}

impl Direction {
    /// Whether a file with this encryption state is an input.
    fn accepts(self, encrypted: bool) -> bool {
        match self {
            Direction::Encrypt => !encrypted,
            Direction::Decrypt => encrypted,
        }
    }

    fn done_message(self) -> &'static str {
        match self {
            Direction::Encrypt => "Encrypted",
            Direction::Decrypt => "Decrypted",
        }
    }

    fn progress_message(self) -> &'static str {
        match self {
            Direction::Encrypt => "Encrypting",
            Direction::Decrypt => "Decrypting",
        }
    }
}

pub fn handle_encrypt(ctx: &AppContext, args: &CryptArgs) -> anyhow::Result<()> {
    run(ctx, args, Direction::Encrypt)
}

pub fn handle_decrypt(ctx: &AppContext, args: &CryptArgs) -> anyhow::Result<()> {
    run(ctx, args, Direction::Decrypt)
}

fn run(ctx: &AppContext, args: &CryptArgs, direction: Direction) -> anyhow::Result<()> {
    let ui_ctx = ctx.ui_context(false);
    let ignore = ctx.ignore_set()?;
    let files: Vec<PathBuf> = list_files(&args.paths, &ignore)
        .map_err(from_core)?
        .into_iter()
        .filter(|path| direction.accepts(is_encrypted(path)))
        .collect();

    if args.dry_run {
        for path in &files {
            println!("{}", path.display());
        }
        return Ok(());
    }
    if files.is_empty() {
        tracing::info!("nothing to do");
        return Ok(());
    }

    let passphrase = match direction {
        Direction::Encrypt => prompt_new_passphrase("Encryption password")?,
        Direction::Decrypt => prompt_passphrase("Decryption password")?,
    };
    let key = ctx.cipher_key(&passphrase);
    let options = VaultOptions {
        dry_run: false,
        keep: args.keep,
        mode: ctx.file_mode()?,
    };

    let progress = FileProgress::new(&ui_ctx, files.len(), direction.progress_message());
    let on_done = |outcome: &FileOutcome| {
        report(&ui_ctx, &progress, outcome);
        progress.inc();
    };
    let outcomes = match direction {
        Direction::Encrypt => encrypt_files(&files, &key, &options, on_done),
        Direction::Decrypt => decrypt_files(&files, &key, &options, on_done),
    };
    progress.finish();

    if ui_ctx.mode.is_pretty() && !ui_ctx.quiet {
        let succeeded = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
        println!(
            "{}",
            summary(
                &ui_ctx,
                direction.done_message(),
                succeeded,
                outcomes.len() - succeeded
            )
        );
    }

    summarize(outcomes)
}

fn report(ui_ctx: &UiContext, progress: &FileProgress, outcome: &FileOutcome) {
    match &outcome.result {
        Ok(_) => progress.println(&outcome.source.display().to_string()),
        Err(err) => eprintln!(
            "{}",
            badge(
                ui_ctx,
                Badge::Err,
                &format!("{}: {}", outcome.source.display(), err)
            )
        ),
    }
}

/// Turn per-file failures into a single error.
///
/// When every file failed authentication the passphrase is the likely cause,
/// so that error is returned as is.
fn summarize(outcomes: Vec<FileOutcome>) -> anyhow::Result<()> {
    let total = outcomes.len();
    let failures: Vec<NoCloudError> = outcomes
        .into_iter()
        .filter_map(|outcome| outcome.result.err())
        .collect();

    if failures.is_empty() {
        return Ok(());
    }
    if failures.len() == total
        && failures
            .iter()
            .all(|err| matches!(err, NoCloudError::Authentication))
    {
        return Err(from_core(NoCloudError::Authentication));
    }
    Err(anyhow::anyhow!("{} of {} files failed", failures.len(), total))
}
