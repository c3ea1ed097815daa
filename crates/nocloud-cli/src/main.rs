//! nocloud CLI - encrypt, sync and audit a personal file vault
//!
//! Thin command-line layer over `nocloud-core`: argument parsing, prompts,
//! output formatting and exit codes live here.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod helpers;
mod ui;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use nocloud_core::VERSION;

use crate::app::AppContext;
use crate::cli::{Cli, Commands};
use crate::commands::{audit, crypt, misc, password, remote, rename};
use crate::ui::print_error;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);
    let ctx = AppContext::new(&cli);

    if let Err(e) = run(&ctx, &cli) {
        let ui_ctx = ctx.ui_context(false);

        let full = format!("{}", e);
        let hint = extract_error_hint(&full);
        let message = match full.find("\nHint:") {
            Some(idx) => full[..idx].to_string(),
            None => full,
        };

        print_error(&ui_ctx, &message, hint.as_deref());
        std::process::exit(errors::exit_code_for(&e));
    }
}

/// Logs go to stderr so they never mix with command output.
///
/// `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();
}

/// Extract a hint from an error message, or provide one for common errors.
fn extract_error_hint(error: &str) -> Option<String> {
    if let Some(idx) = error.find("\nHint:") {
        return Some(error[idx + 1..].to_string());
    }

    let error_lower = error.to_lowercase();

    if error_lower.contains("no passphrase provided") {
        return Some(format!(
            "Hint: Run from a terminal, or set {} for scripted use.",
            constants::PASSPHRASE_ENV
        ));
    }

    if error_lower.contains("document") && error_lower.contains("not found") {
        return Some("Hint: Versions are 0-based document indexes in the YAML file.".to_string());
    }

    if error_lower.contains("remote storage error") {
        return Some(
            "Hint: Check the credentials and bucket in .no-cloud.yml, then retry with -v."
                .to_string(),
        );
    }

    None
}

fn run(ctx: &AppContext, cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Some(Commands::Remote) => {
            remote::handle_remote(ctx)?;
        }
        Some(Commands::Push(args)) => {
            remote::handle_push(ctx, args)?;
        }
        Some(Commands::Pull(args)) => {
            remote::handle_pull(ctx, args)?;
        }
        Some(Commands::Encrypt(args)) => {
            crypt::handle_encrypt(ctx, args)?;
        }
        Some(Commands::Decrypt(args)) => {
            crypt::handle_decrypt(ctx, args)?;
        }
        Some(Commands::Password(args)) => {
            password::handle_password(ctx, args)?;
        }
        Some(Commands::Rename(args)) => {
            rename::handle_rename(ctx, args)?;
        }
        Some(Commands::Audit(args)) => {
            audit::handle_audit(ctx, args)?;
        }
        Some(Commands::Completions(args)) => {
            misc::handle_completions(args.shell)?;
        }
        None => {
            println!("nocloud {}", VERSION);
            println!();
            println!("Quickstart:");
            println!("  nocloud encrypt <path>     Encrypt files into .crypt siblings");
            println!("  nocloud decrypt <path>     Restore .crypt files");
            println!("  nocloud password -s <service> -u <username>");
            println!("  nocloud remote             Show how to configure push/pull");
            println!();
            println!("Run `nocloud --help` for all commands.");
        }
    }
    Ok(())
}
