use std::path::{Path, PathBuf};

use nocloud_core::config::{discover, load_configuration, RemoteConfig};
use nocloud_core::fs::list_files;
use nocloud_core::remote::{open_remote, RemoteStorage};
use nocloud_core::NoCloudError;

use crate::app::AppContext;
use crate::cli::PathsArgs;
use crate::errors::{from_core, CliError};
use crate::helpers::{absolute_path, prompt_passphrase};
use crate::ui::{header, hint, UiContext};

pub fn handle_remote(ctx: &AppContext) -> anyhow::Result<()> {
    let ui_ctx = ctx.ui_context(false);
    print!("{}", RemoteConfig::sample());
    if ui_ctx.mode.is_pretty() {
        println!();
        println!(
            "{}",
            hint(
                &ui_ctx,
                "Save it as .no-cloud.yml at the root of the tree, or encrypt it to .no-cloud.yml.crypt."
            )
        );
    }
    Ok(())
}

fn print_header(ui_ctx: &UiContext, command: &str, target: &Path) {
    if ui_ctx.mode.is_pretty() && !ui_ctx.quiet {
        println!("{}", header(ui_ctx, command, Some(target)));
    }
}

pub fn handle_push(ctx: &AppContext, args: &PathsArgs) -> anyhow::Result<()> {
    let ui_ctx = ctx.ui_context(false);
    let ignore = ctx.ignore_set()?;
    for path in &args.paths {
        let target = absolute_path(path)?;
        let (remote, config_file) = open_for(ctx, &target)?;
        print_header(&ui_ctx, "push", &target);

        let files = list_files(std::slice::from_ref(&target), &ignore).map_err(from_core)?;
        for file in files.iter().filter(|file| **file != config_file) {
            remote.push(file).map_err(from_core)?;
            if !ctx.quiet() {
                println!("{}", file.display());
            }
        }
    }
    Ok(())
}

pub fn handle_pull(ctx: &AppContext, args: &PathsArgs) -> anyhow::Result<()> {
    let ui_ctx = ctx.ui_context(false);
    for path in &args.paths {
        let target = absolute_path(path)?;
        let (remote, _) = open_for(ctx, &target)?;
        print_header(&ui_ctx, "pull", &target);

        for file in remote.pull(&target).map_err(from_core)? {
            if !ctx.quiet() {
                println!("{}", file.display());
            }
        }
    }
    Ok(())
}

/// Open the remote configured for `target`, with the path of its
/// configuration file.
fn open_for(ctx: &AppContext, target: &Path) -> anyhow::Result<(Box<dyn RemoteStorage>, PathBuf)> {
    let (root, file) = discover(target).ok_or_else(|| {
        CliError::not_found(
            format!("No configuration found for {}", target.display()),
            "Hint: Run `nocloud remote` to see how to create .no-cloud.yml.",
        )
    })?;
    tracing::debug!(root = %root.display(), file = %file.display(), "found remote configuration");

    let config: RemoteConfig = load_configuration(&file, 0, || {
        prompt_passphrase("Configuration password")
            .map_err(|e| NoCloudError::InvalidInput(e.to_string()))
    })
    .map_err(from_core)?;

    let remote = open_remote(&config, &root, ctx.file_mode()?).map_err(from_core)?;
    Ok((remote, file))
}
