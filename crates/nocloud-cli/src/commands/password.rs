use serde::Serialize;

use nocloud_core::config::{load_configuration, PasswordEntry};
use nocloud_core::crypto::derive_password_digest;
use nocloud_core::NoCloudError;

use crate::app::AppContext;
use crate::cli::PasswordArgs;
use crate::errors::from_core;
use crate::helpers::{prompt_new_passphrase, prompt_passphrase};

#[derive(Serialize)]
struct PasswordOutput<'a> {
    service: &'a str,
    username: &'a str,
    password: &'a str,
    comment: &'a str,
}

pub fn handle_password(ctx: &AppContext, args: &PasswordArgs) -> anyhow::Result<()> {
    let mut entry = PasswordEntry {
        service: args.service.clone().unwrap_or_default(),
        username: args.username.clone().unwrap_or_default(),
        iterations: args.iterations,
        characters: args.characters.clone(),
        length: args.length,
        comment: None,
    };

    if let Some(file) = &args.file {
        let stored: PasswordEntry = load_configuration(file, args.revision, || {
            prompt_passphrase("Decryption password")
                .map_err(|e| NoCloudError::InvalidInput(e.to_string()))
        })
        .map_err(from_core)?;
        entry = entry.overlay(stored);
    }

    let spec = entry.to_spec(&ctx.digest_defaults()?).map_err(from_core)?;
    let master = prompt_new_passphrase("Master password")?;
    let digest = derive_password_digest(&spec, &master).map_err(from_core)?;

    let output = PasswordOutput {
        service: &entry.service,
        username: &entry.username,
        password: digest.as_str(),
        comment: entry.comment(),
    };

    if ctx.ui_context(args.json).mode.is_json() {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("service: {}", output.service);
    println!("username: {}", output.username);
    println!("password: {}", output.password);
    println!("comment: >");
    println!("  {}", output.comment);
    Ok(())
}
