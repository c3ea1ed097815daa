use nocloud_core::fs::list_files;
use nocloud_core::rename::{apply, SubstitutionPattern};

use crate::app::AppContext;
use crate::cli::RenameArgs;
use crate::errors::{from_core, CliError};

pub fn handle_rename(ctx: &AppContext, args: &RenameArgs) -> anyhow::Result<()> {
    let pattern = SubstitutionPattern::parse(&args.pattern)
        .map_err(|e| CliError::invalid_input(e.to_string()))?;

    let files = list_files(&args.paths, &ctx.ignore_set()?).map_err(from_core)?;
    let plans = pattern.plan(&files);

    for plan in &plans {
        println!("{}", plan.destination.display());
    }

    if args.dry_run {
        return Ok(());
    }

    let renamed = apply(&plans, args.force).map_err(from_core)?;
    tracing::info!(renamed, "rename complete");
    Ok(())
}
