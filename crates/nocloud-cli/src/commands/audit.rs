use nocloud_core::audit::audit;
use nocloud_core::fs::list_files;

use crate::app::AppContext;
use crate::cli::AuditArgs;
use crate::errors::from_core;
use crate::ui::{badge, Badge};

pub fn handle_audit(ctx: &AppContext, args: &AuditArgs) -> anyhow::Result<()> {
    let ui_ctx = ctx.ui_context(args.json);
    let files = list_files(&args.paths, &ctx.ignore_set()?).map_err(from_core)?;
    let findings = audit(&files, ctx.file_mode()?, !args.dry_run).map_err(from_core)?;

    if ui_ctx.mode.is_json() {
        println!("{}", serde_json::to_string_pretty(&findings)?);
        return Ok(());
    }

    for finding in &findings {
        println!("{}", finding);
    }

    let issues = findings.iter().filter(|f| f.has_issues()).count();
    tracing::info!(files = findings.len(), issues, "audit complete");

    if ui_ctx.mode.is_pretty() && !ui_ctx.quiet {
        let summary = if issues == 0 {
            badge(&ui_ctx, Badge::Ok, "No issues found")
        } else {
            badge(
                &ui_ctx,
                Badge::Warn,
                &format!("{} of {} files need attention", issues, findings.len()),
            )
        };
        println!("{}", summary);
    }
    Ok(())
}
