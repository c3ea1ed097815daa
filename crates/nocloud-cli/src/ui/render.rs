//! Line renderers shared by the commands.

use std::path::Path;

use super::theme::{styled, styles};
use super::{Badge, OutputMode, UiContext};

/// Title line of a command acting on `target`.
///
/// Empty in JSON mode.
pub fn header(ctx: &UiContext, command: &str, target: Option<&Path>) -> String {
    let target = target.map(|path| path.display().to_string());
    match (ctx.mode, target) {
        (OutputMode::Json, _) => String::new(),
        (OutputMode::Pretty, Some(target)) => format!(
            "{} \u{00B7} {} {}",
            styled("nocloud", styles::bold(), ctx.color),
            command,
            styled(&target, styles::dim(), ctx.color)
        ),
        (OutputMode::Pretty, None) => format!(
            "{} \u{00B7} {}",
            styled("nocloud", styles::bold(), ctx.color),
            command
        ),
        (OutputMode::Plain, Some(target)) => format!("nocloud {} {}", command, target),
        (OutputMode::Plain, None) => format!("nocloud {}", command),
    }
}

pub fn badge(ctx: &UiContext, kind: Badge, message: &str) -> String {
    let mark = styled(kind.display(ctx.unicode), kind.style(), ctx.color);
    match message {
        "" => mark,
        _ => format!("{} {}", mark, message),
    }
}

pub fn hint(ctx: &UiContext, text: &str) -> String {
    match ctx.mode {
        OutputMode::Pretty => format!("{} {}", styled("Hint:", styles::dim(), ctx.color), text),
        _ => format!("hint={}", text),
    }
}

/// Closing line of a batch run, e.g. "Encrypted 3 files, 1 failed".
pub fn summary(ctx: &UiContext, verb: &str, succeeded: usize, failed: usize) -> String {
    let noun = if succeeded == 1 { "file" } else { "files" };
    match ctx.mode {
        OutputMode::Pretty if failed == 0 => {
            badge(ctx, Badge::Ok, &format!("{} {} {}", verb, succeeded, noun))
        }
        OutputMode::Pretty => badge(
            ctx,
            Badge::Warn,
            &format!("{} {} {}, {} failed", verb, succeeded, noun, failed),
        ),
        _ => format!(
            "{}={} failed={}",
            verb.to_lowercase(),
            succeeded,
            failed
        ),
    }
}

/// An error badge, followed by the hint on its own line.
pub fn error_message(ctx: &UiContext, message: &str, error_hint: Option<&str>) -> String {
    let line = badge(ctx, Badge::Err, message);
    match error_hint {
        Some(text) => format!("{}\n{}", line, styled(text, styles::dim(), ctx.color)),
        None => line,
    }
}

pub fn print_error(ctx: &UiContext, message: &str, error_hint: Option<&str>) {
    eprintln!("{}", error_message(ctx, message, error_hint));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(mode: OutputMode) -> UiContext {
        UiContext {
            is_tty: mode == OutputMode::Pretty,
            color: false,
            unicode: false,
            quiet: false,
            mode,
        }
    }

    #[test]
    fn test_header_modes() {
        let target = Path::new("/vault/docs");
        assert_eq!(
            header(&ctx(OutputMode::Pretty), "push", Some(target)),
            "nocloud \u{00B7} push /vault/docs"
        );
        assert_eq!(header(&ctx(OutputMode::Plain), "pull", None), "nocloud pull");
        assert!(header(&ctx(OutputMode::Json), "push", Some(target)).is_empty());
    }

    #[test]
    fn test_summary_pretty() {
        let pretty = ctx(OutputMode::Pretty);
        assert_eq!(summary(&pretty, "Encrypted", 1, 0), "[OK] Encrypted 1 file");
        assert_eq!(
            summary(&pretty, "Decrypted", 2, 1),
            "[WARN] Decrypted 2 files, 1 failed"
        );
    }

    #[test]
    fn test_summary_plain() {
        assert_eq!(
            summary(&ctx(OutputMode::Plain), "Encrypted", 3, 0),
            "encrypted=3 failed=0"
        );
    }

    #[test]
    fn test_hint_modes() {
        assert_eq!(hint(&ctx(OutputMode::Plain), "retry"), "hint=retry");
        assert_eq!(hint(&ctx(OutputMode::Pretty), "retry"), "Hint: retry");
    }

    #[test]
    fn test_error_message_with_hint() {
        let out = error_message(&ctx(OutputMode::Plain), "bad", Some("Hint: try again"));
        assert_eq!(out, "[ERR] bad\nHint: try again");
    }
}
