//! Progress indicator for batch file operations using indicatif.

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle};

use super::UiContext;

/// A progress bar over a known number of files.
///
/// Hidden unless the terminal allows animation.
pub struct FileProgress {
    bar: Option<IndicatifBar>,
}

impl FileProgress {
    pub fn new(ctx: &UiContext, total: usize, message: &str) -> Self {
        let bar = if ctx.allows_animation() && total > 1 {
            let pb = IndicatifBar::new(total as u64);
            let template = if ctx.unicode {
                "{msg} [{bar:20.cyan/dim}] {pos}/{len}"
            } else {
                "{msg} [{bar:20}] {pos}/{len}"
            };
            if let Ok(style) = ProgressStyle::default_bar().template(template) {
                pb.set_style(style.progress_chars(if ctx.unicode { "━━─" } else { "=>-" }));
            }
            pb.set_message(message.to_string());
            Some(pb)
        } else {
            None
        };
        Self { bar }
    }

    pub fn inc(&self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    /// Print a line without breaking the bar.
    pub fn println(&self, line: &str) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => println!("{}", line),
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::OutputMode;

    #[test]
    fn test_hidden_without_tty() {
        let ctx = UiContext {
            is_tty: false,
            color: false,
            unicode: false,
            quiet: false,
            mode: OutputMode::Plain,
        };
        let progress = FileProgress::new(&ctx, 10, "Encrypting");
        assert!(progress.bar.is_none());
        progress.inc();
        progress.finish();
    }

    #[test]
    fn test_advances_from_worker_threads() {
        let progress = FileProgress {
            bar: Some(IndicatifBar::hidden()),
        };
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| progress.inc());
            }
        });
        assert_eq!(progress.bar.as_ref().map(|bar| bar.position()), Some(4));
    }
}
