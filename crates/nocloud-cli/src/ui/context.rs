//! Terminal detection and output mode selection.

use std::io::IsTerminal;

/// How command results are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// A single JSON document, nothing else
    Json,
    /// Stable line output for pipes and scripts
    #[default]
    Plain,
    /// Colors, badges and progress bars
    Pretty,
}

impl OutputMode {
    pub fn is_json(&self) -> bool {
        *self == Self::Json
    }

    pub fn is_pretty(&self) -> bool {
        *self == Self::Pretty
    }
}

/// Display flags given on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayFlags {
    pub json: bool,
    pub quiet: bool,
    pub no_color: bool,
    pub ascii: bool,
}

/// What the process knows about its terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct Terminal {
    pub stdout_tty: bool,
    /// `TERM=dumb`
    pub dumb: bool,
    /// `NO_COLOR` is set
    pub no_color: bool,
}

impl Terminal {
    pub fn detect() -> Self {
        Self {
            stdout_tty: std::io::stdout().is_terminal(),
            dumb: std::env::var("TERM").is_ok_and(|term| term == "dumb"),
            no_color: std::env::var_os("NO_COLOR").is_some(),
        }
    }
}

/// Resolved presentation settings for one command.
#[derive(Debug, Clone)]
pub struct UiContext {
    pub is_tty: bool,
    pub color: bool,
    pub unicode: bool,
    pub quiet: bool,
    pub mode: OutputMode,
}

impl UiContext {
    pub fn from_env(flags: DisplayFlags) -> Self {
        Self::resolve(Terminal::detect(), flags)
    }

    /// `--json` wins; otherwise pretty output needs a capable TTY.
    pub fn resolve(terminal: Terminal, flags: DisplayFlags) -> Self {
        let capable = terminal.stdout_tty && !terminal.dumb;
        let mode = if flags.json {
            OutputMode::Json
        } else if capable {
            OutputMode::Pretty
        } else {
            OutputMode::Plain
        };

        Self {
            is_tty: terminal.stdout_tty,
            color: capable && !terminal.no_color && !flags.no_color,
            unicode: !flags.ascii,
            quiet: flags.quiet,
            mode,
        }
    }

    /// Progress bars only draw on an interactive pretty terminal.
    pub fn allows_animation(&self) -> bool {
        self.is_tty && !self.quiet && self.mode.is_pretty()
    }
}
