use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use clap_complete::Shell;

use nocloud_core::VERSION;

/// nocloud - encrypt, sync and audit a personal file vault
#[derive(Parser)]
#[command(name = "nocloud")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the user configuration file
    #[arg(long, global = true, env = "NOCLOUD_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Use ASCII symbols only
    #[arg(long, global = true)]
    pub ascii: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show how to configure push/pull
    Remote,

    /// Push files to remote storage, replacing remote copies
    Push(PathsArgs),

    /// Pull files from remote storage, replacing local copies
    Pull(PathsArgs),

    /// Encrypt files using a passphrase
    Encrypt(CryptArgs),

    /// Decrypt files using a passphrase
    Decrypt(CryptArgs),

    /// Reproducibly generate a password
    Password(PasswordArgs),

    /// Rename files using a substitution pattern
    Rename(RenameArgs),

    /// Audit files for clear content and loose permissions
    Audit(AuditArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for `push` and `pull`
#[derive(Args)]
pub struct PathsArgs {
    /// Files or directories inside a configured tree
    #[arg(value_name = "PATH", default_value = ".")]
    pub paths: Vec<PathBuf>,
}

/// Arguments for `encrypt` and `decrypt`
#[derive(Args)]
pub struct CryptArgs {
    /// Files or directories to process
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Print the files that would be processed, change nothing
    #[arg(short, long)]
    pub dry_run: bool,

    /// Keep the source files
    #[arg(short, long)]
    pub keep: bool,
}

/// Arguments for the `password` command
#[derive(Args)]
pub struct PasswordArgs {
    /// Service the password is for (e.g. example.com)
    #[arg(short, long)]
    pub service: Option<String>,

    /// Account name on the service
    #[arg(short, long)]
    pub username: Option<String>,

    /// PBKDF2 iterations
    #[arg(short, long)]
    pub iterations: Option<u32>,

    /// Character classes: l(ower), u(pper), d(igit), p(unctuation)
    #[arg(short, long)]
    pub characters: Option<String>,

    /// Password length (1-64)
    #[arg(short, long)]
    pub length: Option<usize>,

    /// YAML file with one document per version (may be encrypted)
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Document to use from --file (0-based)
    #[arg(short, long, default_value_t = 0)]
    pub revision: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `rename` command
#[derive(Args)]
pub struct RenameArgs {
    /// Substitution pattern, e.g. 's/^/road-trip-$i-/'
    #[arg(value_name = "PATTERN")]
    pub pattern: String,

    /// Files or directories to rename
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Print the new names, change nothing
    #[arg(short, long)]
    pub dry_run: bool,

    /// Overwrite existing files
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the `audit` command
#[derive(Args)]
pub struct AuditArgs {
    /// Files or directories to audit
    #[arg(value_name = "PATH", default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Report only, do not fix modes
    #[arg(short, long)]
    pub dry_run: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `completions` command
#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_name = "SHELL")]
    pub shell: Shell,
}
