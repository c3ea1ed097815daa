//! Terminal presentation for the nocloud CLI.
//!
//! - **context**: terminal detection and output mode
//! - **theme**: badges and styles
//! - **render**: headers, hints, summaries and errors
//! - **progress**: progress bar for batch file operations

mod context;
pub mod progress;
pub mod render;
pub mod theme;

pub use context::{DisplayFlags, OutputMode, UiContext};
pub use theme::Badge;

pub use render::{badge, header, hint, print_error, summary};

pub use progress::FileProgress;
