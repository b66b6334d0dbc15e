//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `init` | Create `.ccron/` with a default config |
//! | `transform` | Normalize and code a schedule export |
//! | `overlaps` | Overlap and gap tables per service |
//! | `macroflow` | Predecessor mismatches against the reference template |
//! | `audit` | Every check, merged into one report |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output on stderr:
//! ```bash
//! ccron --verbose audit schedule.json
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod session;
mod analyze;
mod audit;
mod transform;

pub use app::{Cli, Commands, run};
pub use output::{Output, OutputFormat};
