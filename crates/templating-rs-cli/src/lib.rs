//! # templating-rs-cli
//!
//! The `templating` command-line tool.
//!
//! This crate provides a small framework for defining and registering CLI
//! commands, plus the built-in commands:
//!
//! - `evaluate` - expand every processed file in the project in place
//! - `render <FILE>` - print the expanded contents of one file
//! - `check <PATH>...` - show whether paths would be processed
//!
//! ## Quick Start
//!
//! ```rust
//! use templating_rs_cli::command::CommandRegistry;
//! use templating_rs_cli::commands::register_builtin_commands;
//!
//! let mut registry = CommandRegistry::new();
//! register_builtin_commands(&mut registry);
//!
//! let names = registry.list_commands();
//! assert!(names.contains(&"evaluate"));
//! assert!(names.contains(&"render"));
//! assert!(names.contains(&"check"));
//! ```

// These clippy lints are intentionally allowed:
// - result_large_err: TemplatingError is the crate-wide error type
// - doc_markdown: backtick requirements for documentation items are too strict
#![allow(clippy::result_large_err)]
#![allow(clippy::doc_markdown)]

pub mod command;
pub mod commands;

use std::io::Write;
use std::path::PathBuf;

use templating_rs_core::{logging, settings_loader, TemplatingResult};

// Re-export primary types at the crate root for convenience.
pub use command::{apply_cli_overrides, CommandRegistry, ManagementCommand};

/// Loads settings, configures logging, and runs the command selected by `matches`.
///
/// Settings come from the `--settings` file if given (otherwise the defaults),
/// then the environment, then the global command-line options.
///
/// # Errors
///
/// Returns a `ConfigurationError` for an unreadable settings file or invalid
/// settings, or the command's failure.
pub fn run(registry: &CommandRegistry, matches: &clap::ArgMatches, out: &mut dyn Write) -> TemplatingResult<()> {
    let mut settings = match matches.get_one::<PathBuf>("settings") {
        Some(path) => settings_loader::from_toml_file_with_env(path)?,
        None => settings_loader::from_env()?,
    };
    apply_cli_overrides(&mut settings, matches)?;
    logging::setup_logging(&settings);

    registry.execute(matches, &settings, out)
}
