//! Command framework for the `templating` CLI.
//!
//! This module provides the [`ManagementCommand`] trait for defining CLI
//! commands and [`CommandRegistry`] for registering them and building the
//! `clap` command tree.
//!
//! ## Defining a Custom Command
//!
//! ```rust
//! use std::io::Write;
//! use templating_rs_cli::command::{CommandRegistry, ManagementCommand};
//! use templating_rs_core::{Settings, TemplatingResult};
//!
//! struct GreetCommand;
//!
//! impl ManagementCommand for GreetCommand {
//!     fn name(&self) -> &'static str { "greet" }
//!     fn help(&self) -> &'static str { "Say hello" }
//!
//!     fn handle(
//!         &self,
//!         _matches: &clap::ArgMatches,
//!         _settings: &Settings,
//!         out: &mut dyn Write,
//!     ) -> TemplatingResult<()> {
//!         writeln!(out, "Hello!")?;
//!         Ok(())
//!     }
//! }
//!
//! let mut registry = CommandRegistry::new();
//! registry.register(Box::new(GreetCommand));
//! let matches = registry.build_cli().try_get_matches_from(["templating", "greet"]).unwrap();
//!
//! let mut out = Vec::new();
//! registry.execute(&matches, &Settings::default(), &mut out).unwrap();
//! assert_eq!(out, b"Hello!\n");
//! ```

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

use templating_rs_core::settings::LogFormat;
use templating_rs_core::{Settings, TemplatingError, TemplatingResult};

/// A command that can be registered and invoked through the CLI.
pub trait ManagementCommand: Send + Sync {
    /// Returns the name of this command (used to invoke it from the CLI).
    fn name(&self) -> &'static str;

    /// Returns a short help description for this command.
    fn help(&self) -> &'static str;

    /// Adds custom arguments to the clap command.
    ///
    /// The default implementation returns the command unchanged.
    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd
    }

    /// Executes the command, writing its report to `out`.
    fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
        out: &mut dyn Write,
    ) -> TemplatingResult<()>;
}

/// A registry of commands.
pub struct CommandRegistry {
    commands: HashMap<&'static str, Box<dyn ManagementCommand>>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    /// Creates a new empty command registry.
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Registers a command.
    ///
    /// If a command with the same name already exists, it is replaced.
    pub fn register(&mut self, command: Box<dyn ManagementCommand>) {
        self.commands.insert(command.name(), command);
    }

    /// Returns a reference to the command with the given name, if registered.
    pub fn get(&self, name: &str) -> Option<&dyn ManagementCommand> {
        self.commands.get(name).map(AsRef::as_ref)
    }

    /// Returns a sorted list of all registered command names.
    pub fn list_commands(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if no commands are registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Builds the top-level clap `Command` with global options and all
    /// registered subcommands.
    pub fn build_cli(&self) -> clap::Command {
        let mut app = clap::Command::new("templating")
            .about("Expands ${...} slots in project sources")
            .version(env!("CARGO_PKG_VERSION"))
            .subcommand_required(true)
            .arg_required_else_help(true)
            .arg(
                clap::Arg::new("project")
                    .long("project")
                    .short('p')
                    .global(true)
                    .value_name("DIR")
                    .value_parser(clap::value_parser!(PathBuf))
                    .help("Project directory containing pyproject.toml"),
            )
            .arg(
                clap::Arg::new("settings")
                    .long("settings")
                    .short('s')
                    .global(true)
                    .value_name("FILE")
                    .value_parser(clap::value_parser!(PathBuf))
                    .help("TOML settings file, read before environment overrides"),
            )
            .arg(
                clap::Arg::new("verbose")
                    .long("verbose")
                    .short('v')
                    .global(true)
                    .action(clap::ArgAction::Count)
                    .help("Increase log verbosity (-v debug, -vv trace)"),
            )
            .arg(
                clap::Arg::new("log-format")
                    .long("log-format")
                    .global(true)
                    .value_name("FORMAT")
                    .value_parser(["pretty", "json"])
                    .help("Log output format"),
            );

        let mut entries: Vec<_> = self.commands.values().collect();
        entries.sort_by_key(|cmd| cmd.name());

        for cmd in entries {
            let subcmd = clap::Command::new(cmd.name()).about(cmd.help());
            app = app.subcommand(cmd.add_arguments(subcmd));
        }

        app
    }

    /// Executes the command identified by the given argument matches.
    pub fn execute(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
        out: &mut dyn Write,
    ) -> TemplatingResult<()> {
        let (name, sub_matches) = matches.subcommand().ok_or_else(|| {
            TemplatingError::ConfigurationError("No subcommand specified".to_string())
        })?;

        let cmd = self.get(name).ok_or_else(|| {
            TemplatingError::ConfigurationError(format!("Unknown command: {name}"))
        })?;

        tracing::debug!(command = name, project = %settings.project_dir.display(), "Running command");
        cmd.handle(sub_matches, settings, out)
    }
}

/// Applies the global command-line options to `settings`.
///
/// Command-line values take precedence over the environment and files.
pub fn apply_cli_overrides(settings: &mut Settings, matches: &clap::ArgMatches) -> TemplatingResult<()> {
    if let Some(project) = matches.get_one::<PathBuf>("project") {
        settings.project_dir.clone_from(project);
    }

    match matches.get_count("verbose") {
        0 => {}
        1 => settings.log_level = "debug".to_string(),
        _ => settings.log_level = "trace".to_string(),
    }

    if let Some(format) = matches.get_one::<String>("log-format") {
        settings.log_format = format.parse::<LogFormat>()?;
    }

    Ok(())
}
