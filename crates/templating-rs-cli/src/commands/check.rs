//! The `check` command.
//!
//! Reports, for each given path, whether `evaluate` would process it and why.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use templating_rs_core::{Settings, TemplatingResult};
use templating_rs_engine::TemplatingEngine;

use super::resolve_path;
use crate::command::ManagementCommand;

/// Reports whether paths match the project's include/exclude patterns.
pub struct CheckCommand;

/// Why a path is or is not processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Matches an include pattern and no exclude pattern.
    Process,
    /// Matches an exclude pattern.
    Excluded,
    /// Matches no include pattern.
    NotIncluded,
    /// Lies outside the project root.
    OutsideRoot,
}

impl Decision {
    /// Returns `true` for [`Decision::Process`].
    pub const fn is_processed(self) -> bool {
        matches!(self, Self::Process)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Process => write!(f, "process"),
            Self::Excluded => write!(f, "skip (excluded)"),
            Self::NotIncluded => write!(f, "skip (not included)"),
            Self::OutsideRoot => write!(f, "skip (outside project)"),
        }
    }
}

/// Decides whether the engine would process `path`.
pub fn classify(engine: &TemplatingEngine, path: &Path) -> Decision {
    let rel = engine.relative(path);
    if rel.is_absolute() {
        Decision::OutsideRoot
    } else if !engine.config().include().matches(&rel) {
        Decision::NotIncluded
    } else if engine.config().exclude().matches(&rel) {
        Decision::Excluded
    } else {
        Decision::Process
    }
}

impl ManagementCommand for CheckCommand {
    fn name(&self) -> &'static str {
        "check"
    }

    fn help(&self) -> &'static str {
        "Show whether paths would be processed"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("paths")
                .value_name("PATH")
                .required(true)
                .num_args(1..)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Paths to check, relative to the current directory"),
        )
    }

    fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
        out: &mut dyn Write,
    ) -> TemplatingResult<()> {
        let engine = TemplatingEngine::from_settings(settings)?;

        let mut processed = 0;
        for path in matches.get_many::<PathBuf>("paths").into_iter().flatten() {
            let decision = classify(&engine, &resolve_path(path)?);
            if decision.is_processed() {
                processed += 1;
            }
            writeln!(out, "{decision:<24}{}", path.display())?;
        }

        tracing::info!("{processed} path(s) would be processed");
        Ok(())
    }
}
