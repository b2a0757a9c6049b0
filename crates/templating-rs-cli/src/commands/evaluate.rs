//! The `evaluate` command.
//!
//! Expands every slot in every processed file of the project and writes the
//! results back in place.

use std::io::Write;
use std::time::Instant;

use templating_rs_core::{Settings, TemplatingResult};
use templating_rs_engine::TemplatingEngine;

use crate::command::ManagementCommand;

/// Rewrites the project's source files with their slots expanded.
pub struct EvaluateCommand;

impl ManagementCommand for EvaluateCommand {
    fn name(&self) -> &'static str {
        "evaluate"
    }

    fn help(&self) -> &'static str {
        "Expand templates in the project and rewrite files in place"
    }

    fn handle(
        &self,
        _matches: &clap::ArgMatches,
        settings: &Settings,
        out: &mut dyn Write,
    ) -> TemplatingResult<()> {
        let engine = TemplatingEngine::from_settings(settings)?;
        tracing::info!(root = %engine.root().display(), "Evaluating project");

        let start = Instant::now();
        let count = engine.evaluate_and_replace()?;
        let elapsed = start.elapsed();

        writeln!(out, "Rewrote {count} file(s) in {elapsed:.2?}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use templating_rs_core::TemplatingError;
    use templating_rs_test::TempProject;

    fn settings(project: &TempProject) -> Settings {
        Settings {
            project_dir: project.path().to_path_buf(),
            ..Settings::default()
        }
    }

    fn run(settings: &Settings) -> TemplatingResult<String> {
        let matches = EvaluateCommand
            .add_arguments(clap::Command::new("evaluate"))
            .try_get_matches_from(["evaluate"])
            .unwrap();
        let mut out = Vec::new();
        EvaluateCommand.handle(&matches, settings, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_rewrites_project() {
        let project = TempProject::new()
            .with_file("example/version.py", "VERSION = '${pyproject.tool.poetry.version}'\n");

        let out = run(&settings(&project)).unwrap();

        assert!(out.starts_with("Rewrote 2 file(s) in "), "{out}");
        assert_eq!(project.read("example/__init__.py"), "Success!");
        assert_eq!(project.read("example/version.py"), "VERSION = '1.2.3'\n");
    }

    #[test]
    fn test_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            project_dir: dir.path().to_path_buf(),
            ..Settings::default()
        };
        assert!(run(&settings).is_err());
    }

    #[test]
    fn test_error_reports_location() {
        let project = TempProject::new().with_file("example/bad.py", "${pyproject.missing}");

        let err = run(&settings(&project)).unwrap_err();
        assert!(matches!(err, TemplatingError::Located { .. }), "{err:?}");
        assert!(err.to_string().contains("bad.py"), "{err}");
    }
}
