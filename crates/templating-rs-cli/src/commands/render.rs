//! The `render` command.

use std::io::Write;
use std::path::PathBuf;

use templating_rs_core::{Settings, TemplatingError, TemplatingResult};
use templating_rs_engine::TemplatingEngine;

use super::resolve_path;
use crate::command::ManagementCommand;

/// Prints the evaluated contents of one file without modifying it.
pub struct RenderCommand;

impl ManagementCommand for RenderCommand {
    fn name(&self) -> &'static str {
        "render"
    }

    fn help(&self) -> &'static str {
        "Print the expanded contents of a file"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("file")
                .value_name("FILE")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("File to render, relative to the current directory"),
        )
    }

    fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
        out: &mut dyn Write,
    ) -> TemplatingResult<()> {
        let engine = TemplatingEngine::from_settings(settings)?;
        let file = matches.get_one::<PathBuf>("file").ok_or_else(|| {
            TemplatingError::ConfigurationError("No file specified".to_string())
        })?;

        let text = engine.evaluate_file(resolve_path(file)?)?;
        out.write_all(text.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use templating_rs_test::TempProject;

    fn render(project: &TempProject, rel: &str) -> TemplatingResult<String> {
        let settings = Settings {
            project_dir: project.path().to_path_buf(),
            ..Settings::default()
        };
        let file = project.join(rel);
        let matches = RenderCommand
            .add_arguments(clap::Command::new("render"))
            .try_get_matches_from([OsStr::new("render"), file.as_os_str()])
            .unwrap();
        let mut out = Vec::new();
        RenderCommand.handle(&matches, &settings, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_render_leaves_file_untouched() {
        let project = TempProject::new();
        assert_eq!(render(&project, "example/__init__.py").unwrap(), "Success!");
        assert_eq!(project.read("example/__init__.py"), "${'Success!'}");
    }

    #[test]
    fn test_render_ignores_patterns() {
        let project = TempProject::new().with_file("notes.txt", "v${pyproject.tool.poetry.version}");
        assert_eq!(render(&project, "notes.txt").unwrap(), "v1.2.3");
    }

    #[test]
    fn test_render_missing_file() {
        let project = TempProject::new();
        let err = render(&project, "nope.py").unwrap_err();
        assert!(matches!(err, TemplatingError::FileNotFound(_)), "{err:?}");
    }

    #[test]
    fn test_file_argument_required() {
        let result = RenderCommand
            .add_arguments(clap::Command::new("render"))
            .try_get_matches_from(["render"]);
        assert!(result.is_err());
    }
}
