//! Per-evaluation state and line processing.
//!
//! An [`EvaluationContext`] is created for each top-level evaluation of a file
//! or string. It walks the input line by line, honoring directives, and
//! dispatches every slot on an enabled line to the engine's constructs.
//!
//! ## Directives
//!
//! Directives are comments, matched case-insensitively:
//!
//! | Line | Effect |
//! |---|---|
//! | `# templating: off` (whole line) | stop substituting; the line is dropped |
//! | `# templating: on` (whole line) | resume substituting; the line is dropped |
//! | `... # templating: delete` (anywhere) | drop the line while substituting is on |
//!
//! Lines between `off` and `on` are emitted verbatim.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use templating_rs_core::error::{SourceLocation, TemplatingError, TemplatingResult};
use templating_rs_core::utils::path::{normalize, to_slash};

use crate::engine::TemplatingEngine;
use crate::lexer::{self, Token};

fn disable_directive() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*#\s*templating:\s*off\s*$").unwrap())
}

fn enable_directive() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*#\s*templating:\s*on\s*$").unwrap())
}

fn delete_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)#\s*templating:\s*delete").unwrap())
}

/// The state of one evaluation: where it is, and whether substitution is on.
///
/// # Examples
///
/// ```
/// use templating_rs_core::manifest::Manifest;
/// use templating_rs_engine::context::EvaluationContext;
/// use templating_rs_engine::engine::TemplatingEngine;
///
/// let manifest = Manifest::from_toml_str("[tool.poetry]\nname = 'example'").unwrap();
/// let engine = TemplatingEngine::from_manifest(manifest).unwrap();
///
/// let mut ctx = EvaluationContext::new(&engine, None);
/// let out = ctx.evaluate("name = ${pyproject.tool.poetry.name}\n# templating: off\n${x}").unwrap();
/// assert_eq!(out, "name = example\n${x}");
/// assert_eq!(ctx.line(), 3);
/// assert!(!ctx.is_enabled());
/// ```
#[derive(Debug)]
pub struct EvaluationContext<'a> {
    engine: &'a TemplatingEngine,
    location: Option<PathBuf>,
    /// Files being evaluated, outermost first, ending with `location`.
    chain: Vec<PathBuf>,
    line: usize,
    enabled: bool,
}

impl<'a> EvaluationContext<'a> {
    /// Creates a context for evaluating text at `location`.
    ///
    /// `location` should already be root-relative (see
    /// [`TemplatingEngine::relative`]).
    pub fn new(engine: &'a TemplatingEngine, location: Option<PathBuf>) -> Self {
        Self {
            engine,
            chain: location.iter().cloned().collect(),
            location,
            line: 0,
            enabled: true,
        }
    }

    /// Creates a context for a file included from the files in `parent`.
    ///
    /// # Errors
    ///
    /// Returns a `ContextError` naming the cycle if `location` is already in `parent`.
    pub(crate) fn included(
        engine: &'a TemplatingEngine,
        location: PathBuf,
        parent: &[PathBuf],
    ) -> TemplatingResult<Self> {
        if parent.contains(&location) {
            let cycle: Vec<String> = parent
                .iter()
                .chain(std::iter::once(&location))
                .map(|p| to_slash(p))
                .collect();
            return Err(TemplatingError::ContextError(format!(
                "Circular file inclusion: {}",
                cycle.join(" -> ")
            )));
        }

        let mut chain = parent.to_vec();
        chain.push(location.clone());
        Ok(Self {
            engine,
            location: Some(location),
            chain,
            line: 0,
            enabled: true,
        })
    }

    /// Returns the owning engine.
    pub const fn engine(&self) -> &'a TemplatingEngine {
        self.engine
    }

    /// Returns the root-relative location being evaluated, if any.
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    /// Returns the root-relative files being evaluated, outermost first.
    pub fn chain(&self) -> &[PathBuf] {
        &self.chain
    }

    /// Returns the 1-based number of the line being evaluated, or 0 before the first line.
    pub const fn line(&self) -> usize {
        self.line
    }

    /// Returns `true` unless a `templating: off` directive is in effect.
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the current location and line for diagnostics.
    pub fn source_location(&self) -> SourceLocation {
        SourceLocation::new(self.location.clone(), self.line)
    }

    /// Evaluates `text` line by line.
    ///
    /// Lines are split on `\n` and rejoined with `\n`; any `\r` stays attached to
    /// its line.
    ///
    /// # Errors
    ///
    /// Returns the first slot failure, with the location of the failing slot.
    pub fn evaluate(&mut self, text: &str) -> TemplatingResult<String> {
        let mut lines = Vec::new();
        for line in text.split('\n') {
            self.line += 1;
            if let Some(output) = self.evaluate_line(line)? {
                lines.push(output);
            }
        }
        Ok(lines.join("\n"))
    }

    /// Evaluates one line, returning `None` if the line is dropped.
    fn evaluate_line(&mut self, line: &str) -> TemplatingResult<Option<String>> {
        if disable_directive().is_match(line) {
            self.enabled = false;
            return Ok(None);
        }
        if enable_directive().is_match(line) {
            self.enabled = true;
            return Ok(None);
        }
        if !self.enabled {
            return Ok(Some(line.to_string()));
        }
        if delete_marker().is_match(line) {
            return Ok(None);
        }
        self.substitute(line).map(Some)
    }

    /// Replaces every slot in `text` with its value, left to right.
    ///
    /// Directives are not interpreted. Escaped slots are emitted without
    /// their escape marker.
    ///
    /// # Errors
    ///
    /// Returns the first slot failure.
    pub fn substitute(&mut self, text: &str) -> TemplatingResult<String> {
        let mut output = String::with_capacity(text.len());
        for token in lexer::tokenize(text) {
            match token {
                Token::Text(text) | Token::Escaped(text) => output.push_str(text),
                Token::Slot(content) => output.push_str(&self.evaluate_slot(content)?),
            }
        }
        Ok(output)
    }

    /// Returns the evaluated contents of the file at `path` for inclusion here.
    ///
    /// A file the engine has already processed in this session has been
    /// rewritten with its expansion, so its current text is returned as is.
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound` if `path` is not a regular file, a
    /// `ContextError` if `path` is already on the inclusion chain, or any
    /// failure evaluating the file.
    pub fn include(&self, path: &Path) -> TemplatingResult<String> {
        let engine = self.engine;
        let rel = engine.relative(path);
        if self.chain.contains(&rel) || !engine.is_processed(&rel) {
            return engine.evaluate_file_within(path, &self.chain);
        }

        let absolute = engine.root().join(&rel);
        if !absolute.is_file() {
            return Err(TemplatingError::FileNotFound(normalize(&absolute)));
        }
        tracing::trace!(path = %to_slash(&rel), "Including processed file as written");
        engine.read_text(&absolute)
    }

    /// Evaluates the content of a single slot.
    ///
    /// # Errors
    ///
    /// Returns `UnknownConstruct` if no construct matches; otherwise the
    /// handler's error. Either way the error carries the current location.
    pub fn evaluate_slot(&mut self, content: &str) -> TemplatingResult<String> {
        let engine = self.engine;
        let Some((construct, captures)) = engine.constructs().find(content) else {
            return Err(TemplatingError::UnknownConstruct(content.to_string())
                .at(self.source_location()));
        };

        tracing::trace!(
            construct = construct.name(),
            line = self.line,
            "Evaluating slot"
        );
        construct
            .evaluate(&captures, self)
            .map_err(|e| e.at(self.source_location()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use templating_rs_core::manifest::Manifest;

    fn engine() -> TemplatingEngine {
        let manifest = Manifest::from_toml_str(
            "[tool.poetry]\nname = \"example\"\nversion = \"1.2.3\"\nauthors = []",
        )
        .unwrap();
        TemplatingEngine::from_manifest(manifest).unwrap()
    }

    #[test]
    fn test_directives_match_case_insensitive() {
        assert!(disable_directive().is_match("# templating: off"));
        assert!(disable_directive().is_match("   #TEMPLATING:   OFF  "));
        assert!(disable_directive().is_match("# templating: off\r"));
        assert!(!disable_directive().is_match("x = 1 # templating: off"));
        assert!(enable_directive().is_match("# Templating: On"));
        assert!(delete_marker().is_match("debug = True  # templating: delete"));
        assert!(delete_marker().is_match("#TEMPLATING:DELETE"));
    }

    #[test]
    fn test_line_counter_advances_over_directives() {
        let engine = engine();
        let mut ctx = EvaluationContext::new(&engine, None);
        ctx.evaluate("# templating: off\n# templating: on\nx").unwrap();
        assert_eq!(ctx.line(), 3);
        assert!(ctx.is_enabled());
    }

    #[test]
    fn test_error_reports_line() {
        let engine = engine();
        let mut ctx = EvaluationContext::new(&engine, Some(PathBuf::from("pkg/a.py")));
        let err = ctx.evaluate("ok\n# templating: off\n${bad}\n# templating: on\n${bad}").unwrap_err();
        let location = err.location().unwrap();
        assert_eq!(location.line, 5);
        assert_eq!(location.path(), Some(Path::new("pkg/a.py")));
        assert!(matches!(err.kind(), TemplatingError::UnknownConstruct(c) if c == "bad"));
    }

    #[test]
    fn test_delete_marker_ignored_when_disabled() {
        let engine = engine();
        let mut ctx = EvaluationContext::new(&engine, None);
        let out = ctx
            .evaluate("# templating: off\nx = 1 # templating: delete\n# templating: on")
            .unwrap();
        assert_eq!(out, "x = 1 # templating: delete");
    }

    #[test]
    fn test_substitute_ignores_directives() {
        let engine = engine();
        let mut ctx = EvaluationContext::new(&engine, None);
        assert_eq!(
            ctx.substitute("${'v'} # templating: delete").unwrap(),
            "v # templating: delete"
        );
    }

    #[test]
    fn test_evaluate_slot_directly() {
        let engine = engine();
        let mut ctx = EvaluationContext::new(&engine, None);
        assert_eq!(ctx.evaluate_slot("pyproject.tool.poetry.authors").unwrap(), "[]");
    }

    #[test]
    fn test_source_location_before_first_line() {
        let engine = engine();
        let ctx = EvaluationContext::new(&engine, None);
        assert_eq!(ctx.source_location(), SourceLocation::new(None, 0));
    }

    #[test]
    fn test_chain_starts_at_location() {
        let engine = engine();
        assert!(EvaluationContext::new(&engine, None).chain().is_empty());
        let ctx = EvaluationContext::new(&engine, Some(PathBuf::from("a.py")));
        assert_eq!(ctx.chain(), [PathBuf::from("a.py")]);
    }

    #[test]
    fn test_included_extends_parent_chain() {
        let engine = engine();
        let parent = [PathBuf::from("a.py")];
        let ctx = EvaluationContext::included(&engine, PathBuf::from("b.py"), &parent).unwrap();
        assert_eq!(ctx.chain(), [PathBuf::from("a.py"), PathBuf::from("b.py")]);
        assert_eq!(ctx.location(), Some(Path::new("b.py")));
    }

    #[test]
    fn test_included_rejects_cycle() {
        let engine = engine();
        let parent = [PathBuf::from("a.py"), PathBuf::from("b.py")];
        let err = EvaluationContext::included(&engine, PathBuf::from("a.py"), &parent).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Context error: Circular file inclusion: a.py -> b.py -> a.py"
        );
    }
}
