//! Templating engine: configuration, file evaluation, and batch rewriting.
//!
//! The [`TemplatingEngine`] is the central entry point. It owns the project
//! manifest, the root directory, the engine configuration, and the construct
//! registry, and it tracks which files a batch pass has already processed.
//! Inclusion cycles are detected per evaluation: each
//! [`EvaluationContext`] carries the chain of files that led to it.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use templating_rs_core::error::{TemplatingError, TemplatingResult};
use templating_rs_core::logging::file_span;
use templating_rs_core::manifest::{Manifest, TemplatingConfig};
use templating_rs_core::settings::{Settings, DEFAULT_MANIFEST_NAME};
use templating_rs_core::utils::path::{normalize, relative, to_slash};
use walkdir::WalkDir;

use crate::constructs::ConstructRegistry;
use crate::context::EvaluationContext;

/// The templating engine.
///
/// # Examples
///
/// ```
/// use templating_rs_core::manifest::Manifest;
/// use templating_rs_engine::engine::TemplatingEngine;
///
/// let manifest = Manifest::from_toml_str(r#"
/// [tool.poetry]
/// version = "1.2.3"
/// "#).unwrap();
/// let engine = TemplatingEngine::from_manifest(manifest).unwrap();
///
/// assert_eq!(engine.evaluate_string("${'Success!'}", None).unwrap(), "Success!");
/// assert_eq!(
///     engine.evaluate_string("v${pyproject.tool.poetry.version}", None).unwrap(),
///     "v1.2.3"
/// );
/// assert!(engine.should_process("pkg/__init__.py"));
/// ```
pub struct TemplatingEngine {
    /// The project manifest; never mutated.
    manifest: Manifest,
    /// Absolute, normalized project root.
    root: PathBuf,
    /// Encoding and include/exclude patterns.
    config: TemplatingConfig,
    /// Constructs tried against each slot, in order.
    constructs: ConstructRegistry,
    /// Root-relative paths already handled in this session.
    processed: Mutex<HashSet<PathBuf>>,
}

impl TemplatingEngine {
    /// Creates an engine for the given manifest with the built-in constructs.
    ///
    /// The root is the directory containing the manifest, or the current
    /// directory if the manifest was not read from a file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if the manifest's
    /// `[tool.poetry-templating]` configuration is invalid, or an `IoError` if
    /// the current directory cannot be determined.
    pub fn from_manifest(manifest: Manifest) -> TemplatingResult<Self> {
        let config = TemplatingConfig::from_manifest(&manifest)?;
        let root = manifest.root().unwrap_or_else(|| PathBuf::from("."));
        Self::new(manifest, root, config, ConstructRegistry::builtin())
    }

    /// Reads `pyproject.toml` from `dir` and creates an engine rooted there.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be read or its configuration is invalid.
    pub fn from_project_dir(dir: impl AsRef<Path>) -> TemplatingResult<Self> {
        let manifest = Manifest::from_file(dir.as_ref().join(DEFAULT_MANIFEST_NAME))?;
        Self::from_manifest(manifest)
    }

    /// Reads the manifest named by the settings and creates an engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be read or its configuration is invalid.
    pub fn from_settings(settings: &Settings) -> TemplatingResult<Self> {
        let manifest = Manifest::from_file(settings.manifest_path())?;
        Self::from_manifest(manifest)
    }

    /// Creates an engine from explicit parts.
    ///
    /// # Errors
    ///
    /// Returns an `IoError` if `root` is relative and the current directory
    /// cannot be determined.
    pub fn new(
        manifest: Manifest,
        root: impl AsRef<Path>,
        config: TemplatingConfig,
        constructs: ConstructRegistry,
    ) -> TemplatingResult<Self> {
        let root = root.as_ref();
        let root = if root.is_absolute() {
            normalize(root)
        } else {
            normalize(&std::env::current_dir()?.join(root))
        };

        Ok(Self {
            manifest,
            root,
            config,
            constructs,
            processed: Mutex::new(HashSet::new()),
        })
    }

    /// Replaces the construct registry.
    #[must_use]
    pub fn with_constructs(mut self, constructs: ConstructRegistry) -> Self {
        self.constructs = constructs;
        self
    }

    /// Returns the absolute project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the project manifest.
    pub const fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Returns the engine configuration.
    pub const fn config(&self) -> &TemplatingConfig {
        &self.config
    }

    /// Returns the construct registry.
    pub const fn constructs(&self) -> &ConstructRegistry {
        &self.constructs
    }

    /// Makes `path` relative to the root where possible.
    ///
    /// Relative inputs are taken relative to the root, not the current directory.
    pub fn relative(&self, path: impl AsRef<Path>) -> PathBuf {
        relative(path.as_ref(), &self.root)
    }

    /// Returns `true` if `path` lies inside the root, matches an include
    /// pattern, and matches no exclude pattern.
    pub fn should_process(&self, path: impl AsRef<Path>) -> bool {
        let rel = self.relative(path);
        !rel.is_absolute() && self.config.should_process(&rel)
    }

    /// Marks `path` as processed.
    ///
    /// Returns `false` if it was already marked in this session.
    pub fn set_processed(&self, path: impl AsRef<Path>) -> bool {
        let rel = self.relative(path);
        self.processed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(rel)
    }

    /// Returns `true` if `path` has been marked as processed in this session.
    pub fn is_processed(&self, path: impl AsRef<Path>) -> bool {
        let rel = self.relative(path);
        self.processed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&rel)
    }

    /// Evaluates `text`.
    ///
    /// If `location` is given it is made root-relative and used to resolve
    /// relative file inclusions and in error messages.
    ///
    /// # Errors
    ///
    /// Returns the first slot failure. An inclusion that leads back to a file
    /// already on the inclusion chain fails with a `ContextError`.
    pub fn evaluate_string(&self, text: &str, location: Option<&Path>) -> TemplatingResult<String> {
        let location = location.map(|path| self.relative(path));
        self.evaluate_at(text, location, &[])
    }

    /// Reads the file at `path` and evaluates it with its own location.
    ///
    /// A relative `path` is taken relative to the root. The file is always
    /// evaluated, whether or not it satisfies [`should_process`](Self::should_process).
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound` if `path` is not a regular file, an `IoError` if
    /// it cannot be read or decoded, or any evaluation failure.
    pub fn evaluate_file(&self, path: impl AsRef<Path>) -> TemplatingResult<String> {
        self.evaluate_file_within(path.as_ref(), &[])
    }

    /// Evaluates the file at `path`, included from the files in `chain`
    /// (root-relative, outermost first).
    pub(crate) fn evaluate_file_within(&self, path: &Path, chain: &[PathBuf]) -> TemplatingResult<String> {
        let absolute = self.root.join(path);
        if !absolute.is_file() {
            return Err(TemplatingError::FileNotFound(normalize(&absolute)));
        }
        let text = self.read_text(&absolute)?;
        self.evaluate_at(&text, Some(self.relative(&absolute)), chain)
    }

    /// Evaluates every file under the root that satisfies
    /// [`should_process`](Self::should_process) and overwrites it with the result.
    ///
    /// Files are visited in file-name order. Each file is handled at most once
    /// per session. Files rewritten before a failure are left rewritten.
    ///
    /// Returns the number of files rewritten.
    ///
    /// # Errors
    ///
    /// Returns the first evaluation, read, or write failure.
    pub fn evaluate_and_replace(&self) -> TemplatingResult<usize> {
        let mut count = 0;

        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {e}");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let rel = self.relative(entry.path());
            if !self.should_process(&rel) || !self.set_processed(&rel) {
                continue;
            }

            let result = self.evaluate_file(&rel)?;
            self.write_text(entry.path(), &result)?;
            tracing::info!("Rewrote '{}'", to_slash(&rel));
            count += 1;
        }

        tracing::info!(count, root = %self.root.display(), "Templating complete");
        Ok(count)
    }

    /// Reads a file and decodes it with the configured encoding.
    ///
    /// # Errors
    ///
    /// Returns an `IoError` if the file cannot be read or is not valid in the
    /// configured encoding.
    pub fn read_text(&self, path: impl AsRef<Path>) -> TemplatingResult<String> {
        let bytes = std::fs::read(self.root.join(path.as_ref()))?;
        self.config.decode(&bytes)
    }

    /// Encodes `text` with the configured encoding and writes it to `path`.
    ///
    /// # Errors
    ///
    /// Returns an `IoError` if the text cannot be encoded or the file cannot be written.
    pub fn write_text(&self, path: impl AsRef<Path>, text: &str) -> TemplatingResult<()> {
        let bytes = self.config.encode(text)?;
        std::fs::write(self.root.join(path.as_ref()), bytes)?;
        Ok(())
    }

    fn evaluate_at(
        &self,
        text: &str,
        location: Option<PathBuf>,
        chain: &[PathBuf],
    ) -> TemplatingResult<String> {
        let Some(rel) = location else {
            return EvaluationContext::new(self, None).evaluate(text);
        };

        let span = file_span(&rel);
        let _entered = span.enter();
        tracing::debug!("Templating engine processing '{}'", to_slash(&rel));

        EvaluationContext::included(self, rel, chain)?.evaluate(text)
    }
}

impl fmt::Debug for TemplatingEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplatingEngine")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("constructs", &self.constructs.names().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
[tool.poetry]
name = "example"
version = "1.2.3"
"#;

    fn project() -> (tempfile::TempDir, TemplatingEngine) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pyproject.toml"), MANIFEST).unwrap();
        let engine = TemplatingEngine::from_project_dir(dir.path()).unwrap();
        (dir, engine)
    }

    #[test]
    fn test_root_is_manifest_dir() {
        let (dir, engine) = project();
        assert_eq!(engine.root(), normalize(dir.path()));
    }

    #[test]
    fn test_relative_resolves_against_root() {
        let (dir, engine) = project();
        assert_eq!(engine.relative("pkg/a.py"), Path::new("pkg/a.py"));
        assert_eq!(engine.relative(dir.path().join("pkg/a.py")), Path::new("pkg/a.py"));
    }

    #[test]
    fn test_should_process_outside_root() {
        let (_dir, engine) = project();
        assert!(!engine.should_process("/definitely/elsewhere/a.py"));
        assert!(engine.should_process("a.py"));
    }

    #[test]
    fn test_processed_status() {
        let (dir, engine) = project();
        assert!(!engine.is_processed("test.py"));
        assert!(engine.set_processed("test.py"));
        assert!(engine.is_processed(dir.path().join("test.py")));
        assert!(!engine.set_processed(dir.path().join("./test.py")));
    }

    #[test]
    fn test_failed_evaluation_leaves_no_chain_behind() {
        let (dir, engine) = project();
        std::fs::write(dir.path().join("bad.py"), "${nope}").unwrap();
        std::fs::write(dir.path().join("top.py"), "${/bad.py}").unwrap();
        assert!(engine.evaluate_file("top.py").is_err());
        let err = engine.evaluate_file("bad.py").unwrap_err();
        assert!(matches!(err.kind(), TemplatingError::UnknownConstruct(_)), "{err:?}");
    }

    #[test]
    fn test_evaluate_file_missing() {
        let (_dir, engine) = project();
        let err = engine.evaluate_file("missing.py").unwrap_err();
        assert!(matches!(err, TemplatingError::FileNotFound(ref p) if p.ends_with("missing.py")));
    }

    #[test]
    fn test_with_constructs_empty_registry() {
        let (_dir, engine) = project();
        let engine = engine.with_constructs(ConstructRegistry::new());
        let err = engine.evaluate_string("${'x'}", None).unwrap_err();
        assert!(matches!(err.kind(), TemplatingError::UnknownConstruct(_)));
    }

    #[test]
    fn test_debug() {
        let (_dir, engine) = project();
        let debug = format!("{engine:?}");
        assert!(debug.contains("TemplatingEngine"));
        assert!(debug.contains("literal"));
    }
}
