//! Temporary project trees.
//!
//! [`TempProject`] creates a directory holding a `pyproject.toml` and any
//! number of source files. The directory is removed when the project is dropped.
//!
//! ## Example
//!
//! ```rust
//! use templating_rs_test::project::TempProject;
//!
//! let project = TempProject::new()
//!     .with_file("example/version.py", "VERSION = '${pyproject.tool.poetry.version}'");
//!
//! assert!(project.join("pyproject.toml").is_file());
//! assert_eq!(project.read("example/__init__.py"), "${'Success!'}");
//! ```

use std::path::{Path, PathBuf};

use templating_rs_core::settings::DEFAULT_MANIFEST_NAME;
use tempfile::TempDir;

/// A minimal Poetry manifest.
pub const BASIC_PYPROJECT_TOML: &str = r#"
[tool.poetry]
name = "example"
packages = [{include="example"}]
version = "1.2.3"
description = "Example description"
authors = []
license = "MIT"

[tool.poetry.dependencies]
python = "^3.8"

[build-system]
requires = ["poetry-core"]
build-backend = "poetry.core.masonry.api"
"#;

/// The source of the package file seeded by [`TempProject::new`].
pub const BASIC_INIT_PY: &str = "${'Success!'}";

/// A project directory that is deleted on drop.
///
/// # Panics
///
/// The builder methods panic on filesystem errors; this type is meant for tests.
#[derive(Debug)]
pub struct TempProject {
    dir: TempDir,
}

impl TempProject {
    /// Creates a project with [`BASIC_PYPROJECT_TOML`] and an
    /// `example/__init__.py` containing [`BASIC_INIT_PY`].
    pub fn new() -> Self {
        Self::with_manifest(BASIC_PYPROJECT_TOML).with_file("example/__init__.py", BASIC_INIT_PY)
    }

    /// Creates a project with the given manifest and no other files.
    pub fn with_manifest(manifest: &str) -> Self {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("cannot create temp dir: {e}"));
        let project = Self { dir };
        project.write(DEFAULT_MANIFEST_NAME, manifest);
        project
    }

    /// Adds a file, creating parent directories as needed.
    #[must_use]
    pub fn with_file(self, rel: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Self {
        self.write(rel, contents);
        self
    }

    /// Appends TOML to the manifest.
    #[must_use]
    pub fn with_manifest_section(self, toml: &str) -> Self {
        let mut manifest = self.read(DEFAULT_MANIFEST_NAME);
        manifest.push('\n');
        manifest.push_str(toml);
        self.write(DEFAULT_MANIFEST_NAME, manifest);
        self
    }

    /// Writes a file, creating parent directories as needed.
    pub fn write(&self, rel: impl AsRef<Path>, contents: impl AsRef<[u8]>) {
        let path = self.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("cannot create '{}': {e}", parent.display()));
        }
        std::fs::write(&path, contents)
            .unwrap_or_else(|e| panic!("cannot write '{}': {e}", path.display()));
    }

    /// Reads a file as UTF-8.
    pub fn read(&self, rel: impl AsRef<Path>) -> String {
        let path = self.join(rel);
        std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("cannot read '{}': {e}", path.display()))
    }

    /// Reads a file as bytes.
    pub fn read_bytes(&self, rel: impl AsRef<Path>) -> Vec<u8> {
        let path = self.join(rel);
        std::fs::read(&path).unwrap_or_else(|e| panic!("cannot read '{}': {e}", path.display()))
    }

    /// Returns the project root.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Returns the path of the manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.join(DEFAULT_MANIFEST_NAME)
    }

    /// Joins `rel` onto the project root.
    pub fn join(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(rel)
    }
}

impl Default for TempProject {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_seeds_basic_project() {
        let project = TempProject::new();
        assert_eq!(project.read("pyproject.toml"), BASIC_PYPROJECT_TOML);
        assert_eq!(project.read("example/__init__.py"), BASIC_INIT_PY);
    }

    #[test]
    fn test_with_file_creates_directories() {
        let project = TempProject::with_manifest("").with_file("a/b/c.txt", "deep");
        assert_eq!(project.read("a/b/c.txt"), "deep");
        assert!(!project.join("example").exists());
    }

    #[test]
    fn test_with_manifest_section_appends() {
        let project = TempProject::new().with_manifest_section("[tool.poetry-templating]\ninclude = '*.txt'");
        let manifest = project.read("pyproject.toml");
        assert!(manifest.starts_with(BASIC_PYPROJECT_TOML));
        assert!(manifest.ends_with("include = '*.txt'"));
    }

    #[test]
    fn test_dropped_project_is_removed() {
        let project = TempProject::new();
        let root = project.path().to_path_buf();
        drop(project);
        assert!(!root.exists());
    }

    #[test]
    fn test_read_bytes() {
        let project = TempProject::with_manifest("").with_file("latin.txt", b"caf\xe9");
        assert_eq!(project.read_bytes("latin.txt"), b"caf\xe9");
    }
}
