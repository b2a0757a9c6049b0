//! Source loaders.
//!
//! A host tool that packages a project (an archiver, a wheel builder) reads
//! file contents and sizes through a [`SourceLoader`] instead of the
//! filesystem directly. [`FileSystemLoader`] returns files as they are on disk;
//! [`TemplatedLoader`] returns the evaluated contents of files the engine
//! should process, so the package contains expanded sources while the working
//! tree is left untouched.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use templating_rs_core::error::{TemplatingError, TemplatingResult};

use crate::engine::TemplatingEngine;

/// Reads file contents on behalf of a host tool.
pub trait SourceLoader: Send + Sync {
    /// Returns the contents of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound` if there is no such file, or any read failure.
    fn load(&self, path: &Path) -> TemplatingResult<Vec<u8>>;

    /// Returns the size in bytes of what [`load`](Self::load) would return.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`load`](Self::load).
    fn size(&self, path: &Path) -> TemplatingResult<u64> {
        Ok(self.load(path)?.len() as u64)
    }
}

/// Loads files from disk unchanged.
///
/// Relative paths are resolved against the loader's root.
#[derive(Debug, Clone)]
pub struct FileSystemLoader {
    root: PathBuf,
}

impl FileSystemLoader {
    /// Creates a loader resolving relative paths against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &Path) -> TemplatingResult<PathBuf> {
        let full = self.root.join(path);
        if full.is_file() {
            Ok(full)
        } else {
            Err(TemplatingError::FileNotFound(full))
        }
    }
}

impl SourceLoader for FileSystemLoader {
    fn load(&self, path: &Path) -> TemplatingResult<Vec<u8>> {
        Ok(std::fs::read(self.resolve(path)?)?)
    }

    fn size(&self, path: &Path) -> TemplatingResult<u64> {
        Ok(std::fs::metadata(self.resolve(path)?)?.len())
    }
}

/// Loads files through the engine.
///
/// Files that satisfy [`TemplatingEngine::should_process`] are evaluated and
/// re-encoded; the result is cached per root-relative path, so asking for a
/// file's size and then its contents evaluates it once. Other files are
/// returned unchanged.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use std::sync::Arc;
/// use templating_rs_engine::engine::TemplatingEngine;
/// use templating_rs_engine::loaders::{SourceLoader, TemplatedLoader};
///
/// let engine = Arc::new(TemplatingEngine::from_project_dir(".").unwrap());
/// let loader = TemplatedLoader::new(engine);
/// let size = loader.size(Path::new("example/__init__.py")).unwrap();
/// let bytes = loader.load(Path::new("example/__init__.py")).unwrap();
/// assert_eq!(size, bytes.len() as u64);
/// ```
#[derive(Debug)]
pub struct TemplatedLoader {
    engine: Arc<TemplatingEngine>,
    raw: FileSystemLoader,
    cache: RwLock<HashMap<PathBuf, Arc<[u8]>>>,
}

impl TemplatedLoader {
    /// Creates a loader evaluating files with `engine`.
    pub fn new(engine: Arc<TemplatingEngine>) -> Self {
        let raw = FileSystemLoader::new(engine.root());
        Self {
            engine,
            raw,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the engine.
    pub fn engine(&self) -> &TemplatingEngine {
        &self.engine
    }

    /// Returns `true` if the evaluated contents of `path` are cached.
    pub fn is_cached(&self, path: &Path) -> bool {
        let rel = self.engine.relative(path);
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&rel)
    }

    /// Drops all cached results.
    pub fn clear(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn evaluated(&self, path: &Path) -> TemplatingResult<Arc<[u8]>> {
        let rel = self.engine.relative(path);
        if let Some(bytes) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&rel)
        {
            return Ok(Arc::clone(bytes));
        }

        let text = self.engine.evaluate_file(&rel)?;
        let bytes: Arc<[u8]> = self.engine.config().encode(&text)?.into();
        tracing::debug!(path = %rel.display(), size = bytes.len(), "Evaluated for packaging");

        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(rel, Arc::clone(&bytes));
        Ok(bytes)
    }
}

impl SourceLoader for TemplatedLoader {
    fn load(&self, path: &Path) -> TemplatingResult<Vec<u8>> {
        if self.engine.should_process(path) {
            Ok(self.evaluated(path)?.to_vec())
        } else {
            self.raw.load(path)
        }
    }

    fn size(&self, path: &Path) -> TemplatingResult<u64> {
        if self.engine.should_process(path) {
            Ok(self.evaluated(path)?.len() as u64)
        } else {
            self.raw.size(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = "[tool.poetry]\nname = \"example\"\n";

    fn setup() -> (tempfile::TempDir, TemplatedLoader) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pyproject.toml"), MANIFEST).unwrap();
        std::fs::create_dir(dir.path().join("example")).unwrap();
        std::fs::write(
            dir.path().join("example").join("__init__.py"),
            "NAME = '${pyproject.tool.poetry.name}'",
        )
        .unwrap();
        std::fs::write(dir.path().join("README.md"), "${'raw'}").unwrap();

        let engine = TemplatingEngine::from_project_dir(dir.path()).unwrap();
        (dir, TemplatedLoader::new(Arc::new(engine)))
    }

    #[test]
    fn test_filesystem_loader() {
        let (dir, _) = setup();
        let loader = FileSystemLoader::new(dir.path());
        assert_eq!(loader.load(Path::new("README.md")).unwrap(), b"${'raw'}");
        assert_eq!(loader.size(Path::new("README.md")).unwrap(), 8);
    }

    #[test]
    fn test_filesystem_loader_not_found() {
        let loader = FileSystemLoader::new("/nonexistent/path");
        let err = loader.load(Path::new("missing.py")).unwrap_err();
        assert!(matches!(err, TemplatingError::FileNotFound(_)));
    }

    #[test]
    fn test_templated_loader_evaluates_matching_files() {
        let (_dir, loader) = setup();
        let path = Path::new("example/__init__.py");
        assert_eq!(loader.load(path).unwrap(), b"NAME = 'example'");
    }

    #[test]
    fn test_templated_loader_passes_other_files_through() {
        let (_dir, loader) = setup();
        assert_eq!(loader.load(Path::new("README.md")).unwrap(), b"${'raw'}");
        assert!(!loader.is_cached(Path::new("README.md")));
    }

    #[test]
    fn test_templated_loader_size_then_load_uses_cache() {
        let (dir, loader) = setup();
        let path = Path::new("example/__init__.py");
        assert_eq!(loader.size(path).unwrap(), 16);
        assert!(loader.is_cached(path));

        // The cached result survives later changes on disk.
        std::fs::write(dir.path().join(path), "changed").unwrap();
        assert_eq!(loader.load(path).unwrap(), b"NAME = 'example'");

        loader.clear();
        assert_eq!(loader.load(path).unwrap(), b"changed");
    }

    #[test]
    fn test_templated_loader_absolute_path() {
        let (dir, loader) = setup();
        let path = dir.path().join("example").join("__init__.py");
        assert_eq!(loader.load(&path).unwrap(), b"NAME = 'example'");
        assert!(loader.is_cached(Path::new("example/__init__.py")));
    }
}
