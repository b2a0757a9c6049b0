//! Root-relative path resolution.
//!
//! Paths handed to the engine may be absolute, relative to the project root,
//! contain `.`/`..` segments, or pass through symlinks. Everything is reduced to
//! one normalized form so that the processed registry and the cycle detector
//! see a single key per file.

use std::path::{Component, Path, PathBuf};

/// Normalizes a path without requiring it to exist.
///
/// `.` and `..` segments are resolved lexically, then the longest existing
/// prefix of the result is canonicalized so symlinks collapse to their target.
/// The non-existing tail is appended unchanged.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use templating_rs_core::utils::path::normalize;
///
/// let p = normalize(Path::new("/nonexistent-root/a/../b/./c.txt"));
/// assert_eq!(p, Path::new("/nonexistent-root/b/c.txt"));
/// ```
pub fn normalize(path: &Path) -> PathBuf {
    let lexical = lexical_normalize(path);

    let mut existing = lexical.as_path();
    let mut tail = Vec::new();
    loop {
        if existing.exists() {
            break;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                existing = parent;
            }
            _ => return lexical,
        }
    }

    let mut resolved = std::fs::canonicalize(existing).unwrap_or_else(|_| existing.to_path_buf());
    for name in tail.iter().rev() {
        resolved.push(name);
    }
    resolved
}

/// Resolves `.` and `..` components without touching the filesystem.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Makes `path` relative to `root` where possible.
///
/// A relative `path` is taken relative to `root`. The result is normalized
/// (see [`normalize`]); if it lies inside `root` the root-relative remainder is
/// returned, otherwise the absolute normalized path is returned unchanged, so
/// an absolute result signals "outside the tree".
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use templating_rs_core::utils::path::relative;
///
/// let root = Path::new("/top/root");
/// assert_eq!(relative(Path::new("/top/root/../root/subdir"), root), Path::new("subdir"));
/// assert_eq!(relative(Path::new("/diff/root"), root), Path::new("/diff/root"));
/// ```
pub fn relative(path: &Path, root: &Path) -> PathBuf {
    let root = normalize(root);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };
    let resolved = normalize(&absolute);

    match resolved.strip_prefix(&root) {
        Ok(rel) => rel.to_path_buf(),
        Err(_) => resolved,
    }
}

/// Renders a path with forward slashes regardless of platform.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::RootDir => Some(String::new()),
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::Prefix(prefix) => Some(prefix.as_os_str().to_string_lossy().into_owned()),
            Component::CurDir => Some(".".to_string()),
            Component::ParentDir => Some("..".to_string()),
        })
        .collect::<Vec<_>>()
        .join("/")
}
