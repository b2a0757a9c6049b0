//! The project manifest and the engine configuration read from it.
//!
//! The manifest is the project's `pyproject.toml`. The engine never mutates it:
//! it is the source of truth for `${pyproject...}` lookups and carries the
//! engine's own configuration in the `[tool.poetry-templating]` table:
//!
//! ```toml
//! [tool.poetry-templating]
//! encoding = "utf-8"
//! include = ["*.py", "*.pyi"]
//! exclude = "tests/*"
//! ```
//!
//! `include` and `exclude` accept either a single string or an array of strings.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use toml::Value;

use crate::error::{TemplatingError, TemplatingResult};
use crate::utils::glob::PatternSet;

/// The name of the manifest table holding engine configuration, under `tool`.
pub const CONFIG_TABLE: &str = "poetry-templating";
/// The default text encoding for reading and writing source files.
pub const DEFAULT_ENCODING: &str = "utf-8";
/// The default include patterns.
pub const DEFAULT_INCLUDE: &[&str] = &["*.py"];
/// The default exclude patterns.
pub const DEFAULT_EXCLUDE: &[&str] = &[];

/// A parsed project manifest.
///
/// # Examples
///
/// ```
/// use templating_rs_core::manifest::Manifest;
///
/// let manifest = Manifest::from_toml_str("[tool.poetry]\nname = \"example\"").unwrap();
/// assert_eq!(manifest.data()["tool"]["poetry"]["name"].as_str(), Some("example"));
/// assert!(manifest.path().is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    path: Option<PathBuf>,
    data: Value,
}

impl Manifest {
    /// Parses a manifest from TOML source.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if the TOML is malformed.
    pub fn from_toml_str(source: &str) -> TemplatingResult<Self> {
        let data: Value = toml::from_str(source).map_err(|e| {
            TemplatingError::ConfigurationError(format!("Failed to parse manifest: {e}"))
        })?;
        Ok(Self { path: None, data })
    }

    /// Reads and parses the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> TemplatingResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            TemplatingError::ConfigurationError(format!(
                "Failed to read manifest '{}': {e}",
                path.display()
            ))
        })?;
        let mut manifest = Self::from_toml_str(&source)?;
        manifest.path = Some(path.to_path_buf());
        Ok(manifest)
    }

    /// Wraps an already-parsed document.
    pub const fn from_value(data: Value) -> Self {
        Self { path: None, data }
    }

    /// Returns the manifest path, if it was read from a file.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the directory containing the manifest, if it was read from a file.
    pub fn root(&self) -> Option<PathBuf> {
        self.path.as_deref().and_then(Path::parent).map(|parent| {
            if parent.as_os_str().is_empty() {
                PathBuf::from(".")
            } else {
                parent.to_path_buf()
            }
        })
    }

    /// Returns the full document.
    pub const fn data(&self) -> &Value {
        &self.data
    }

    /// Returns the `[tool.poetry-templating]` table, or an empty table if absent.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if `tool` is missing or not a table, or if
    /// the configuration entry exists but is not a table.
    pub fn configuration(&self) -> TemplatingResult<Cow<'_, toml::Table>> {
        let tool = self
            .data
            .get("tool")
            .and_then(Value::as_table)
            .ok_or_else(|| {
                TemplatingError::ConfigurationError("Could not find table 'tool'".to_string())
            })?;

        match tool.get(CONFIG_TABLE) {
            None => Ok(Cow::Owned(toml::Table::new())),
            Some(Value::Table(table)) => Ok(Cow::Borrowed(table)),
            Some(_) => Err(TemplatingError::ConfigurationError(format!(
                "Could not find table 'tool.{CONFIG_TABLE}'"
            ))),
        }
    }
}

/// Gets a list of strings from `table[key]`.
///
/// A single string is wrapped in a one-element list; a missing key yields
/// `default`.
///
/// # Errors
///
/// Returns a `ConfigurationError` if the value is neither a string nor an
/// array of strings.
pub fn get_listable(table: &toml::Table, key: &str, default: &[&str]) -> TemplatingResult<Vec<String>> {
    let invalid = || {
        TemplatingError::ConfigurationError(format!(
            "'{key}' must be a string or an array of strings"
        ))
    };

    match table.get(key) {
        None => Ok(default.iter().map(|s| (*s).to_string()).collect()),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
            .collect(),
        Some(_) => Err(invalid()),
    }
}

/// Engine configuration: text encoding and include/exclude patterns.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use templating_rs_core::manifest::TemplatingConfig;
///
/// let config = TemplatingConfig::new("utf-8", ["*.py"], ["test.py"]).unwrap();
/// assert!(config.should_process(Path::new("pkg/app.py")));
/// assert!(!config.should_process(Path::new("test.py")));
/// assert!(!config.should_process(Path::new("notes.txt")));
/// ```
#[derive(Debug, Clone)]
pub struct TemplatingConfig {
    encoding: &'static Encoding,
    include: PatternSet,
    exclude: PatternSet,
}

impl TemplatingConfig {
    /// Creates a configuration from an encoding label and pattern lists.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` for an unknown encoding label, an
    /// encoding that cannot be written back (UTF-16 and the replacement
    /// encoding), or an invalid pattern.
    pub fn new<I, E, S, T>(label: &str, include: I, exclude: E) -> TemplatingResult<Self>
    where
        I: IntoIterator<Item = S>,
        E: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let encoding = Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| {
            TemplatingError::ConfigurationError(format!("Unknown encoding '{label}'"))
        })?;
        if encoding.output_encoding() != encoding {
            return Err(TemplatingError::ConfigurationError(format!(
                "Encoding '{label}' ({}) cannot be used to rewrite files",
                encoding.name(),
                label = label.trim(),
            )));
        }
        Ok(Self {
            encoding,
            include: PatternSet::new(include)?,
            exclude: PatternSet::new(exclude)?,
        })
    }

    /// Reads the configuration from the manifest's `[tool.poetry-templating]` table.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if the table or any value is invalid.
    pub fn from_manifest(manifest: &Manifest) -> TemplatingResult<Self> {
        let configuration = manifest.configuration()?;

        let encoding = match configuration.get("encoding") {
            None => DEFAULT_ENCODING,
            Some(Value::String(s)) => s.as_str(),
            Some(_) => {
                return Err(TemplatingError::ConfigurationError(
                    "'encoding' must be a string".to_string(),
                ))
            }
        };
        let include = get_listable(&configuration, "include", DEFAULT_INCLUDE)?;
        let exclude = get_listable(&configuration, "exclude", DEFAULT_EXCLUDE)?;

        Self::new(encoding, include, exclude)
    }

    /// Returns the configured encoding.
    pub const fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Returns the include patterns.
    pub const fn include(&self) -> &PatternSet {
        &self.include
    }

    /// Returns the exclude patterns.
    pub const fn exclude(&self) -> &PatternSet {
        &self.exclude
    }

    /// Returns `true` if `path` matches an include pattern and no exclude pattern.
    pub fn should_process(&self, path: &Path) -> bool {
        self.include.matches(path) && !self.exclude.matches(path)
    }

    /// Decodes file contents with the configured encoding.
    ///
    /// # Errors
    ///
    /// Returns an `IoError` of kind `InvalidData` if the bytes are malformed.
    pub fn decode(&self, bytes: &[u8]) -> TemplatingResult<String> {
        self.encoding
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(Cow::into_owned)
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("stream did not contain valid {}", self.encoding.name()),
                )
                .into()
            })
    }

    /// Encodes text with the configured encoding.
    ///
    /// # Errors
    ///
    /// Returns an `IoError` of kind `InvalidData` if a character cannot be
    /// represented in the encoding.
    pub fn encode(&self, text: &str) -> TemplatingResult<Vec<u8>> {
        let (bytes, _, had_errors) = self.encoding.encode(text);
        if had_errors {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("text cannot be encoded as {}", self.encoding.name()),
            )
            .into());
        }
        Ok(bytes.into_owned())
    }
}

impl Default for TemplatingConfig {
    fn default() -> Self {
        Self {
            encoding: encoding_rs::UTF_8,
            include: PatternSet::new(DEFAULT_INCLUDE).unwrap_or_else(|_| unreachable!()),
            exclude: PatternSet::new(DEFAULT_EXCLUDE).unwrap_or_else(|_| unreachable!()),
        }
    }
}
