//! Host-tool settings.
//!
//! [`Settings`] holds what a host tool needs to locate a project and configure
//! logging. Engine behavior itself (include/exclude patterns, encoding) lives in
//! the project manifest; see [`crate::manifest::TemplatingConfig`].

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TemplatingError;

/// The file name of the project manifest, relative to the project directory.
pub const DEFAULT_MANIFEST_NAME: &str = "pyproject.toml";

/// Output format of the logging subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, multi-line output with file and line information.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = TemplatingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(TemplatingError::ConfigurationError(format!(
                "Unknown log format '{other}' (expected 'pretty' or 'json')"
            ))),
        }
    }
}

/// The complete set of host-tool settings.
///
/// # Examples
///
/// ```
/// use templating_rs_core::settings::{LogFormat, Settings};
///
/// let settings = Settings::default();
/// assert_eq!(settings.manifest_name, "pyproject.toml");
/// assert_eq!(settings.log_level, "info");
/// assert_eq!(settings.log_format, LogFormat::Pretty);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// The project directory containing the manifest.
    pub project_dir: PathBuf,
    /// The manifest file name inside `project_dir`.
    pub manifest_name: String,
    /// The log filter (e.g. "info", "debug", "templating_rs_engine=trace").
    pub log_level: String,
    /// The log output format.
    pub log_format: LogFormat,
}

impl Settings {
    /// Returns the full path of the project manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.project_dir.join(&self.manifest_name)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("."),
            manifest_name: DEFAULT_MANIFEST_NAME.to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
