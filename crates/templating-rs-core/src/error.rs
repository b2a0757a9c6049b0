//! Core error types for the templating engine.
//!
//! This module provides [`TemplatingError`], the single error enum shared by
//! every crate in the workspace, and [`SourceLocation`], which identifies the
//! file and line a failure was triggered from.
//!
//! Errors raised deep inside traversal or construct handlers carry no location.
//! The evaluation context attaches one at the slot boundary, either by wrapping
//! the typed error in [`TemplatingError::Located`] or, for failures that are not
//! part of the taxonomy, by wrapping them in [`TemplatingError::EvaluationError`].

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// The file and line an evaluation failure was triggered from.
///
/// # Examples
///
/// ```
/// use templating_rs_core::error::SourceLocation;
///
/// let loc = SourceLocation::new(Some("src/app.py".into()), 3);
/// assert_eq!(loc.to_string(), "File \"src/app.py\", line 3");
///
/// let loc = SourceLocation::new(None, 1);
/// assert_eq!(loc.to_string(), "Line 1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// The root-relative path of the file being evaluated, if any.
    pub path: Option<PathBuf>,
    /// The 1-based line number.
    pub line: usize,
}

impl SourceLocation {
    /// Creates a new location.
    pub const fn new(path: Option<PathBuf>, line: usize) -> Self {
        Self { path, line }
    }

    /// Returns the path component, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "File \"{}\", line {}", path.display(), self.line),
            None => write!(f, "Line {}", self.line),
        }
    }
}

/// The primary error type for template evaluation.
///
/// The taxonomy variants (`UnknownConstruct` through `MissingEnvironmentVariable`)
/// describe *what* went wrong. `Located` and `EvaluationError` describe *where*.
/// Use [`TemplatingError::kind`] to look through the location wrapper.
#[derive(Error, Debug)]
pub enum TemplatingError {
    // ── Dispatch ─────────────────────────────────────────────────────

    /// Slot content matched no registered construct.
    #[error("Unknown construct: '{0}'")]
    UnknownConstruct(String),

    // ── Structured-document traversal ────────────────────────────────

    /// A mapping key along a dotted path does not exist.
    #[error("Key not found: {0} does not exist")]
    KeyNotFound(String),

    /// A sequence was indexed with a segment that is not a non-negative integer.
    #[error("Invalid index: '{0}' is not a valid list index")]
    InvalidIndex(String),

    /// A sequence index is past the end of the sequence.
    #[error("Index out of range: {0}")]
    IndexOutOfRange(String),

    /// Segments remain but the current node is neither a mapping nor a sequence.
    #[error("Not traversable: expected list or table at '{0}'")]
    NotTraversable(String),

    // ── Constructs ───────────────────────────────────────────────────

    /// A construct was used where the evaluation context does not allow it,
    /// or a file inclusion cycle was detected.
    #[error("Context error: {0}")]
    ContextError(String),

    /// An inclusion path does not resolve to a regular file.
    #[error("No such file \"{}\"", .0.display())]
    FileNotFound(PathBuf),

    /// A referenced environment variable is unset.
    #[error("No environment variable '{0}'")]
    MissingEnvironmentVariable(String),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// A failure raised by a construct handler that is not part of this taxonomy.
    #[error("{0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),

    // ── Location wrappers ────────────────────────────────────────────

    /// A foreign failure raised while evaluating a slot, with its cause preserved.
    #[error("Error evaluating template: {source}\n  {location}")]
    EvaluationError {
        /// Where the failing slot was evaluated.
        location: SourceLocation,
        /// The original failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A typed error with the location of the failing slot attached.
    #[error("Error evaluating template: {source}\n  {location}")]
    Located {
        /// Where the failing slot was evaluated.
        location: SourceLocation,
        /// The typed error.
        #[source]
        source: Box<TemplatingError>,
    },
}

impl TemplatingError {
    /// Wraps an arbitrary error as a foreign handler failure.
    pub fn other(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Other(err.into())
    }

    /// Attaches a location to this error.
    ///
    /// Errors that already carry a location are returned unchanged, so the
    /// innermost location wins when an error crosses nested file inclusions.
    /// I/O and foreign failures become [`TemplatingError::EvaluationError`].
    #[must_use]
    pub fn at(self, location: SourceLocation) -> Self {
        match self {
            Self::Located { .. } | Self::EvaluationError { .. } => self,
            Self::IoError(err) => Self::EvaluationError {
                location,
                source: Box::new(err),
            },
            Self::Other(source) => Self::EvaluationError { location, source },
            typed => Self::Located {
                location,
                source: Box::new(typed),
            },
        }
    }

    /// Returns the innermost error, looking through [`TemplatingError::Located`].
    pub fn kind(&self) -> &Self {
        match self {
            Self::Located { source, .. } => source.kind(),
            other => other,
        }
    }

    /// Returns the location attached to this error, if any.
    pub const fn location(&self) -> Option<&SourceLocation> {
        match self {
            Self::Located { location, .. } | Self::EvaluationError { location, .. } => {
                Some(location)
            }
            _ => None,
        }
    }
}

/// A convenience type alias for `Result<T, TemplatingError>`.
pub type TemplatingResult<T> = Result<T, TemplatingError>;
