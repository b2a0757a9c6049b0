//! Utility functions shared by the engine and its host tools.
//!
//! This module provides:
//! - [`path`]: root-relative path resolution and normalization.
//! - [`glob`]: case-insensitive glob matching of relative paths.
//! - [`traverse`]: dotted-path lookup into the manifest document.
//! - [`text`]: Python-style stringification of manifest values and mappings.

pub mod glob;
pub mod path;
pub mod text;
pub mod traverse;

pub use glob::PatternSet;
pub use path::{normalize, relative};
pub use traverse::traverse;
