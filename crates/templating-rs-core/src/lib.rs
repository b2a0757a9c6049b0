//! # templating-rs-core
//!
//! Core types, settings, manifest configuration, and error types for the
//! templating-rs engine. This crate has no dependency on the engine and
//! provides the foundation for all other crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`utils`] - Path normalization, glob matching, document traversal, value stringification
//! - [`manifest`] - The project manifest and the `[tool.poetry-templating]` configuration
//! - [`settings`] - Host-tool settings
//! - [`settings_loader`] - Settings loading from TOML files and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod manifest;
pub mod settings;
pub mod settings_loader;
pub mod utils;

// Re-export the most commonly used types at the crate root.
pub use error::{SourceLocation, TemplatingError, TemplatingResult};
pub use manifest::{Manifest, TemplatingConfig};
pub use settings::Settings;
