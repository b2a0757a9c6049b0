//! # templating-rs
//!
//! Expands `${...}` slots in project source files using values from the
//! project manifest, the environment, other files, and literals.
//!
//! This is the meta-crate that re-exports all sub-crates for convenient access.
//! You can depend on `templating-rs` to get everything, or depend on
//! individual crates for finer-grained control.
//!
//! ```rust
//! # #[cfg(feature = "engine")] {
//! use templating_rs::core::Manifest;
//! use templating_rs::engine::TemplatingEngine;
//!
//! let manifest = Manifest::from_toml_str("[tool.poetry]\nversion = '0.4.0'").unwrap();
//! let engine = TemplatingEngine::from_manifest(manifest).unwrap();
//! let text = engine.evaluate_string("__version__ = '${pyproject.tool.poetry.version}'", None).unwrap();
//! assert_eq!(text, "__version__ = '0.4.0'");
//! # }
//! ```

/// Core types, manifest configuration, settings, and error types.
pub use templating_rs_core as core;

/// The slot lexer, constructs, evaluation context, and engine.
#[cfg(feature = "engine")]
pub use templating_rs_engine as engine;

/// The `templating` command-line tool.
#[cfg(feature = "cli")]
pub use templating_rs_cli as cli;

/// Test fixtures: temporary projects and environment overrides.
#[cfg(feature = "testing")]
pub use templating_rs_test as test;

pub use templating_rs_core::{TemplatingError, TemplatingResult};

// Third-party re-exports so hosts can configure logging without extra dependencies.
pub use tracing;
pub use tracing_subscriber;
