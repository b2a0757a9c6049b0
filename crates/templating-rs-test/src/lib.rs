//! # templating-rs-test
//!
//! Testing utilities for the templating-rs project. Provides temporary
//! project directories seeded with a manifest and source files, and scoped
//! environment-variable overrides.
//!
//! ## Modules
//!
//! - [`project`] - [`TempProject`], a throwaway project tree on disk
//! - [`override_env`] - Scoped environment variables with unique names

pub mod override_env;
pub mod project;

pub use override_env::{unique_key, EnvOverride};
pub use project::{TempProject, BASIC_PYPROJECT_TOML};
