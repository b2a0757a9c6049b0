//! # templating-rs-engine
//!
//! Template engine for the templating-rs project. Expands `${...}` slots in
//! project sources against a fixed set of constructs (literals, manifest
//! lookups, file inclusion, environment lookups), honoring line directives
//! that switch expansion off and on or delete a line.
//!
//! ## Modules
//!
//! - [`lexer`] - Splits text into plain text, slots, and escaped slots
//! - [`constructs`] - The construct registry and the built-in constructs
//! - [`context`] - Per-evaluation state and line-by-line processing
//! - [`engine`] - The engine: configuration, file evaluation, batch rewriting
//! - [`loaders`] - Source loaders for host tools that package a project

pub mod constructs;
pub mod context;
pub mod engine;
pub mod lexer;
pub mod loaders;

pub use constructs::{Construct, ConstructRegistry};
pub use context::EvaluationContext;
pub use engine::TemplatingEngine;
pub use loaders::{FileSystemLoader, SourceLoader, TemplatedLoader};
