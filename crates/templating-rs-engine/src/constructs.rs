//! Constructs: the grammar forms a slot's content can take.
//!
//! A [`Construct`] pairs a regular expression with a handler. The
//! [`ConstructRegistry`] tries its constructs in registration order against the
//! content of each slot; the first pattern that matches wins.
//!
//! ## Built-in constructs
//!
//! | Name | Content | Result |
//! |---|---|---|
//! | `literal` | `'text'` or `"text"` | `text`, itself evaluated for slots |
//! | `pyproject` | `pyproject` or `pyproject.<dotted.path>` | the manifest, or the value at the path |
//! | `file` | `/from/root.txt` or `./sibling.txt` | the evaluated contents of the file |
//! | `env` | `env` or `env.<KEY>` | the environment mapping, or one variable |

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use regex::{Captures, Regex};
use templating_rs_core::error::{TemplatingError, TemplatingResult};
use templating_rs_core::utils::text::{repr_mapping, repr_str, to_display_string};
use templating_rs_core::utils::traverse;

use crate::context::EvaluationContext;

/// A construct handler.
///
/// Receives the captures of the construct's pattern against the slot content
/// and the evaluation context, and returns the text substituted for the slot.
pub type ConstructHandler =
    Arc<dyn Fn(&Captures<'_>, &mut EvaluationContext<'_>) -> TemplatingResult<String> + Send + Sync>;

/// A named (pattern, handler) pair.
#[derive(Clone)]
pub struct Construct {
    name: String,
    pattern: Regex,
    handler: ConstructHandler,
}

impl Construct {
    /// Creates a construct from a pattern and a handler.
    ///
    /// The pattern is matched against the whole slot content, so it should be
    /// anchored with `^` and `$`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if the pattern is not a valid regex.
    pub fn new<F>(name: impl Into<String>, pattern: &str, handler: F) -> TemplatingResult<Self>
    where
        F: Fn(&Captures<'_>, &mut EvaluationContext<'_>) -> TemplatingResult<String>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        let pattern = Regex::new(pattern).map_err(|e| {
            TemplatingError::ConfigurationError(format!(
                "Invalid pattern for construct '{name}': {e}"
            ))
        })?;
        Ok(Self {
            name,
            pattern,
            handler: Arc::new(handler),
        })
    }

    /// Returns the construct name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the pattern matched against slot content.
    pub const fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Runs the handler.
    ///
    /// # Errors
    ///
    /// Propagates the handler's error.
    pub fn evaluate(
        &self,
        captures: &Captures<'_>,
        ctx: &mut EvaluationContext<'_>,
    ) -> TemplatingResult<String> {
        (self.handler)(captures, ctx)
    }
}

impl fmt::Debug for Construct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Construct")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .finish_non_exhaustive()
    }
}

/// An ordered list of constructs.
///
/// # Examples
///
/// ```
/// use templating_rs_engine::constructs::ConstructRegistry;
///
/// let registry = ConstructRegistry::builtin();
/// assert_eq!(registry.names().collect::<Vec<_>>(), vec!["literal", "pyproject", "file", "env"]);
///
/// let (construct, _) = registry.find("pyproject.tool.poetry.name").unwrap();
/// assert_eq!(construct.name(), "pyproject");
/// assert!(registry.find("nothing at all").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConstructRegistry {
    constructs: Vec<Construct>,
}

impl ConstructRegistry {
    /// Creates an empty registry.
    pub const fn new() -> Self {
        Self {
            constructs: Vec::new(),
        }
    }

    /// Creates a registry holding the four built-in constructs, in order:
    /// literal, pyproject, file, env.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(literal_construct());
        registry.register(pyproject_construct());
        registry.register(file_construct());
        registry.register(env_construct());
        registry
    }

    /// Appends a construct. It is tried after every construct already registered.
    pub fn register(&mut self, construct: Construct) -> &mut Self {
        self.constructs.push(construct);
        self
    }

    /// Finds the first construct whose pattern matches `content`.
    pub fn find<'c>(&self, content: &'c str) -> Option<(&Construct, Captures<'c>)> {
        self.constructs.iter().find_map(|construct| {
            construct
                .pattern
                .captures(content)
                .map(|captures| (construct, captures))
        })
    }

    /// Returns the construct names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructs.iter().map(Construct::name)
    }

    /// Returns the number of registered constructs.
    pub fn len(&self) -> usize {
        self.constructs.len()
    }

    /// Returns `true` if no construct is registered.
    pub fn is_empty(&self) -> bool {
        self.constructs.is_empty()
    }
}

// ── Built-in constructs ─────────────────────────────────────────────

const LITERAL_PATTERN: &str = r#"(?s)^(?:'(.*)'|"(.*)")$"#;
const PYPROJECT_PATTERN: &str = r"^pyproject((?:\.[^.]+)+)?$";
// Any content containing `/` is a path and is tried before `env`, so an
// environment key can never contain `/` (`env.A/B` is an inclusion).
const FILE_PATTERN: &str = r"^(.*/.*)$";
const ENV_PATTERN: &str = r"^env(?:\.([^.\s]+))?$";

type BuiltinHandler = fn(&Captures<'_>, &mut EvaluationContext<'_>) -> TemplatingResult<String>;

fn builtin(name: &str, pattern: &str, handler: BuiltinHandler) -> Construct {
    Construct::new(name, pattern, handler)
        .unwrap_or_else(|e| unreachable!("built-in construct '{name}' is invalid: {e}"))
}

fn literal_construct() -> Construct {
    builtin("literal", LITERAL_PATTERN, evaluate_literal)
}

fn pyproject_construct() -> Construct {
    builtin("pyproject", PYPROJECT_PATTERN, evaluate_pyproject)
}

fn file_construct() -> Construct {
    builtin("file", FILE_PATTERN, evaluate_file)
}

fn env_construct() -> Construct {
    builtin("env", ENV_PATTERN, evaluate_env)
}

/// Strips the quotes and evaluates the inner text for slots.
fn evaluate_literal(
    captures: &Captures<'_>,
    ctx: &mut EvaluationContext<'_>,
) -> TemplatingResult<String> {
    let inner = captures
        .get(1)
        .or_else(|| captures.get(2))
        .map_or("", |m| m.as_str());
    ctx.substitute(inner)
}

/// Looks up a value in the manifest.
fn evaluate_pyproject(
    captures: &Captures<'_>,
    ctx: &mut EvaluationContext<'_>,
) -> TemplatingResult<String> {
    let data = ctx.engine().manifest().data();
    match captures.get(1) {
        None => Ok(to_display_string(data)),
        Some(path) => {
            let value = traverse(data, &path.as_str()[1..])?;
            Ok(to_display_string(value))
        }
    }
}

/// Includes another file, fully evaluated.
///
/// A leading `/` resolves from the project root; anything else resolves from
/// the directory of the file currently being evaluated. A file already
/// processed in this session is included as rewritten.
fn evaluate_file(
    captures: &Captures<'_>,
    ctx: &mut EvaluationContext<'_>,
) -> TemplatingResult<String> {
    let reference = &captures[1];
    let engine = ctx.engine();

    let path = if let Some(rooted) = reference.strip_prefix('/') {
        engine.root().join(rooted)
    } else {
        let location = ctx.location().ok_or_else(|| {
            TemplatingError::ContextError(
                "Relative paths are not permitted in this context".to_string(),
            )
        })?;
        let current = engine.root().join(location);
        current
            .parent()
            .unwrap_or_else(|| engine.root())
            .join(Path::new(reference))
    };

    ctx.include(&path)
}

/// Looks up the environment.
fn evaluate_env(
    captures: &Captures<'_>,
    _ctx: &mut EvaluationContext<'_>,
) -> TemplatingResult<String> {
    match captures.get(1) {
        None => {
            let vars: Vec<(String, String)> = std::env::vars().collect();
            Ok(repr_mapping(
                vars.iter().map(|(k, v)| (k.as_str(), repr_str(v))),
            ))
        }
        Some(key) => std::env::var(key.as_str())
            .map_err(|_| TemplatingError::MissingEnvironmentVariable(key.as_str().to_string())),
    }
}
