//! Case-insensitive glob matching for include/exclude patterns.
//!
//! Patterns are translated to anchored regular expressions. A pattern matches
//! a path when it matches the path's trailing components, so `*.py` matches
//! `src/pkg/mod.py` and `pkg/mod.py` matches `src/pkg/mod.py`.
//!
//! | Glob | Meaning |
//! |---|---|
//! | `*` | any run of characters within one path component |
//! | `?` | any single character within one path component |
//! | `**` | any run of characters, crossing component boundaries |
//! | `[abc]`, `[!abc]` | character class / negated character class |
//!
//! Both the path and the pattern are lowercased before matching, and a single
//! leading `/` is stripped from the pattern.

use std::fmt;
use std::path::Path;

use regex::Regex;

use crate::error::{TemplatingError, TemplatingResult};
use crate::utils::path::to_slash;

/// A compiled, ordered set of glob patterns.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use templating_rs_core::utils::glob::PatternSet;
///
/// let set = PatternSet::new(["*.py", "docs/**/*.md"]).unwrap();
/// assert!(set.matches(Path::new("src/app.PY")));
/// assert!(set.matches(Path::new("docs/guide/intro.md")));
/// assert!(!set.matches(Path::new("README.txt")));
/// ```
#[derive(Clone)]
pub struct PatternSet {
    patterns: Vec<(String, Option<Regex>)>,
}

impl PatternSet {
    /// Compiles the given glob patterns, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if a pattern cannot be compiled.
    pub fn new<I, S>(patterns: I) -> TemplatingResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut compiled = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let regex = compile(pattern).map_err(|e| {
                TemplatingError::ConfigurationError(format!("Invalid glob pattern '{pattern}': {e}"))
            })?;
            compiled.push((pattern.to_string(), regex));
        }
        Ok(Self { patterns: compiled })
    }

    /// Returns the original pattern strings.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|(p, _)| p.as_str())
    }

    /// Returns `true` if the set contains no patterns.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Returns `true` if any pattern in the set matches `path`.
    pub fn matches(&self, path: &Path) -> bool {
        let normalized = normalize_path(path);
        self.patterns
            .iter()
            .filter_map(|(_, re)| re.as_ref())
            .any(|re| re.is_match(&normalized))
    }
}

impl fmt::Debug for PatternSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.patterns()).finish()
    }
}

/// Lowercases a path and renders it with forward slashes.
fn normalize_path(path: &Path) -> String {
    let slashed = to_slash(path);
    let slashed = if cfg!(windows) {
        slashed.replace('\\', "/")
    } else {
        slashed
    };
    slashed.to_lowercase()
}

/// Compiles one glob pattern into a right-anchored regex.
///
/// An empty pattern compiles to `None`, which matches nothing.
fn compile(pattern: &str) -> Result<Option<Regex>, regex::Error> {
    let pattern = pattern.to_lowercase();
    let pattern = pattern.strip_prefix('/').unwrap_or(&pattern);
    if pattern.is_empty() {
        return Ok(None);
    }
    Regex::new(&format!("^(?:.*/)?{}$", glob_to_regex(pattern))).map(Some)
}

/// Translates the body of a glob pattern into regex syntax.
fn glob_to_regex(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                if chars.get(i + 2) == Some(&'/') {
                    out.push_str("(?:[^/]*/)*");
                    i += 3;
                } else {
                    out.push_str(".*");
                    i += 2;
                }
            }
            '*' => {
                out.push_str("[^/]*");
                i += 1;
            }
            '?' => {
                out.push_str("[^/]");
                i += 1;
            }
            '[' => {
                if let Some((class, consumed)) = parse_class(&chars[i..]) {
                    out.push_str(&class);
                    i += consumed;
                } else {
                    out.push_str(r"\[");
                    i += 1;
                }
            }
            c => {
                out.push_str(&regex::escape(&c.to_string()));
                i += 1;
            }
        }
    }

    out
}

/// Parses a `[...]` character class starting at `chars[0]`.
///
/// Returns the regex class and the number of characters consumed, or `None`
/// if the class is never closed.
fn parse_class(chars: &[char]) -> Option<(String, usize)> {
    let mut i = 1;
    let mut class = String::from("[");

    if matches!(chars.get(i), Some('!' | '^')) {
        class.push('^');
        i += 1;
    }
    // A `]` right after the opening bracket is literal.
    if chars.get(i) == Some(&']') {
        class.push_str(r"\]");
        i += 1;
    }

    while let Some(&c) = chars.get(i) {
        match c {
            ']' => {
                class.push(']');
                return Some((class, i + 1));
            }
            '\\' | '[' | '&' | '~' => {
                class.push('\\');
                class.push(c);
            }
            _ => class.push(c),
        }
        i += 1;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches_any<S: AsRef<str>>(path: &Path, patterns: &[S]) -> bool {
        PatternSet::new(patterns).unwrap().matches(path)
    }

    #[test]
    fn test_glob_matches() {
        let cases: &[(&str, &[&str])] = &[
            ("src/test.py", &["*.py"]),
            ("test.py", &["*.png", "test.py"]),
            ("src/test.PY", &["*.py"]),
            ("src/test.py", &["/*.py"]),
            ("SRC/Test.py", &["src/TEST.py"]),
        ];
        for (path, patterns) in cases {
            assert!(matches_any(Path::new(path), patterns), "{path} vs {patterns:?}");
        }
    }

    #[test]
    fn test_glob_not_matches() {
        assert!(!matches_any(Path::new("src/test.pyi"), &["*.py"]));
        assert!(!matches_any(Path::new("not_test.py"), &["test.py"]));
        assert!(!matches_any(Path::new("test.py"), &[] as &[&str]));
    }

    #[test]
    fn test_star_does_not_cross_components() {
        assert!(!matches_any(Path::new("src/pkg/mod.py"), &["src/*.py"]));
        assert!(matches_any(Path::new("src/pkg/mod.py"), &["src/*/*.py"]));
    }

    #[test]
    fn test_double_star() {
        assert!(matches_any(Path::new("src/pkg/mod.py"), &["src/**/*.py"]));
        assert!(matches_any(Path::new("src/mod.py"), &["src/**/*.py"]));
        assert!(matches_any(Path::new("a/b/c/d.txt"), &["a/**"]));
    }

    #[test]
    fn test_question_mark() {
        assert!(matches_any(Path::new("v1.txt"), &["v?.txt"]));
        assert!(!matches_any(Path::new("v10.txt"), &["v?.txt"]));
    }

    #[test]
    fn test_character_classes() {
        assert!(matches_any(Path::new("a1.py"), &["a[0-9].py"]));
        assert!(!matches_any(Path::new("ab.py"), &["a[0-9].py"]));
        assert!(matches_any(Path::new("ab.py"), &["a[!0-9].py"]));
        assert!(matches_any(Path::new("a[.py"), &["a[.py"]));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        assert!(matches_any(Path::new("a+b(c).py"), &["a+b(c).py"]));
        assert!(!matches_any(Path::new("aXpy"), &["a.py"]));
    }

    #[test]
    fn test_absolute_path_matches_trailing_components() {
        assert!(matches_any(Path::new("/outside/tree/x.py"), &["*.py"]));
    }

    #[test]
    fn test_empty_pattern_never_matches() {
        assert!(!matches_any(Path::new("x.py"), &[""]));
        assert!(!matches_any(Path::new("x.py"), &["/"]));
    }

    #[test]
    fn test_pattern_set_order_and_debug() {
        let set = PatternSet::new(vec!["*.py".to_string(), "*.txt".to_string()]).unwrap();
        assert_eq!(set.patterns().collect::<Vec<_>>(), vec!["*.py", "*.txt"]);
        assert!(set.matches(Path::new("notes.TXT")));
        assert_eq!(format!("{set:?}"), r#"["*.py", "*.txt"]"#);
    }

    #[test]
    fn test_pattern_set_empty() {
        let set = PatternSet::new(Vec::<String>::new()).unwrap();
        assert!(set.is_empty());
        assert!(!set.matches(Path::new("x.py")));
    }
}
