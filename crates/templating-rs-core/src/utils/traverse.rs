//! Dotted-path lookup into a structured document.
//!
//! The manifest is a tree of TOML tables and arrays. A dotted path such as
//! `tool.poetry.authors.0` walks it one segment at a time: table segments are
//! keys, array segments are non-negative integer indices.

use toml::Value;

use crate::error::{TemplatingError, TemplatingResult};

/// Gets the value at the provided dotted path.
///
/// # Errors
///
/// - `KeyNotFound` if a table has no such key.
/// - `InvalidIndex` if an array segment is not a non-negative integer.
/// - `IndexOutOfRange` if an array index is past the end.
/// - `NotTraversable` if segments remain at a scalar value.
///
/// # Examples
///
/// ```
/// use templating_rs_core::utils::traverse::traverse;
///
/// let doc: toml::Value = toml::from_str("[tool.poetry]\nversion = \"1.2.3\"").unwrap();
/// let version = traverse(&doc, "tool.poetry.version").unwrap();
/// assert_eq!(version.as_str(), Some("1.2.3"));
/// ```
pub fn traverse<'a>(structure: &'a Value, path: &str) -> TemplatingResult<&'a Value> {
    let steps: Vec<&str> = path.split('.').collect();
    traverse_steps(structure, &steps)
}

/// Gets the value at the provided path, given as individual segments.
pub fn traverse_steps<'a>(structure: &'a Value, steps: &[&str]) -> TemplatingResult<&'a Value> {
    let mut current = structure;

    for (i, step) in steps.iter().enumerate() {
        current = match current {
            Value::Table(table) => table
                .get(*step)
                .ok_or_else(|| TemplatingError::KeyNotFound(steps[..=i].join(".")))?,
            Value::Array(items) => {
                let index: usize = step
                    .parse()
                    .map_err(|_| TemplatingError::InvalidIndex((*step).to_string()))?;
                items.get(index).ok_or_else(|| {
                    TemplatingError::IndexOutOfRange(format!(
                        "{index} is out of range for list at '{}'",
                        steps[..i].join(".")
                    ))
                })?
            }
            _ => return Err(TemplatingError::NotTraversable(steps[..i].join("."))),
        };
    }

    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_structure() -> Value {
        toml::from_str(
            r#"
top = 4
list = [{ name = 1 }, 2]

[dict]
subdict = 3
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_traverse_values() {
        let doc = demo_structure();
        assert_eq!(traverse(&doc, "list.0.name").unwrap().as_integer(), Some(1));
        assert_eq!(traverse(&doc, "list.1").unwrap().as_integer(), Some(2));
        assert_eq!(traverse(&doc, "dict.subdict").unwrap().as_integer(), Some(3));
        assert_eq!(traverse(&doc, "top").unwrap().as_integer(), Some(4));
    }

    #[test]
    fn test_traverse_returns_subtree() {
        let doc = demo_structure();
        let dict = traverse(&doc, "dict").unwrap();
        assert!(dict.is_table());
        assert_eq!(dict.get("subdict").and_then(Value::as_integer), Some(3));
    }

    #[test]
    fn test_traverse_key_not_found() {
        let doc = demo_structure();
        let err = traverse(&doc, "dict.unknown").unwrap_err();
        assert!(matches!(err, TemplatingError::KeyNotFound(ref p) if p == "dict.unknown"));
    }

    #[test]
    fn test_traverse_invalid_index() {
        let doc = demo_structure();
        let err = traverse(&doc, "list.a").unwrap_err();
        assert!(matches!(err, TemplatingError::InvalidIndex(ref s) if s == "a"));

        let err = traverse(&doc, "list.-1").unwrap_err();
        assert!(matches!(err, TemplatingError::InvalidIndex(_)));
    }

    #[test]
    fn test_traverse_index_out_of_range() {
        let doc = demo_structure();
        let err = traverse(&doc, "list.2").unwrap_err();
        assert!(matches!(err, TemplatingError::IndexOutOfRange(_)));
        assert!(err.to_string().contains("2 is out of range for list at 'list'"));
    }

    #[test]
    fn test_traverse_not_traversable() {
        let doc = demo_structure();
        let err = traverse(&doc, "top.sub").unwrap_err();
        assert!(matches!(err, TemplatingError::NotTraversable(ref p) if p == "top"));
    }
}
