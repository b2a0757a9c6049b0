//! Stringification of manifest values.
//!
//! Slot results are always text. Scalars render as their plain value, while
//! tables and arrays render the way the Python tooling around `pyproject.toml`
//! prints them (`{'name': 'example', 'authors': []}`), so expanded files look
//! the same regardless of which implementation produced them.

use toml::Value;

/// Converts a value to the text substituted for a slot.
///
/// Top-level strings are emitted without quotes; nested strings are quoted.
///
/// # Examples
///
/// ```
/// use templating_rs_core::utils::text::to_display_string;
///
/// let doc: toml::Value = toml::from_str("a = 'x'\nb = [1, true]").unwrap();
/// assert_eq!(to_display_string(&doc["a"]), "x");
/// assert_eq!(to_display_string(&doc["b"]), "[1, True]");
/// assert_eq!(to_display_string(&doc), "{'a': 'x', 'b': [1, True]}");
/// ```
pub fn to_display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => to_repr(other),
    }
}

/// Returns a Python-like repr string.
pub fn to_repr(value: &Value) -> String {
    match value {
        Value::String(s) => repr_str(s),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => repr_float(*f),
        Value::Boolean(b) => {
            if *b {
                "True".to_string()
            } else {
                "False".to_string()
            }
        }
        Value::Datetime(dt) => dt.to_string(),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(to_repr).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Table(table) => repr_mapping(table.iter().map(|(k, v)| (k.as_str(), to_repr(v)))),
    }
}

/// Renders key/value pairs as a Python dict literal.
///
/// Values must already be rendered; keys are quoted here.
///
/// # Examples
///
/// ```
/// use templating_rs_core::utils::text::{repr_mapping, repr_str};
///
/// let pairs = vec![("HOME", repr_str("/root")), ("LANG", repr_str("C"))];
/// assert_eq!(repr_mapping(pairs), "{'HOME': '/root', 'LANG': 'C'}");
/// ```
pub fn repr_mapping<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, String)>,
{
    let inner: Vec<String> = pairs
        .into_iter()
        .map(|(k, v)| format!("{}: {v}", repr_str(k)))
        .collect();
    format!("{{{}}}", inner.join(", "))
}

/// Quotes a string the way Python's `repr` does.
///
/// Single quotes are preferred; double quotes are used when the string
/// contains a single quote but no double quote.
pub fn repr_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Formats a float like Python: integral values keep a trailing `.0`.
fn repr_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        let s = if f > 0.0 { "inf" } else { "-inf" };
        s.to_string()
    } else if f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{f:.1}")
    } else {
        f.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_scalars() {
        assert_eq!(to_display_string(&Value::String("1.2.3".into())), "1.2.3");
        assert_eq!(to_display_string(&Value::Integer(42)), "42");
        assert_eq!(to_display_string(&Value::Float(2.0)), "2.0");
        assert_eq!(to_display_string(&Value::Float(0.5)), "0.5");
        assert_eq!(to_display_string(&Value::Boolean(false)), "False");
    }

    #[test]
    fn test_display_nested_quotes_strings() {
        let doc: Value = toml::from_str(r#"authors = ["Jane <jane@example.com>"]"#).unwrap();
        assert_eq!(
            to_display_string(&doc["authors"]),
            "['Jane <jane@example.com>']"
        );
    }

    #[test]
    fn test_display_table_preserves_order() {
        let doc: Value = toml::from_str("z = 1\na = 2\nm = {}").unwrap();
        assert_eq!(to_display_string(&doc), "{'z': 1, 'a': 2, 'm': {}}");
    }

    #[test]
    fn test_repr_str_quote_selection() {
        assert_eq!(repr_str("plain"), "'plain'");
        assert_eq!(repr_str("it's"), "\"it's\"");
        assert_eq!(repr_str(r#"both ' and ""#), r#"'both \' and "'"#);
    }

    #[test]
    fn test_repr_str_escapes() {
        assert_eq!(repr_str("a\nb"), "'a\\nb'");
        assert_eq!(repr_str("C:\\dir"), "'C:\\\\dir'");
        assert_eq!(repr_str("\u{1}"), "'\\x01'");
        assert_eq!(repr_str("héllo"), "'héllo'");
    }

    #[test]
    fn test_repr_float_special() {
        assert_eq!(repr_float(f64::INFINITY), "inf");
        assert_eq!(repr_float(f64::NEG_INFINITY), "-inf");
        assert_eq!(repr_float(f64::NAN), "nan");
    }

    #[test]
    fn test_repr_mapping_empty() {
        assert_eq!(repr_mapping(Vec::<(&str, String)>::new()), "{}");
    }
}
