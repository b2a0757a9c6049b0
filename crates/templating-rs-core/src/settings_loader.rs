//! Settings loading from configuration files and the environment.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `TEMPLATING_PROJECT_DIR` | `project_dir` |
//! | `TEMPLATING_MANIFEST` | `manifest_name` |
//! | `TEMPLATING_LOG_LEVEL` | `log_level` |
//! | `TEMPLATING_LOG_FORMAT` | `log_format` (`pretty` or `json`) |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use templating_rs_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("templating.toml").unwrap();
//! ```

use std::path::{Path, PathBuf};

use crate::error::TemplatingError;
use crate::settings::Settings;

/// Loads settings from a TOML string.
///
/// Fields not present in the TOML keep their default values.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or cannot be deserialized.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, TemplatingError> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| TemplatingError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;

    let json_value = toml_to_json(toml_value);
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        TemplatingError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, json_value);
    serde_json::from_value(merged).map_err(|e| {
        TemplatingError::ConfigurationError(format!("Failed to deserialize settings from TOML: {e}"))
    })
}

/// Loads settings from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, TemplatingError> {
    let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        TemplatingError::ConfigurationError(format!(
            "Failed to read TOML file '{}': {e}",
            path.as_ref().display()
        ))
    })?;
    from_toml_str(&content)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the TOML is malformed, or an
/// override has an invalid value.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, TemplatingError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings)?;
    Ok(settings)
}

/// Loads settings from just environment variables (starting from defaults).
///
/// # Errors
///
/// Returns an error if an override has an invalid value.
pub fn from_env() -> Result<Settings, TemplatingError> {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings)?;
    Ok(settings)
}

/// Applies `TEMPLATING_*` environment variable overrides to a settings struct.
///
/// # Errors
///
/// Returns an error if `TEMPLATING_LOG_FORMAT` is not a known format.
pub fn apply_env_overrides(settings: &mut Settings) -> Result<(), TemplatingError> {
    apply_overrides_with(settings, |key| std::env::var(key).ok())
}

/// Applies overrides from an arbitrary key lookup.
///
/// This is [`apply_env_overrides`] with the environment abstracted away.
///
/// # Errors
///
/// Returns an error if the log format override is not a known format.
pub fn apply_overrides_with<F>(settings: &mut Settings, lookup: F) -> Result<(), TemplatingError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("TEMPLATING_PROJECT_DIR") {
        settings.project_dir = PathBuf::from(val);
    }

    if let Some(val) = lookup("TEMPLATING_MANIFEST") {
        settings.manifest_name = val;
    }

    if let Some(val) = lookup("TEMPLATING_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Some(val) = lookup("TEMPLATING_LOG_FORMAT") {
        settings.log_format = val.parse()?;
    }

    Ok(())
}

// ============================================================
// Helpers
// ============================================================

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, serde_json::Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::settings::LogFormat;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    // ── TOML loading ────────────────────────────────────────────────

    #[test]
    fn test_from_toml_str_basic() {
        let toml = r#"
            project_dir = "/srv/project"
            log_format = "json"
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert_eq!(settings.project_dir, PathBuf::from("/srv/project"));
        assert_eq!(settings.log_format, LogFormat::Json);
        // Defaults preserved
        assert_eq!(settings.manifest_name, "pyproject.toml");
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_from_toml_str_empty() {
        let settings = from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_from_toml_str_invalid() {
        let result = from_toml_str("[[invalid toml content");
        assert!(matches!(result, Err(TemplatingError::ConfigurationError(_))));
    }

    #[test]
    fn test_from_toml_str_bad_log_format() {
        let result = from_toml_str(r#"log_format = "xml""#);
        assert!(result.is_err());
    }

    // ── File loading ────────────────────────────────────────────────

    #[test]
    fn test_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("templating.toml");
        std::fs::write(&path, "log_level = \"debug\"\nmanifest_name = \"project.toml\"").unwrap();

        let settings = from_toml_file(&path).unwrap();
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.manifest_name, "project.toml");
    }

    #[test]
    fn test_from_toml_file_missing() {
        let result = from_toml_file("/nonexistent/path/templating.toml");
        assert!(result.is_err());
    }

    // ── Overrides ───────────────────────────────────────────────────

    #[test]
    fn test_apply_overrides_all() {
        let mut settings = Settings::default();
        let lookup = lookup_from(&[
            ("TEMPLATING_PROJECT_DIR", "/tmp/proj"),
            ("TEMPLATING_MANIFEST", "alt.toml"),
            ("TEMPLATING_LOG_LEVEL", "trace"),
            ("TEMPLATING_LOG_FORMAT", "JSON"),
        ]);
        apply_overrides_with(&mut settings, lookup).unwrap();
        assert_eq!(settings.project_dir, PathBuf::from("/tmp/proj"));
        assert_eq!(settings.manifest_name, "alt.toml");
        assert_eq!(settings.log_level, "trace");
        assert_eq!(settings.log_format, LogFormat::Json);
    }

    #[test]
    fn test_apply_overrides_none_keeps_settings() {
        let mut settings = Settings::default();
        apply_overrides_with(&mut settings, |_| None).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_apply_overrides_invalid_format() {
        let mut settings = Settings::default();
        let lookup = lookup_from(&[("TEMPLATING_LOG_FORMAT", "yaml")]);
        assert!(apply_overrides_with(&mut settings, lookup).is_err());
    }

    // ── merge_json helper ───────────────────────────────────────────

    #[test]
    fn test_merge_json_nested() {
        let base = serde_json::json!({"outer": {"a": 1, "b": 2}});
        let over = serde_json::json!({"outer": {"b": 3}});
        let merged = merge_json(base, over);
        assert_eq!(merged["outer"]["a"], 1);
        assert_eq!(merged["outer"]["b"], 3);
    }

    #[test]
    fn test_merge_json_array_override() {
        let base = serde_json::json!({"list": [1, 2, 3]});
        let over = serde_json::json!({"list": [4, 5]});
        let merged = merge_json(base, over);
        assert_eq!(merged["list"], serde_json::json!([4, 5]));
    }
}
