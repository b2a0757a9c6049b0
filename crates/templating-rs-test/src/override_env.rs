//! Scoped environment-variable overrides for tests.
//!
//! The process environment is shared by every test thread, so tests that set
//! variables should use names no other test uses. [`unique_key`] generates
//! such names, and [`EnvOverride`] sets a variable for the lifetime of a guard
//! and restores the previous value when dropped.
//!
//! ## Example
//!
//! ```rust
//! use templating_rs_test::override_env::{unique_key, EnvOverride};
//!
//! let key = unique_key("TOKEN");
//! {
//!     let _guard = EnvOverride::set(&key, "secret");
//!     assert_eq!(std::env::var(&key).unwrap(), "secret");
//! }
//! assert!(std::env::var(&key).is_err());
//! ```

use std::ffi::OsString;
use std::sync::atomic::{AtomicUsize, Ordering};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Returns a variable name that no other call in this process returns.
pub fn unique_key(prefix: &str) -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("TEMPLATING_TEST_{prefix}_{}_{n}", std::process::id())
}

/// Restores an environment variable to its previous state on drop.
#[derive(Debug)]
pub struct EnvOverride {
    key: String,
    previous: Option<OsString>,
}

impl EnvOverride {
    /// Sets `key` to `value` until the guard is dropped.
    pub fn set(key: impl Into<String>, value: impl AsRef<std::ffi::OsStr>) -> Self {
        let key = key.into();
        let previous = std::env::var_os(&key);
        std::env::set_var(&key, value);
        Self { key, previous }
    }

    /// Removes `key` until the guard is dropped.
    pub fn remove(key: impl Into<String>) -> Self {
        let key = key.into();
        let previous = std::env::var_os(&key);
        std::env::remove_var(&key);
        Self { key, previous }
    }

    /// Returns the overridden variable name.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for EnvOverride {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => std::env::set_var(&self.key, value),
            None => std::env::remove_var(&self.key),
        }
    }
}
