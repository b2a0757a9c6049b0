//! Logging integration.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`Settings`](crate::settings::Settings) and for creating per-file spans.

use std::path::Path;

use crate::settings::{LogFormat, Settings};

/// Sets up the global tracing subscriber based on the given settings.
///
/// The filter is read from `settings.log_level` (e.g. "debug", "info",
/// "templating_rs_engine=trace"); an invalid filter falls back to `info`.
/// Installing a subscriber when one is already set is a no-op.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    match settings.log_format {
        LogFormat::Pretty => {
            fmt::Subscriber::builder()
                .with_env_filter(filter)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr)
                .pretty()
                .try_init()
                .ok();
        }
        LogFormat::Json => {
            fmt::Subscriber::builder()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .json()
                .try_init()
                .ok();
        }
    }
}

/// Creates a tracing span for the evaluation of one file.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use templating_rs_core::logging::file_span;
///
/// let span = file_span(Path::new("pkg/__init__.py"));
/// let _guard = span.enter();
/// tracing::debug!("evaluating");
/// ```
pub fn file_span(path: &Path) -> tracing::Span {
    tracing::info_span!("template", path = %path.display())
}
