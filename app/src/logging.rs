//! Logging bootstrap: one `tracing` subscriber per process, configured from env.
//!
//! - `XCFG_LOG_LEVEL`: filter directive (falls back to `RUST_LOG`, then `info`)
//! - `XCFG_LOG_FORMAT`: `compact` (default) or `json`
//!
//! Output goes to stderr; stdout is reserved for command output.

use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static LOGGING: OnceLock<LoggingConfig> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: String,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let format = match get("XCFG_LOG_FORMAT").as_deref().map(str::trim) {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        };
        let level = get("XCFG_LOG_LEVEL")
            .or_else(|| get("RUST_LOG"))
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "info".to_string());
        Self { format, level }
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_logging() {
    LOGGING.get_or_init(|| {
        let config = LoggingConfig::from_env();
        let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true);
        // another subscriber may already be installed (tests); keep it
        let _ = match config.format {
            LogFormat::Json => builder.json().try_init(),
            LogFormat::Compact => builder.compact().try_init(),
        };
        tracing::debug!(format = ?config.format, level = %config.level, "logging initialized");
        config
    });
}
