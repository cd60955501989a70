//! Opt-in structured logging.
//!
//! The crate itself only emits `tracing` events (`debug!` for accepted and
//! rejected requests, `trace!` for ignored query-string keys). Applications
//! that already install a subscriber need nothing from this module. Others
//! can call [`init`] once at startup, which is driven by:
//!
//! - `LISTQUERY_DEBUG=true|1|yes` - enable debug-level logging
//! - `LISTQUERY_LOG_LEVEL=trace|debug|info|warn|error` - set the level explicitly
//! - `LISTQUERY_LOG_FORMAT=json|pretty|compact` - output format (default: json)
//!
//! Installing the subscriber requires the `tracing-subscriber` feature.
//!
//! ```rust,no_run
//! use listquery_core::logging;
//!
//! logging::init();
//! ```

use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::Once;

/// Environment variable enabling debug logging.
pub const DEBUG_VAR: &str = "LISTQUERY_DEBUG";
/// Environment variable overriding the level.
pub const LEVEL_VAR: &str = "LISTQUERY_LOG_LEVEL";
/// Environment variable selecting the output format.
pub const FORMAT_VAR: &str = "LISTQUERY_LOG_FORMAT";

static INIT: Once = Once::new();

/// Subscriber output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Multi-line human readable output.
    Pretty,
    /// Single-line human readable output.
    Compact,
}

impl LogFormat {
    /// The format name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Compact => "compact",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(format!("unknown log format `{}`", other)),
        }
    }
}

/// Resolved logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Whether anything was requested at all.
    pub enabled: bool,
    /// Level directive applied to this crate's targets.
    pub level: &'static str,
    /// Output format.
    pub format: LogFormat,
}

impl LogSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::resolve(
            env::var(DEBUG_VAR).ok().as_deref(),
            env::var(LEVEL_VAR).ok().as_deref(),
            env::var(FORMAT_VAR).ok().as_deref(),
        )
    }

    /// Resolve settings from raw variable values.
    ///
    /// An unrecognized level falls back to `debug` when debugging is on and
    /// `warn` otherwise; an unrecognized format falls back to JSON.
    pub fn resolve(debug: Option<&str>, level: Option<&str>, format: Option<&str>) -> Self {
        let debug = debug.is_some_and(is_truthy);
        let fallback = if debug { "debug" } else { "warn" };
        let level = level.map_or(fallback, |l| parse_level(l).unwrap_or(fallback));
        let format = format.and_then(|f| f.parse().ok()).unwrap_or_default();

        Self {
            enabled: debug || level != fallback || format != LogFormat::Json,
            level,
            format,
        }
    }

    /// Filter directive covering this crate's targets.
    pub fn directive(&self) -> String {
        format!("listquery={level},listquery_core={level}", level = self.level)
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

fn parse_level(value: &str) -> Option<&'static str> {
    match value.trim().to_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" => Some("warn"),
        "error" => Some("error"),
        _ => None,
    }
}

/// Check if debug logging is enabled via `LISTQUERY_DEBUG`.
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var(DEBUG_VAR).is_ok_and(|v| is_truthy(&v))
}

/// Initialize logging from the environment.
///
/// Does nothing unless one of the `LISTQUERY_*` variables asks for output.
/// Subsequent calls are no-ops.
pub fn init() {
    let settings = LogSettings::from_env();
    if settings.enabled || env::var(LEVEL_VAR).is_ok() {
        init_with(LogSettings {
            enabled: true,
            ..settings
        });
    }
}

/// Initialize logging with explicit settings.
///
/// Subsequent calls (including [`init`]) are no-ops.
pub fn init_with(settings: LogSettings) {
    INIT.call_once(|| {
        if !settings.enabled {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let filter =
                EnvFilter::try_new(settings.directive()).unwrap_or_else(|_| EnvFilter::new("warn"));
            let registry = tracing_subscriber::registry().with(filter);

            // try_init: the host application may already own the global subscriber.
            let installed = match settings.format {
                LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
                LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
                LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
            };

            if installed.is_ok() {
                tracing::info!(
                    level = settings.level,
                    format = %settings.format,
                    "listquery logging initialized"
                );
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_requested() {
        let settings = LogSettings::resolve(None, None, None);
        assert!(!settings.enabled);
        assert_eq!(settings.level, "warn");
        assert_eq!(settings.format, LogFormat::Json);
    }

    #[test]
    fn test_debug_flag() {
        for value in ["true", "1", "YES"] {
            let settings = LogSettings::resolve(Some(value), None, None);
            assert!(settings.enabled);
            assert_eq!(settings.level, "debug");
        }
        assert!(!LogSettings::resolve(Some("no"), None, None).enabled);
    }

    #[test]
    fn test_level_and_format() {
        let settings = LogSettings::resolve(None, Some("Trace"), Some("compact"));
        assert_eq!(settings.level, "trace");
        assert_eq!(settings.format, LogFormat::Compact);
        assert_eq!(settings.directive(), "listquery=trace,listquery_core=trace");

        let settings = LogSettings::resolve(Some("1"), Some("bogus"), Some("xml"));
        assert_eq!(settings.level, "debug");
        assert_eq!(settings.format, LogFormat::Json);
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("pretty".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert!("yaml".parse::<LogFormat>().is_err());
    }
}
