#![forbid(unsafe_code)]

//! Logging bootstrap for binaries and test harnesses embedding chime.
//!
//! chime libraries only emit `tracing` events; nothing is printed unless the
//! host installs a subscriber. [`init`] installs a `tracing-subscriber`
//! formatter driven by a [`LogConfig`].
//!
//! # Environment
//!
//! | Variable           | Meaning                                      | Default   |
//! |--------------------|----------------------------------------------|-----------|
//! | `CHIME_LOG`        | `EnvFilter` directive (e.g. `chime_task=trace`) | `info` |
//! | `CHIME_LOG_FORMAT` | `compact`, `pretty`, or `json`               | `compact` |

use std::fmt;
use std::str::FromStr;

use tracing_subscriber::EnvFilter;

/// Filter directive used when none is configured or the configured one is
/// malformed.
pub const DEFAULT_FILTER: &str = "info";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Single-line human-readable output.
    #[default]
    Compact,
    /// Multi-line human-readable output.
    Pretty,
    /// One JSON object per line. Falls back to `Compact` unless the
    /// `logging-json` feature is enabled.
    Json,
}

/// Error returned when a format name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLogFormat(pub String);

impl fmt::Display for UnknownLogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown log format: {}", self.0)
    }
}

impl std::error::Error for UnknownLogFormat {}

impl FromStr for LogFormat {
    type Err = UnknownLogFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" | "" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" | "jsonl" => Ok(Self::Json),
            other => Err(UnknownLogFormat(other.to_string())),
        }
    }
}

/// Configuration for the global log subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// `EnvFilter` directive string.
    pub filter: String,
    /// Line format.
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl LogConfig {
    /// Read `CHIME_LOG` and `CHIME_LOG_FORMAT` from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Unknown formats fall back
    /// to the default.
    #[must_use]
    pub fn from_lookup<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(filter) = get_env("CHIME_LOG").filter(|f| !f.trim().is_empty()) {
            config.filter = filter;
        }
        if let Some(format) = get_env("CHIME_LOG_FORMAT") {
            config.format = format.parse().unwrap_or_default();
        }
        config
    }

    /// Set the filter directive.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Set the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Install a global subscriber from `config`.
///
/// Returns `false` if a global subscriber was already installed; the
/// existing one stays in place.
pub fn init(config: &LogConfig) -> bool {
    let builder = tracing_subscriber::fmt().with_env_filter(config.env_filter());
    let installed = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        #[cfg(feature = "logging-json")]
        LogFormat::Json => builder.json().try_init(),
        #[cfg(not(feature = "logging-json"))]
        LogFormat::Json => builder.compact().try_init(),
    };
    installed.is_ok()
}
