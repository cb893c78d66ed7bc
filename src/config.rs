//! Configuration loaded from environment variables.
//!
//! All values have defaults suitable for development. In production, set
//! them in the environment or a `.env` file.
//!
//! # Signals
//!
//! - `INTERRUPT_SIGNALS`: Comma-separated signal names (default: `SIGINT`).
//!   On Unix any of `SIGINT,SIGTERM,SIGQUIT,SIGHUP,SIGUSR1,SIGUSR2`.
//!
//! # Observability
//!
//! - `RUST_LOG`: Log filter (default: `info`)
//! - `LOG_FORMAT`: `pretty` or `json` (default: `pretty`)
//! - `METRICS_PORT`: Prometheus exporter port (default: 0 = disabled)
//!
//! # Demo binary
//!
//! - `SHUTDOWN_GRACE_SECS`: How long the binary keeps running after the
//!   first interrupt (default: 3)

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::signals::SignalSet;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(AppError::ConfigError(format!(
                "unknown log format {other:?} (expected \"pretty\" or \"json\")"
            ))),
        }
    }
}

/// Runtime configuration.
///
/// # Example
///
/// ```rust,ignore
/// let config = Config::from_env()?;
/// let coordinator = ShutdownCoordinator::from_config(&config);
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // Signal Configuration
    // =========================================================================
    /// Signals that start shutdown, in priority order (default: SIGINT)
    pub interrupt_signals: SignalSet,

    // =========================================================================
    // Observability Configuration
    // =========================================================================
    /// Log level (e.g., "info", "debug", "trace")
    pub log_level: String,

    /// Log line format (default: pretty)
    pub log_format: LogFormat,

    /// Port for Prometheus metrics endpoint (default: 0 = disabled)
    pub metrics_port: u16,

    // =========================================================================
    // Binary Configuration
    // =========================================================================
    /// Time the binary keeps running after the first interrupt (default: 3s)
    pub shutdown_grace: Duration,
}

impl Config {
    /// Load configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if a value does not parse or fails
    /// validation (e.g. an empty signal list).
    pub fn from_env() -> AppResult<Self> {
        // Load an .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let config = Self {
            interrupt_signals: Self::parse_env("INTERRUPT_SIGNALS", SignalSet::default())?,

            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            log_format: Self::parse_env("LOG_FORMAT", LogFormat::default())?,
            metrics_port: Self::parse_env("METRICS_PORT", 0)?,

            shutdown_grace: Duration::from_secs(Self::parse_env("SHUTDOWN_GRACE_SECS", 3)?),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values for consistency and correctness.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if validation fails.
    fn validate(&self) -> AppResult<()> {
        if self.interrupt_signals.is_empty() {
            return Err(AppError::ConfigError(
                "INTERRUPT_SIGNALS must name at least one signal".to_string(),
            ));
        }

        if let Some(signal) = self.interrupt_signals.first_unsupported() {
            return Err(AppError::ConfigError(format!(
                "INTERRUPT_SIGNALS contains {signal}, which this platform does not support"
            )));
        }

        Ok(())
    }

    /// Check if Prometheus metrics export is enabled.
    pub fn metrics_enabled(&self) -> bool {
        self.metrics_port > 0
    }

    /// Get the metrics endpoint address.
    ///
    /// Returns `None` if metrics are disabled (port = 0).
    pub fn metrics_addr(&self) -> Option<std::net::SocketAddr> {
        if self.metrics_enabled() {
            Some(std::net::SocketAddr::from((
                [0, 0, 0, 0],
                self.metrics_port,
            )))
        } else {
            None
        }
    }

    /// Parse an environment variable into the specified type with a default value.
    fn parse_env<T>(name: &str, default: T) -> AppResult<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match env::var(name) {
            Ok(val) => val
                .parse()
                .map_err(|e| AppError::ConfigError(format!("Invalid {name}: {e}"))),
            Err(_) => Ok(default),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interrupt_signals: SignalSet::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_port: 0,
            shutdown_grace: Duration::from_secs(3),
        }
    }
}
