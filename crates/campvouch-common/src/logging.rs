//! Logging configuration and initialization
//!
//! Centralized tracing setup for all CampVouch binaries. Output goes to the
//! console and, by default, to a daily-rotated file under the configured log
//! directory, matching the original deployment which kept a persistent
//! `logs/` trail next to the scraped data.
//!
//! Use the structured logging macros (`trace!`, `debug!`, `info!`, `warn!`,
//! `error!`) rather than `println!`; the scraper runs unattended and the log
//! file is the only record of what a run did.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log level for filtering messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to tracing Level
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(anyhow::anyhow!("Invalid log level: {}", s)),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: LogLevel,

    /// Directory for log files
    pub log_dir: PathBuf,

    /// Log file name prefix (e.g. "scraper" -> "scraper.2026-08-23.log")
    pub file_prefix: String,

    /// Whether to write to the console
    pub console: bool,

    /// Whether to write to a daily-rotated log file
    pub file: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            log_dir: PathBuf::from("./logs"),
            file_prefix: "scraper".to_string(),
            console: true,
            file: true,
        }
    }
}

impl LogConfig {
    /// Create a new LogConfig with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `CAMPVOUCH_LOG_LEVEL`: log level (trace, debug, info, warn, error)
    /// - `CAMPVOUCH_LOG_DIR`: directory for log files
    /// - `CAMPVOUCH_LOG_TO_FILE`: write a log file in addition to the console (true/false)
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(level) = std::env::var("CAMPVOUCH_LOG_LEVEL") {
            config.level = level.parse()?;
        }

        if let Ok(dir) = std::env::var("CAMPVOUCH_LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }

        if let Ok(val) = std::env::var("CAMPVOUCH_LOG_TO_FILE") {
            config.file = val.parse().unwrap_or(true);
        }

        Ok(config)
    }
}

/// Initialize logging with the given configuration
///
/// Sets up the global tracing subscriber; call once at startup.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter =
        EnvFilter::from_default_env().add_directive(config.level.to_tracing_level().into());

    let console_layer = config.console.then(|| {
        fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(false)
    });

    let file_layer = if config.file {
        std::fs::create_dir_all(&config.log_dir).context("Failed to create log directory")?;

        let file_appender =
            tracing_appender::rolling::daily(&config.log_dir, &config.file_prefix);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // The guard flushes on drop; keep it alive for the process lifetime.
        std::mem::forget(guard);

        Some(
            fmt::layer()
                .with_writer(non_blocking)
                .with_target(false)
                .with_ansi(false),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_str() {
        assert_eq!("trace".parse::<LogLevel>().unwrap(), LogLevel::Trace);
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("ERROR".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert!("invalid".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = LogConfig::new();
        assert_eq!(config.level, LogLevel::Info);
        assert!(config.console);
        assert!(config.file);
        assert_eq!(config.file_prefix, "scraper");
    }
}
