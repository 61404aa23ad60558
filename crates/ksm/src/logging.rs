//! # Logging Infrastructure
//!
//! Structured logging on the `tracing` ecosystem.
//!
//! Console output always goes to stderr so command output on stdout stays
//! machine-readable. An optional log file receives a second copy through a
//! non-blocking daily-rolling appender.
//!
//! ## Quick Start
//!
//! ```no_run
//! use ksm::logging::{init_logging, LogConfig};
//!
//! let _guard = init_logging(&LogConfig::default()).expect("Failed to initialize logging");
//! tracing::info!("key service started");
//! ```
//!
//! ## From configuration
//!
//! ```
//! use ksm::logging::{LogConfig, LogFormat, LogLevel};
//! use ksm_core::config::LoggingConfig;
//!
//! let settings = LoggingConfig { format: "json".into(), file: None };
//! let config = LogConfig::from_settings(&settings, 2).unwrap();
//! assert_eq!(config.format, LogFormat::Json);
//! assert_eq!(config.level, LogLevel::Debug);
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use ksm_core::config::LoggingConfig;
use ksm_core::config_loader::expand_path;

/// Target used for security-relevant events.
pub const SECURITY_TARGET: &str = "ksm::security";

/// Error type for logging initialization failures.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// Failed to create log file or directory
    #[error("Failed to create log file: {0}")]
    FileCreation(String),
    /// Failed to initialize the subscriber
    #[error("Failed to initialize logging: {0}")]
    SubscriberInit(String),
    /// Invalid configuration
    #[error("Invalid log configuration: {0}")]
    InvalidConfig(String),
}

/// Minimum severity that is logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// trace and above
    Trace,
    /// debug and above
    Debug,
    /// info and above
    #[default]
    Info,
    /// warn and above
    Warn,
    /// error only
    Error,
}

impl LogLevel {
    /// Convert to tracing Level.
    #[must_use]
    pub const fn as_tracing_level(self) -> Level {
        match self {
            Self::Trace => Level::TRACE,
            Self::Debug => Level::DEBUG,
            Self::Info => Level::INFO,
            Self::Warn => Level::WARN,
            Self::Error => Level::ERROR,
        }
    }

    /// Directive string for the env filter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
    /// Single-line output.
    Compact,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
            Self::Compact => write!(f, "compact"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            other => Err(LogError::InvalidConfig(format!("unknown log format {other:?}"))),
        }
    }
}

/// Configuration for the logging system.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Minimum level, [`LogLevel::Info`] by default.
    pub level: LogLevel,

    /// Console and file format.
    pub format: LogFormat,

    /// Optional log file, written in addition to stderr.
    ///
    /// The directory is created if it doesn't exist.
    pub file_path: Option<PathBuf>,
}

impl LogConfig {
    /// Builds a config from the `[logging]` settings and a CLI verbosity count.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidConfig`] for an unknown format or a log
    /// file path whose `~` cannot be expanded.
    pub fn from_settings(settings: &LoggingConfig, verbosity: u8) -> Result<Self, LogError> {
        let file_path = settings
            .file
            .as_deref()
            .map(expand_path)
            .transpose()
            .map_err(|e| LogError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            level: verbosity_to_level(verbosity),
            format: settings.format.parse()?,
            file_path,
        })
    }
}

/// Guard that flushes logs on drop.
///
/// Keep it alive for the duration of the program.
pub struct LogGuard {
    guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

impl LogGuard {
    const fn new(guard: Option<tracing_appender::non_blocking::WorkerGuard>) -> Self {
        Self { guard }
    }
}

impl std::fmt::Debug for LogGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogGuard")
            .field("has_file_guard", &self.guard.is_some())
            .finish()
    }
}

type BoxedLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>;

fn console_layer(format: LogFormat) -> BoxedLayer {
    let base = fmt::layer().with_writer(std::io::stderr).with_target(true);
    match format {
        LogFormat::Pretty => base.pretty().boxed(),
        LogFormat::Json => base.json().with_current_span(true).boxed(),
        LogFormat::Compact => base.compact().boxed(),
    }
}

fn file_layer(
    format: LogFormat,
    writer: tracing_appender::non_blocking::NonBlocking,
) -> BoxedLayer {
    let base = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);
    match format {
        LogFormat::Json => base.json().boxed(),
        LogFormat::Pretty | LogFormat::Compact => base.compact().boxed(),
    }
}

fn split_log_path(path: &Path) -> Result<(PathBuf, String), LogError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let filename = path
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| LogError::InvalidConfig("Invalid log file name".to_string()))?
        .to_string();
    Ok((dir, filename))
}

/// Initialize the global subscriber.
///
/// `RUST_LOG`, when set, overrides the configured level.
///
/// # Errors
///
/// Returns [`LogError`] if the log directory cannot be created or a
/// subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<LogGuard, LogError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.level.as_str()))
        .map_err(|e| LogError::InvalidConfig(e.to_string()))?;

    let mut layers: Vec<BoxedLayer> = vec![console_layer(config.format)];
    let mut guard = None;

    if let Some(ref path) = config.file_path {
        let (dir, filename) = split_log_path(path)?;
        std::fs::create_dir_all(&dir)
            .map_err(|e| LogError::FileCreation(format!("{}: {e}", dir.display())))?;

        let appender = tracing_appender::rolling::daily(dir, filename);
        let (writer, worker_guard) = tracing_appender::non_blocking(appender);
        layers.push(file_layer(config.format, writer));
        guard = Some(worker_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| LogError::SubscriberInit(e.to_string()))?;

    Ok(LogGuard::new(guard))
}

/// Convert verbosity count to `LogLevel`.
///
/// | Verbosity | Level |
/// |-----------|-------|
/// | 0         | Warn  |
/// | 1         | Info  |
/// | 2         | Debug |
/// | 3+        | Trace |
#[must_use]
pub const fn verbosity_to_level(verbosity: u8) -> LogLevel {
    match verbosity {
        0 => LogLevel::Warn,
        1 => LogLevel::Info,
        2 => LogLevel::Debug,
        _ => LogLevel::Trace,
    }
}

/// Log a security event under [`SECURITY_TARGET`].
///
/// Used for key lifecycle events: generation and deletion.
pub fn log_security_event(event: &str, entity_id: &str, details: &str) {
    tracing::info!(
        target: "ksm::security",
        security_event = event,
        entity_id = entity_id,
        details = details,
        "Security event: {event}"
    );
}
