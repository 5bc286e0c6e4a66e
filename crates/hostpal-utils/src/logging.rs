//! # Logging Utilities
//!
//! Logging infrastructure for Hostpal using `tracing`.
//!
//! - Pretty (development) or JSON (production) output
//! - `RUST_LOG` filtering
//! - Optional file output through a non-blocking appender
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hostpal_utils::init_logging;
//!
//! // Reads RUST_LOG, HOSTPAL_LOG_FORMAT and HOSTPAL_LOG_FILE
//! init_logging().expect("Failed to initialize logging");
//!
//! tracing::info!("runtime started");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: log level filter (e.g., `RUST_LOG=debug`, `RUST_LOG=hostpal_core=trace`)
//! - `HOSTPAL_LOG_FORMAT`: output format (`json` or `pretty`, default: `pretty`)
//! - `HOSTPAL_LOG_FILE`: optional log file, rotated daily, written next to the console output

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, io};

use chrono::Utc;
use tracing::Level;
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable selecting the output format
pub const LOG_FORMAT_ENV: &str = "HOSTPAL_LOG_FORMAT";

/// Environment variable naming a log file
pub const LOG_FILE_ENV: &str = "HOSTPAL_LOG_FILE";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat
{
    /// Pretty-printed, human-readable format (default for development)
    #[default]
    Pretty,
    /// JSON format (default for production)
    Json,
}

impl FromStr for LogFormat
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(LoggingError::InvalidFormat(s.to_string())),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level (default)
    #[default]
    Info,
    /// Debug level
    Debug,
    /// Trace level (most verbose)
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(LoggingError::InvalidLevel(s.to_string())),
        }
    }
}

/// Initialize logging from the environment
///
/// Console output always; file output as well when `HOSTPAL_LOG_FILE` is set.
/// An unparsable `HOSTPAL_LOG_FORMAT` falls back to pretty output.
///
/// ## Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging() -> Result<(), LoggingError>
{
    let format = env::var(LOG_FORMAT_ENV)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_default();
    let log_file = env::var_os(LOG_FILE_ENV).map(PathBuf::from);

    install(format, env_filter(None), true, log_file.as_deref().map(|path| rolling_file(path, true)))
}

/// Initialize console logging with an explicit level and format
///
/// `RUST_LOG` still wins when it is set.
///
/// ## Example
///
/// ```rust,no_run
/// use hostpal_utils::{LogFormat, LogLevel, init_logging_with_level};
///
/// init_logging_with_level(LogLevel::Debug, LogFormat::Json).expect("Failed to initialize logging");
/// ```
///
/// ## Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<(), LoggingError>
{
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::from(level).to_string()));
    install(format, filter, true, None)
}

/// Initialize file-only logging and return the file path
///
/// The file is `~/.hostpal/YYYY-MM-DD-hostpal.log`, or the same name under
/// `/tmp` when `HOME` is not set. An explicit `level` takes precedence over
/// `RUST_LOG`.
///
/// ## Errors
///
/// Returns an error if the log directory cannot be created or a global
/// subscriber is already installed.
pub fn init_logging_to_file(level: Option<LogLevel>) -> Result<PathBuf, LoggingError>
{
    let today = Utc::now().format("%Y-%m-%d");
    let dir = match env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".hostpal"),
        None => PathBuf::from("/tmp"),
    };
    std::fs::create_dir_all(&dir)?;
    let log_file = dir.join(format!("{today}-hostpal.log"));

    install(LogFormat::Pretty, env_filter(level), false, Some(rolling_file(&log_file, false)))?;
    Ok(log_file)
}

/// Filter priority: explicit level, then `RUST_LOG`, then INFO
fn env_filter(explicit: Option<LogLevel>) -> EnvFilter
{
    if let Some(level) = explicit {
        return EnvFilter::new(Level::from(level).to_string());
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()))
}

fn rolling_file(path: &Path, daily: bool) -> RollingFileAppender
{
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let name = path.file_name().unwrap_or_default();
    if daily {
        rolling::daily(dir, name)
    } else {
        // The date is already part of the file name
        rolling::never(dir, name)
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn output_layer<W>(format: LogFormat, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::rfc_3339());

    match format {
        LogFormat::Pretty => layer.with_ansi(ansi).boxed(),
        LogFormat::Json => layer.json().with_current_span(true).with_span_list(true).boxed(),
    }
}

fn install(format: LogFormat, filter: EnvFilter, console: bool, file: Option<RollingFileAppender>) -> Result<(), LoggingError>
{
    let mut layers: Vec<BoxedLayer> = Vec::new();
    if console {
        layers.push(output_layer(format, io::stdout, true));
    }
    if let Some(appender) = file {
        let (writer, guard) = tracing_appender::non_blocking(appender);
        // The worker must outlive every subscriber call; logging lives until exit
        std::mem::forget(guard);
        layers.push(output_layer(format, writer, false));
    }

    Registry::default()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| LoggingError::InitializationFailed(e.to_string()))
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Unknown log format: {0}. Use 'pretty' or 'json'")]
    InvalidFormat(String),

    /// Invalid log level
    #[error("Unknown log level: {0}. Use 'error', 'warn', 'info', 'debug', or 'trace'")]
    InvalidLevel(String),

    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}
