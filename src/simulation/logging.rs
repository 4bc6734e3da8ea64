//! Logging and tracing configuration
//!
//! This module provides centralized logging configuration for the simulator:
//! console output (pretty or JSON) and optional daily-rolling JSON log files.

use std::io;
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Error returned when the global subscriber cannot be installed
pub type LoggingError = Box<dyn std::error::Error + Send + Sync>;

/// Keeps non-blocking log writers flushing until dropped
///
/// Hold this for the lifetime of the program; dropping it flushes and closes
/// any log files.
#[derive(Debug, Default)]
pub struct LoggingGuard {
    _guards: Vec<WorkerGuard>,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level for the simulator crate
    pub level: Level,
    /// Emit console output as JSON
    pub json_format: bool,
    /// Directory for daily-rolling JSON log files, if any
    pub log_directory: Option<String>,
    /// Log file prefix
    pub log_file_prefix: String,
    /// Emit span open/close events
    pub enable_span_events: bool,
    /// Use ANSI colors in console output
    pub enable_ansi: bool,
    /// Custom environment filter, overriding `level`
    pub env_filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            log_directory: None,
            log_file_prefix: "hiv-care-simulator".to_string(),
            enable_span_events: false,
            enable_ansi: true,
            env_filter: None,
        }
    }
}

impl LoggingConfig {
    /// Create a new logging configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Enable JSON console output
    pub fn with_json_format(mut self) -> Self {
        self.json_format = true;
        self
    }

    /// Also write JSON logs to daily-rolling files in `directory`
    pub fn with_file_logging(mut self, directory: impl Into<String>) -> Self {
        self.log_directory = Some(directory.into());
        self
    }

    /// Set log file prefix
    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.log_file_prefix = prefix.into();
        self
    }

    /// Enable span events
    pub fn with_span_events(mut self) -> Self {
        self.enable_span_events = true;
        self
    }

    /// Disable ANSI colors
    pub fn without_ansi(mut self) -> Self {
        self.enable_ansi = false;
        self
    }

    /// Set custom environment filter
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Filter directive used when neither `env_filter` nor `RUST_LOG` is set
    pub fn default_directive(&self) -> String {
        format!("{}={}", env!("CARGO_PKG_NAME").replace('-', "_"), self.level)
    }

    fn span_events(&self) -> FmtSpan {
        if self.enable_span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    /// Install the global tracing subscriber
    pub fn init(self) -> Result<LoggingGuard, LoggingError> {
        let env_filter = match &self.env_filter {
            Some(filter) => EnvFilter::try_new(filter)?,
            None => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.default_directive())),
        };

        let mut guards = Vec::new();
        let (console_writer, console_guard) = non_blocking(io::stderr());
        guards.push(console_guard);

        let console_layer = if self.json_format {
            fmt::layer()
                .json()
                .with_writer(console_writer)
                .with_span_events(self.span_events())
                .boxed()
        } else {
            fmt::layer()
                .pretty()
                .with_writer(console_writer)
                .with_ansi(self.enable_ansi)
                .with_span_events(self.span_events())
                .boxed()
        };

        let file_layer = match &self.log_directory {
            Some(directory) => {
                let appender = rolling::daily(directory, &self.log_file_prefix);
                let (file_writer, file_guard) = non_blocking(appender);
                guards.push(file_guard);
                Some(
                    fmt::layer()
                        .json()
                        .with_writer(file_writer)
                        .with_ansi(false)
                        .with_span_events(self.span_events()),
                )
            }
            None => None,
        };

        Registry::default().with(env_filter).with(console_layer).with(file_layer).try_init()?;

        info!("Logging initialized with configuration: {:?}", self);
        Ok(LoggingGuard { _guards: guards })
    }

    /// Initialize logging for production (JSON console and rolling files)
    pub fn init_prod(log_dir: impl Into<String>) -> Result<LoggingGuard, LoggingError> {
        Self::new()
            .with_level(Level::INFO)
            .with_json_format()
            .with_file_logging(log_dir)
            .without_ansi()
            .init()
    }

    /// Initialize logging for testing (warnings only)
    pub fn init_test() -> Result<LoggingGuard, LoggingError> {
        Self::new().with_level(Level::WARN).without_ansi().init()
    }

    /// Initialize verbose logging (INFO level with span events)
    pub fn init_verbose() -> Result<LoggingGuard, LoggingError> {
        Self::new().with_level(Level::INFO).with_span_events().init()
    }

    /// Initialize debug logging (DEBUG level with span events)
    pub fn init_debug() -> Result<LoggingGuard, LoggingError> {
        Self::new().with_level(Level::DEBUG).with_span_events().init()
    }
}

/// Structured log event tagged with the simulation component
#[macro_export]
macro_rules! sim_event {
    ($level:ident, $message:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::$level!(
            message = $message,
            component = "simulation",
            $($key = $value,)*
        );
    };
    ($level:ident, $message:expr) => {
        tracing::$level!(
            message = $message,
            component = "simulation",
        );
    };
}

/// Span for timing a section of the run
#[macro_export]
macro_rules! perf_span {
    ($name:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::info_span!(
            $name,
            component = "performance",
            $($key = $value,)*
        )
    };
    ($name:expr) => {
        tracing::info_span!(
            $name,
            component = "performance",
        )
    };
}
