//! Telemetry initialisation primitives and logging configuration.
//!
//! # Design
//! - One entry point installs a console layer (pretty or JSON) behind an `EnvFilter`.
//! - When a log directory is configured, two daily-rolling files are added:
//!   `general.log` receives INFO and above, `error.log` receives ERROR only.
//! - Records the build SHA once to avoid inconsistencies across modules.

use std::fs;
use std::path::Path;

use once_cell::sync::OnceCell;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{TelemetryError, TelemetryResult};

/// Default logging target when `RUST_LOG` is not provided.
pub const DEFAULT_LOG_LEVEL: &str = "info";

const GENERAL_LOG: &str = "general.log";
const ERROR_LOG: &str = "error.log";

static BUILD_SHA: OnceCell<String> = OnceCell::new();

/// Configure and install the global tracing subscriber.
///
/// The returned guards own the background writers of the log files; keep them alive
/// until the process exits so buffered lines are flushed.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or a global subscriber has
/// already been installed.
pub fn init_logging(config: &LoggingConfig<'_>) -> TelemetryResult<LogGuards> {
    BUILD_SHA.get_or_init(|| config.build_sha.to_string());

    let mut workers = Vec::new();
    let (general_writer, error_writer) = match config.directory {
        Some(dir) => {
            fs::create_dir_all(dir).map_err(|source| TelemetryError::LogDirectory {
                path: dir.to_path_buf(),
                source,
            })?;
            let (general, general_guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, GENERAL_LOG));
            let (errors, error_guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, ERROR_LOG));
            workers.push(general_guard);
            workers.push(error_guard);
            (Some(general), Some(errors))
        }
        None => (None, None),
    };

    let console = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(false)
            .with_thread_ids(false)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .boxed(),
    };
    let general = general_writer.map(|writer| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(writer)
            .with_filter(LevelFilter::INFO)
    });
    let errors = error_writer.map(|writer| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(writer)
            .with_filter(LevelFilter::ERROR)
    });

    tracing_subscriber::registry()
        .with(build_env_filter(config.level))
        .with(console)
        .with(general)
        .with(errors)
        .try_init()
        .map_err(|source| TelemetryError::SubscriberInstall { source })?;

    Ok(LogGuards { workers })
}

/// Access the build SHA recorded during logging initialisation.
#[must_use]
pub fn build_sha() -> &'static str {
    BUILD_SHA.get().map_or("dev", String::as_str)
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig<'a> {
    /// Log level directive used when `RUST_LOG` is unset.
    pub level: &'a str,
    /// Console output format.
    pub format: LogFormat,
    /// Build identifier recorded in structured logs.
    pub build_sha: &'a str,
    /// Directory for the rolling log files; console only when `None`.
    pub directory: Option<&'a Path>,
}

impl Default for LoggingConfig<'_> {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL,
            format: LogFormat::infer(),
            build_sha: build_sha(),
            directory: None,
        }
    }
}

/// Available output formats for the console logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Emit logs as structured JSON objects.
    Json,
    /// Emit human-readable, pretty-printed logs.
    Pretty,
}

impl LogFormat {
    /// Choose a sensible default for the current build.
    #[must_use]
    pub const fn infer() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }

    /// Resolve a configured format name, falling back to [`LogFormat::infer`].
    #[must_use]
    pub fn from_setting(value: Option<&str>) -> Self {
        match value {
            Some("json") => Self::Json,
            Some("pretty") => Self::Pretty,
            _ => Self::infer(),
        }
    }
}

/// Keeps the non-blocking log file writers alive; dropping it flushes them.
#[derive(Debug)]
#[must_use = "dropping the guards stops file logging"]
pub struct LogGuards {
    #[allow(dead_code, reason = "held for its Drop impl")]
    workers: Vec<WorkerGuard>,
}

fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}
