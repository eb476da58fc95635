//! Logging System
//!
//! Installs a `tracing` subscriber with:
//! - Configurable verbosity, globally and per module
//! - Text or JSON formatting
//! - Console output, rolling file output, or both
//! - A separate ERROR-only file next to the main log file

mod config;


pub use config::{LogFormat, LogLevel, LogOutput, LoggingConfig, RotationStrategy};

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Logging system errors
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to initialize logging: {0}")]
    InitializationError(String),

    #[error("Failed to create log directory: {0}")]
    DirectoryCreationError(String),
}

/// Result type for logging operations
pub type LoggingResult<T> = Result<T, LoggingError>;

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;

/// Installed subscriber; keep it alive so buffered file output is flushed
pub struct LoggingSystem {
    log_directory: Option<PathBuf>,
    _guards: Vec<WorkerGuard>,
}

impl LoggingSystem {
    /// Initialize the logging system with the given configuration
    pub fn init(config: LoggingConfig) -> LoggingResult<Self> {
        let mut guards = Vec::new();

        let env_filter = Self::build_env_filter(&config)?;
        let log_directory = config
            .writes_files()
            .then(|| config.resolved_log_directory());
        let layers = Self::build_layers(&config, log_directory.as_deref(), &mut guards)?;

        tracing_subscriber::registry()
            .with(env_filter)
            .with(layers)
            .try_init()
            .map_err(|e| LoggingError::InitializationError(e.to_string()))?;

        Ok(Self {
            log_directory,
            _guards: guards,
        })
    }

    /// `RUST_LOG` wins over the configured directives when set
    fn build_env_filter(config: &LoggingConfig) -> LoggingResult<EnvFilter> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        EnvFilter::try_new(config.filter_directives())
            .map_err(|e| LoggingError::InitializationError(e.to_string()))
    }

    fn build_layers<S>(
        config: &LoggingConfig,
        log_dir: Option<&Path>,
        guards: &mut Vec<WorkerGuard>,
    ) -> LoggingResult<Vec<BoxedLayer<S>>>
    where
        S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    {
        let mut layers = Vec::new();

        if matches!(config.output, LogOutput::Console | LogOutput::Both) {
            layers.push(Self::create_console_layer(config));
        }

        if let Some(log_dir) = log_dir {
            std::fs::create_dir_all(log_dir).map_err(|e| {
                LoggingError::DirectoryCreationError(format!(
                    "Failed to create log directory {:?}: {}",
                    log_dir, e
                ))
            })?;

            let (layer, guard) = Self::create_file_layer(config, log_dir, &config.file_prefix);
            guards.push(guard);
            layers.push(layer);

            if config.error_file {
                let (layer, guard) =
                    Self::create_file_layer(config, log_dir, &config.error_file_prefix());
                guards.push(guard);
                layers.push(layer.with_filter(LevelFilter::ERROR).boxed());
            }
        }

        Ok(layers)
    }

    /// Create console logging layer
    fn create_console_layer<S>(config: &LoggingConfig) -> BoxedLayer<S>
    where
        S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    {
        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(config.include_target)
            .with_thread_ids(config.include_thread_id)
            .with_file(config.include_file_info)
            .with_line_number(config.include_file_info);

        if config.format == LogFormat::Json {
            layer.json().boxed()
        } else {
            layer.boxed()
        }
    }

    /// Create file logging layer with rotation
    fn create_file_layer<S>(
        config: &LoggingConfig,
        log_dir: &Path,
        file_prefix: &str,
    ) -> (BoxedLayer<S>, WorkerGuard)
    where
        S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    {
        let rotation = match config.rotation {
            RotationStrategy::Daily => Rotation::DAILY,
            RotationStrategy::Hourly => Rotation::HOURLY,
            RotationStrategy::Never => Rotation::NEVER,
        };

        let file_appender = RollingFileAppender::new(rotation, log_dir, file_prefix);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let layer = fmt::layer()
            .with_writer(non_blocking)
            .with_target(config.include_target)
            .with_thread_ids(config.include_thread_id)
            .with_file(config.include_file_info)
            .with_line_number(config.include_file_info)
            .with_ansi(false); // No ANSI colors in file output

        if config.format == LogFormat::Json {
            (layer.json().boxed(), guard)
        } else {
            (layer.boxed(), guard)
        }
    }

    /// Directory the file layers write to, if any
    pub fn log_directory(&self) -> Option<&Path> {
        self.log_directory.as_deref()
    }
}
