//! Tracing subscriber setup shared by the CLI and embedding applications.
//!
//! The engine only emits `tracing` events; nothing is printed unless a
//! subscriber is installed through [`init_logging`].

use crate::config::EnvParser;
use std::path::PathBuf;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Output encoding for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "compact" => Some(Self::Compact),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("failed to prepare log directory {path}: {source}")]
    LogDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
    pub stderr: bool,
    /// Optional file that receives JSON lines in addition to stderr.
    pub file: Option<PathBuf>,
}

impl LogConfig {
    /// Build from `SLA_LOG_LEVEL`, `SLA_LOG_FORMAT` and `SLA_LOG_FILE`.
    ///
    /// Malformed values fall back to the defaults.
    pub fn from_env(default_level: &str) -> Self {
        let mut parser = EnvParser::new();
        let level = parser.get_log_level("LOG_LEVEL", default_level).value;
        let format = LogFormat::parse(&parser.get_string("LOG_FORMAT", "compact").value)
            .unwrap_or(LogFormat::Compact);
        let file = parser.get_optional_string("LOG_FILE").value.map(PathBuf::from);
        Self {
            level,
            format,
            stderr: false,
            file,
        }
    }

    pub fn with_stderr(mut self) -> Self {
        self.stderr = true;
        self
    }

    pub fn with_level(mut self, level: &str) -> Self {
        self.level = level.to_string();
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    fn filter(&self) -> Result<EnvFilter, LoggingError> {
        let directive = format!("uptime_sla={level},uptime_sla_cli={level}", level = self.level);
        EnvFilter::try_new(&directive).map_err(|e| LoggingError::InvalidFilter {
            filter: directive,
            reason: e.to_string(),
        })
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            stderr: true,
            file: None,
        }
    }
}

/// Keeps non-blocking writers flushing until dropped.
#[must_use = "dropping the guards stops background log flushing"]
pub struct LoggingGuards {
    _guards: Vec<WorkerGuard>,
}

/// Install the global subscriber described by `config`.
pub fn init_logging(config: &LogConfig) -> Result<LoggingGuards, LoggingError> {
    let mut guards = Vec::new();

    let file_layer = match &config.file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            std::fs::create_dir_all(&dir).map_err(|source| LoggingError::LogDir {
                path: dir.clone(),
                source,
            })?;
            let file_name = path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| "uptime-sla.log".into());
            let appender = tracing_appender::rolling::never(&dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            guards.push(guard);
            Some(
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_target(true)
                    .with_current_span(true),
            )
        }
        None => None,
    };

    let stderr_layer = config.stderr.then(|| {
        let layer = fmt::layer().with_writer(std::io::stderr).with_target(true);
        match config.format {
            LogFormat::Pretty => layer.pretty().boxed(),
            LogFormat::Compact => layer.compact().boxed(),
            LogFormat::Json => layer.json().boxed(),
        }
    });

    tracing_subscriber::registry()
        .with(config.filter()?)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)?;

    Ok(LoggingGuards { _guards: guards })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("pretty"), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::parse("xml"), None);
    }

    #[test]
    fn test_builder_chain() {
        let config = LogConfig::default()
            .with_level("debug")
            .with_format(LogFormat::Json)
            .with_file("/tmp/sla/run.log");
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.stderr);
        assert_eq!(config.file, Some(PathBuf::from("/tmp/sla/run.log")));
    }

    #[test]
    fn test_filter_rejects_garbage_level() {
        let config = LogConfig::default().with_level("not a level[");
        assert!(matches!(
            config.filter(),
            Err(LoggingError::InvalidFilter { .. })
        ));
    }
}
