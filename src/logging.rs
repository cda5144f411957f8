//! Intake Desk Logging System
//!
//! Structured logging through `tracing`, with configurable level and output
//! format. The server can write to a log file instead of stdout.

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Logging configuration options
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum log level to output
    pub level: Level,
    /// Enable colored output
    pub color: bool,
    /// Show timestamps
    pub show_timestamps: bool,
    /// Show target/module name
    pub show_target: bool,
    /// Enable JSON format for machine parsing
    pub json_format: bool,
    /// Enable span events for tracing
    pub enable_spans: bool,
    /// Output to file instead of stdout
    pub file_output: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            color: true,
            show_timestamps: false,
            show_target: false,
            json_format: false,
            enable_spans: false,
            file_output: None,
        }
    }
}

impl LoggingConfig {
    /// Create config for different application modes
    pub fn for_mode(mode: ApplicationMode) -> Self {
        match mode {
            ApplicationMode::Server => Self {
                level: Level::INFO,
                color: io::stdout().is_terminal(),
                show_timestamps: true,
                show_target: true,
                json_format: false,
                enable_spans: true,
                file_output: None,
            },
            ApplicationMode::Cli => Self {
                level: Level::WARN,
                color: true,
                show_timestamps: false,
                show_target: false,
                json_format: false,
                enable_spans: false,
                file_output: None,
            },
            ApplicationMode::Test => Self {
                level: Level::DEBUG,
                color: false,
                show_timestamps: true,
                show_target: true,
                json_format: false,
                enable_spans: true,
                file_output: None,
            },
        }
    }

    /// Create config from CLI arguments
    pub fn from_args(quiet: bool, verbose: bool, json: bool) -> Self {
        let level = if verbose {
            Level::DEBUG
        } else if quiet {
            Level::ERROR
        } else {
            Level::INFO
        };

        Self {
            level,
            color: !quiet && !json && io::stdout().is_terminal(),
            show_timestamps: verbose || json,
            show_target: verbose,
            json_format: json,
            enable_spans: verbose,
            file_output: None,
        }
    }
}

/// Application modes with different logging requirements
#[derive(Debug, Clone, Copy)]
pub enum ApplicationMode {
    /// HTTP server - timestamps and request spans
    Server,
    /// One-shot CLI commands - warnings and errors only
    Cli,
    /// Test mode - maximum detail for testing
    Test,
}

/// Initialize the logging system
pub fn init_logging(config: LoggingConfig) -> io::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "intake_desk={},tower_http={}",
            config.level, config.level
        ))
    });

    let registry = Registry::default().with(env_filter);

    if let Some(log_file) = config.file_output {
        let file_appender = tracing_appender::rolling::daily(
            log_dir_of(&log_file),
            log_file.file_name().ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "Invalid log file name")
            })?,
        );

        if config.json_format {
            let json_layer = fmt::layer()
                .json()
                .with_current_span(config.enable_spans)
                .with_span_events(FmtSpan::CLOSE)
                .with_writer(file_appender);
            json_layer.with_subscriber(registry).try_init().map_err(io::Error::other)?;
        } else {
            fmt::layer()
                .with_target(config.show_target)
                .with_level(true)
                .with_ansi(false)
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .with_writer(file_appender)
                .with_subscriber(registry)
                .try_init()
                .map_err(io::Error::other)?;
        }
    } else if config.json_format {
        let json_layer = fmt::layer()
            .json()
            .with_current_span(config.enable_spans)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(io::stderr);
        json_layer.with_subscriber(registry).try_init().map_err(io::Error::other)?;
    } else {
        let fmt_layer = fmt::layer()
            .with_target(config.show_target)
            .with_level(true)
            .with_ansi(config.color)
            .with_writer(io::stderr);

        if config.show_timestamps {
            fmt_layer
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .with_subscriber(registry)
                .try_init()
                .map_err(io::Error::other)?;
        } else {
            fmt_layer
                .without_time()
                .with_subscriber(registry)
                .try_init()
                .map_err(io::Error::other)?;
        }
    }

    Ok(())
}

/// Directory a log file lives in; a bare file name means the working directory.
pub fn log_dir_of(log_file: &Path) -> &Path {
    log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Clean up old log files based on retention policy
///
/// Only removes rotated files, i.e. names containing `.log.` followed by a
/// date suffix (`server.log.2026-10-12`).
pub fn cleanup_old_logs(log_dir: &Path, retention_days: u32) -> io::Result<usize> {
    use std::fs;
    use std::time::{Duration, SystemTime};

    if !log_dir.exists() {
        return Ok(0);
    }

    let now = SystemTime::now();
    let retention = Duration::from_secs(u64::from(retention_days) * 24 * 60 * 60);
    let mut cleaned = 0;

    for entry in fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();

        let name = entry.file_name();
        if !name.to_string_lossy().contains(".log.") || !path.is_file() {
            continue;
        }

        let modified = entry.metadata()?.modified()?;
        if let Ok(age) = now.duration_since(modified) {
            if age > retention {
                match fs::remove_file(&path) {
                    Ok(_) => {
                        cleaned += 1;
                        tracing::info!(
                            "Cleaned up old log file: {} (age: {} days)",
                            path.display(),
                            age.as_secs() / 86400
                        );
                    },
                    Err(e) => {
                        tracing::warn!("Failed to remove old log file {}: {}", path.display(), e);
                    },
                }
            }
        }
    }

    Ok(cleaned)
}

/// Log a change to a stored record
#[macro_export]
macro_rules! log_record_operation {
    ($operation:expr, $kind:expr, $id:expr) => {
        tracing::info!(
            operation = $operation,
            kind = %$kind,
            id = %$id,
            "Record operation"
        );
    };
    ($operation:expr, $kind:expr, $id:expr, $details:expr) => {
        tracing::info!(
            operation = $operation,
            kind = %$kind,
            id = %$id,
            details = %$details,
            "Record operation"
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_args_levels() {
        assert_eq!(LoggingConfig::from_args(false, true, false).level, Level::DEBUG);
        assert_eq!(LoggingConfig::from_args(true, false, false).level, Level::ERROR);
        let json = LoggingConfig::from_args(false, false, true);
        assert!(json.json_format);
        assert!(!json.color);
        assert!(json.show_timestamps);
    }

    #[test]
    fn test_cleanup_only_touches_rotated_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("server.log"), "current").unwrap();
        std::fs::write(dir.path().join("server.log.2020-01-01"), "old").unwrap();

        // Zero-day retention: anything with a measurable age goes.
        std::thread::sleep(std::time::Duration::from_millis(20));
        let cleaned = cleanup_old_logs(dir.path(), 0).unwrap();

        assert_eq!(cleaned, 1);
        assert!(dir.path().join("server.log").exists());
        assert!(!dir.path().join("server.log.2020-01-01").exists());
    }

    #[test]
    fn test_log_dir_of_bare_name() {
        assert_eq!(log_dir_of(Path::new("server.log")), Path::new("."));
        assert_eq!(log_dir_of(Path::new("/var/log/intake/server.log")), Path::new("/var/log/intake"));
    }

    #[test]
    fn test_cleanup_missing_dir() {
        let dir = TempDir::new().unwrap();
        assert_eq!(cleanup_old_logs(&dir.path().join("nope"), 7).unwrap(), 0);
    }
}
