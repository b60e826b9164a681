//! Logging Module
//!
//! Sets up `tracing` output. Debug mode writes a daily rolling file under
//! `.sol-bridge/logs/`; otherwise logs go to the configured file, or stderr.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const LOG_FILE_PREFIX: &str = "sol-bridge.log";

/// Logging setup options
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
    pub debug_mode: bool,
    pub log_dir: PathBuf,
    /// Plain file to log to outside debug mode
    pub log_file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self {
            level: "warn".to_string(),
            debug_mode: false,
            log_dir: default_log_dir(),
            log_file: None,
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_debug_mode(mut self, debug: bool) -> Self {
        self.debug_mode = debug;
        self
    }

    pub fn with_log_dir(mut self, dir: PathBuf) -> Self {
        self.log_dir = dir;
        self
    }

    pub fn with_log_file(mut self, file: Option<PathBuf>) -> Self {
        self.log_file = file;
        self
    }

    /// Filter directive: `RUST_LOG` wins, then debug mode, then the level.
    fn filter(&self) -> EnvFilter {
        let fallback = if self.debug_mode {
            "debug".to_string()
        } else {
            self.level.clone()
        };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(".sol-bridge").join("logs")
}

/// Install the global subscriber. Keep the returned guard alive for the
/// lifetime of the program so buffered file output is flushed.
pub fn init_logging(config: LogConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = config.filter();

    if config.debug_mode {
        std::fs::create_dir_all(&config.log_dir)?;
        let appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(writer).with_ansi(false))
            .try_init()?;
        tracing::debug!("Logging to {}", config.log_dir.display());
        return Ok(Some(guard));
    }

    if let Some(file) = &config.log_file {
        let dir = file.parent().unwrap_or_else(|| std::path::Path::new("."));
        let name = file
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Log file has no name: {}", file.display()))?;
        std::fs::create_dir_all(dir)?;
        let appender = tracing_appender::rolling::never(dir, name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(writer).with_ansi(false))
            .try_init()?;
        return Ok(Some(guard));
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()?;
    Ok(None)
}

/// Delete log files older than `days` from the default log directory.
/// Returns how many were removed.
pub fn cleanup_old_logs(days: u64) -> anyhow::Result<usize> {
    cleanup_logs_in(&default_log_dir(), days)
}

fn cleanup_logs_in(dir: &std::path::Path, days: u64) -> anyhow::Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let max_age = Duration::from_secs(days * 24 * 60 * 60);
    let now = SystemTime::now();
    let mut removed = 0;

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(LOG_FILE_PREFIX) {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        let age = now.duration_since(modified).unwrap_or_default();
        if age > max_age {
            std::fs::remove_file(entry.path())?;
            removed += 1;
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_builder() {
        let config = LogConfig::new()
            .with_level("warn")
            .with_debug_mode(true)
            .with_log_dir(PathBuf::from("/tmp/sol-logs"))
            .with_log_file(Some(PathBuf::from("/tmp/sol.log")));
        assert_eq!(config.level, "warn");
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/sol.log")));
        assert!(config.debug_mode);
        assert_eq!(config.log_dir, PathBuf::from("/tmp/sol-logs"));
    }

    #[test]
    fn test_cleanup_keeps_fresh_logs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sol-bridge.log.2026-10-19"), "x").unwrap();
        std::fs::write(dir.path().join("unrelated.txt"), "x").unwrap();

        assert_eq!(cleanup_logs_in(dir.path(), 7).unwrap(), 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_cleanup_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(cleanup_logs_in(&dir.path().join("nope"), 7).unwrap(), 0);
    }
}
