/*!
 * Logging and tracing initialization
 */

use std::fs::File;
use std::path::Path;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LogConfig;
use crate::error::{StorageError, StorageResult};

/// Resolve the effective level, `verbose` forcing DEBUG
pub fn effective_level(config: &LogConfig) -> Level {
    if config.verbose {
        Level::DEBUG
    } else {
        config.log_level.to_tracing_level()
    }
}

/// Build the env filter: `RUST_LOG` wins, otherwise `anf_storage=<level>`
fn build_filter(level: Level) -> StorageResult<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("anf_storage={}", level)))
        .map_err(|e| StorageError::config(format!("Failed to create log filter: {}", e)))
}

/// Initialize structured logging based on configuration
///
/// Installs a global subscriber; a second call returns a configuration error
/// instead of panicking.
pub fn init_logging(config: &LogConfig) -> StorageResult<()> {
    let env_filter = build_filter(effective_level(config))?;

    if let Some(ref log_path) = config.log_file {
        init_file_logging(log_path, env_filter)
    } else {
        init_stdout_logging(env_filter)
    }
}

/// Initialize logging to stdout/stderr
fn init_stdout_logging(env_filter: EnvFilter) -> StorageResult<()> {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| StorageError::config(format!("Failed to install logger: {}", e)))
}

/// Initialize JSON logging to a file
fn init_file_logging(log_path: &Path, env_filter: EnvFilter) -> StorageResult<()> {
    let file = File::create(log_path)
        .map_err(|e| StorageError::config(format!("Failed to create log file: {}", e)))?;

    let fmt_layer = fmt::layer()
        .with_writer(file)
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(false)
        .json();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| StorageError::config(format!("Failed to install logger: {}", e)))
}

/// Initialize logging with custom format for testing
#[cfg(test)]
pub fn init_test_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("anf_storage=debug"));

        let fmt_layer = fmt::layer().with_test_writer().with_target(false).compact();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .ok(); // Ignore error if already initialized
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_verbose_overrides_log_level() {
        let config = LogConfig {
            log_level: LogLevel::Error,
            log_file: None,
            verbose: true,
        };
        assert_eq!(effective_level(&config), Level::DEBUG);
    }

    #[test]
    fn test_effective_level_follows_config() {
        let config = LogConfig {
            log_level: LogLevel::Warn,
            ..Default::default()
        };
        assert_eq!(effective_level(&config), Level::WARN);
    }

    #[test]
    fn test_filter_builds_for_every_level() {
        for level in [Level::ERROR, Level::WARN, Level::INFO, Level::DEBUG, Level::TRACE] {
            assert!(build_filter(level).is_ok());
        }
    }

    #[test]
    fn test_second_init_is_an_error_not_a_panic() {
        init_test_logging();
        let result = init_logging(&LogConfig::default());
        assert!(matches!(result, Err(StorageError::Configuration(_))));
    }
}
