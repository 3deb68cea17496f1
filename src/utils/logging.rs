//! Structured logging setup
//!
//! The codec itself only emits `tracing` events. Applications that do not
//! install their own subscriber can call [`init_logging`] with the
//! [`LoggingConfig`] section of their configuration.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{constants, ProtocolError, Result};

/// Build the filter: `RUST_LOG` wins, otherwise the configured level.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    filter_with(config, directives.as_deref())
}

fn filter_with(config: &LoggingConfig, directives: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(config.log_level).into())
        .parse_lossy(directives.unwrap_or_default())
}

/// Install a global subscriber for `config`.
///
/// Fails if the configuration is invalid, the log file cannot be opened,
/// or a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let problems = config.validate();
    if !problems.is_empty() {
        return Err(ProtocolError::ConfigError(problems.join("; ")));
    }

    let init_err = |e: tracing_subscriber::util::TryInitError| {
        ProtocolError::ConfigError(format!("{}: {e}", constants::ERR_LOGGING_INIT))
    };

    let file_layer = match (config.log_to_file, &config.log_file_path) {
        (true, Some(path)) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    ProtocolError::ConfigError(format!("{}: {e}", constants::ERR_LOGGING_INIT))
                })?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        _ => None,
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter(config))
        .with(file_layer);

    match (config.log_to_console, config.json_format) {
        (true, true) => registry.with(fmt::layer().json()).try_init().map_err(init_err)?,
        (true, false) => registry.with(fmt::layer()).try_init().map_err(init_err)?,
        (false, _) => registry.try_init().map_err(init_err)?,
    }

    info!(app = %config.app_name, level = %config.log_level, "Logging initialised");
    Ok(())
}
