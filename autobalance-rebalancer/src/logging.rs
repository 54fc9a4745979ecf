//! Logging setup
//!
//! The library only emits `tracing` events. The binary installs the
//! subscriber here: a reloadable level filter, a stderr layer and an
//! optional rolling log file. The level filter is exposed to the
//! orchestrator through [`VerbosityControl`] so an input's `debug` option
//! can raise verbosity for that input only.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{Builder as RollingBuilder, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, Registry};

/// Log file name prefix inside the log directory
pub const LOG_FILE_NAME: &str = "auto_data_rebalance.log";

/// Rotated log files kept on disk
const MAX_LOG_FILES: usize = 3;

/// Switches between INFO and DEBUG verbosity
pub trait VerbosityControl: Send + Sync {
    fn set_debug(&self, enabled: bool);
}

/// Verbosity that never changes, for embedding and tests
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedVerbosity;

impl VerbosityControl for FixedVerbosity {
    fn set_debug(&self, _enabled: bool) {}
}

/// Verbosity backed by a reloadable subscriber level filter
pub struct ReloadVerbosity {
    handle: reload::Handle<LevelFilter, Registry>,
}

impl VerbosityControl for ReloadVerbosity {
    fn set_debug(&self, enabled: bool) {
        let level = if enabled {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        };
        if let Err(e) = self.handle.reload(level) {
            tracing::warn!(error = %e, "Failed to change log level");
        }
    }
}

/// `[logging]` section of the configuration file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Directory for the rotating log file; stderr only when unset
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Emit JSON lines instead of human readable text
    #[serde(default)]
    pub json: bool,
}

/// Keeps the background log writer alive for the lifetime of the process
pub struct LoggingHandle {
    pub verbosity: Arc<ReloadVerbosity>,
    _guard: Option<WorkerGuard>,
}

/// Install the global subscriber
pub fn init(config: &LoggingConfig) -> Result<LoggingHandle> {
    let (level, handle) = reload::Layer::new(LevelFilter::INFO);

    let stderr_layer = if config.json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let (file_layer, guard) = match config.dir {
        Some(ref dir) => {
            let appender = RollingBuilder::new()
                .rotation(Rotation::DAILY)
                .filename_prefix(LOG_FILE_NAME)
                .max_log_files(MAX_LOG_FILES)
                .build(dir)
                .with_context(|| format!("Failed to open log directory {}", dir.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = if config.json {
                fmt::layer().json().with_writer(writer).boxed()
            } else {
                fmt::layer().with_ansi(false).with_writer(writer).boxed()
            };
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(level)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(LoggingHandle {
        verbosity: Arc::new(ReloadVerbosity { handle }),
        _guard: guard,
    })
}
