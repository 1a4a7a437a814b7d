//! Tracing integration for structured logging.
//!
//! Shared by the server and client binaries: verbosity mapped from repeated
//! `-v` flags, optional log file, text or JSON output.

use std::path::Path;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{Error, Result};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// Structured JSON output.
    Json,
}

/// Initialize the logging system.
///
/// `verbosity` maps 0=error, 1=warn, 2=info, 3=debug, 4+=trace. The
/// `RUST_LOG` environment variable overrides the computed filter. When
/// `log_file` is set, output is appended there instead of stderr.
pub fn init_logging(verbosity: u8, log_file: Option<&Path>, format: LogFormat) -> Result<()> {
    let level = match verbosity {
        0 => "error",
        1 => "warn",
        2 => "info",
        3 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "relay_core={level},relay_server={level},relay_client={level}"
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    let init_err = |e: tracing_subscriber::util::TryInitError| {
        Error::Io(std::io::Error::other(e.to_string()))
    };

    match log_file {
        None => {
            let layer = fmt::layer()
                .with_target(true)
                .with_file(verbosity >= 3)
                .with_line_number(verbosity >= 3);
            match format {
                LogFormat::Text => registry.with(layer).try_init().map_err(init_err)?,
                LogFormat::Json => registry.with(layer.json()).try_init().map_err(init_err)?,
            }
        }
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            let layer = fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true);
            match format {
                LogFormat::Text => registry.with(layer).try_init().map_err(init_err)?,
                LogFormat::Json => registry.with(layer.json()).try_init().map_err(init_err)?,
            }
        }
    }

    Ok(())
}

/// Initialize logging with defaults for testing.
///
/// Silently ignores errors (a subscriber may already be installed).
pub fn init_test_logging() {
    let _ = init_logging(2, None, LogFormat::Text);
}
