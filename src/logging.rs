//! Logging setup. The terminal belongs to the UI, so logs go to a file.
//!
//! `RUST_LOG` takes precedence over the verbosity given on the command line.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing::Level;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub fn level_from_verbosity(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // Keep http internals quiet unless asked for explicitly.
        EnvFilter::new(format!(
            "warn,cview={level}",
            level = level.as_str().to_lowercase()
        ))
    })
}

pub fn init_logging(path: &Path, level: Level) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(build_env_filter(level))
        .with(layer)
        .with(ErrorLayer::default())
        .try_init()
        .map_err(io::Error::other)
}
