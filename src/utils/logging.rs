use std::{path::Path, sync::LazyLock};

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::{fmt::writer::MakeWriterExt, EnvFilter};

pub const LOG_PREFIX: &str = "runtally";

/// Installs the global subscriber. Every run appends to a daily log file under `log_dir`, the
/// console gets a copy only when `console` is set. `RUST_LOG` overrides the level.
pub fn enable_logging(log_dir: &Path, console: bool) -> Result<()> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(5)
        .filename_prefix(LOG_PREFIX)
        .filename_suffix("log")
        .build(log_dir)?;

    let stdout = std::io::stdout.with_filter(move |_| console);

    let default_level = if console {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) => EnvFilter::new(directives),
        Err(_) => EnvFilter::new(format!(
            "{}={default_level}",
            env!("CARGO_PKG_NAME").replace("-", "_"),
        )),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(stdout.and(appender))
        .pretty()
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install logger {e}"))?;
    Ok(())
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .pretty()
        .try_init();
});
