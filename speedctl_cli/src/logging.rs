//! Tracing setup: console layer on stderr plus an optional JSON file sink.

use std::path::Path;

use speedctl_config::Logging;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::cli::FILE_GUARD;

/// Install the global subscriber.
///
/// Filter precedence: `RUST_LOG`, then `--log-level`, then `[logging].level`,
/// then `info`. stdout is left alone; console responses go there.
pub fn init(json: bool, cli_level: Option<&str>, cfg: &Logging) -> eyre::Result<()> {
    let level = cli_level
        .or(cfg.level.as_deref())
        .unwrap_or("info")
        .to_string();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console = if json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).boxed()
    };

    let file = match cfg.file.as_deref() {
        Some(path) => {
            let appender = rolling_appender(Path::new(path), cfg.rotation.as_deref())?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .with(filter)
        .try_init()
        .map_err(|e| eyre::eyre!("install tracing subscriber: {e}"))
}

fn rolling_appender(
    path: &Path,
    rotation: Option<&str>,
) -> eyre::Result<tracing_appender::rolling::RollingFileAppender> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let Some(name) = path.file_name() else {
        eyre::bail!("logging.file must name a file, got {}", path.display());
    };
    std::fs::create_dir_all(dir)?;
    let appender = match rotation.unwrap_or("never") {
        "daily" => tracing_appender::rolling::daily(dir, name),
        "hourly" => tracing_appender::rolling::hourly(dir, name),
        _ => tracing_appender::rolling::never(dir, name),
    };
    Ok(appender)
}
