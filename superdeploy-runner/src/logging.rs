//! Tracing setup: terminal output plus a daily log file.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use crate::log_retention::{daily_log_path, prune_daily_logs};

/// Environment variable overriding the terminal log filter.
pub const LOG_ENV: &str = "SUPERDEPLOY_LOG";

/// Install the global subscriber.
///
/// - stderr: `SUPERDEPLOY_LOG` filter, else `info` when `verbose`, else `warn`;
/// - `<logs_dir>/superdeploy-<today>.log`: everything at `debug`, no ANSI.
///
/// Returns the log file path, or `None` when the file could not be opened
/// (logging then continues on the terminal only). Safe to call twice; the
/// second call is ignored.
pub fn init(logs_dir: &Path, verbose: bool, retention_days: usize) -> Option<PathBuf> {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    let terminal = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);

    let (file_layer, log_path, open_error) = match open_daily_log(logs_dir) {
        Ok((file, path)) => {
            let layer = fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_filter(LevelFilter::DEBUG);
            (Some(layer), Some(path), None)
        }
        Err(err) => (None, None, Some(err)),
    };

    let _ = tracing_subscriber::registry()
        .with(terminal)
        .with(file_layer)
        .try_init();

    if let Some(err) = open_error {
        tracing::warn!(dir = %logs_dir.display(), error = %err, "cannot open log file; logging to terminal only");
    }
    match prune_daily_logs(logs_dir, retention_days.max(1)) {
        Ok(removed) if !removed.is_empty() => {
            tracing::debug!(count = removed.len(), "pruned old log files")
        }
        Ok(_) => {}
        Err(err) => tracing::warn!(dir = %logs_dir.display(), error = %err, "log pruning failed"),
    }
    log_path
}

fn open_daily_log(logs_dir: &Path) -> std::io::Result<(std::fs::File, PathBuf)> {
    std::fs::create_dir_all(logs_dir)?;
    let path = daily_log_path(logs_dir, chrono::Local::now().date_naive());
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((file, path))
}
