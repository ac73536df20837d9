//! Daily log files and their retention.
//!
//! Each invocation appends to `superdeploy-<YYYY-MM-DD>.log` for the local
//! date. At start-up the oldest files beyond the retention count are removed:
//!   superdeploy-2024-05-01.log  (deleted when more than `keep` files exist)
//!   superdeploy-2024-05-02.log
//!   …

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

pub const LOG_PREFIX: &str = "superdeploy-";
pub const LOG_SUFFIX: &str = ".log";

/// `<dir>/superdeploy-<date>.log`
pub fn daily_log_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("{LOG_PREFIX}{}{LOG_SUFFIX}", date.format("%Y-%m-%d")))
}

/// Date encoded in a daily log file name, if it is one.
pub fn parse_log_date(file_name: &str) -> Option<NaiveDate> {
    let date = file_name.strip_prefix(LOG_PREFIX)?.strip_suffix(LOG_SUFFIX)?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Delete the oldest daily logs in `dir` so at most `keep` remain.
///
/// Files that are not daily logs are never touched. A missing directory is
/// not an error. Returns the removed paths.
pub fn prune_daily_logs(dir: &Path, keep: usize) -> io::Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };

    let mut logs: Vec<(NaiveDate, PathBuf)> = entries
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let date = parse_log_date(&e.file_name().to_string_lossy())?;
            Some((date, e.path()))
        })
        .collect();
    if logs.len() <= keep {
        return Ok(Vec::new());
    }

    logs.sort_by_key(|(date, _)| *date);
    let excess = logs.len() - keep;
    let mut removed = Vec::with_capacity(excess);
    for (_, path) in logs.into_iter().take(excess) {
        fs::remove_file(&path)?;
        removed.push(path);
    }
    Ok(removed)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
