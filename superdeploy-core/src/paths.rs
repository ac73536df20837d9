//! On-disk layout.
//!
//! ```text
//! $SUPERDEPLOY_HOME/            (default ~/.superdeploy)
//!   projects.txt                registry, one "<name> is a project" per line
//!   config.yaml                 optional settings
//!   projects/<name>/            default project roots
//!   logs/superdeploy-<date>.log daily log files
//! ```
//!
//! Every helper takes the SuperDeploy root explicitly; only [`root`] consults
//! the environment. Tests must always pass a `TempDir` root.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const HOME_ENV: &str = "SUPERDEPLOY_HOME";
pub const PROJECTS_DIR_ENV: &str = "SUPERDEPLOY_PROJECTS_DIR";

pub const REGISTRY_FILE: &str = "projects.txt";
pub const CONFIG_FILE: &str = "config.yaml";
pub const PROJECTS_DIR: &str = "projects";
pub const LOGS_DIR: &str = "logs";

/// `$SUPERDEPLOY_HOME`, falling back to `~/.superdeploy`.
pub fn root() -> Result<PathBuf, ConfigError> {
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".superdeploy"))
        .ok_or(ConfigError::HomeNotFound)
}

pub fn registry_path_at(root: &Path) -> PathBuf {
    root.join(REGISTRY_FILE)
}

pub fn config_path_at(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn default_projects_dir_at(root: &Path) -> PathBuf {
    root.join(PROJECTS_DIR)
}

pub fn logs_dir_at(root: &Path) -> PathBuf {
    root.join(LOGS_DIR)
}
