//! `config.yaml` — optional user settings.
//!
//! Every field has a default, so a missing file (or an empty one) yields
//! [`Settings::default`]. `SUPERDEPLOY_PROJECTS_DIR` overrides `projects_dir`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::paths::{config_path_at, default_projects_dir_at, PROJECTS_DIR_ENV};
use crate::types::ProjectName;

/// Default number of daily log files kept in `logs/`.
pub const DEFAULT_LOG_RETENTION_DAYS: usize = 14;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Directory containing one checkout per project. Defaults to `<root>/projects`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projects_dir: Option<PathBuf>,
    pub terraform_bin: String,
    pub ansible_playbook_bin: String,
    pub python_bin: String,
    pub log_retention_days: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            projects_dir: None,
            terraform_bin: "terraform".to_string(),
            ansible_playbook_bin: "ansible-playbook".to_string(),
            python_bin: "python3".to_string(),
            log_retention_days: DEFAULT_LOG_RETENTION_DAYS,
        }
    }
}

impl Settings {
    /// Load `<root>/config.yaml` without consulting the environment.
    pub fn load_at(root: &Path) -> Result<Self, ConfigError> {
        let path = config_path_at(root);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
    }

    /// `load_at` plus environment overrides.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let settings = Self::load_at(root)?;
        Ok(settings.with_env(|key| std::env::var_os(key).map(PathBuf::from)))
    }

    /// Apply overrides from `lookup` (injected so tests need not touch the process env).
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<PathBuf>) -> Self {
        if let Some(dir) = lookup(PROJECTS_DIR_ENV).filter(|d| !d.as_os_str().is_empty()) {
            self.projects_dir = Some(dir);
        }
        self
    }

    pub fn projects_dir(&self, root: &Path) -> PathBuf {
        match &self.projects_dir {
            Some(dir) if dir.is_relative() => root.join(dir),
            Some(dir) => dir.clone(),
            None => default_projects_dir_at(root),
        }
    }

    /// `<projects_dir>/<name>` — pure, no I/O.
    pub fn project_root(&self, root: &Path, name: &ProjectName) -> PathBuf {
        self.projects_dir(root).join(name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_config_yields_defaults() {
        let root = TempDir::new().expect("tempdir");
        let settings = Settings::load_at(root.path()).expect("load");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.projects_dir(root.path()), root.path().join("projects"));
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let root = TempDir::new().expect("tempdir");
        std::fs::write(
            config_path_at(root.path()),
            "python_bin: /usr/bin/python3.12\nlog_retention_days: 3\n",
        )
        .expect("write");
        let settings = Settings::load_at(root.path()).expect("load");
        assert_eq!(settings.python_bin, "/usr/bin/python3.12");
        assert_eq!(settings.log_retention_days, 3);
        assert_eq!(settings.terraform_bin, "terraform");
    }

    #[test]
    fn unknown_field_is_a_parse_error_with_path() {
        let root = TempDir::new().expect("tempdir");
        std::fs::write(config_path_at(root.path()), "terraform: tf\n").expect("write");
        let err = Settings::load_at(root.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
        assert!(err.to_string().contains("config.yaml"));
    }

    #[test]
    fn relative_projects_dir_is_rooted() {
        let settings = Settings {
            projects_dir: Some(PathBuf::from("checkouts")),
            ..Settings::default()
        };
        let root = Path::new("/srv/sd");
        assert_eq!(
            settings.project_root(root, &ProjectName::from("alpha")),
            PathBuf::from("/srv/sd/checkouts/alpha")
        );
    }

    #[test]
    fn env_override_wins_over_file() {
        let settings = Settings {
            projects_dir: Some(PathBuf::from("/from/file")),
            ..Settings::default()
        }
        .with_env(|key| (key == PROJECTS_DIR_ENV).then(|| PathBuf::from("/from/env")));
        assert_eq!(settings.projects_dir(Path::new("/r")), PathBuf::from("/from/env"));
    }
}
