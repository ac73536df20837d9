//! Error types for superdeploy-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::ProjectName;

/// All errors that can arise from registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Underlying I/O failure on the registry file (permission denied, etc.).
    /// A missing file is never reported here; it reads as an empty registry.
    #[error("I/O error at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `add` was called with a name already present.
    #[error("project '{name}' is already registered")]
    AlreadyExists { name: ProjectName },

    /// `remove` was called with a name that is not present.
    #[error("project '{name}' not found in registry")]
    NotFound { name: ProjectName },

    /// A project-scoped command referenced a name that was never added.
    #[error("project '{name}' is not registered; run `superdeploy add {name}` first")]
    NotRegistered { name: ProjectName },

    /// The name cannot be stored in the registry line grammar or used as a directory.
    #[error("invalid project name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },
}

/// Errors from locating the SuperDeploy home or loading `config.yaml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `dirs::home_dir()` returned `None` and `SUPERDEPLOY_HOME` is unset.
    #[error("cannot determine home directory; set $HOME or $SUPERDEPLOY_HOME")]
    HomeNotFound,

    #[error("I/O error at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load — includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RegistryError {
    RegistryError::Io {
        path: path.into(),
        source,
    }
}
