use std::path::PathBuf;

use superdeploy_core::{ProjectName, RegistryError};
use superdeploy_resolver::ResolveError;
use thiserror::Error;

/// Failure to start or wait for a subprocess. A non-zero exit is not a
/// `RunnerError`; it is reported through [`crate::ProcessOutput::code`].
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to start `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for `{program}`")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Error surface for project-scoped operations.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("project '{project}' is registered but its directory {path} does not exist")]
    DirectoryMissing { project: ProjectName, path: PathBuf },

    #[error(
        "no deployable structure for '{project}' in {path}: no custom deploy script, \
         terraform/ configuration or suitable ansible configuration found"
    )]
    NoDeployableStructure { project: ProjectName, path: PathBuf },

    #[error("nothing to run for '{project}': {reason}")]
    NothingToRun { project: ProjectName, reason: String },

    #[error("required tool `{tool}` not found in PATH (needed for {purpose})")]
    ToolMissing { tool: String, purpose: String },

    #[error("{step} failed with exit code {code}: {command}")]
    SubprocessFailure {
        step: String,
        command: String,
        code: i32,
    },

    #[error("invalid options: {0}")]
    Validation(String),

    #[error("interrupted during {step}")]
    Interrupted { step: String },

    #[error("I/O error at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Runner(#[from] RunnerError),
}
