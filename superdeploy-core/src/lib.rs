//! SuperDeploy core library — domain types, project registry, paths and settings.
//!
//! - [`types`] — project names and the resolved [`DeploymentDescriptor`]
//! - [`registry`] — the line-oriented project registry and its stores
//! - [`paths`] / [`settings`] — on-disk layout and `config.yaml`
//! - [`error`] — [`RegistryError`], [`ConfigError`]

pub mod error;
pub mod paths;
pub mod registry;
pub mod settings;
pub mod types;

pub use error::{ConfigError, RegistryError};
pub use registry::{FileStore, MemoryStore, ProjectRegistry, RegistryStore};
pub use settings::Settings;
pub use types::{
    AnsibleConfig, AnsibleLayout, CustomScript, DeploymentDescriptor, ProjectName,
    ScriptInterpreter,
};
