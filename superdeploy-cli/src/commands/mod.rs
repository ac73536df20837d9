pub mod check;
pub mod deploy;
pub mod project;

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};
use superdeploy_core::{FileStore, ProjectName, ProjectRegistry, Settings};
use superdeploy_runner::{Dispatcher, PathLocator, Project, SystemRunner};

/// Everything a verb needs: the SuperDeploy root, loaded settings and the
/// Ctrl-C flag.
pub struct Workspace {
    pub root: PathBuf,
    pub settings: Settings,
    pub cancel: Arc<AtomicBool>,
}

impl Workspace {
    pub fn registry(&self) -> ProjectRegistry<FileStore> {
        ProjectRegistry::open_at(&self.root)
    }

    pub fn dispatcher(&self) -> Dispatcher<SystemRunner, PathLocator> {
        Dispatcher::new(
            SystemRunner::new(),
            PathLocator::from_env(),
            self.settings.clone(),
        )
        .with_cancel_flag(Arc::clone(&self.cancel))
    }

    /// Registered project with an existing directory.
    pub fn project(&self, name: &str) -> Result<Project> {
        let name = ProjectName::parse(name)?;
        Project::locate(&self.registry(), &self.settings, &self.root, &name)
            .with_context(|| format!("cannot use project '{name}'"))
    }
}
