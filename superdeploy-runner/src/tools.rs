//! Locating external tools before anything runs.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::DispatchError;
use crate::steps::Step;

/// Answers "where is `program`?". Injected so tests need not touch `PATH`.
pub trait ToolLocator {
    fn locate(&self, program: &str) -> Option<PathBuf>;
}

impl<F> ToolLocator for F
where
    F: Fn(&str) -> Option<PathBuf>,
{
    fn locate(&self, program: &str) -> Option<PathBuf> {
        self(program)
    }
}

/// Searches a `PATH`-style list of directories for an executable file.
/// Programs containing a path separator are checked as given.
#[derive(Debug, Clone, Default)]
pub struct PathLocator {
    search_path: Option<OsString>,
}

impl PathLocator {
    pub fn new(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(search_path.into()),
        }
    }

    pub fn from_env() -> Self {
        Self {
            search_path: std::env::var_os("PATH"),
        }
    }
}

impl ToolLocator for PathLocator {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        let candidate = Path::new(program);
        if candidate.components().count() > 1 {
            return is_executable_file(candidate).then(|| candidate.to_path_buf());
        }
        let search_path = self.search_path.as_ref()?;
        std::env::split_paths(search_path)
            .map(|dir| dir.join(program))
            .find(|path| is_executable_file(path))
    }
}

/// Check every tool the steps need, in step order, failing on the first absent one.
pub fn ensure_available<L: ToolLocator + ?Sized>(
    locator: &L,
    steps: &[Step],
) -> Result<(), DispatchError> {
    let mut checked: Vec<&str> = Vec::new();
    for step in steps {
        let Some(tool) = step.tool.as_deref() else { continue };
        if checked.contains(&tool) {
            continue;
        }
        checked.push(tool);
        match locator.locate(tool) {
            Some(path) => tracing::debug!(tool, path = %path.display(), "tool found"),
            None => {
                return Err(DispatchError::ToolMissing {
                    tool: tool.to_string(),
                    purpose: step.label.clone(),
                })
            }
        }
    }
    Ok(())
}

#[cfg(unix)]
fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
#[cfg(not(unix))]
fn is_executable_file(path: &Path) -> bool {
    path.is_file()
}
