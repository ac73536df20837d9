//! Deployment resolution for `superdeploy-resolver`.
//!
//! `resolve(root)` inspects a project checkout and returns the
//! [`DeploymentDescriptor`] describing how it is deployed. Checks run in a
//! fixed priority order and the first match wins:
//!
//! 1. a custom deployment script ([`CUSTOM_SCRIPT_CANDIDATES`]);
//! 2. a `terraform/` directory holding at least one `.tf` / `.tf.json` file;
//! 3. an `ansible/` directory in one of the [`AnsibleLayout`]s.
//!
//! Custom scripts are checked first because they orchestrate Terraform and
//! Ansible themselves; (2) and (3) are evaluated independently and composed.

mod lookup;

use std::path::{Path, PathBuf};

use superdeploy_core::types::{
    AnsibleConfig, AnsibleLayout, CustomScript, DeploymentDescriptor, ScriptInterpreter,
};
use thiserror::Error;

pub use lookup::{EntryKind, FileLookup, FsLookup};

// ---------------------------------------------------------------------------
// Public constants
// ---------------------------------------------------------------------------

/// Custom script locations relative to the project root, without extension,
/// in precedence order. Each is tried as `.sh` (must be executable) and then
/// as `.py` (run through the Python interpreter).
pub const CUSTOM_SCRIPT_CANDIDATES: [&str; 6] = [
    "scripts/deploy/master-deploy",
    "scripts/deploy/deploy",
    "deploy/master-deploy",
    "deploy/deploy",
    "bin/deploy",
    "deploy",
];

pub const TERRAFORM_DIR: &str = "terraform";
pub const ANSIBLE_DIR: &str = "ansible";

/// File suffixes that mark a directory as a Terraform configuration.
pub const TERRAFORM_SUFFIXES: [&str; 2] = [".tf", ".tf.json"];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Hard failures during resolution. An absent file is never an error.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("cannot inspect {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn io_err(path: &Path, source: std::io::Error) -> ResolveError {
    ResolveError::Io {
        path: path.to_path_buf(),
        source,
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Resolve the deployment mechanism for the project checked out at `root`.
///
/// A missing `root` resolves to [`DeploymentDescriptor::NotFound`].
pub fn resolve(root: &Path) -> Result<DeploymentDescriptor, ResolveError> {
    resolve_with(&FsLookup, root)
}

/// [`resolve`] against an injected [`FileLookup`].
pub fn resolve_with<L: FileLookup + ?Sized>(
    lookup: &L,
    root: &Path,
) -> Result<DeploymentDescriptor, ResolveError> {
    if entry(lookup, root)? != Some(EntryKind::Dir) {
        tracing::debug!(root = %root.display(), "project root is not a directory");
        return Ok(DeploymentDescriptor::NotFound);
    }

    if let Some(script) = find_custom_script(lookup, root)? {
        tracing::debug!(script = %script.path.display(), "custom deployment script selected");
        return Ok(DeploymentDescriptor::CustomScript(script));
    }

    let terraform = find_terraform(lookup, root)?;
    let ansible = find_ansible(lookup, root)?;
    Ok(compose(terraform, ansible))
}

/// First custom deployment script under `root`, if any.
pub fn find_custom_script<L: FileLookup + ?Sized>(
    lookup: &L,
    root: &Path,
) -> Result<Option<CustomScript>, ResolveError> {
    for stem in CUSTOM_SCRIPT_CANDIDATES {
        let shell = root.join(format!("{stem}.sh"));
        match entry(lookup, &shell)? {
            Some(EntryKind::File { executable: true }) => {
                return Ok(Some(CustomScript {
                    path: shell,
                    interpreter: ScriptInterpreter::Direct,
                }));
            }
            Some(EntryKind::File { executable: false }) => {
                tracing::warn!(
                    script = %shell.display(),
                    "deploy script is not executable; skipping (chmod +x to enable)"
                );
            }
            _ => {}
        }

        let python = root.join(format!("{stem}.py"));
        if let Some(EntryKind::File { .. }) = entry(lookup, &python)? {
            return Ok(Some(CustomScript {
                path: python,
                interpreter: ScriptInterpreter::Python,
            }));
        }
    }
    Ok(None)
}

/// `<root>/terraform` when it contains at least one Terraform file.
pub fn find_terraform<L: FileLookup + ?Sized>(
    lookup: &L,
    root: &Path,
) -> Result<Option<PathBuf>, ResolveError> {
    let dir = root.join(TERRAFORM_DIR);
    if entry(lookup, &dir)? != Some(EntryKind::Dir) {
        return Ok(None);
    }
    let names = lookup.children(&dir).map_err(|e| io_err(&dir, e))?;
    let has_config = names
        .iter()
        .any(|name| TERRAFORM_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)));
    if !has_config {
        tracing::debug!(dir = %dir.display(), "terraform directory has no .tf files; ignoring");
        return Ok(None);
    }
    Ok(Some(dir))
}

/// `<root>/ansible` with the first satisfied [`AnsibleLayout`].
pub fn find_ansible<L: FileLookup + ?Sized>(
    lookup: &L,
    root: &Path,
) -> Result<Option<AnsibleConfig>, ResolveError> {
    let dir = root.join(ANSIBLE_DIR);
    if entry(lookup, &dir)? != Some(EntryKind::Dir) {
        return Ok(None);
    }
    for layout in AnsibleLayout::ALL {
        let candidate = AnsibleConfig {
            dir: dir.clone(),
            layout,
        };
        if layout_satisfied(lookup, &candidate)? {
            return Ok(Some(candidate));
        }
    }
    tracing::debug!(dir = %dir.display(), "no suitable ansible configuration found");
    Ok(None)
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

fn compose(terraform: Option<PathBuf>, ansible: Option<AnsibleConfig>) -> DeploymentDescriptor {
    match (terraform, ansible) {
        (Some(terraform), Some(ansible)) => {
            DeploymentDescriptor::TerraformAnsible { terraform, ansible }
        }
        (Some(terraform), None) => DeploymentDescriptor::TerraformOnly { terraform },
        (None, Some(ansible)) => DeploymentDescriptor::AnsibleOnly { ansible },
        (None, None) => DeploymentDescriptor::NotFound,
    }
}

fn layout_satisfied<L: FileLookup + ?Sized>(
    lookup: &L,
    candidate: &AnsibleConfig,
) -> Result<bool, ResolveError> {
    if !matches!(
        entry(lookup, &candidate.playbook_path())?,
        Some(EntryKind::File { .. })
    ) {
        return Ok(false);
    }
    let inventory = entry(lookup, &candidate.inventory_path())?;
    Ok(match (candidate.layout.inventory_is_dir(), inventory) {
        (true, Some(EntryKind::Dir)) => true,
        (false, Some(EntryKind::File { .. })) => true,
        _ => false,
    })
}

fn entry<L: FileLookup + ?Sized>(lookup: &L, path: &Path) -> Result<Option<EntryKind>, ResolveError> {
    lookup.entry(path).map_err(|e| io_err(path, e))
}

// ---------------------------------------------------------------------------
// Unit tests (in-memory tree, no filesystem)
// ---------------------------------------------------------------------------
