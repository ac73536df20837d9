//! Project-scoped operations: `check`, `deploy`, `plan`, `teardown`, `refresh`.
//!
//! Every operation resolves the project directory afresh, builds its full
//! step list, checks that every required tool exists, and only then runs the
//! steps in order, stopping at the first failure.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use superdeploy_core::{
    DeploymentDescriptor, ProjectName, ProjectRegistry, RegistryStore, Settings,
};
use superdeploy_resolver::{find_terraform, resolve, FsLookup};

use crate::error::DispatchError;
use crate::options::DeployOptions;
use crate::process::ProcessRunner;
use crate::steps::{deploy_steps, teardown_steps, Step};
use crate::tools::{ensure_available, ToolLocator};

// ---------------------------------------------------------------------------
// Project lookup
// ---------------------------------------------------------------------------

/// A registered project whose checkout exists on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub name: ProjectName,
    pub root: PathBuf,
}

impl Project {
    /// Confirm registry membership, then confirm the directory exists.
    ///
    /// `NotRegistered` and `DirectoryMissing` are kept distinct.
    pub fn locate<S: RegistryStore>(
        registry: &ProjectRegistry<S>,
        settings: &Settings,
        superdeploy_root: &Path,
        name: &ProjectName,
    ) -> Result<Self, DispatchError> {
        registry.require(name)?;
        let root = settings.project_root(superdeploy_root, name);
        match std::fs::metadata(&root) {
            Ok(meta) if meta.is_dir() => Ok(Self {
                name: name.clone(),
                root,
            }),
            Ok(_) => Err(DispatchError::DirectoryMissing {
                project: name.clone(),
                path: root,
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(DispatchError::DirectoryMissing {
                    project: name.clone(),
                    path: root,
                })
            }
            Err(source) => Err(DispatchError::Io { path: root, source }),
        }
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Deploy,
    Plan,
    Teardown,
    Refresh,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Deploy => write!(f, "deploy"),
            Operation::Plan => write!(f, "plan"),
            Operation::Teardown => write!(f, "teardown"),
            Operation::Refresh => write!(f, "refresh"),
        }
    }
}

/// One executed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub label: String,
    pub command: String,
    pub code: i32,
    pub duration_ms: u128,
}

/// Summary of a successful operation.
#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    pub project: ProjectName,
    pub operation: Operation,
    /// `None` for `teardown`, which only looks at `terraform/`.
    pub descriptor: Option<DeploymentDescriptor>,
    pub steps: Vec<StepRecord>,
    /// `true` when there was nothing to do (teardown without Terraform).
    pub noop: bool,
    pub duration_ms: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolStatus {
    pub tool: String,
    pub path: Option<PathBuf>,
}

/// What `deploy` and `teardown` would do, without running anything.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub project: ProjectName,
    pub root: PathBuf,
    pub descriptor: DeploymentDescriptor,
    pub deploy: Vec<Step>,
    pub teardown: Vec<Step>,
    pub tools: Vec<ToolStatus>,
}

impl CheckReport {
    pub fn missing_tools(&self) -> impl Iterator<Item = &str> {
        self.tools
            .iter()
            .filter(|t| t.path.is_none())
            .map(|t| t.tool.as_str())
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Lines of a failed step's stderr repeated in the failure log record.
const STDERR_TAIL_LINES: usize = 20;

pub struct Dispatcher<R, L> {
    runner: R,
    locator: L,
    settings: Settings,
    cancel: Option<Arc<AtomicBool>>,
}

impl<R: ProcessRunner, L: ToolLocator> Dispatcher<R, L> {
    pub fn new(runner: R, locator: L, settings: Settings) -> Self {
        Self {
            runner,
            locator,
            settings,
            cancel: None,
        }
    }

    /// Once `flag` is set (Ctrl-C), the operation ends as `Interrupted` when the
    /// current step returns, whatever its exit code.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn check(&self, project: &Project) -> Result<CheckReport, DispatchError> {
        let descriptor = resolve(&project.root)?;
        let deploy = if descriptor.is_found() {
            deploy_steps(
                &project.name,
                &project.root,
                &descriptor,
                &DeployOptions::default(),
                &self.settings,
            )?
        } else {
            Vec::new()
        };
        let teardown = self.teardown_plan(project)?;

        let mut tools: Vec<ToolStatus> = Vec::new();
        for tool in deploy.iter().chain(&teardown).filter_map(|s| s.tool.as_deref()) {
            if tools.iter().any(|t| t.tool == tool) {
                continue;
            }
            tools.push(ToolStatus {
                tool: tool.to_string(),
                path: self.locator.locate(tool),
            });
        }

        Ok(CheckReport {
            project: project.name.clone(),
            root: project.root.clone(),
            descriptor,
            deploy,
            teardown,
            tools,
        })
    }

    pub fn deploy(
        &self,
        project: &Project,
        opts: &DeployOptions,
    ) -> Result<DeployReport, DispatchError> {
        self.run_deploy(project, opts, Operation::Deploy)
    }

    /// `deploy` with `--plan-only` forced on.
    pub fn plan(
        &self,
        project: &Project,
        opts: &DeployOptions,
    ) -> Result<DeployReport, DispatchError> {
        self.run_deploy(project, &opts.planning(), Operation::Plan)
    }

    /// `terraform destroy`. A project without Terraform is a no-op success.
    pub fn teardown(
        &self,
        project: &Project,
        opts: &DeployOptions,
    ) -> Result<DeployReport, DispatchError> {
        opts.validate()?;
        let started = Instant::now();
        let steps = self.teardown_plan(project)?;
        if steps.is_empty() {
            tracing::info!(project = %project.name, "no terraform/ configuration; nothing to tear down");
            return Ok(DeployReport {
                project: project.name.clone(),
                operation: Operation::Teardown,
                descriptor: None,
                steps: Vec::new(),
                noop: true,
                duration_ms: started.elapsed().as_millis(),
            });
        }

        ensure_available(&self.locator, &steps)?;
        let mut records = Vec::new();
        self.execute(&steps, &mut records)?;
        Ok(DeployReport {
            project: project.name.clone(),
            operation: Operation::Teardown,
            descriptor: None,
            steps: records,
            noop: false,
            duration_ms: started.elapsed().as_millis(),
        })
    }

    /// `teardown` then `deploy`. Both step lists are built and their tools
    /// checked up front; a teardown failure ends the operation before deploy.
    pub fn refresh(
        &self,
        project: &Project,
        opts: &DeployOptions,
    ) -> Result<DeployReport, DispatchError> {
        opts.validate()?;
        let started = Instant::now();

        let teardown = self.teardown_plan(project)?;
        let descriptor = resolve(&project.root)?;
        let deploy = deploy_steps(&project.name, &project.root, &descriptor, opts, &self.settings)?;

        let all: Vec<Step> = teardown.iter().chain(&deploy).cloned().collect();
        ensure_available(&self.locator, &all)?;

        let mut records = Vec::new();
        if teardown.is_empty() {
            tracing::info!(project = %project.name, "no terraform/ configuration; skipping teardown");
        }
        self.execute(&teardown, &mut records)?;
        self.execute(&deploy, &mut records)?;

        Ok(DeployReport {
            project: project.name.clone(),
            operation: Operation::Refresh,
            descriptor: Some(descriptor),
            steps: records,
            noop: false,
            duration_ms: started.elapsed().as_millis(),
        })
    }

    fn run_deploy(
        &self,
        project: &Project,
        opts: &DeployOptions,
        operation: Operation,
    ) -> Result<DeployReport, DispatchError> {
        opts.validate()?;
        let started = Instant::now();

        let descriptor = resolve(&project.root)?;
        tracing::info!(project = %project.name, mechanism = %descriptor, "resolved deployment");
        let steps = deploy_steps(&project.name, &project.root, &descriptor, opts, &self.settings)?;
        ensure_available(&self.locator, &steps)?;

        let mut records = Vec::new();
        self.execute(&steps, &mut records)?;

        Ok(DeployReport {
            project: project.name.clone(),
            operation,
            descriptor: Some(descriptor),
            steps: records,
            noop: false,
            duration_ms: started.elapsed().as_millis(),
        })
    }

    /// Teardown looks for `terraform/` directly, independent of custom scripts.
    fn teardown_plan(&self, project: &Project) -> Result<Vec<Step>, DispatchError> {
        Ok(find_terraform(&FsLookup, &project.root)?
            .map(|dir| teardown_steps(&dir, &self.settings))
            .unwrap_or_default())
    }

    fn execute(&self, steps: &[Step], records: &mut Vec<StepRecord>) -> Result<(), DispatchError> {
        for step in steps {
            if self.cancelled() {
                return Err(DispatchError::Interrupted {
                    step: step.label.clone(),
                });
            }

            tracing::info!(step = %step.label, command = %step.invocation, "running");
            let started = Instant::now();
            let output = self.runner.run(&step.invocation)?;
            let duration_ms = started.elapsed().as_millis();
            records.push(StepRecord {
                label: step.label.clone(),
                command: step.invocation.command_line(),
                code: output.code,
                duration_ms,
            });

            // A step that exits 0 after Ctrl-C still ends the operation.
            if self.cancelled() {
                tracing::warn!(step = %step.label, code = output.code, "interrupted");
                return Err(DispatchError::Interrupted {
                    step: step.label.clone(),
                });
            }
            if !output.success() {
                tracing::error!(
                    step = %step.label,
                    code = output.code,
                    stderr = %output.stderr_tail(STDERR_TAIL_LINES),
                    "step failed"
                );
                return Err(DispatchError::SubprocessFailure {
                    step: step.label.clone(),
                    command: step.invocation.command_line(),
                    code: output.code,
                });
            }
            tracing::info!(step = %step.label, duration_ms, "step completed");
        }
        Ok(())
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}
