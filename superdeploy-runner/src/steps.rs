//! Translating a resolved descriptor into the concrete commands to run.
//!
//! Step construction is pure: `check` uses it to show what `deploy` would do,
//! and the dispatcher uses the same lists to check tools before running.

use std::path::Path;

use serde::Serialize;
use superdeploy_core::{
    types::{AnsibleConfig, CustomScript, DeploymentDescriptor, ScriptInterpreter},
    ProjectName, Settings,
};

use crate::error::DispatchError;
use crate::options::DeployOptions;
use crate::process::Invocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Script,
    Infrastructure,
    Application,
    Teardown,
}

/// One command in an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub stage: Stage,
    pub label: String,
    /// Binary that must be on `PATH`; `None` for directly executed scripts.
    pub tool: Option<String>,
    pub invocation: Invocation,
}

/// Steps for `deploy` (and `plan`, with `opts.plan_only`).
pub fn deploy_steps(
    project: &ProjectName,
    root: &Path,
    descriptor: &DeploymentDescriptor,
    opts: &DeployOptions,
    settings: &Settings,
) -> Result<Vec<Step>, DispatchError> {
    if let DeploymentDescriptor::CustomScript(script) = descriptor {
        return Ok(vec![script_step(project, root, script, opts, settings)]);
    }
    if !descriptor.is_found() {
        return Err(DispatchError::NoDeployableStructure {
            project: project.clone(),
            path: root.to_path_buf(),
        });
    }

    let mut steps = Vec::new();
    if opts.runs_infrastructure() {
        if let Some(dir) = descriptor.terraform_dir() {
            steps.push(terraform_init(dir, settings));
            steps.push(if opts.plan_only {
                terraform_plan(dir, settings)
            } else {
                terraform_apply(dir, settings)
            });
        }
    }
    if opts.runs_application() {
        if let Some(ansible) = descriptor.ansible() {
            steps.push(ansible_playbook(ansible, opts, settings));
        }
    }

    if steps.is_empty() {
        let reason = if opts.application_only {
            "--application-only was given but no ansible configuration was found"
        } else {
            "--infrastructure-only was given but no terraform/ configuration was found"
        };
        return Err(DispatchError::NothingToRun {
            project: project.clone(),
            reason: reason.to_string(),
        });
    }
    Ok(steps)
}

/// Steps for `teardown` against a Terraform directory.
pub fn teardown_steps(terraform_dir: &Path, settings: &Settings) -> Vec<Step> {
    vec![
        terraform_init(terraform_dir, settings),
        Step {
            stage: Stage::Teardown,
            label: "terraform destroy".to_string(),
            tool: Some(settings.terraform_bin.clone()),
            invocation: Invocation::new(&settings.terraform_bin, terraform_dir).args([
                "destroy",
                "-input=false",
                "-auto-approve",
            ]),
        },
    ]
}

fn script_step(
    project: &ProjectName,
    root: &Path,
    script: &CustomScript,
    opts: &DeployOptions,
    settings: &Settings,
) -> Step {
    let path = script.path.to_string_lossy().into_owned();
    let args = opts.script_args(project.as_str());
    let (tool, invocation) = match script.interpreter {
        ScriptInterpreter::Direct => (None, Invocation::new(path, root).args(args)),
        ScriptInterpreter::Python => (
            Some(settings.python_bin.clone()),
            Invocation::new(&settings.python_bin, root).arg(path).args(args),
        ),
    };
    let file_name = script
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "deploy script".to_string());
    Step {
        stage: Stage::Script,
        label: file_name,
        tool,
        invocation,
    }
}

fn terraform_init(dir: &Path, settings: &Settings) -> Step {
    Step {
        stage: Stage::Infrastructure,
        label: "terraform init".to_string(),
        tool: Some(settings.terraform_bin.clone()),
        invocation: Invocation::new(&settings.terraform_bin, dir).args(["init", "-input=false"]),
    }
}

fn terraform_plan(dir: &Path, settings: &Settings) -> Step {
    Step {
        stage: Stage::Infrastructure,
        label: "terraform plan".to_string(),
        tool: Some(settings.terraform_bin.clone()),
        invocation: Invocation::new(&settings.terraform_bin, dir).args(["plan", "-input=false"]),
    }
}

fn terraform_apply(dir: &Path, settings: &Settings) -> Step {
    Step {
        stage: Stage::Infrastructure,
        label: "terraform apply".to_string(),
        tool: Some(settings.terraform_bin.clone()),
        invocation: Invocation::new(&settings.terraform_bin, dir).args([
            "apply",
            "-input=false",
            "-auto-approve",
        ]),
    }
}

fn ansible_playbook(ansible: &AnsibleConfig, opts: &DeployOptions, settings: &Settings) -> Step {
    let playbook = ansible.layout.playbook();
    let mut invocation = Invocation::new(&settings.ansible_playbook_bin, &ansible.dir)
        .args(["-i", ansible.layout.inventory(), playbook]);
    if opts.plan_only {
        invocation = invocation.arg("--check");
    }
    if opts.verbose {
        invocation = invocation.arg("-v");
    }
    Step {
        stage: Stage::Application,
        label: format!("ansible-playbook {playbook}"),
        tool: Some(settings.ansible_playbook_bin.clone()),
        invocation,
    }
}
