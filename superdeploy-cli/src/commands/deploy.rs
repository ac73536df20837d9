//! `superdeploy deploy`, `plan`, `teardown` and `refresh`.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use superdeploy_runner::{DeployOptions, DeployReport};

use super::Workspace;

/// Arguments for `superdeploy deploy`.
#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Registered project to deploy.
    pub name: String,

    /// Preview only: `terraform plan`, `ansible-playbook --check`.
    #[arg(long)]
    pub plan_only: bool,

    /// Run only the Terraform stage.
    #[arg(long)]
    pub infrastructure_only: bool,

    /// Run only the Ansible stage.
    #[arg(long)]
    pub application_only: bool,

    /// More output from the tools and from SuperDeploy itself.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl DeployArgs {
    pub fn run(self, ws: &Workspace) -> Result<()> {
        let opts = DeployOptions {
            plan_only: self.plan_only,
            infrastructure_only: self.infrastructure_only,
            application_only: self.application_only,
            verbose: self.verbose,
        };
        // Conflicting flags are reported before the registry is consulted.
        opts.validate()?;

        let project = ws.project(&self.name)?;
        let report = ws
            .dispatcher()
            .deploy(&project, &opts)
            .with_context(|| format!("deploy failed for '{}'", project.name))?;
        print_report(&report);
        Ok(())
    }
}

/// Arguments shared by `plan`, `teardown` and `refresh`.
#[derive(Args, Debug)]
pub struct ProjectArgs {
    /// Registered project name.
    pub name: String,

    /// More output from the tools and from SuperDeploy itself.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl ProjectArgs {
    fn options(&self) -> DeployOptions {
        DeployOptions {
            verbose: self.verbose,
            ..Default::default()
        }
    }

    pub fn plan(self, ws: &Workspace) -> Result<()> {
        let project = ws.project(&self.name)?;
        let report = ws
            .dispatcher()
            .plan(&project, &self.options())
            .with_context(|| format!("plan failed for '{}'", project.name))?;
        print_report(&report);
        Ok(())
    }

    pub fn teardown(self, ws: &Workspace) -> Result<()> {
        let project = ws.project(&self.name)?;
        let report = ws
            .dispatcher()
            .teardown(&project, &self.options())
            .with_context(|| format!("teardown failed for '{}'", project.name))?;
        print_report(&report);
        Ok(())
    }

    pub fn refresh(self, ws: &Workspace) -> Result<()> {
        let project = ws.project(&self.name)?;
        let report = ws
            .dispatcher()
            .refresh(&project, &self.options())
            .with_context(|| format!("refresh failed for '{}'", project.name))?;
        print_report(&report);
        Ok(())
    }
}

fn print_report(report: &DeployReport) {
    if report.noop {
        println!(
            "{} '{}' {}: no terraform/ configuration, nothing to do",
            "✓".green(),
            report.project,
            report.operation
        );
        return;
    }

    let via = report
        .descriptor
        .as_ref()
        .map(|d| format!(" via {d}"))
        .unwrap_or_default();
    println!(
        "{} '{}' {} succeeded{via} ({})",
        "✓".green(),
        report.project,
        report.operation,
        format_duration(report.duration_ms)
    );
    for step in &report.steps {
        println!(
            "  {}  {:<28} {}",
            "·".bright_black(),
            step.label,
            format_duration(step.duration_ms).bright_black()
        );
    }
}

fn format_duration(ms: u128) -> String {
    if ms < 1_000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1_000.0)
    } else {
        format!("{}m{:02}s", ms / 60_000, (ms % 60_000) / 1_000)
    }
}
