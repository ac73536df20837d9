//! `superdeploy check` — what `deploy` would do, without running it.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use superdeploy_core::{DeploymentDescriptor, ProjectName};
use superdeploy_runner::{dispatch::ToolStatus, CheckReport, Step};

use super::Workspace;

/// Arguments for `superdeploy check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Registered project name.
    pub name: String,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl CheckArgs {
    pub fn run(self, ws: &Workspace) -> Result<()> {
        let project = ws.project(&self.name)?;
        let report = ws
            .dispatcher()
            .check(&project)
            .with_context(|| format!("check failed for '{}'", project.name))?;

        if self.json {
            print_json(&report)?;
        } else {
            print_table(&report);
        }

        if !report.descriptor.is_found() {
            bail!("no deployable structure for '{}'", report.project);
        }
        let missing: Vec<&str> = report.missing_tools().collect();
        if !missing.is_empty() {
            bail!("missing tools for '{}': {}", report.project, missing.join(", "));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct CheckJson<'a> {
    project: &'a ProjectName,
    root: &'a PathBuf,
    descriptor: &'a DeploymentDescriptor,
    deploy: Vec<String>,
    teardown: Vec<String>,
    tools: &'a [ToolStatus],
}

#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "stage")]
    stage: String,
    #[tabled(rename = "step")]
    label: String,
    #[tabled(rename = "command")]
    command: String,
}

#[derive(Tabled)]
struct ToolRow {
    #[tabled(rename = "tool")]
    tool: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "path")]
    path: String,
}

fn command_lines(steps: &[Step]) -> Vec<String> {
    steps.iter().map(|s| s.invocation.command_line()).collect()
}

fn print_json(report: &CheckReport) -> Result<()> {
    let payload = CheckJson {
        project: &report.project,
        root: &report.root,
        descriptor: &report.descriptor,
        deploy: command_lines(&report.deploy),
        teardown: command_lines(&report.teardown),
        tools: &report.tools,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize check JSON")?
    );
    Ok(())
}

fn print_table(report: &CheckReport) {
    println!("{} {}", "Project:".bold(), report.project);
    println!("{} {}", "Directory:".bold(), report.root.display());
    let mechanism = if report.descriptor.is_found() {
        report.descriptor.to_string().green()
    } else {
        report.descriptor.to_string().red()
    };
    println!("{} {mechanism}", "Mechanism:".bold());

    print_steps("deploy", &report.deploy);
    if report.teardown.is_empty() {
        println!("\n{} nothing to tear down (no terraform/)", "teardown:".bold());
    } else {
        print_steps("teardown", &report.teardown);
    }

    if report.tools.is_empty() {
        return;
    }
    let rows: Vec<ToolRow> = report
        .tools
        .iter()
        .map(|t| ToolRow {
            tool: t.tool.clone(),
            status: match t.path {
                Some(_) => "found".green().to_string(),
                None => "MISSING".red().bold().to_string(),
            },
            path: t
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("\n{table}");
}

fn print_steps(title: &str, steps: &[Step]) {
    if steps.is_empty() {
        return;
    }
    let rows: Vec<StepRow> = steps
        .iter()
        .map(|s| StepRow {
            stage: format!("{:?}", s.stage).to_lowercase(),
            label: s.label.clone(),
            command: s.invocation.command_line(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("\n{}\n{table}", format!("{title}:").bold());
}
