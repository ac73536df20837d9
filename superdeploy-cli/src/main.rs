//! SuperDeploy — deploy registered projects with their own scripts, Terraform
//! or Ansible.
//!
//! # Usage
//!
//! ```text
//! superdeploy list
//! superdeploy add <name>
//! superdeploy remove <name>
//! superdeploy deploy <name> [--plan-only | --infrastructure-only | --application-only] [--verbose]
//! superdeploy teardown <name> [--verbose]
//! superdeploy refresh <name> [--verbose]
//! superdeploy check <name> [--json]
//! superdeploy plan <name> [--verbose]
//! ```

mod commands;

use std::process::exit;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use commands::{
    check::CheckArgs,
    deploy::{DeployArgs, ProjectArgs},
    project::NameArgs,
    Workspace,
};
use superdeploy_core::{paths, settings::DEFAULT_LOG_RETENTION_DAYS, Settings};
use superdeploy_runner::logging;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "superdeploy",
    version,
    about = "Deploy registered projects through custom scripts, Terraform and Ansible",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List registered projects.
    List,

    /// Register a project.
    Add(NameArgs),

    /// Unregister a project. Its directory is left untouched.
    Remove(NameArgs),

    /// Deploy a project with the mechanism detected in its directory.
    Deploy(DeployArgs),

    /// Destroy a project's Terraform-managed infrastructure.
    Teardown(ProjectArgs),

    /// Tear down, then deploy again.
    Refresh(ProjectArgs),

    /// Show what deploy would run and whether the required tools are present.
    Check(CheckArgs),

    /// Deploy in plan mode: `terraform plan` and `ansible-playbook --check`.
    Plan(ProjectArgs),
}

impl Commands {
    fn verbose(&self) -> bool {
        match self {
            Commands::Deploy(args) => args.verbose,
            Commands::Teardown(args) | Commands::Refresh(args) | Commands::Plan(args) => {
                args.verbose
            }
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("{} {err:#}", "error:".red().bold());
        exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let root = paths::root().context("cannot locate the SuperDeploy home directory")?;
    let settings = Settings::load(&root);
    let retention = settings
        .as_ref()
        .map(|s| s.log_retention_days)
        .unwrap_or(DEFAULT_LOG_RETENTION_DAYS);
    logging::init(&paths::logs_dir_at(&root), cli.command.verbose(), retention);
    let settings = settings.context("failed to load configuration")?;

    let workspace = Workspace {
        root,
        settings,
        cancel: install_interrupt_handler()?,
    };

    match cli.command {
        Commands::List => commands::project::list(&workspace),
        Commands::Add(args) => commands::project::add(&workspace, args),
        Commands::Remove(args) => commands::project::remove(&workspace, args),
        Commands::Deploy(args) => args.run(&workspace),
        Commands::Teardown(args) => args.teardown(&workspace),
        Commands::Refresh(args) => args.refresh(&workspace),
        Commands::Check(args) => args.run(&workspace),
        Commands::Plan(args) => args.plan(&workspace),
    }
}

/// First Ctrl-C asks the running operation to stop after the current step;
/// a second one exits immediately.
fn install_interrupt_handler() -> Result<Arc<AtomicBool>> {
    let cancel = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&cancel);
    ctrlc::set_handler(move || {
        eprintln!();
        if handler_flag.swap(true, Ordering::SeqCst) {
            eprintln!("{}", "interrupted again, exiting".red().bold());
            exit(1);
        }
        eprintln!(
            "{}",
            "interrupted; stopping after the current step (Ctrl-C again to exit now)".yellow()
        );
    })
    .context("failed to install Ctrl-C handler")?;
    Ok(cancel)
}
