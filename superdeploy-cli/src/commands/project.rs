//! `superdeploy list`, `superdeploy add <name>` and `superdeploy remove <name>`

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use superdeploy_core::ProjectName;

use super::Workspace;

#[derive(Args, Debug)]
pub struct NameArgs {
    /// Project name (e.g. "payments", "alpha").
    pub name: String,
}

pub fn list(ws: &Workspace) -> Result<()> {
    let registry = ws.registry();
    let names = registry.list().context("failed to read the project registry")?;

    if names.is_empty() {
        println!("No projects registered.");
        println!("Run: superdeploy add <name>");
        return Ok(());
    }

    let projects_dir = ws.settings.projects_dir(&ws.root);
    for name in &names {
        let root = projects_dir.join(name.as_str());
        if root.is_dir() {
            println!("{name}");
        } else {
            println!("{name}  {}", "(directory missing)".yellow());
        }
    }
    Ok(())
}

pub fn add(ws: &Workspace, args: NameArgs) -> Result<()> {
    let name = ProjectName::parse(&args.name)?;
    ws.registry()
        .add(&name)
        .with_context(|| format!("failed to add '{name}'"))?;

    println!("{} Added '{name}'", "✓".green());
    let root = ws.settings.project_root(&ws.root, &name);
    if !root.is_dir() {
        println!(
            "  {} expected project directory {} does not exist yet",
            "!".yellow(),
            root.display()
        );
    }
    Ok(())
}

pub fn remove(ws: &Workspace, args: NameArgs) -> Result<()> {
    let name = ProjectName::parse(&args.name)?;
    ws.registry()
        .remove(&name)
        .with_context(|| format!("failed to remove '{name}'"))?;

    println!("{} Removed '{name}'", "✓".green());
    Ok(())
}
