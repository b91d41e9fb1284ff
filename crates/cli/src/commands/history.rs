use anyhow::{anyhow, Context, Result};
use bisect_core::model::{RevisionId, ToolchainId};
use bisect_core::services::backends::GitHistory;
use bisect_core::services::{RevisionHistory, ToolchainContext};

use crate::commands::{load_workspace, switcher_for};

/// Print the revision an identifier resolves to.
///
/// Moving identifiers are activated to ask the toolchain what it was built from.
pub fn resolve_command(root: &str, identifier: &str) -> Result<()> {
    let ws = load_workspace(root)?;
    let id = ToolchainId::classify(identifier, &ws.config.moving);
    let switcher = switcher_for(&ws.config);
    let mut ctx = ToolchainContext::new(&switcher);
    let mut history = GitHistory::from_context(&ws);

    let revision = history
        .resolve(&mut ctx, &id)
        .ok_or_else(|| anyhow!("Could not resolve '{}' to a revision", id))?;
    println!("{} -> #{}", id, revision);
    Ok(())
}

/// List revisions after `from` up to and including `to`, newest first.
pub fn between_command(root: &str, from: &str, to: &str, json: bool) -> Result<()> {
    let ws = load_workspace(root)?;
    let history = GitHistory::from_context(&ws);
    let (old, new) = (RevisionId::new(from), RevisionId::new(to));
    let revisions = history
        .between(&old, &new)
        .with_context(|| format!("Failed to list revisions between {} and {}", old, new))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&revisions)?);
        return Ok(());
    }
    if revisions.is_empty() {
        println!("Revisions: (none)");
        return Ok(());
    }
    println!("Revisions ({}):", revisions.len());
    for rev in revisions {
        println!("- #{}", rev);
    }
    Ok(())
}

/// Check out a revision and print its metadata.
pub fn show_revision_command(root: &str, revision: &str, json: bool) -> Result<()> {
    let ws = load_workspace(root)?;
    let mut history = GitHistory::from_context(&ws);
    let rev = RevisionId::new(revision);
    let meta = history
        .metadata(&rev)
        .with_context(|| format!("Failed to read metadata for {}", rev))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&meta)?);
        return Ok(());
    }
    println!("Revision: #{}", meta.revision);
    println!("Author: {}", meta.author);
    println!("Date: {}", meta.timestamp);
    println!("Message:");
    for line in meta.message.lines() {
        println!("  {}", line);
    }
    println!("Files ({}):", meta.files.len());
    for file in &meta.files {
        println!("- {}", file);
    }
    Ok(())
}
