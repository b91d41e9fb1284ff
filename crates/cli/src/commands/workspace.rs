use anyhow::{anyhow, Result};
use bisect_core::services::backends::{resolve_compiler_path, resolve_installer_path};
use bisect_core::workspace::{write_config, BisectConfig, WorkspaceContext, WorkspaceLayout};
use serde::Serialize;

use crate::canonicalize_or_current;
use crate::commands::{load_workspace, print_dir_status};

#[derive(Serialize)]
pub struct ConfigInfoSnapshot {
    pub root: String,
    pub config_file: String,
    pub installer: String,
    pub compiler: String,
    pub repository: String,
    pub layout: ConfigInfoLayout,
    pub config: BisectConfig,
}

#[derive(Serialize)]
pub struct ConfigInfoLayout {
    pub work_dir: String,
    pub cache_dir: String,
    pub reports_dir: String,
}

/// Write a default `bisect.yaml` and create the scratch directories.
pub fn init_command(root: &str, force: bool) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = WorkspaceLayout::new(&root_path);
    if layout.config_path.exists() && !force {
        return Err(anyhow!(
            "Config already exists at {} (rerun with --force to overwrite)",
            layout.config_path.display()
        ));
    }

    let config = BisectConfig::default();
    std::fs::create_dir_all(&layout.root)?;
    write_config(&layout.config_path, &config)?;
    let ws = WorkspaceContext { config_path: layout.config_path.clone(), layout, config };
    ws.ensure_dirs()?;

    println!("Initialized bisect workspace:");
    println!("  Root: {}", ws.layout.root.display());
    println!("  Config: {}", ws.config_path.display());
    println!("  Work dir: {}", ws.layout.work_dir.display());
    println!("  Reports dir: {}", ws.layout.reports_dir.display());
    println!("  Versions: {}", ws.config.versions.join(", "));

    Ok(())
}

/// Show the resolved configuration and layout.
pub fn config_info_command(root: &str, json: bool) -> Result<()> {
    let ws = load_workspace(root)?;
    let installer = resolve_installer_path(&ws.config).display().to_string();
    let compiler = resolve_compiler_path(&ws.config).display().to_string();
    let repository = ws.layout.repository_path(&ws.config).display().to_string();

    if json {
        let snapshot = ConfigInfoSnapshot {
            root: ws.layout.root.display().to_string(),
            config_file: ws.config_path.display().to_string(),
            installer,
            compiler,
            repository,
            layout: ConfigInfoLayout {
                work_dir: ws.layout.work_dir.display().to_string(),
                cache_dir: ws.layout.cache_dir.display().to_string(),
                reports_dir: ws.layout.reports_dir.display().to_string(),
            },
            config: ws.config,
        };
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("Bisect Workspace Info");
    println!("=====================");
    println!("Root: {}", ws.layout.root.display());
    println!("Config file: {}", ws.config_path.display());
    println!("Config version: {}", ws.config.config_version);
    println!("Versions: {}", ws.config.versions.join(", "));
    println!("Moving: {}", ws.config.moving.join(", "));
    println!("Installer: {}", installer);
    println!("Compiler: {}", compiler);
    println!("Repository: {} ({})", repository, ws.config.repository.url);
    println!("Linear threshold: {}", ws.config.search.linear_threshold);
    println!();
    println!("Directories:");
    print_dir_status("Work dir (.bisect)", &ws.layout.work_dir);
    print_dir_status("Cache dir", &ws.layout.cache_dir);
    print_dir_status("Reports dir", &ws.layout.reports_dir);
    if !ws.config.release_revisions.is_empty() {
        println!();
        println!("Release revisions:");
        for (tag, rev) in &ws.config.release_revisions {
            println!("- {tag}: #{rev}");
        }
    }

    Ok(())
}
