use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use bisect_core::model::{BisectionOutcome, ToolchainId};
use bisect_core::services::backends::{CommandProbe, GitHistory};
use bisect_core::services::{
    BisectReport, BisectStatus, BisectionSearch, Bisector, MatrixReport, SkipReason,
    ToolchainContext, VersionOutcome,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::commands::{identifiers, load_workspace, read_snippet, switcher_for};

/// Inputs shared by `matrix` and `run`.
#[derive(Debug, Clone, Default)]
pub struct ProbeArgs {
    pub snippet: String,
    /// Overrides the configured version list when non-empty.
    pub versions: Vec<String>,
    /// Passed to the compiler ahead of the configured flags.
    pub extra_args: Vec<String>,
    pub json: bool,
}

/// Everything recorded about one `run`, written as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub snippet: String,
    pub snippet_sha256: String,
    pub identifiers: Vec<ToolchainId>,
    pub extra_args: Vec<String>,
    pub started_at: String,
    pub finished_at: String,
    pub activations: u64,
    pub revisions_considered: usize,
    pub result: BisectReport,
}

/// Probe the snippet under every identifier and print the matrix.
pub fn matrix_command(root: &str, args: &ProbeArgs) -> Result<()> {
    let ws = load_workspace(root)?;
    ws.ensure_dirs()?;
    let snippet = read_snippet(&args.snippet)?;
    let ids = identifiers(&ws.config, &args.versions)?;

    let switcher = switcher_for(&ws.config);
    let mut ctx = ToolchainContext::new(&switcher);
    let probe = CommandProbe::from_context(&ws);
    let mut history = GitHistory::from_context(&ws);
    let bisector = Bisector::new(&probe, &mut history);
    let matrix = bisector
        .matrix(&mut ctx, &ids, &snippet.text, &args.extra_args)
        .context("Version matrix failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&matrix)?);
        return Ok(());
    }
    print_matrix(&matrix);
    Ok(())
}

/// Full pipeline: matrix, boundary resolution and commit search.
pub fn run_command(root: &str, args: &ProbeArgs, report: Option<&str>) -> Result<()> {
    let ws = load_workspace(root)?;
    ws.ensure_dirs()?;
    let snippet = read_snippet(&args.snippet)?;
    let ids = identifiers(&ws.config, &args.versions)?;

    let started_at = Utc::now().to_rfc3339();
    let switcher = switcher_for(&ws.config);
    let mut ctx = ToolchainContext::new(&switcher);
    let probe = CommandProbe::from_context(&ws);
    let mut history = GitHistory::from_context(&ws);
    let result = Bisector::new(&probe, &mut history)
        .with_search(BisectionSearch::new(ws.config.search.linear_threshold))
        .bisect(&mut ctx, &ids, &snippet.text, &args.extra_args)
        .context("Bisect run failed")?;

    let run = RunReport {
        snippet: args.snippet.clone(),
        snippet_sha256: snippet.sha256,
        identifiers: ids,
        extra_args: args.extra_args.clone(),
        started_at,
        finished_at: Utc::now().to_rfc3339(),
        activations: ctx.activations(),
        revisions_considered: result.revisions_considered(),
        result,
    };

    let report_path = match report {
        Some(path) => ws.layout.resolve(path),
        None => ws
            .layout
            .reports_dir
            .join(format!("run-{}.json", Utc::now().format("%Y%m%dT%H%M%S%.3fZ"))),
    };
    write_run_report(&report_path, &run)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&run)?);
        return Ok(());
    }
    print_matrix(&run.result.matrix);
    println!();
    print_status(&run.result.status);
    println!();
    println!("Revisions considered: {}", run.revisions_considered);
    println!("Report: {}", report_path.display());
    Ok(())
}

fn write_run_report(path: &Path, run: &RunReport) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create report dir {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(run)?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write bisect report {}", path.display()))
}

fn print_matrix(matrix: &MatrixReport) {
    println!("Version matrix:");
    for entry in &matrix.results {
        match &entry.outcome {
            VersionOutcome::Probed { result } => println!(
                "- {}: {} ({} ms, {} bytes)",
                entry.identifier,
                if result.success { "PASS" } else { "FAIL" },
                result.duration_ms,
                result.artifact_size_bytes
            ),
            VersionOutcome::Unavailable { attempts, last_error } => println!(
                "- {}: UNAVAILABLE after {} attempts ({})",
                entry.identifier, attempts, last_error
            ),
        }
    }
    match matrix.regression_window() {
        Some((works, fails)) => println!("Regression window: works {} / fails {}", works, fails),
        None => println!("Regression window: none"),
    }
}

fn print_status(status: &BisectStatus) {
    match status {
        BisectStatus::Skipped { skip } => {
            let reason = match skip {
                SkipReason::NoRegressionWindow => "no passing/failing pair".to_string(),
                SkipReason::ResolutionFailed { identifier } => {
                    format!("could not resolve {} to a revision", identifier)
                }
                SkipReason::EmptyWindow { works, fails } => {
                    format!("no revisions between #{} and #{}", works, fails)
                }
                SkipReason::HistoryUnavailable { message } => {
                    format!("history unavailable: {}", message)
                }
            };
            println!("Commit search skipped: {}", reason);
        }
        BisectStatus::Searched { works, fails, search } => {
            println!("Searched #{}..#{} ({} probes)", works, fails, search.steps.len());
            match &search.outcome {
                BisectionOutcome::Found { revision, metadata, .. } => {
                    println!("Breaking revision: #{}", revision);
                    println!("  Author: {}", metadata.author);
                    println!("  Date: {}", metadata.timestamp);
                    println!("  Message: {}", metadata.message.lines().next().unwrap_or(""));
                    if !metadata.files.is_empty() {
                        println!("  Files:");
                        for file in &metadata.files {
                            println!("    - {}", file);
                        }
                    }
                }
                BisectionOutcome::NotFound { candidates } => {
                    println!("Inconclusive: {} candidate revisions remain", candidates.len());
                }
            }
        }
    }
}
