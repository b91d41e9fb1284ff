use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

use bisect_core::model::{RevisionId, ToolchainId};
use bisect_core::services::backends::GitHistory;
use bisect_core::services::fakes::ScriptedInstaller;
use bisect_core::services::{HistoryError, RevisionHistory, ToolchainContext};

fn git(repo: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git")
        .args(["-c", "user.name=Test Author", "-c", "user.email=test@example.com"])
        .args(args)
        .current_dir(repo)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Build a repo with `count` commits, each touching `file{i}.nim`. Returns
/// short hashes oldest first, or `None` when git is unavailable.
fn build_repo(repo: &Path, count: usize) -> Option<Vec<String>> {
    git(repo, &["init", "--quiet"])?;
    let mut hashes = Vec::new();
    for i in 0..count {
        std::fs::write(repo.join(format!("file{i}.nim")), format!("echo {i}\n")).unwrap();
        git(repo, &["add", "."])?;
        git(repo, &["commit", "--quiet", "-m", &format!("commit number {i}")])?;
        hashes.push(git(repo, &["rev-parse", "--short", "HEAD"])?);
    }
    if hashes.len() > 1 {
        git(repo, &["tag", "v0.9.0", &hashes[1]])?;
    }
    Some(hashes)
}

#[test]
fn between_lists_newest_first_and_metadata_moves_checkout() {
    let temp = tempfile::tempdir().unwrap();
    let Some(hashes) = build_repo(temp.path(), 5) else {
        return; // Skip if git is not installed or failed
    };
    let mut history = GitHistory::new(temp.path(), BTreeMap::new());

    let old = RevisionId::new(&hashes[0]);
    let new = RevisionId::new(&hashes[4]);
    let between = history.between(&old, &new).expect("between");
    let expected: Vec<RevisionId> = hashes[1..].iter().rev().map(RevisionId::new).collect();
    assert_eq!(between, expected);

    let meta = history.metadata(&RevisionId::new(&hashes[2])).expect("metadata");
    assert_eq!(meta.author, "Test Author");
    assert_eq!(meta.message, "commit number 2");
    assert_eq!(meta.files, vec!["file2.nim".to_string()]);
    assert!(meta.timestamp.contains('T'));

    let head = git(temp.path(), &["rev-parse", "--short", "HEAD"]).unwrap();
    assert_eq!(RevisionId::new(head), RevisionId::new(&hashes[2]));
}

#[test]
fn metadata_reads_root_commit_files() {
    let temp = tempfile::tempdir().unwrap();
    let Some(hashes) = build_repo(temp.path(), 1) else {
        return;
    };
    let mut history = GitHistory::new(temp.path(), BTreeMap::new());
    let meta = history.metadata(&RevisionId::new(&hashes[0])).expect("metadata");
    assert_eq!(meta.files, vec!["file0.nim".to_string()]);
}

#[test]
fn unknown_revision_is_reported() {
    let temp = tempfile::tempdir().unwrap();
    if build_repo(temp.path(), 2).is_none() {
        return;
    }
    let mut history = GitHistory::new(temp.path(), BTreeMap::new());
    let err = history.metadata(&RevisionId::new("0000000")).unwrap_err();
    assert!(matches!(err, HistoryError::UnknownRevision(_)));
}

#[test]
fn resolve_prefers_frozen_table_then_tags() {
    let temp = tempfile::tempdir().unwrap();
    let Some(hashes) = build_repo(temp.path(), 3) else {
        return;
    };
    let mut releases = BTreeMap::new();
    releases.insert("1.0.0".to_string(), RevisionId::new("f7a8fc4"));
    let mut history = GitHistory::new(temp.path(), releases);

    let switcher = ScriptedInstaller::new().into_switcher();
    let mut ctx = ToolchainContext::new(&switcher);

    let table = history.resolve(&mut ctx, &ToolchainId::Release("1.0.0".into()));
    assert_eq!(table, Some(RevisionId::new("f7a8fc4")));

    let tagged = history.resolve(&mut ctx, &ToolchainId::Release("0.9.0".into()));
    assert_eq!(tagged, Some(RevisionId::new(&hashes[1])));

    let missing = history.resolve(&mut ctx, &ToolchainId::Release("9.9.9".into()));
    assert_eq!(missing, None);
    assert!(switcher.installer().attempts().is_empty());
}

#[test]
fn ensure_checkout_is_noop_for_existing_repo() {
    let temp = tempfile::tempdir().unwrap();
    let history = GitHistory::new(temp.path(), BTreeMap::new());
    history.ensure_checkout().expect("existing path is left alone");
}
