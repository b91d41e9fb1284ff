use bisect_core::model::{BisectionOutcome, RevisionId, RevisionWindow};
use bisect_core::services::fakes::{MemoryHistory, ScriptedInstaller, ScriptedProbe};
use bisect_core::services::{BisectionSearch, SearchPhase, ToolchainContext, Verdict};

fn window(names: &[&str]) -> RevisionWindow {
    names.iter().map(RevisionId::new).collect()
}

fn key(name: &str) -> String {
    format!("#{name}")
}

#[test]
fn reports_element_preceding_first_pass() {
    let names = ["r5", "r4", "r3", "r2", "r1"];
    let probe = ScriptedProbe::new()
        .fail(key("r5"))
        .fail(key("r4"))
        .pass(key("r3"))
        .pass(key("r2"))
        .pass(key("r1"));
    let switcher = ScriptedInstaller::new().into_switcher();
    let mut ctx = ToolchainContext::new(&switcher);
    let mut history = MemoryHistory::new(&names);

    let report = BisectionSearch::default()
        .search(&mut ctx, &probe, &mut history, "x", &[], window(&names))
        .expect("search");

    assert_eq!(report.outcome.breaking_revision(), Some(&RevisionId::new("r4")));
    match &report.outcome {
        BisectionOutcome::Found { metadata, candidates, .. } => {
            assert_eq!(metadata.revision.as_str(), "r4");
            assert_eq!(candidates.len(), 5);
        }
        other => panic!("expected found, got {other:?}"),
    }
    // First success terminates the scan.
    assert_eq!(probe.runs(), vec![key("r5"), key("r4"), key("r3")]);
    assert_eq!(history.checked_out(), Some(&RevisionId::new("r4")));
}

#[test]
fn success_at_index_zero_reports_that_element() {
    let names = ["r3", "r2", "r1"];
    let probe = ScriptedProbe::new().default_pass(true);
    let switcher = ScriptedInstaller::new().into_switcher();
    let mut ctx = ToolchainContext::new(&switcher);
    let mut history = MemoryHistory::new(&names);

    let report = BisectionSearch::default()
        .search(&mut ctx, &probe, &mut history, "x", &[], window(&names))
        .unwrap();
    assert_eq!(report.outcome.breaking_revision(), Some(&RevisionId::new("r3")));
    assert_eq!(report.steps.len(), 1);
}

#[test]
fn no_passing_revision_returns_window_unmutated() {
    let names = ["r4", "r3", "r2", "r1"];
    let probe = ScriptedProbe::new().default_pass(false);
    let switcher = ScriptedInstaller::new().into_switcher();
    let mut ctx = ToolchainContext::new(&switcher);
    let mut history = MemoryHistory::new(&names);

    let report = BisectionSearch::default()
        .search(&mut ctx, &probe, &mut history, "x", &[], window(&names))
        .unwrap();
    assert_eq!(report.outcome, BisectionOutcome::NotFound { candidates: window(&names) });
    assert_eq!(report.steps.len(), 4);
    assert_eq!(history.metadata_calls(), 0);
}

#[test]
fn untestable_revisions_are_skipped_during_scan() {
    let names = ["r5", "r4", "r3", "r2"];
    let probe = ScriptedProbe::new().fail(key("r5")).pass(key("r3")).pass(key("r2"));
    let switcher = ScriptedInstaller::new().unavailable(key("r4")).into_switcher();
    let mut ctx = ToolchainContext::new(&switcher);
    let mut history = MemoryHistory::new(&names);

    let report = BisectionSearch::default()
        .search(&mut ctx, &probe, &mut history, "x", &[], window(&names))
        .unwrap();
    // r4 could not be built; the last probed failure is the boundary.
    assert_eq!(report.outcome.breaking_revision(), Some(&RevisionId::new("r5")));
    assert_eq!(report.steps[1].verdict, Verdict::Untestable);
    assert_eq!(probe.runs(), vec![key("r5"), key("r3")]);
}

#[test]
fn untestable_window_is_not_found() {
    let names = ["r2", "r1"];
    let probe = ScriptedProbe::new().default_pass(true);
    let switcher =
        ScriptedInstaller::new().unavailable(key("r2")).unavailable(key("r1")).into_switcher();
    let mut ctx = ToolchainContext::new(&switcher);
    let mut history = MemoryHistory::new(&names);

    let report = BisectionSearch::default()
        .search(&mut ctx, &probe, &mut history, "x", &[], window(&names))
        .unwrap();
    assert!(matches!(report.outcome, BisectionOutcome::NotFound { .. }));
    assert!(probe.runs().is_empty());
}

/// Window of `n` revisions where indices `[0, boundary)` fail and the rest pass.
fn monotonic(n: usize, boundary: usize) -> (Vec<String>, ScriptedProbe) {
    let names: Vec<String> = (0..n).map(|i| format!("c{:03}", n - i)).collect();
    let mut probe = ScriptedProbe::new();
    for (i, name) in names.iter().enumerate() {
        probe = if i < boundary { probe.fail(key(name)) } else { probe.pass(key(name)) };
    }
    (names, probe)
}

#[test]
fn halving_keeps_true_boundary_for_monotonic_windows() {
    for n in 11..=64 {
        for boundary in 1..n {
            let (names, probe) = monotonic(n, boundary);
            let switcher = ScriptedInstaller::new().into_switcher();
            let mut ctx = ToolchainContext::new(&switcher);
            let mut history = MemoryHistory::new(&names);
            let true_breaking = RevisionId::new(&names[boundary - 1]);

            let report = BisectionSearch::default()
                .search(
                    &mut ctx,
                    &probe,
                    &mut history,
                    "x",
                    &[],
                    names.iter().map(RevisionId::new).collect(),
                )
                .unwrap();

            let candidates = report.outcome.candidates();
            assert!(candidates.len() <= 10, "n={n} boundary={boundary}");
            assert!(
                candidates.iter().any(|r| r == &true_breaking),
                "n={n} boundary={boundary}: {candidates:?}"
            );
            if let Some(found) = report.outcome.breaking_revision() {
                assert_eq!(found, &true_breaking, "n={n} boundary={boundary}");
            }
        }
    }
}

#[test]
fn halving_uses_ceil_midpoint() {
    // 12 revisions, all failing except the oldest: pivot is index 6.
    let (names, probe) = monotonic(12, 11);
    let switcher = ScriptedInstaller::new().into_switcher();
    let mut ctx = ToolchainContext::new(&switcher);
    let mut history = MemoryHistory::new(&names);

    let report = BisectionSearch::default()
        .search(&mut ctx, &probe, &mut history, "x", &[], names.iter().map(RevisionId::new).collect())
        .unwrap();
    assert_eq!(report.steps[0].phase, SearchPhase::Halving);
    assert_eq!(report.steps[0].revision.as_str(), names[6]);
    assert_eq!(report.steps[0].verdict, Verdict::Fail);
    assert_eq!(report.steps[1].phase, SearchPhase::Linear);
    assert_eq!(report.outcome.breaking_revision(), Some(&RevisionId::new(&names[10])));
}

#[test]
fn untestable_pivot_is_dropped_and_halving_continues() {
    let (names, probe) = monotonic(20, 15);
    let switcher = ScriptedInstaller::new().unavailable(key(&names[10])).into_switcher();
    let mut ctx = ToolchainContext::new(&switcher);
    let mut history = MemoryHistory::new(&names);

    let report = BisectionSearch::default()
        .search(&mut ctx, &probe, &mut history, "x", &[], names.iter().map(RevisionId::new).collect())
        .unwrap();
    assert_eq!(report.steps[0].verdict, Verdict::Untestable);
    // The neighbour becomes the next pivot.
    assert_eq!(report.steps[1].phase, SearchPhase::Halving);
    assert_eq!(report.steps[1].revision.as_str(), names[11]);
    assert_eq!(report.steps[1].verdict, Verdict::Fail);
    assert!(report.outcome.candidates().len() <= 10);
    assert!(report.outcome.candidates().iter().all(|r| r.as_str() != names[10]));
    assert_eq!(report.outcome.breaking_revision(), Some(&RevisionId::new(&names[14])));
}

#[test]
fn untestable_pivot_in_large_window_keeps_search_logarithmic() {
    let (names, probe) = monotonic(2000, 1990);
    let switcher = ScriptedInstaller::new().unavailable(key(&names[1000])).into_switcher();
    let mut ctx = ToolchainContext::new(&switcher);
    let mut history = MemoryHistory::new(&names);

    let report = BisectionSearch::default()
        .search(&mut ctx, &probe, &mut history, "x", &[], names.iter().map(RevisionId::new).collect())
        .unwrap();
    assert_eq!(report.steps[0].revision.as_str(), names[1000]);
    assert_eq!(report.steps[0].verdict, Verdict::Untestable);
    assert!(report.outcome.candidates().len() <= 10, "{:?}", report.outcome.candidates());
    assert!(probe.runs().len() <= 25, "probed {} revisions", probe.runs().len());
    assert!(ctx.activations() <= 26);
    assert_eq!(report.outcome.breaking_revision(), Some(&RevisionId::new(&names[1989])));
}

#[test]
fn all_untestable_pivots_shrink_window_to_threshold() {
    let names: Vec<String> = (0..14).map(|i| format!("u{:02}", 14 - i)).collect();
    let mut installer = ScriptedInstaller::new();
    for name in &names {
        installer = installer.unavailable(key(name));
    }
    let switcher = installer.into_switcher();
    let probe = ScriptedProbe::new().default_pass(true);
    let mut ctx = ToolchainContext::new(&switcher);
    let mut history = MemoryHistory::new(&names);

    let report = BisectionSearch::default()
        .search(&mut ctx, &probe, &mut history, "x", &[], names.iter().map(RevisionId::new).collect())
        .unwrap();
    assert!(matches!(report.outcome, BisectionOutcome::NotFound { .. }));
    assert_eq!(report.outcome.candidates().len(), 10);
    assert!(probe.runs().is_empty());
}

#[test]
fn custom_threshold_controls_halving() {
    let (names, probe) = monotonic(8, 3);
    let switcher = ScriptedInstaller::new().into_switcher();
    let mut ctx = ToolchainContext::new(&switcher);
    let mut history = MemoryHistory::new(&names);

    let report = BisectionSearch::new(2)
        .search(&mut ctx, &probe, &mut history, "x", &[], names.iter().map(RevisionId::new).collect())
        .unwrap();
    assert!(report.outcome.candidates().len() <= 2);
    assert!(report.steps.iter().any(|s| s.phase == SearchPhase::Halving));
}
