#![cfg(unix)]

use bisect_core::model::{RevisionId, Target, ToolchainId};
use bisect_core::services::backends::{CommandInstaller, CommandProbe};
use bisect_core::services::{
    Probe, RetryingSwitcher, SelectOutcome, ToolchainContext, ToolchainSwitcher,
};
use bisect_core::workspace::{BisectConfig, WorkspaceContext, WorkspaceLayout};

fn shell_workspace(root: &std::path::Path) -> WorkspaceContext {
    let mut config = BisectConfig::default();
    config.compiler.program = "sh".into();
    config.compiler.flags = vec!["{source}".into(), "{out}".into()];
    config.compiler.source_file = "probe.sh".into();
    config.compiler.artifact_file = "probe.out".into();
    let layout = WorkspaceLayout::new(root);
    WorkspaceContext { config_path: layout.config_path.clone(), layout, config }
}

fn shell_installer(script: &str) -> CommandInstaller {
    let mut config = BisectConfig::default();
    config.installer.program = "sh".into();
    config.installer.args = vec!["-c".into(), script.into(), "installer".into()];
    config.compiler.program = "sh".into();
    config.compiler.version_args =
        vec!["-c".into(), "echo 'Nim Compiler Version 2.1.1'; echo 'git hash: ABCDEF1'".into()];
    let mut installer = CommandInstaller::from_config(&config);
    // Keep the tests independent of BISECT_INSTALLER/BISECT_COMPILER in the environment.
    installer.program = "sh".into();
    installer.compiler = "sh".into();
    installer
}

#[test]
fn probe_captures_success_output_and_artifact() {
    let temp = tempfile::tempdir().unwrap();
    let ws = shell_workspace(temp.path());
    let mut probe = CommandProbe::from_context(&ws);
    probe.program = "sh".into();

    let installer = shell_installer("exit 0");
    let switcher = RetryingSwitcher::new(installer);
    let ctx = ToolchainContext::new(&switcher);

    let result = probe.run(&ctx, "echo hello\nprintf abcd > \"$1\"", &[]).expect("probe");
    assert!(result.success);
    assert_eq!(result.output, "hello");
    assert_eq!(result.artifact_size_bytes, 4);
    assert_eq!(result.artifact.as_deref(), Some(ws.layout.artifact_path(&ws.config).as_path()));
}

#[test]
fn probe_failure_is_a_result_not_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let ws = shell_workspace(temp.path());
    let mut probe = CommandProbe::from_context(&ws);
    probe.program = "sh".into();
    probe.prelude = Some("echo prelude".into());
    let switcher = RetryingSwitcher::new(shell_installer("exit 0"));
    let ctx = ToolchainContext::new(&switcher);

    let result = probe.run(&ctx, "echo boom >&2\nexit 3", &[]).expect("probe");
    assert!(!result.success);
    assert!(result.output.contains("prelude"));
    assert!(result.output.contains("boom"));
    assert_eq!(result.artifact_size_bytes, 0);
    assert!(result.artifact.is_none());
}

#[test]
fn missing_compiler_is_a_failed_probe() {
    let temp = tempfile::tempdir().unwrap();
    let ws = shell_workspace(temp.path());
    let mut probe = CommandProbe::from_context(&ws);
    probe.program = temp.path().join("no-such-compiler");
    let switcher = RetryingSwitcher::new(shell_installer("exit 0"));
    let ctx = ToolchainContext::new(&switcher);

    let result = probe.run(&ctx, "echo 1", &[]).expect("probe");
    assert!(!result.success);
    assert!(result.output.contains("failed to spawn"));
}

#[test]
fn command_args_substitute_placeholders_after_extra_args() {
    let temp = tempfile::tempdir().unwrap();
    let ws = shell_workspace(temp.path());
    let probe = CommandProbe::from_context(&ws);
    let args = probe.command_args(&["c".into(), "--run".into()]);
    assert_eq!(args[0], "c");
    assert_eq!(args[1], "--run");
    assert!(args[2].ends_with(".bisect/probe.sh"));
    assert!(args[3].ends_with(".bisect/probe.out"));
}

#[test]
fn installer_failure_exhausts_retries() {
    let switcher = RetryingSwitcher::new(shell_installer("exit 1"));
    let outcome = switcher.select(&Target::Revision(RevisionId::new("abc1234")));
    assert!(matches!(outcome, SelectOutcome::Unavailable { attempts: 3, .. }));
}

#[test]
fn installer_receives_target_and_reports_revision() {
    let switcher = RetryingSwitcher::new(shell_installer("test \"$1\" = devel"));
    let mut ctx = ToolchainContext::new(&switcher);
    assert!(ctx.select(&Target::Toolchain(ToolchainId::Moving("devel".into()))).is_active());
    assert_eq!(ctx.reported_revision(), Some(RevisionId::new("abcdef1")));
    assert!(!ctx.select(&Target::Toolchain(ToolchainId::Moving("stable".into()))).is_active());
}

#[test]
fn installer_exports_current_source_date_epoch() {
    let installer = shell_installer("[ \"$SOURCE_DATE_EPOCH\" -gt 1600000000 ]");
    let epoch: i64 = installer.source_date_epoch.parse().expect("numeric epoch");
    assert!((chrono::Utc::now().timestamp() - epoch).abs() < 60);

    let switcher = RetryingSwitcher::new(installer);
    assert!(switcher.select(&Target::Toolchain(ToolchainId::Moving("devel".into()))).is_active());
}
