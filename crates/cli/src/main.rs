use anyhow::Result;
use clap::{Parser, Subcommand};
use regress_bisect::commands::{
    between_command, config_info_command, init_command, matrix_command, resolve_command,
    run_command, show_revision_command, ProbeArgs,
};
use regress_bisect::telemetry::{init_tracing, level_for_verbosity};

/// Find the toolchain revision that broke a snippet.
///
/// This CLI is a thin wrapper around `bisect-core` (exposed in code as `bisect_core`).
/// All substantive logic lives in the library so it can be tested thoroughly
/// and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "regress-bisect",
    version,
    about = "Toolchain regression bisector",
    long_about = None
)]
struct Cli {
    /// Workspace root directory. Defaults to the current working directory.
    #[arg(long, global = true, default_value = ".")]
    root: String,

    /// Emit log lines as JSON.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct ProbeOpts {
    /// Path to the snippet that reproduces the regression.
    #[arg(long)]
    snippet: String,

    /// Comma-separated identifiers to probe, in order. Defaults to the configured list.
    #[arg(long, value_delimiter = ',')]
    versions: Vec<String>,

    /// Emit JSON instead of human-readable text.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Extra compiler arguments, placed before the configured flags (after `--`).
    #[arg(last = true)]
    args: Vec<String>,
}

impl From<ProbeOpts> for ProbeArgs {
    fn from(opts: ProbeOpts) -> Self {
        ProbeArgs {
            snippet: opts.snippet,
            versions: opts.versions,
            extra_args: opts.args,
            json: opts.json,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a bisect workspace.
    ///
    /// This will:
    /// - Write a default `bisect.yaml`.
    /// - Create the `.bisect` work, cache and reports directories.
    Init {
        /// Overwrite an existing config.
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Show the resolved configuration and workspace layout.
    ConfigInfo {
        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Probe the snippet under every identifier without bisecting.
    Matrix {
        #[command(flatten)]
        probe: ProbeOpts,
    },

    /// Probe every identifier, then bisect the commits of the regression window.
    Run {
        #[command(flatten)]
        probe: ProbeOpts,

        /// Report file. Defaults to `.bisect/reports/run-<timestamp>.json`.
        #[arg(long)]
        report: Option<String>,
    },

    /// Print the revision a toolchain identifier resolves to.
    Resolve {
        /// Identifier, e.g. `devel` or `1.6.0`.
        identifier: String,
    },

    /// List revisions after `--from` up to `--to`, newest first.
    Between {
        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Check out a revision and show its author, message and touched files.
    ShowRevision {
        revision: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json, level_for_verbosity(cli.verbose));
    let root = cli.root.as_str();

    match cli.command {
        Command::Init { force } => init_command(root, force)?,
        Command::ConfigInfo { json } => config_info_command(root, json)?,
        Command::Matrix { probe } => matrix_command(root, &probe.into())?,
        Command::Run { probe, report } => run_command(root, &probe.into(), report.as_deref())?,
        Command::Resolve { identifier } => resolve_command(root, &identifier)?,
        Command::Between { from, to, json } => between_command(root, &from, &to, json)?,
        Command::ShowRevision { revision, json } => show_revision_command(root, &revision, json)?,
    }

    Ok(())
}
