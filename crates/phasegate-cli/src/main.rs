mod cmd;
mod output;
mod root;

use anyhow::Context;
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use phasegate_core::project::Project;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "phasegate",
    about = "Sequential phase gate with hash-verified manifests and an append-only ledger",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .phasegate/ or .git/)
    #[arg(long, global = true, env = "PHASEGATE_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default .phasegate/config.yaml
    Init,

    /// Validate upstream phases and open a phase for work
    Start { phase: u32 },

    /// Freeze a phase for human review and commit it
    Commit {
        phase: u32,
        /// Note recorded in the ledger and commit message
        #[arg(long)]
        note: Option<String>,
    },

    /// Lock a phase after human approval
    Complete {
        phase: u32,
        /// Note recorded in the ledger
        #[arg(long)]
        note: Option<String>,
    },

    /// Show every phase and any stale outputs
    Status,

    /// Check whether a phase could start, without changing anything
    Validate { phase: u32 },

    /// Print ledger entries
    Log {
        /// Only entries for this phase
        #[arg(long)]
        phase: Option<u32>,
    },

    /// Stage and commit everything outside the phase protocol
    Checkpoint { message: String },
}

impl Commands {
    fn phase(&self) -> Option<u32> {
        match self {
            Commands::Start { phase }
            | Commands::Commit { phase, .. }
            | Commands::Complete { phase, .. }
            | Commands::Validate { phase } => Some(*phase),
            Commands::Log { phase } => *phase,
            Commands::Init | Commands::Status | Commands::Checkpoint { .. } => None,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = dispatch(&root, &cli.command, cli.json);

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

/// Load the project and reject phase numbers outside the configured table
/// as a usage error.
fn open_project(root: &std::path::Path, command: &Commands) -> anyhow::Result<Project> {
    let project = Project::open(root)
        .with_context(|| format!("failed to load project at {}", root.display()))?;
    if let Some(phase) = command.phase() {
        if !project.registry().contains(phase) {
            Cli::command()
                .error(
                    ErrorKind::InvalidValue,
                    format!(
                        "invalid phase {phase}: configured phases are 1-{}",
                        project.registry().len()
                    ),
                )
                .exit();
        }
    }
    Ok(project)
}

fn dispatch(root: &std::path::Path, command: &Commands, json: bool) -> anyhow::Result<()> {
    let project = || open_project(root, command);
    match command {
        Commands::Init => cmd::init::run(root, json),
        Commands::Start { phase } => cmd::start::run(&project()?, *phase, json),
        Commands::Commit { phase, note } => {
            cmd::commit::run(&project()?, *phase, note.as_deref(), json)
        }
        Commands::Complete { phase, note } => {
            cmd::complete::run(&project()?, *phase, note.as_deref(), json)
        }
        Commands::Status => cmd::status::run(&project()?, json),
        Commands::Validate { phase } => cmd::validate::run(&project()?, *phase, json),
        Commands::Log { phase } => cmd::log::run(&project()?, *phase, json),
        Commands::Checkpoint { message } => cmd::checkpoint::run(&project()?, message, json),
    }
}
