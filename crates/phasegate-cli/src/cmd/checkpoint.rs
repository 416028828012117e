use crate::cmd;
use crate::output::print_json;
use anyhow::Context;
use phasegate_core::{gate::PhaseGate, project::Project};

pub fn run(project: &Project, message: &str, json: bool) -> anyhow::Result<()> {
    let vcs = cmd::git(project);
    let transcripts = cmd::transcript_source(project);
    let gate = PhaseGate::new(project, &vcs, transcripts.as_ref());

    let outcome = gate.checkpoint(message).context("checkpoint failed")?;

    if json {
        return print_json(&outcome);
    }
    match &outcome.revision {
        Some(rev) => println!("Checkpoint: {rev} [phasegate] {message}"),
        None => println!("Nothing to commit."),
    }
    Ok(())
}
