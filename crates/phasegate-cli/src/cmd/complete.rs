use crate::cmd;
use crate::output::{print_json, print_warnings};
use anyhow::Context;
use phasegate_core::{gate::PhaseGate, project::Project};

pub fn run(project: &Project, phase: u32, note: Option<&str>, json: bool) -> anyhow::Result<()> {
    let vcs = cmd::git(project);
    let transcripts = cmd::transcript_source(project);
    let gate = PhaseGate::new(project, &vcs, transcripts.as_ref());

    let outcome = gate
        .complete(phase, note)
        .with_context(|| format!("failed to complete phase {phase}"))?;

    if json {
        return print_json(&outcome);
    }
    print_warnings(&outcome.warnings);
    println!(
        "Manifest written: {} output file(s) recorded",
        outcome.outputs.unwrap_or_default()
    );
    if let Some(rev) = &outcome.revision {
        println!("Locked as: {rev}");
    }
    println!(
        "Phase {} locked. Downstream phases can now start.",
        outcome.phase
    );
    Ok(())
}
