use crate::cmd;
use crate::output::{print_json, print_warnings};
use anyhow::Context;
use phasegate_core::{gate::PhaseGate, project::Project};

pub fn run(project: &Project, phase: u32, note: Option<&str>, json: bool) -> anyhow::Result<()> {
    let vcs = cmd::git(project);
    let transcripts = cmd::transcript_source(project);
    let gate = PhaseGate::new(project, &vcs, transcripts.as_ref());

    let outcome = gate
        .commit(phase, note)
        .with_context(|| format!("failed to commit phase {phase}"))?;

    if json {
        return print_json(&outcome);
    }
    print_warnings(&outcome.warnings);
    if let Some(rev) = &outcome.revision {
        println!("Committed: {rev}");
    }
    println!(
        "Phase {}: {} frozen for review. Awaiting human review of {}.",
        outcome.phase,
        outcome.phase_name,
        project.config().files.review_artifact
    );
    Ok(())
}
