use crate::cmd;
use crate::output::{print_issues, print_json};
use anyhow::Context;
use phasegate_core::{gate::PhaseGate, project::Project, GateError};

pub fn run(project: &Project, phase: u32, json: bool) -> anyhow::Result<()> {
    let vcs = cmd::git(project);
    let transcripts = cmd::transcript_source(project);
    let gate = PhaseGate::new(project, &vcs, transcripts.as_ref());

    let outcome = match gate.start(phase) {
        Ok(outcome) => outcome,
        Err(GateError::Blocked { phase, issues }) => {
            if json {
                #[derive(serde::Serialize)]
                struct Blocked<'a> {
                    phase: u32,
                    ready: bool,
                    issues: &'a [String],
                }
                print_json(&Blocked {
                    phase,
                    ready: false,
                    issues: &issues,
                })?;
            } else {
                println!("BLOCKED: Cannot start phase {phase}.\n");
                print_issues(&issues);
                println!("\nResolve these issues before proceeding.");
            }
            std::process::exit(1);
        }
        Err(e) => return Err(e).with_context(|| format!("failed to start phase {phase}")),
    };

    if json {
        return print_json(&outcome);
    }
    println!("Phase {}: {} started", outcome.phase, outcome.phase_name);
    println!("Phase directory: {}", outcome.dir.display());
    println!("Upstream validation: PASSED");
    Ok(())
}
