use crate::output::{print_issues, print_json};
use anyhow::Context;
use phasegate_core::{project::Project, validate::Validator};

/// Exits 1 when the phase is blocked.
pub fn run(project: &Project, phase: u32, json: bool) -> anyhow::Result<()> {
    let def = project.phase(phase)?;
    let validation = Validator::new(project)
        .validate(phase)
        .with_context(|| format!("failed to validate phase {phase}"))?;
    let ready = validation.is_ready();

    if json {
        #[derive(serde::Serialize)]
        struct ValidateOutput<'a> {
            phase: u32,
            name: &'a str,
            ready: bool,
            issues: Vec<String>,
        }
        print_json(&ValidateOutput {
            phase,
            name: &def.name,
            ready,
            issues: validation.messages(),
        })?;
    } else if ready {
        println!("Phase {phase} ({}): READY to start.", def.name);
    } else {
        println!("Phase {phase} ({}): BLOCKED.", def.name);
        print_issues(&validation.messages());
    }

    if !ready {
        std::process::exit(1);
    }
    Ok(())
}
