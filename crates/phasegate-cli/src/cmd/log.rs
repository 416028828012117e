use crate::output::print_json;
use anyhow::Context;
use phasegate_core::{ledger::Ledger, project::Project};

pub fn run(project: &Project, phase: Option<u32>, json: bool) -> anyhow::Result<()> {
    let ledger = Ledger::new(project.ledger_path());
    let entries: Vec<_> = ledger
        .entries()
        .with_context(|| format!("failed to read {}", ledger.path().display()))?
        .into_iter()
        .filter(|e| phase.map_or(true, |p| e.phase == p))
        .collect();

    if json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No ledger entries.");
        return Ok(());
    }
    for entry in &entries {
        println!("{entry}");
    }
    Ok(())
}
