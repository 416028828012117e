use crate::output::{print_json, render_table};
use anyhow::Context;
use phasegate_core::{project::Project, status::StatusReport};

pub fn run(project: &Project, json: bool) -> anyhow::Result<()> {
    let report = StatusReport::collect(project).context("failed to collect status")?;

    if json {
        return print_json(&report);
    }

    println!("Project: {}\n", project.config().project.name);
    let rows: Vec<[String; 4]> = report
        .phases
        .iter()
        .map(|r| {
            [
                r.number.to_string(),
                r.name.clone(),
                r.state.to_string(),
                r.completed_date(),
            ]
        })
        .collect();
    print!("{}", render_table(["PHASE", "NAME", "STATE", "COMPLETED"], &rows));

    println!("\nStaleness check:");
    if report.is_current() {
        println!("  All completed phases are current.");
    } else {
        for finding in &report.stale {
            println!("  {}", finding.message);
        }
    }
    Ok(())
}
