use crate::error::Result;
use crate::hash;
use crate::manifest::ManifestStore;
use crate::project::Project;
use crate::state;
use crate::types::PhaseState;
use crate::validate::{self, Validator};
use chrono::{DateTime, Utc};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct PhaseStatusRow {
    pub number: u32,
    pub name: String,
    pub state: PhaseState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl PhaseStatusRow {
    /// `YYYY-MM-DD` of completion, or `-`.
    pub fn completed_date(&self) -> String {
        self.completed_at
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleOrigin {
    /// The phase's own recorded outputs changed.
    OwnOutputs,
    /// Something upstream of the phase is incomplete or changed.
    Upstream,
}

#[derive(Debug, Clone, Serialize)]
pub struct StaleFinding {
    pub phase: u32,
    pub origin: StaleOrigin,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub phases: Vec<PhaseStatusRow>,
    pub stale: Vec<StaleFinding>,
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

impl StatusReport {
    /// Derived state of every phase, without the staleness sweep.
    pub fn rows(project: &Project) -> Result<Vec<PhaseStatusRow>> {
        let store = ManifestStore::new(project);
        let mut rows = Vec::with_capacity(project.registry().all().len());
        for def in project.registry().all() {
            let manifest = store.read(def.number)?;
            let state = match manifest {
                Some(_) => PhaseState::Complete,
                None => state::derive_state(project, def)?,
            };
            rows.push(PhaseStatusRow {
                number: def.number,
                name: def.name.clone(),
                state,
                completed_at: manifest.map(|m| m.completed_at),
            });
        }
        Ok(rows)
    }

    /// Rows plus the staleness sweep over every completed phase.
    pub fn collect(project: &Project) -> Result<Self> {
        let phases = Self::rows(project)?;
        let store = ManifestStore::new(project);
        let validator = Validator::new(project);
        let mut stale = Vec::new();

        for def in project.registry().all() {
            let Some(manifest) = store.read(def.number)? else {
                continue;
            };
            let current = hash::hash_directory(project.root(), &project.phase_dir(def))?;
            for issue in validate::diff_outputs(def.number, &manifest.output_hashes, &current) {
                stale.push(StaleFinding {
                    phase: def.number,
                    origin: StaleOrigin::OwnOutputs,
                    message: issue.describe_own(),
                });
            }
            if def.number > 1 {
                for issue in validator.validate(def.number)?.issues {
                    stale.push(StaleFinding {
                        phase: def.number,
                        origin: StaleOrigin::Upstream,
                        message: issue.to_string(),
                    });
                }
            }
        }

        if !stale.is_empty() {
            tracing::info!(findings = stale.len(), "staleness detected");
        }
        Ok(Self { phases, stale })
    }

    pub fn is_current(&self) -> bool {
        self.stale.is_empty()
    }
}

// ---------------------------------------------------------------------------
// STATUS.md
// ---------------------------------------------------------------------------

pub fn render_status_md(rows: &[PhaseStatusRow], now: DateTime<Utc>) -> String {
    let mut out = String::from("# Replication Status\n\n");
    out.push_str(&format!("Last updated: {}\n\n", now.format("%Y-%m-%d %H:%M UTC")));
    out.push_str("| Phase | Status | Completed |\n");
    out.push_str("|-------|--------|-----------|\n");
    for row in rows {
        out.push_str(&format!(
            "| {}. {} | {} | {} |\n",
            row.number,
            row.name,
            row.state,
            row.completed_date()
        ));
    }
    out
}

/// Regenerate the project status file from the current derived states.
pub fn write_status_file(project: &Project) -> Result<()> {
    let rows = StatusReport::rows(project)?;
    let path = project.status_path();
    crate::io::atomic_write(&path, render_status_md(&rows, Utc::now()).as_bytes())?;
    tracing::debug!(path = %path.display(), "status file regenerated");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
