use crate::error::Result;
use crate::hash::{self, FileHashes};
use crate::manifest::{Manifest, ManifestStore};
use crate::project::Project;
use serde::Serialize;
use std::fmt;

// ---------------------------------------------------------------------------
// Issue
// ---------------------------------------------------------------------------

/// One reason a phase cannot start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Issue {
    NotCompleted { phase: u32, name: String },
    Deleted { phase: u32, path: String },
    Modified { phase: u32, path: String },
}

impl Issue {
    /// Wording used by the status sweep when a phase's own outputs drift.
    pub fn describe_own(&self) -> String {
        match self {
            Issue::NotCompleted { .. } => self.to_string(),
            Issue::Deleted { phase, path } => {
                format!("STALE: Phase {phase}: {path} was deleted after completion.")
            }
            Issue::Modified { phase, path } => {
                format!("STALE: Phase {phase}: {path} was modified after completion.")
            }
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::NotCompleted { phase, name } => {
                write!(f, "Phase {phase} ({name}) has not been completed.")
            }
            Issue::Deleted { phase, path } => {
                write!(f, "STALE: {path} was deleted since Phase {phase} completed.")
            }
            Issue::Modified { phase, path } => write!(
                f,
                "STALE: {path} was modified since Phase {phase} completed. Phase {phase} must be re-run."
            ),
        }
    }
}

/// Compare recorded outputs against the current directory hashes.
///
/// Only regressions count: recorded files that disappeared or changed.
/// Files added after completion are ignored.
pub fn diff_outputs(phase: u32, recorded: &FileHashes, current: &FileHashes) -> Vec<Issue> {
    recorded
        .iter()
        .filter_map(|(path, recorded_hash)| match current.get(path) {
            None => Some(Issue::Deleted {
                phase,
                path: path.clone(),
            }),
            Some(h) if h != recorded_hash => Some(Issue::Modified {
                phase,
                path: path.clone(),
            }),
            Some(_) => None,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Validation {
    pub phase: u32,
    pub issues: Vec<Issue>,
}

impl Validation {
    pub fn is_ready(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(|i| i.to_string()).collect()
    }
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// Read-only readiness check: every earlier phase complete, and every
/// completed earlier phase unchanged since its manifest was written.
pub struct Validator<'a> {
    project: &'a Project,
    store: ManifestStore<'a>,
}

impl<'a> Validator<'a> {
    pub fn new(project: &'a Project) -> Self {
        Self {
            project,
            store: ManifestStore::new(project),
        }
    }

    pub fn validate(&self, phase: u32) -> Result<Validation> {
        self.project.phase(phase)?;
        let mut issues = Vec::new();
        if phase == 1 {
            return Ok(Validation { phase, issues });
        }

        let upstream = self.project.registry().before(phase);
        let manifests: Vec<Option<Manifest>> = upstream
            .iter()
            .map(|def| self.store.read(def.number))
            .collect::<Result<_>>()?;

        // Completeness. A missing immediate predecessor is reported alone;
        // otherwise every gap further upstream is listed.
        let prev = upstream.len() - 1;
        if manifests[prev].is_none() {
            issues.push(Issue::NotCompleted {
                phase: upstream[prev].number,
                name: upstream[prev].name.clone(),
            });
        } else {
            for (def, manifest) in upstream[..prev].iter().zip(&manifests) {
                if manifest.is_none() {
                    issues.push(Issue::NotCompleted {
                        phase: def.number,
                        name: def.name.clone(),
                    });
                }
            }
        }

        // Staleness of every completed upstream phase.
        for (def, manifest) in upstream.iter().zip(&manifests) {
            let Some(manifest) = manifest else {
                continue;
            };
            let current = hash::hash_directory(self.project.root(), &self.project.phase_dir(def))?;
            issues.extend(diff_outputs(def.number, &manifest.output_hashes, &current));
        }

        tracing::debug!(phase, issues = issues.len(), "upstream validated");
        Ok(Validation { phase, issues })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
