use crate::config::PhaseDefinition;
use crate::conversation;
use crate::error::{GateError, Result};
use crate::hash;
use crate::ledger::{Ledger, LedgerAction, LedgerEntry};
use crate::manifest::ManifestStore;
use crate::project::Project;
use crate::state;
use crate::status::{self, StatusReport};
use crate::types::PhaseState;
use crate::validate::{Validation, Validator};
use crate::vcs::{self, VersionControl};
use chrono::{SecondsFormat, Utc};
use claude_transcript::TranscriptSource;
use serde::Serialize;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// What a successful transition did, including anything that degraded.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionOutcome {
    pub phase: u32,
    pub phase_name: String,
    pub state: PhaseState,
    pub dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    /// Number of hashed output files, set on completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<usize>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckpointOutcome {
    pub message: String,
    /// `None` when the working tree was already clean.
    pub revision: Option<String>,
}

// ---------------------------------------------------------------------------
// PhaseGate
// ---------------------------------------------------------------------------

/// The start / commit / complete protocol over one project.
///
/// Every mutation happens in a fixed order: phase directory and manifest
/// first, then state label and status file, then the ledger, and version
/// control last. A failing commit therefore never undoes a lock.
pub struct PhaseGate<'a> {
    project: &'a Project,
    vcs: &'a dyn VersionControl,
    transcripts: &'a dyn TranscriptSource,
}

impl<'a> PhaseGate<'a> {
    pub fn new(
        project: &'a Project,
        vcs: &'a dyn VersionControl,
        transcripts: &'a dyn TranscriptSource,
    ) -> Self {
        Self {
            project,
            vcs,
            transcripts,
        }
    }

    fn ledger(&self) -> Ledger {
        Ledger::new(self.project.ledger_path())
    }

    /// Read-only readiness check for `phase`.
    pub fn validate(&self, phase: u32) -> Result<Validation> {
        Validator::new(self.project).validate(phase)
    }

    pub fn status(&self) -> Result<StatusReport> {
        StatusReport::collect(self.project)
    }

    /// Open `phase` for work. Nothing is touched when it is blocked.
    pub fn start(&self, phase: u32) -> Result<TransitionOutcome> {
        let def = self.project.phase(phase)?;
        let validation = self.validate(phase)?;
        if !validation.is_ready() {
            tracing::info!(phase, issues = validation.issues.len(), "start blocked");
            return Err(GateError::Blocked {
                phase,
                issues: validation.messages(),
            });
        }

        let dir = self.project.phase_dir(def);
        crate::io::ensure_dir(&dir)?;
        state::set_state(self.project, def, PhaseState::InProgress)?;
        status::write_status_file(self.project)?;
        self.ledger()
            .append(&LedgerEntry::new(phase, &def.name, LedgerAction::Started, None))?;
        tracing::info!(phase, dir = %dir.display(), "phase started");

        Ok(self.outcome(def, PhaseState::InProgress, Vec::new()))
    }

    /// Freeze `phase` for human review and commit the working tree.
    pub fn commit(&self, phase: u32, note: Option<&str>) -> Result<TransitionOutcome> {
        let def = self.project.phase(phase)?;
        self.require_dir(def)?;
        let mut warnings = self.review_artifact_warning(def);

        state::set_state(self.project, def, PhaseState::Review)?;
        status::write_status_file(self.project)?;
        self.ledger().append(&LedgerEntry::new(
            phase,
            &def.name,
            LedgerAction::Committed,
            note,
        ))?;

        let mut message = format!("phase {phase} commit: {}", def.name);
        if let Some(note) = note.filter(|n| !n.trim().is_empty()) {
            message.push_str(&format!(": {}", note.trim()));
        }
        let revision = self.commit_all(&message, &mut warnings);
        if let Some(rev) = &revision {
            self.ledger().append(&LedgerEntry::new(
                phase,
                &def.name,
                LedgerAction::Revision(rev.clone()),
                None,
            ))?;
        }

        let mut outcome = self.outcome(def, PhaseState::Review, warnings);
        outcome.revision = revision;
        Ok(outcome)
    }

    /// Lock `phase`: snapshot the conversation, hash inputs and outputs,
    /// write the manifest, then ledger and commit.
    ///
    /// Re-completing an already complete phase replaces its manifest.
    pub fn complete(&self, phase: u32, note: Option<&str>) -> Result<TransitionOutcome> {
        let def = self.project.phase(phase)?;
        self.require_dir(def)?;
        let mut warnings = self.review_artifact_warning(def);

        let snapshot = conversation::snapshot(self.project, def, self.transcripts);
        warnings.extend(snapshot.warnings);

        let upstream_dirs: Vec<PathBuf> = self
            .project
            .registry()
            .before(phase)
            .iter()
            .map(|d| self.project.phase_dir(d))
            .collect();
        let inputs =
            hash::hash_directories(self.project.root(), upstream_dirs.iter().map(|p| p.as_path()))?;
        let manifest = ManifestStore::new(self.project).write(phase, inputs)?;

        state::set_state(self.project, def, PhaseState::Complete)?;
        status::write_status_file(self.project)?;
        self.ledger().append(&LedgerEntry::new(
            phase,
            &def.name,
            LedgerAction::Completed,
            note,
        ))?;

        let message = format!("phase {phase} complete: {}", def.name);
        let revision = self.commit_all(&message, &mut warnings);
        if let Some(rev) = &revision {
            self.ledger().append(&LedgerEntry::new(
                phase,
                &def.name,
                LedgerAction::Locked(rev.clone()),
                None,
            ))?;
            if self.project.config().vcs.tag_completions {
                let tag = format!("phase{phase}-complete");
                if let Err(e) = self.vcs.tag(&tag) {
                    tracing::warn!(%tag, error = %e, "tag not created");
                    warnings.push(format!("Could not tag {tag}: {e}"));
                }
            }
        }

        let mut outcome = self.outcome(def, PhaseState::Complete, warnings);
        outcome.revision = revision;
        outcome.outputs = Some(manifest.output_hashes.len());
        Ok(outcome)
    }

    /// Commit everything outside the phase protocol.
    pub fn checkpoint(&self, message: &str) -> Result<CheckpointOutcome> {
        if !self.project.config().vcs.enabled {
            return Err(GateError::Vcs {
                command: "checkpoint".into(),
                message: "version control is disabled in config".into(),
            });
        }
        self.vcs.stage_all()?;
        if !self.vcs.has_changes()? {
            return Ok(CheckpointOutcome {
                message: message.to_string(),
                revision: None,
            });
        }
        let full = format!(
            "[phasegate] {message}\n\nTimestamp: {}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        let revision = self.vcs.commit(&full)?;
        Ok(CheckpointOutcome {
            message: message.to_string(),
            revision: Some(revision),
        })
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn require_dir(&self, def: &PhaseDefinition) -> Result<()> {
        let dir = self.project.phase_dir(def);
        if !dir.is_dir() {
            return Err(GateError::MissingPhaseDir {
                phase: def.number,
                path: dir,
            });
        }
        Ok(())
    }

    fn review_artifact_warning(&self, def: &PhaseDefinition) -> Vec<String> {
        let path = self.project.review_artifact_path(def);
        if path.exists() {
            return Vec::new();
        }
        tracing::warn!(path = %path.display(), "review artifact missing");
        vec![format!(
            "{} not found in {}. Write a summary for the reviewer.",
            self.project.config().files.review_artifact,
            def.dir
        )]
    }

    /// Stage and commit; failures become warnings.
    fn commit_all(&self, message: &str, warnings: &mut Vec<String>) -> Option<String> {
        if !self.project.config().vcs.enabled {
            return None;
        }
        match vcs::commit_all(self.vcs, message) {
            Ok(rev) => Some(rev),
            Err(e) => {
                tracing::warn!(error = %e, "version control commit failed");
                warnings.push(format!("Version control commit failed: {e}"));
                None
            }
        }
    }

    fn outcome(
        &self,
        def: &PhaseDefinition,
        state: PhaseState,
        warnings: Vec<String>,
    ) -> TransitionOutcome {
        TransitionOutcome {
            phase: def.number,
            phase_name: def.name.clone(),
            state,
            dir: self.project.phase_dir(def),
            revision: None,
            outputs: None,
            warnings,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GateConfig;
    use crate::vcs::InMemoryVcs;
    use claude_transcript::{Disabled, MissingReason, TranscriptLookup};
    use tempfile::TempDir;

    struct NoSessions;

    impl TranscriptSource for NoSessions {
        fn latest(&self) -> claude_transcript::Result<TranscriptLookup> {
            Ok(TranscriptLookup::Missing(MissingReason::NoSessions))
        }
    }

    fn setup() -> (TempDir, Project) {
        let dir = TempDir::new().unwrap();
        let project = Project::new(dir.path(), GateConfig::new("test"));
        (dir, project)
    }

    fn write(dir: &TempDir, rel: &str, body: &str) {
        let path = dir.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    fn ledger_actions(project: &Project) -> Vec<LedgerAction> {
        Ledger::new(project.ledger_path())
            .entries()
            .unwrap()
            .into_iter()
            .map(|e| e.action)
            .collect()
    }

    #[test]
    fn start_creates_directory_and_logs() {
        let (dir, project) = setup();
        let vcs = InMemoryVcs::new();
        let gate = PhaseGate::new(&project, &vcs, &Disabled);

        let outcome = gate.start(1).unwrap();
        assert_eq!(outcome.state, PhaseState::InProgress);
        assert!(dir.path().join("phase1_comprehension").is_dir());
        assert!(dir.path().join("STATUS.md").exists());
        assert_eq!(ledger_actions(&project), vec![LedgerAction::Started]);
        let def = project.phase(1).unwrap();
        assert_eq!(
            state::derive_state(&project, def).unwrap(),
            PhaseState::InProgress
        );
    }

    #[test]
    fn blocked_start_mutates_nothing() {
        let (dir, project) = setup();
        let vcs = InMemoryVcs::new();
        let gate = PhaseGate::new(&project, &vcs, &Disabled);

        let err = gate.start(2).unwrap_err();
        match err {
            GateError::Blocked { phase, issues } => {
                assert_eq!(phase, 2);
                assert_eq!(issues, vec!["Phase 1 (Comprehension) has not been completed."]);
            }
            other => panic!("expected Blocked, got {other:?}"),
        }
        assert!(!dir.path().join("phase2_planning").exists());
        assert!(!dir.path().join("LEDGER.md").exists());
        assert!(!dir.path().join("STATUS.md").exists());
    }

    #[test]
    fn commit_and_complete_require_directory() {
        let (_dir, project) = setup();
        let vcs = InMemoryVcs::new();
        let gate = PhaseGate::new(&project, &vcs, &Disabled);
        assert!(matches!(
            gate.commit(1, None),
            Err(GateError::MissingPhaseDir { phase: 1, .. })
        ));
        assert!(matches!(
            gate.complete(1, None),
            Err(GateError::MissingPhaseDir { phase: 1, .. })
        ));
        assert!(vcs.commits().is_empty());
    }

    #[test]
    fn commit_freezes_for_review() {
        let (dir, project) = setup();
        let vcs = InMemoryVcs::new();
        let gate = PhaseGate::new(&project, &vcs, &Disabled);
        gate.start(1).unwrap();
        write(&dir, "phase1_comprehension/GATE.md", "summary");

        let outcome = gate.commit(1, Some("first pass")).unwrap();
        assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
        assert_eq!(outcome.state, PhaseState::Review);
        let rev = outcome.revision.unwrap();
        assert_eq!(vcs.commits(), vec!["phase 1 commit: Comprehension: first pass"]);
        assert_eq!(
            ledger_actions(&project),
            vec![
                LedgerAction::Started,
                LedgerAction::Committed,
                LedgerAction::Revision(rev),
            ]
        );
    }

    #[test]
    fn missing_review_artifact_is_only_a_warning() {
        let (_dir, project) = setup();
        let vcs = InMemoryVcs::new();
        let gate = PhaseGate::new(&project, &vcs, &Disabled);
        gate.start(1).unwrap();
        let outcome = gate.commit(1, None).unwrap();
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("GATE.md"));
    }

    #[test]
    fn complete_without_transcript_still_locks() {
        let (dir, project) = setup();
        let vcs = InMemoryVcs::new();
        let gate = PhaseGate::new(&project, &vcs, &NoSessions);
        gate.start(1).unwrap();
        write(&dir, "phase1_comprehension/GATE.md", "summary");
        write(&dir, "phase1_comprehension/notes.md", "notes");

        let outcome = gate.complete(1, Some("approved")).unwrap();
        assert_eq!(outcome.state, PhaseState::Complete);
        assert_eq!(outcome.outputs, Some(2));
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("No sessions found."));

        let log = std::fs::read_to_string(dir.path().join("phase1_comprehension/conversation_log.md"))
            .unwrap();
        assert_eq!(log, "# Conversation Log\n\nNo sessions found.\n");

        let manifest = ManifestStore::new(&project).read(1).unwrap().unwrap();
        assert!(!manifest.output_hashes.is_empty());
        assert!(manifest.input_hashes.is_empty());
        assert_eq!(vcs.commits(), vec!["phase 1 complete: Comprehension"]);
        assert_eq!(vcs.tags()[0].0, "phase1-complete");
        assert!(matches!(
            ledger_actions(&project).last(),
            Some(LedgerAction::Locked(_))
        ));
    }

    #[test]
    fn complete_records_upstream_inputs() {
        let (dir, project) = setup();
        let vcs = InMemoryVcs::new();
        let gate = PhaseGate::new(&project, &vcs, &Disabled);
        gate.start(1).unwrap();
        write(&dir, "phase1_comprehension/notes.md", "notes");
        gate.complete(1, None).unwrap();
        gate.start(2).unwrap();
        write(&dir, "phase2_planning/plan.md", "plan");
        gate.complete(2, None).unwrap();

        let manifest = ManifestStore::new(&project).read(2).unwrap().unwrap();
        let inputs: Vec<_> = manifest.input_hashes.keys().cloned().collect();
        assert_eq!(inputs, vec!["phase1_comprehension/notes.md"]);
        assert!(gate.validate(3).unwrap().is_ready());
    }

    #[test]
    fn recompletion_is_idempotent_on_outputs() {
        let (dir, project) = setup();
        let vcs = InMemoryVcs::new();
        let gate = PhaseGate::new(&project, &vcs, &Disabled);
        gate.start(1).unwrap();
        write(&dir, "phase1_comprehension/notes.md", "notes");
        gate.complete(1, None).unwrap();
        let first = ManifestStore::new(&project).read(1).unwrap().unwrap();
        gate.complete(1, None).unwrap();
        let second = ManifestStore::new(&project).read(1).unwrap().unwrap();
        assert_eq!(first.output_hashes, second.output_hashes);
        assert_eq!(vcs.tags().len(), 1);
    }

    #[test]
    fn vcs_failure_keeps_the_lock() {
        let (dir, project) = setup();
        let vcs = InMemoryVcs::failing();
        let gate = PhaseGate::new(&project, &vcs, &Disabled);
        gate.start(1).unwrap();
        write(&dir, "phase1_comprehension/notes.md", "notes");

        let outcome = gate.complete(1, None).unwrap();
        assert!(outcome.revision.is_none());
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.starts_with("Version control commit failed")));
        assert!(ManifestStore::new(&project).is_complete(1).unwrap());
        assert_eq!(
            ledger_actions(&project),
            vec![LedgerAction::Started, LedgerAction::Completed]
        );
    }

    #[test]
    fn disabled_vcs_is_silent() {
        let dir = TempDir::new().unwrap();
        let mut config = GateConfig::new("test");
        config.vcs.enabled = false;
        let project = Project::new(dir.path(), config);
        let vcs = InMemoryVcs::new();
        let gate = PhaseGate::new(&project, &vcs, &Disabled);
        gate.start(1).unwrap();
        write(&dir, "phase1_comprehension/GATE.md", "summary");
        let outcome = gate.commit(1, None).unwrap();
        assert!(outcome.warnings.is_empty());
        assert!(vcs.commits().is_empty());
        assert!(gate.checkpoint("wip").is_err());
    }

    #[test]
    fn ledger_only_grows() {
        let (dir, project) = setup();
        let vcs = InMemoryVcs::new();
        let gate = PhaseGate::new(&project, &vcs, &Disabled);
        let ledger_path = dir.path().join("LEDGER.md");

        gate.start(1).unwrap();
        let mut previous = std::fs::read_to_string(&ledger_path).unwrap();
        for step in 0..3 {
            match step {
                0 => {
                    gate.commit(1, None).unwrap();
                }
                1 => {
                    gate.complete(1, None).unwrap();
                }
                _ => {
                    gate.start(2).unwrap();
                }
            }
            let current = std::fs::read_to_string(&ledger_path).unwrap();
            assert!(current.len() > previous.len());
            assert!(current.starts_with(&previous));
            previous = current;
        }
    }

    #[test]
    fn editing_completed_outputs_blocks_downstream() {
        let (dir, project) = setup();
        let vcs = InMemoryVcs::new();
        let gate = PhaseGate::new(&project, &vcs, &Disabled);
        gate.start(1).unwrap();
        write(&dir, "phase1_comprehension/notes.md", "notes");
        gate.complete(1, None).unwrap();
        write(&dir, "phase1_comprehension/notes.md", "changed");

        let err = gate.start(2).unwrap_err();
        let GateError::Blocked { issues, .. } = err else {
            panic!("expected Blocked");
        };
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("phase1_comprehension/notes.md was modified"));
        assert!(!gate.status().unwrap().is_current());
    }

    #[test]
    fn checkpoint_commits_only_when_dirty() {
        let (_dir, project) = setup();
        let vcs = InMemoryVcs::new();
        let gate = PhaseGate::new(&project, &vcs, &Disabled);

        let done = gate.checkpoint("before refactor").unwrap();
        assert!(done.revision.is_some());
        assert!(vcs.commits()[0].starts_with("[phasegate] before refactor\n\nTimestamp: "));

        vcs.set_dirty(false);
        let clean = gate.checkpoint("again").unwrap();
        assert!(clean.revision.is_none());
        assert_eq!(vcs.commits().len(), 1);
    }
}
