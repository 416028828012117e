use crate::config::PhaseDefinition;
use crate::error::Result;
use crate::project::Project;
use crate::types::PhaseState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// StateLabel
// ---------------------------------------------------------------------------

/// Gate-owned marker stored as `PHASE_STATE.yaml` in the phase directory.
///
/// Completion is never read from here; the manifest alone decides that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateLabel {
    pub state: PhaseState,
    pub updated_at: DateTime<Utc>,
}

impl StateLabel {
    pub fn new(state: PhaseState) -> Self {
        Self {
            state,
            updated_at: Utc::now(),
        }
    }

    /// `None` when the label is absent or unreadable.
    pub fn load(project: &Project, phase: &PhaseDefinition) -> Result<Option<Self>> {
        let path = project.state_label_path(phase);
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path)?;
        match serde_yaml::from_str(&data) {
            Ok(label) => Ok(Some(label)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable state label");
                Ok(None)
            }
        }
    }

    pub fn save(&self, project: &Project, phase: &PhaseDefinition) -> Result<()> {
        let path = project.state_label_path(phase);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())?;
        tracing::debug!(phase = phase.number, state = %self.state, "state label written");
        Ok(())
    }
}

/// Write a fresh label for `phase`.
pub fn set_state(project: &Project, phase: &PhaseDefinition, state: PhaseState) -> Result<()> {
    StateLabel::new(state).save(project, phase)
}

/// Manifest present → COMPLETE; else the label; else IN_PROGRESS when the
/// directory exists; else PENDING.
pub fn derive_state(project: &Project, phase: &PhaseDefinition) -> Result<PhaseState> {
    if project.manifest_path(phase).exists() {
        return Ok(PhaseState::Complete);
    }
    if let Some(label) = StateLabel::load(project, phase)? {
        // A COMPLETE label without its manifest means the lock was removed.
        if label.state != PhaseState::Complete {
            return Ok(label.state);
        }
    }
    if project.phase_dir(phase).is_dir() {
        Ok(PhaseState::InProgress)
    } else {
        Ok(PhaseState::Pending)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
