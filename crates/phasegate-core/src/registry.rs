use crate::config::PhaseDefinition;
use crate::error::{GateError, Result};

/// Ordered, immutable table of phases. Phase `n` is at index `n - 1`.
#[derive(Debug, Clone)]
pub struct PhaseRegistry {
    phases: Vec<PhaseDefinition>,
}

impl PhaseRegistry {
    /// Callers are expected to pass a validated phase list (see
    /// `GateConfig::validate`).
    pub fn new(phases: Vec<PhaseDefinition>) -> Self {
        Self { phases }
    }

    pub fn len(&self) -> u32 {
        self.phases.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn contains(&self, phase: u32) -> bool {
        phase >= 1 && phase <= self.len()
    }

    pub fn get(&self, phase: u32) -> Result<&PhaseDefinition> {
        if !self.contains(phase) {
            return Err(GateError::InvalidPhase {
                phase,
                max: self.len(),
            });
        }
        Ok(&self.phases[phase as usize - 1])
    }

    pub fn all(&self) -> &[PhaseDefinition] {
        &self.phases
    }

    /// Phases strictly before `phase`, in order.
    pub fn before(&self, phase: u32) -> &[PhaseDefinition] {
        let end = (phase.saturating_sub(1) as usize).min(self.phases.len());
        &self.phases[..end]
    }
}
