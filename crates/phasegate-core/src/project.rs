use crate::config::{GateConfig, PhaseDefinition};
use crate::error::Result;
use crate::paths;
use crate::registry::PhaseRegistry;
use std::path::{Path, PathBuf};

/// Immutable per-invocation context: project root, configuration, and the
/// phase table derived from it. Every component borrows one of these instead
/// of reading process-wide settings.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    config: GateConfig,
    registry: PhaseRegistry,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>, config: GateConfig) -> Self {
        let registry = PhaseRegistry::new(config.phases.clone());
        Self {
            root: root.into(),
            config,
            registry,
        }
    }

    /// Load the config under `root` (or its defaults) and build the context.
    pub fn open(root: &Path) -> Result<Self> {
        let config = GateConfig::load(root)?;
        Ok(Self::new(root, config))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn registry(&self) -> &PhaseRegistry {
        &self.registry
    }

    pub fn phase(&self, number: u32) -> Result<&PhaseDefinition> {
        self.registry.get(number)
    }

    pub fn phase_dir(&self, phase: &PhaseDefinition) -> PathBuf {
        paths::phase_dir(&self.root, &phase.dir)
    }

    pub fn manifest_path(&self, phase: &PhaseDefinition) -> PathBuf {
        paths::manifest_path(&self.root, &phase.dir)
    }

    pub fn conversation_log_path(&self, phase: &PhaseDefinition) -> PathBuf {
        paths::conversation_log_path(&self.root, &phase.dir)
    }

    pub fn state_label_path(&self, phase: &PhaseDefinition) -> PathBuf {
        paths::state_label_path(&self.root, &phase.dir)
    }

    pub fn review_artifact_path(&self, phase: &PhaseDefinition) -> PathBuf {
        self.phase_dir(phase).join(&self.config.files.review_artifact)
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.root.join(&self.config.files.ledger)
    }

    pub fn status_path(&self) -> PathBuf {
        self.root.join(&self.config.files.status)
    }
}
