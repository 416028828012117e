use crate::error::{GateError, Result};
use crate::hash::{self, FileHashes};
use crate::project::Project;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// Completion record for one phase, persisted as `MANIFEST.json`.
///
/// Written once per completion and never edited; re-completing a phase
/// replaces the whole file with a fresh snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub phase: u32,
    pub phase_name: String,
    pub completed_at: DateTime<Utc>,
    /// Every file under all earlier phase directories at completion time.
    pub input_hashes: FileHashes,
    /// Every file under this phase's directory at completion time.
    pub output_hashes: FileHashes,
}

// ---------------------------------------------------------------------------
// ManifestStore
// ---------------------------------------------------------------------------

/// The only component allowed to write completion state.
pub struct ManifestStore<'a> {
    project: &'a Project,
}

impl<'a> ManifestStore<'a> {
    pub fn new(project: &'a Project) -> Self {
        Self { project }
    }

    /// `None` means the phase has not been completed.
    pub fn read(&self, phase: u32) -> Result<Option<Manifest>> {
        let def = self.project.phase(phase)?;
        let path = self.project.manifest_path(def);
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path)?;
        let manifest = serde_json::from_str(&data)
            .map_err(|source| GateError::CorruptManifest { path, source })?;
        Ok(Some(manifest))
    }

    pub fn is_complete(&self, phase: u32) -> Result<bool> {
        let def = self.project.phase(phase)?;
        Ok(self.project.manifest_path(def).exists())
    }

    /// Snapshot the phase directory and lock the phase.
    pub fn write(&self, phase: u32, input_hashes: FileHashes) -> Result<Manifest> {
        let def = self.project.phase(phase)?;
        let dir = self.project.phase_dir(def);
        let manifest = Manifest {
            phase,
            phase_name: def.name.clone(),
            completed_at: Utc::now(),
            input_hashes,
            output_hashes: hash::hash_directory(self.project.root(), &dir)?,
        };
        let path = self.project.manifest_path(def);
        let mut data = serde_json::to_string_pretty(&manifest)?;
        data.push('\n');
        crate::io::atomic_write(&path, data.as_bytes())?;
        tracing::info!(
            phase,
            outputs = manifest.output_hashes.len(),
            inputs = manifest.input_hashes.len(),
            path = %path.display(),
            "manifest written"
        );
        Ok(manifest)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
