use crate::error::{GateError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// PhaseDefinition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhaseDefinition {
    pub number: u32,
    pub name: String,
    /// Storage directory, relative to the project root.
    pub dir: String,
}

impl PhaseDefinition {
    pub fn new(number: u32, name: impl Into<String>, dir: impl Into<String>) -> Self {
        Self {
            number,
            name: name.into(),
            dir: dir.into(),
        }
    }
}

fn default_phases() -> Vec<PhaseDefinition> {
    vec![
        PhaseDefinition::new(1, "Comprehension", "phase1_comprehension"),
        PhaseDefinition::new(2, "Planning", "phase2_planning"),
        PhaseDefinition::new(3, "Data Acquisition", "phase3_data"),
        PhaseDefinition::new(4, "Implementation", "phase4_implementation"),
        PhaseDefinition::new(5, "Comparison", "phase5_comparison"),
        PhaseDefinition::new(6, "Final Report", "phase6_report"),
    ]
}

// ---------------------------------------------------------------------------
// FilesConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    #[serde(default = "default_ledger")]
    pub ledger: String,
    #[serde(default = "default_status")]
    pub status: String,
    /// Human-authored summary expected in each phase directory before review.
    #[serde(default = "default_review_artifact")]
    pub review_artifact: String,
}

fn default_ledger() -> String {
    paths::DEFAULT_LEDGER_FILE.to_string()
}

fn default_status() -> String {
    paths::DEFAULT_STATUS_FILE.to_string()
}

fn default_review_artifact() -> String {
    paths::DEFAULT_REVIEW_ARTIFACT.to_string()
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            ledger: default_ledger(),
            status: default_status(),
            review_artifact: default_review_artifact(),
        }
    }
}

// ---------------------------------------------------------------------------
// TranscriptConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Overrides `~/.claude/projects`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects_dir: Option<PathBuf>,
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
}

fn default_true() -> bool {
    true
}

fn default_max_message_chars() -> usize {
    3000
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            projects_dir: None,
            max_message_chars: default_max_message_chars(),
        }
    }
}

// ---------------------------------------------------------------------------
// VcsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VcsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Tag each completion as `phase<N>-complete`.
    #[serde(default = "default_true")]
    pub tag_completions: bool,
}

impl Default for VcsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tag_completions: true,
        }
    }
}

// ---------------------------------------------------------------------------
// ProjectConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// GateConfig (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    pub project: ProjectConfig,
    #[serde(default = "default_phases")]
    pub phases: Vec<PhaseDefinition>,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub transcripts: TranscriptConfig,
    #[serde(default)]
    pub vcs: VcsConfig,
}

fn default_version() -> u32 {
    1
}

impl GateConfig {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            version: 1,
            project: ProjectConfig {
                name: project_name.into(),
                description: None,
            },
            phases: default_phases(),
            files: FilesConfig::default(),
            transcripts: TranscriptConfig::default(),
            vcs: VcsConfig::default(),
        }
    }

    /// Load `.phasegate/config.yaml`, or fall back to the default phase
    /// table named after the root directory when no config exists.
    /// Configs with error-level findings are rejected.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        let cfg = if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            serde_yaml::from_str(&data)?
        } else {
            let name = root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "project".to_string());
            Self::new(name)
        };

        let errors: Vec<String> = cfg
            .validate()
            .into_iter()
            .filter(|w| w.level == WarnLevel::Error)
            .map(|w| w.message)
            .collect();
        if !errors.is_empty() {
            return Err(GateError::InvalidConfig(errors.join("; ")));
        }
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut error = |message: String| {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message,
            })
        };

        if self.phases.is_empty() {
            error("no phases configured".to_string());
        }

        // 1. Phases must be numbered 1..N in declaration order
        for (i, phase) in self.phases.iter().enumerate() {
            let expected = i as u32 + 1;
            if phase.number != expected {
                error(format!(
                    "phase '{}' has number {} but is declared at position {expected}",
                    phase.name, phase.number
                ));
            }
            if phase.name.trim().is_empty() {
                error(format!("phase {} has an empty name", phase.number));
            }
            if paths::validate_phase_dir(&phase.dir).is_err() {
                error(format!(
                    "phase {} has an invalid directory '{}'",
                    phase.number, phase.dir
                ));
            }
        }

        // 2. Directories must be distinct and must not nest, otherwise one
        //    phase's outputs would be hashed as another's.
        let mut seen = HashSet::new();
        for phase in &self.phases {
            if !seen.insert(phase.dir.as_str()) {
                error(format!("directory '{}' is used by more than one phase", phase.dir));
            }
        }
        for a in &self.phases {
            for b in &self.phases {
                if a.number != b.number && b.dir.starts_with(&format!("{}/", a.dir)) {
                    error(format!(
                        "phase {} directory '{}' is nested inside phase {} directory '{}'",
                        b.number, b.dir, a.number, a.dir
                    ));
                }
            }
        }

        // 3. The ledger and status files are rewritten after completion, so
        //    they must stay inside the root and outside every phase directory.
        for (key, file) in [("ledger", &self.files.ledger), ("status", &self.files.status)] {
            if paths::validate_phase_dir(file).is_err() {
                error(format!("files.{key} has an invalid path '{file}'"));
                continue;
            }
            if let Some(phase) = self
                .phases
                .iter()
                .find(|p| *file == p.dir || file.starts_with(&format!("{}/", p.dir)))
            {
                error(format!(
                    "files.{key} '{file}' is inside phase {} directory '{}'",
                    phase.number, phase.dir
                ));
            }
        }

        // 4. Softer checks
        let mut names = HashSet::new();
        for phase in &self.phases {
            if !names.insert(phase.name.as_str()) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("phase name '{}' is used more than once", phase.name),
                });
            }
        }
        if paths::is_generated(&self.files.review_artifact) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "review artifact '{}' is a generated file and is never hashed",
                    self.files.review_artifact
                ),
            });
        }
        if self.transcripts.max_message_chars == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "transcripts.max_message_chars is 0; every message will be truncated"
                    .to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
