use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("invalid phase {phase}: configured phases are 1-{max}")]
    InvalidPhase { phase: u32, max: u32 },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid phase directory '{0}': use relative path segments of letters, digits, '.', '_' or '-'")]
    InvalidPhaseDir(String),

    #[error("phase {phase} is blocked: {}", issues.join("; "))]
    Blocked { phase: u32, issues: Vec<String> },

    #[error("phase directory {} does not exist: run 'phasegate start {phase}' first", path.display())]
    MissingPhaseDir { phase: u32, path: PathBuf },

    #[error("corrupt manifest {}: {source}", path.display())]
    CorruptManifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("git not found on PATH")]
    GitNotFound,

    #[error("git {command} failed: {message}")]
    Vcs { command: String, message: String },

    #[error(transparent)]
    Transcript(#[from] claude_transcript::TranscriptError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Walk(#[from] walkdir::Error),
}

pub type Result<T> = std::result::Result<T, GateError>;
