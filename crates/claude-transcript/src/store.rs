use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::types::{
    MessageTime, MissingReason, RawLine, Role, SessionsIndex, Transcript, TranscriptLookup,
    TranscriptMessage,
};
use crate::{Result, TranscriptError, TranscriptSource};

pub const SESSIONS_INDEX: &str = "sessions-index.json";

// ─── ClaudeProjects ───────────────────────────────────────────────────────

/// Reads sessions the Claude CLI recorded for one project.
///
/// The CLI keys each project by its absolute path with every `/` replaced
/// by `-`, so `/home/me/proj` lives at `<projects_dir>/-home-me-proj/`.
pub struct ClaudeProjects {
    projects_dir: PathBuf,
    project_root: PathBuf,
}

impl ClaudeProjects {
    pub fn new(projects_dir: impl Into<PathBuf>, project_root: impl Into<PathBuf>) -> Self {
        ClaudeProjects {
            projects_dir: projects_dir.into(),
            project_root: project_root.into(),
        }
    }

    /// Use `~/.claude/projects` as the projects directory.
    pub fn from_home(project_root: impl Into<PathBuf>) -> Result<Self> {
        let home = home::home_dir().ok_or(TranscriptError::HomeNotFound)?;
        Ok(Self::new(home.join(".claude").join("projects"), project_root))
    }

    pub fn project_dir(&self) -> PathBuf {
        self.projects_dir.join(encode_project_path(&self.project_root))
    }
}

impl TranscriptSource for ClaudeProjects {
    fn latest(&self) -> Result<TranscriptLookup> {
        let dir = self.project_dir();
        if !dir.is_dir() {
            tracing::debug!(dir = %dir.display(), "no claude project directory");
            return Ok(TranscriptLookup::Missing(MissingReason::ProjectDirNotFound(dir)));
        }

        let index_path = dir.join(SESSIONS_INDEX);
        if !index_path.exists() {
            return Ok(TranscriptLookup::Missing(MissingReason::NoSessionIndex));
        }
        let data = std::fs::read_to_string(&index_path)?;
        let index: SessionsIndex =
            serde_json::from_str(&data).map_err(|source| TranscriptError::Index {
                path: index_path.clone(),
                source,
            })?;

        let Some(entry) = index.newest() else {
            return Ok(TranscriptLookup::Missing(MissingReason::NoSessions));
        };
        if !entry.full_path.exists() {
            return Ok(TranscriptLookup::Missing(
                MissingReason::SessionFileNotFound(entry.full_path.clone()),
            ));
        }

        let file = std::fs::File::open(&entry.full_path)?;
        let messages = parse_session(std::io::BufReader::new(file))?;
        tracing::debug!(
            session = %entry.session_id,
            messages = messages.len(),
            "loaded claude session"
        );
        Ok(TranscriptLookup::Found(Transcript {
            session_id: entry.session_id.clone(),
            source: entry.full_path.clone(),
            messages,
        }))
    }
}

// ─── Disabled ─────────────────────────────────────────────────────────────

/// Source used when transcript capture is switched off.
pub struct Disabled;

impl TranscriptSource for Disabled {
    fn latest(&self) -> Result<TranscriptLookup> {
        Ok(TranscriptLookup::Missing(MissingReason::Disabled))
    }
}

/// Encode a project root the way the Claude CLI names its project folders.
pub fn encode_project_path(root: &Path) -> String {
    root.to_string_lossy().replace(['/', '\\'], "-")
}

/// Parse a session JSONL stream into user/assistant messages.
///
/// Lines that are not valid UTF-8 JSON, or that belong to other message
/// types (`system`, `summary`, ...), are skipped.
pub fn parse_session(reader: impl BufRead) -> Result<Vec<TranscriptMessage>> {
    let mut messages = Vec::new();
    for (lineno, line) in reader.split(b'\n').enumerate() {
        let line = line?;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let raw: RawLine = match serde_json::from_slice(&line) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(line = lineno + 1, error = %e, "skipping unparseable session line");
                continue;
            }
        };
        let Some(kind) = raw.kind.as_deref().and_then(Role::parse) else {
            continue;
        };

        let role = raw
            .message
            .as_ref()
            .and_then(|m| m.role.as_deref())
            .and_then(Role::parse)
            .unwrap_or(kind);
        let timestamp = raw
            .timestamp
            .as_ref()
            .map(|t| t.resolve())
            .unwrap_or(MessageTime::Unknown);
        let content = raw
            .message
            .as_ref()
            .and_then(|m| m.content.as_ref())
            .map(|c| c.flatten())
            .unwrap_or_default();

        messages.push(TranscriptMessage {
            role,
            timestamp,
            content,
        });
    }
    Ok(messages)
}
