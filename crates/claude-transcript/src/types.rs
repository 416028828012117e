use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ─── Sessions index ───────────────────────────────────────────────────────

/// `sessions-index.json` as written by the Claude CLI.
///
/// Only the fields needed to pick a session are modelled; everything else
/// in the file is ignored.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SessionsIndex {
    #[serde(default)]
    pub entries: Vec<SessionEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEntry {
    pub session_id: String,
    pub full_path: PathBuf,
    /// Modification time in epoch milliseconds. Missing entries sort oldest.
    #[serde(default)]
    pub file_mtime: f64,
}

impl SessionsIndex {
    /// The entry with the greatest `fileMtime`. Ties keep the earlier entry.
    pub fn newest(&self) -> Option<&SessionEntry> {
        let mut best: Option<&SessionEntry> = None;
        for entry in &self.entries {
            match best {
                Some(b) if entry.file_mtime <= b.file_mtime => {}
                _ => best = Some(entry),
            }
        }
        best
    }
}

// ─── Raw JSONL lines ──────────────────────────────────────────────────────

/// One line of a session JSONL file. Lines of any `type` parse; callers keep
/// only `user` and `assistant`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawLine {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub timestamp: Option<RawTimestamp>,
    #[serde(default)]
    pub message: Option<RawMessage>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawTimestamp {
    Millis(i64),
    Float(f64),
    Text(String),
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<RawContent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawContent {
    Text(String),
    Blocks(Vec<RawBlock>),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawBlock {
    Plain(String),
    Typed(ContentBlock),
    Other(serde::de::IgnoredAny),
}

/// Content block inside a message, discriminated by `"type"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ContentBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    ToolUse {
        #[serde(default = "unknown_tool")]
        name: String,
    },
    ToolResult,
    #[serde(other)]
    Unknown,
}

fn unknown_tool() -> String {
    "unknown".to_string()
}

impl RawTimestamp {
    pub(crate) fn resolve(&self) -> MessageTime {
        match self {
            RawTimestamp::Millis(ms) => DateTime::from_timestamp_millis(*ms)
                .map(MessageTime::At)
                .unwrap_or_else(|| MessageTime::Raw(ms.to_string())),
            RawTimestamp::Float(ms) => DateTime::from_timestamp_millis(*ms as i64)
                .map(MessageTime::At)
                .unwrap_or_else(|| MessageTime::Raw(ms.to_string())),
            RawTimestamp::Text(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| MessageTime::At(dt.with_timezone(&Utc)))
                .unwrap_or_else(|_| MessageTime::Raw(s.clone())),
        }
    }
}

impl RawContent {
    /// Flatten to display text: text blocks verbatim, tool traffic as markers.
    pub(crate) fn flatten(&self) -> String {
        match self {
            RawContent::Text(s) => s.clone(),
            RawContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|b| match b {
                    RawBlock::Plain(s) => Some(s.clone()),
                    RawBlock::Typed(ContentBlock::Text { text }) => Some(text.clone()),
                    RawBlock::Typed(ContentBlock::ToolUse { name }) => {
                        Some(format!("[Tool call: {name}]"))
                    }
                    RawBlock::Typed(ContentBlock::ToolResult) => {
                        Some("[Tool result received]".to_string())
                    }
                    RawBlock::Typed(ContentBlock::Unknown) | RawBlock::Other(_) => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
            RawContent::Other(serde_json::Value::Null) => String::new(),
            RawContent::Other(v) => v.to_string(),
        }
    }
}

// ─── Public transcript model ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When a message was recorded. Unparseable timestamps are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MessageTime {
    At(DateTime<Utc>),
    Raw(String),
    Unknown,
}

impl fmt::Display for MessageTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageTime::At(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S UTC")),
            MessageTime::Raw(s) => f.write_str(s),
            MessageTime::Unknown => f.write_str("unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub role: Role,
    pub timestamp: MessageTime,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub session_id: String,
    pub source: PathBuf,
    pub messages: Vec<TranscriptMessage>,
}

/// Why no transcript could be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingReason {
    ProjectDirNotFound(PathBuf),
    NoSessionIndex,
    NoSessions,
    SessionFileNotFound(PathBuf),
    Disabled,
}

impl fmt::Display for MissingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingReason::ProjectDirNotFound(_) => f.write_str("No conversation data found."),
            MissingReason::NoSessionIndex => f.write_str("No session index found."),
            MissingReason::NoSessions => f.write_str("No sessions found."),
            MissingReason::SessionFileNotFound(_) => f.write_str("Session file not found."),
            MissingReason::Disabled => f.write_str("Transcript capture is disabled."),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptLookup {
    Found(Transcript),
    Missing(MissingReason),
}
