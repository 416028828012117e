use crate::error::Result;
use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

pub const LEDGER_HEADER: &str = "# Phase Ledger\n\nAppend-only log of phase transitions.\n\n";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

// ---------------------------------------------------------------------------
// LedgerAction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "detail", rename_all = "snake_case")]
pub enum LedgerAction {
    Started,
    Committed,
    Completed,
    /// Revision recorded after a review commit.
    Revision(String),
    /// Revision recorded after a completion commit.
    Locked(String),
    /// Anything this version does not recognise, kept verbatim.
    Other(String),
}

impl LedgerAction {
    fn parse(s: &str) -> LedgerAction {
        match s {
            "STARTED" => LedgerAction::Started,
            "COMMITTED (awaiting human review)" => LedgerAction::Committed,
            "COMPLETED (human approved)" => LedgerAction::Completed,
            _ => {
                if let Some(rev) = s.strip_prefix("LOCKED as git commit ") {
                    LedgerAction::Locked(rev.to_string())
                } else if let Some(rev) = s.strip_prefix("git commit ") {
                    LedgerAction::Revision(rev.to_string())
                } else {
                    LedgerAction::Other(s.to_string())
                }
            }
        }
    }
}

impl fmt::Display for LedgerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerAction::Started => f.write_str("STARTED"),
            LedgerAction::Committed => f.write_str("COMMITTED (awaiting human review)"),
            LedgerAction::Completed => f.write_str("COMPLETED (human approved)"),
            LedgerAction::Revision(rev) => write!(f, "git commit {rev}"),
            LedgerAction::Locked(rev) => write!(f, "LOCKED as git commit {rev}"),
            LedgerAction::Other(s) => f.write_str(s),
        }
    }
}

// ---------------------------------------------------------------------------
// LedgerEntry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub timestamp: DateTime<Utc>,
    pub phase: u32,
    pub phase_name: String,
    pub action: LedgerAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl LedgerEntry {
    /// New entry stamped now, at the one-second resolution the ledger stores.
    pub fn new(
        phase: u32,
        phase_name: impl Into<String>,
        action: LedgerAction,
        note: Option<&str>,
    ) -> Self {
        let note = note
            .map(|n| n.replace(['\r', '\n'], " ").trim().to_string())
            .filter(|n| !n.is_empty());
        Self {
            timestamp: Utc::now().trunc_subsecs(0),
            phase,
            phase_name: phase_name.into(),
            action,
            note,
        }
    }

    /// Parse one `- **ts** | Phase N (Name) | ACTION[ | note]` line.
    pub fn parse(line: &str) -> Option<LedgerEntry> {
        let rest = line.trim_end().strip_prefix("- **")?;
        let (ts, rest) = rest.split_once("** | ")?;
        let timestamp = NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT)
            .ok()?
            .and_utc();

        let mut parts = rest.splitn(3, " | ");
        let phase_part = parts.next()?.strip_prefix("Phase ")?;
        let action = LedgerAction::parse(parts.next()?);
        let note = parts.next().map(str::to_string);

        let (num, name) = phase_part.split_once(' ')?;
        let phase = num.parse().ok()?;
        let phase_name = name.strip_prefix('(')?.strip_suffix(')')?.to_string();

        Some(LedgerEntry {
            timestamp,
            phase,
            phase_name,
            action,
            note,
        })
    }
}

impl fmt::Display for LedgerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "- **{}** | Phase {} ({}) | {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.phase,
            self.phase_name,
            self.action
        )?;
        if let Some(note) = &self.note {
            write!(f, " | {note}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Append-only markdown audit log. Existing lines are never rewritten.
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: &LedgerEntry) -> Result<()> {
        crate::io::append_text(&self.path, LEDGER_HEADER, &format!("{entry}\n"))?;
        tracing::debug!(phase = entry.phase, action = %entry.action, "ledger entry appended");
        Ok(())
    }

    /// Every parseable entry in file order. A missing ledger has no entries.
    pub fn entries(&self) -> Result<Vec<LedgerEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&self.path)?;
        Ok(data.lines().filter_map(LedgerEntry::parse).collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
