use crate::error::{GateError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// File and directory constants
// ---------------------------------------------------------------------------

pub const CONFIG_DIR: &str = ".phasegate";
pub const CONFIG_FILE: &str = ".phasegate/config.yaml";

pub const MANIFEST_FILE: &str = "MANIFEST.json";
pub const CONVERSATION_LOG: &str = "conversation_log.md";
pub const STATE_LABEL_FILE: &str = "PHASE_STATE.yaml";

pub const DEFAULT_LEDGER_FILE: &str = "LEDGER.md";
pub const DEFAULT_STATUS_FILE: &str = "STATUS.md";
pub const DEFAULT_REVIEW_ARTIFACT: &str = "GATE.md";

/// Files the gate itself writes into a phase directory. They are never part
/// of a phase's hashed outputs: writing the manifest must not change the
/// hashes it records.
pub const GENERATED_FILES: &[&str] = &[MANIFEST_FILE, CONVERSATION_LOG, STATE_LABEL_FILE];

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn phase_dir(root: &Path, dir: &str) -> PathBuf {
    root.join(dir)
}

pub fn manifest_path(root: &Path, dir: &str) -> PathBuf {
    phase_dir(root, dir).join(MANIFEST_FILE)
}

pub fn conversation_log_path(root: &Path, dir: &str) -> PathBuf {
    phase_dir(root, dir).join(CONVERSATION_LOG)
}

pub fn state_label_path(root: &Path, dir: &str) -> PathBuf {
    phase_dir(root, dir).join(STATE_LABEL_FILE)
}

pub fn is_generated(file_name: &str) -> bool {
    GENERATED_FILES.contains(&file_name)
}

// ---------------------------------------------------------------------------
// Phase directory validation
// ---------------------------------------------------------------------------

static SEGMENT_RE: OnceLock<Regex> = OnceLock::new();

fn segment_re() -> &'static Regex {
    SEGMENT_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9._-]+$").unwrap())
}

/// A phase directory (or any project-relative path the gate writes, such as
/// the ledger) must stay inside the project root: relative, `/` separated,
/// no `.` or `..` segments.
pub fn validate_phase_dir(dir: &str) -> Result<()> {
    let ok = !dir.is_empty()
        && dir.len() <= 128
        && dir
            .split('/')
            .all(|seg| seg != "." && seg != ".." && segment_re().is_match(seg));
    if !ok {
        return Err(GateError::InvalidPhaseDir(dir.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
