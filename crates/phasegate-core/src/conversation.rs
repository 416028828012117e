//! Snapshot of the assistant conversation that produced a phase.
//!
//! The snapshot is evidence, not state: it is written into the phase
//! directory on completion but excluded from hashing, and any failure to
//! obtain it degrades to a placeholder document plus a warning.

use crate::config::PhaseDefinition;
use crate::project::Project;
use chrono::{DateTime, SecondsFormat, Utc};
use claude_transcript::{Transcript, TranscriptLookup, TranscriptSource};
use serde::Serialize;
use std::path::PathBuf;

const TRUNCATION_MARKER: &str = "\n\n[... truncated ...]";

#[derive(Debug, Clone, Serialize)]
pub struct ConversationSnapshot {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub messages: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Render a transcript as the markdown conversation log.
pub fn render_transcript(
    transcript: &Transcript,
    max_chars: usize,
    extracted_at: DateTime<Utc>,
) -> String {
    let mut out = String::from("# Conversation Log\n\n");
    out.push_str(&format!(
        "Extracted: {}\n",
        extracted_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    ));
    out.push_str(&format!("Session: {}\n\n", transcript.session_id));
    for msg in &transcript.messages {
        out.push_str(&format!(
            "---\n### {} ({})\n\n",
            msg.role.as_str().to_uppercase(),
            msg.timestamp
        ));
        out.push_str(&truncate_chars(&msg.content, max_chars));
        out.push_str("\n\n");
    }
    out
}

pub fn render_placeholder(reason: &str) -> String {
    format!("# Conversation Log\n\n{reason}\n")
}

/// Cut `text` to `max_chars` characters, marking the cut.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}{TRUNCATION_MARKER}", &text[..idx]),
        None => text.to_string(),
    }
}

/// Write `conversation_log.md` for `phase`. Never fails; problems come back
/// as warnings and a placeholder is written instead.
pub fn snapshot(
    project: &Project,
    phase: &PhaseDefinition,
    source: &dyn TranscriptSource,
) -> ConversationSnapshot {
    let path = project.conversation_log_path(phase);
    let mut warnings = Vec::new();
    let mut session_id = None;
    let mut messages = 0;

    let body = match source.latest() {
        Ok(TranscriptLookup::Found(transcript)) => {
            session_id = Some(transcript.session_id.clone());
            messages = transcript.messages.len();
            render_transcript(
                &transcript,
                project.config().transcripts.max_message_chars,
                Utc::now(),
            )
        }
        Ok(TranscriptLookup::Missing(reason)) => {
            warnings.push(format!("No conversation transcript captured: {reason}"));
            render_placeholder(&reason.to_string())
        }
        Err(e) => {
            tracing::warn!(error = %e, "transcript could not be read");
            warnings.push(format!("Conversation transcript could not be read: {e}"));
            render_placeholder("Conversation data could not be read.")
        }
    };

    if let Err(e) = crate::io::atomic_write(&path, body.as_bytes()) {
        tracing::warn!(path = %path.display(), error = %e, "conversation log not written");
        warnings.push(format!("Conversation log not written: {e}"));
    } else {
        tracing::info!(phase = phase.number, messages, "conversation log saved");
    }

    ConversationSnapshot {
        path,
        session_id,
        messages,
        warnings,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
