//! `claude-transcript`: read the most recent Claude CLI session for a project.
//!
//! The Claude CLI stores one JSONL file per session under
//! `~/.claude/projects/<encoded project path>/`, together with a
//! `sessions-index.json` describing them. This crate locates that directory,
//! picks the most recently modified session, and turns its user/assistant
//! lines into a typed [`Transcript`].
//!
//! # Architecture
//!
//! ```text
//! ClaudeProjects          ← resolves ~/.claude/projects/<encoded root>
//!     │
//!     ▼
//! sessions-index.json     ← newest entry by fileMtime
//!     │
//!     ▼
//! <session>.jsonl         ← one JSON object per line, bad lines skipped
//!     │
//!     ▼
//! Transcript              ← ordered TranscriptMessage values
//! ```
//!
//! Callers depend on the [`TranscriptSource`] trait so a missing or
//! unreadable transcript can be substituted in tests.

pub mod error;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::TranscriptError;
pub use store::{encode_project_path, ClaudeProjects, Disabled};
pub use types::{
    MessageTime, MissingReason, Role, Transcript, TranscriptLookup, TranscriptMessage,
};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, TranscriptError>;

/// Anything that can produce the latest recorded session for the current project.
///
/// Absence is not an error: implementations return
/// [`TranscriptLookup::Missing`] when there is simply nothing to read, and
/// reserve `Err` for data that exists but cannot be read.
pub trait TranscriptSource {
    fn latest(&self) -> Result<TranscriptLookup>;
}
