pub mod checkpoint;
pub mod commit;
pub mod complete;
pub mod init;
pub mod log;
pub mod start;
pub mod status;
pub mod validate;

use claude_transcript::{
    ClaudeProjects, Disabled, TranscriptError, TranscriptLookup, TranscriptSource,
};
use phasegate_core::{project::Project, vcs::Git};

/// Transcript reader for this project, honoring the `transcripts` config.
pub fn transcript_source(project: &Project) -> Box<dyn TranscriptSource> {
    let settings = &project.config().transcripts;
    if !settings.enabled {
        return Box::new(Disabled);
    }
    // The Claude CLI keys projects by absolute path.
    let root = std::fs::canonicalize(project.root()).unwrap_or_else(|_| project.root().into());
    match &settings.projects_dir {
        Some(dir) => Box::new(ClaudeProjects::new(dir, root)),
        None => match ClaudeProjects::from_home(root) {
            Ok(source) => Box::new(source),
            Err(e) => {
                tracing::warn!(error = %e, "claude projects directory unavailable");
                Box::new(HomeMissing)
            }
        },
    }
}

pub fn git(project: &Project) -> Git {
    Git::new(project.root())
}

/// Reports the missing home directory at snapshot time, so it surfaces as a
/// completion warning rather than aborting the command.
struct HomeMissing;

impl TranscriptSource for HomeMissing {
    fn latest(&self) -> claude_transcript::Result<TranscriptLookup> {
        Err(TranscriptError::HomeNotFound)
    }
}
