use crate::error::{GateError, Result};
use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::process::Command;

// ---------------------------------------------------------------------------
// VersionControl
// ---------------------------------------------------------------------------

/// The narrow slice of version control the gate needs.
pub trait VersionControl {
    /// Stage every change in the working tree, including deletions.
    fn stage_all(&self) -> Result<()>;
    /// Commit the staged changes and return the new short revision id.
    fn commit(&self, message: &str) -> Result<String>;
    fn current_revision(&self) -> Result<String>;
    /// Whether anything is staged or modified.
    fn has_changes(&self) -> Result<bool>;
    /// Create or move `name` to the current revision.
    fn tag(&self, name: &str) -> Result<()>;
}

/// Stage everything and commit it.
pub fn commit_all(vcs: &dyn VersionControl, message: &str) -> Result<String> {
    vcs.stage_all()?;
    vcs.commit(message)
}

// ---------------------------------------------------------------------------
// Git
// ---------------------------------------------------------------------------

/// Shells out to the `git` binary found on PATH, never prompting.
pub struct Git {
    root: PathBuf,
}

impl Git {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let bin = which::which("git").map_err(|_| GateError::GitNotFound)?;
        let output = Command::new(bin)
            .args(args)
            .current_dir(&self.root)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("GIT_EDITOR", "true")
            .output()?;
        let command = args.first().copied().unwrap_or_default().to_string();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
            let message = if stderr.is_empty() { stdout } else { stderr };
            tracing::debug!(%command, %message, "git failed");
            return Err(GateError::Vcs { command, message });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl VersionControl for Git {
    fn stage_all(&self) -> Result<()> {
        self.run(&["add", "-A"]).map(|_| ())
    }

    fn commit(&self, message: &str) -> Result<String> {
        self.run(&["commit", "-m", message])?;
        let rev = self.current_revision()?;
        tracing::info!(revision = %rev, "git commit created");
        Ok(rev)
    }

    fn current_revision(&self) -> Result<String> {
        self.run(&["rev-parse", "--short", "HEAD"])
    }

    fn has_changes(&self) -> Result<bool> {
        Ok(!self.run(&["status", "--porcelain"])?.is_empty())
    }

    fn tag(&self, name: &str) -> Result<()> {
        self.run(&["tag", "-f", name]).map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// InMemoryVcs
// ---------------------------------------------------------------------------

/// Records commits and tags in memory. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemoryVcs {
    commits: RefCell<Vec<String>>,
    tags: RefCell<Vec<(String, String)>>,
    dirty: Cell<bool>,
    fail: bool,
}

impl InMemoryVcs {
    pub fn new() -> Self {
        Self {
            dirty: Cell::new(true),
            ..Self::default()
        }
    }

    /// Every operation fails as if git were missing.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn set_dirty(&self, dirty: bool) {
        self.dirty.set(dirty);
    }

    pub fn commits(&self) -> Vec<String> {
        self.commits.borrow().clone()
    }

    /// `(tag, revision)` pairs, one per tag name.
    pub fn tags(&self) -> Vec<(String, String)> {
        self.tags.borrow().clone()
    }

    fn check(&self) -> Result<()> {
        if self.fail {
            return Err(GateError::GitNotFound);
        }
        Ok(())
    }

    fn revision_for(index: usize) -> String {
        format!("{:07x}", 0xabc0000 + index)
    }
}

impl VersionControl for InMemoryVcs {
    fn stage_all(&self) -> Result<()> {
        self.check()
    }

    fn commit(&self, message: &str) -> Result<String> {
        self.check()?;
        if !self.dirty.get() {
            return Err(GateError::Vcs {
                command: "commit".into(),
                message: "nothing to commit, working tree clean".into(),
            });
        }
        let mut commits = self.commits.borrow_mut();
        commits.push(message.to_string());
        Ok(Self::revision_for(commits.len()))
    }

    fn current_revision(&self) -> Result<String> {
        self.check()?;
        let count = self.commits.borrow().len();
        if count == 0 {
            return Err(GateError::Vcs {
                command: "rev-parse".into(),
                message: "HEAD has no commits".into(),
            });
        }
        Ok(Self::revision_for(count))
    }

    fn has_changes(&self) -> Result<bool> {
        self.check()?;
        Ok(self.dirty.get())
    }

    fn tag(&self, name: &str) -> Result<()> {
        let rev = self.current_revision()?;
        let mut tags = self.tags.borrow_mut();
        tags.retain(|(t, _)| t != name);
        tags.push((name.to_string(), rev));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
