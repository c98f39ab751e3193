//! Repository state analysis.
//!
//! [`analyze`] turns a working tree into a [`RepoStatus`] snapshot that the
//! synchronizer can reason about without touching git again. A failed fetch
//! is not fatal: the snapshot is then built from possibly stale tracking
//! refs and marked `remote_refreshed: false`, and the ahead/behind flags
//! stay conservative.

mod git;

pub use git::{GitCli, GitOps};

use crate::error::{Error, Result};
use std::path::Path;

/// Snapshot of one working tree at analysis time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoStatus {
    /// The working tree exists on disk.
    pub exists: bool,
    /// Currently checked-out branch, when it could be determined.
    pub branch: Option<String>,
    /// No uncommitted changes (staged or unstaged).
    pub is_clean: bool,
    pub has_uncommitted: bool,
    /// Local commits the upstream does not have.
    pub ahead_of_remote: bool,
    /// Upstream commits the local branch does not have.
    pub behind_remote: bool,
    /// Whether the tracking refs were refreshed from the remote just now.
    pub remote_refreshed: bool,
}

impl RepoStatus {
    pub fn absent() -> Self {
        RepoStatus::default()
    }

    /// A pull cannot lose work: the tree is clean and has nothing unpushed.
    pub fn can_safely_pull(&self) -> bool {
        self.is_clean && !self.ahead_of_remote
    }
}

/// Inspects the working tree at `path` and reports its state.
///
/// A missing directory yields `RepoStatus::absent()`. A directory that
/// exists but is not a git repository is an error; the caller decides how
/// to surface it.
pub async fn analyze(git: &dyn GitOps, path: &Path) -> Result<RepoStatus> {
    if !path.exists() {
        return Ok(RepoStatus::absent());
    }
    if !path.join(".git").exists() {
        return Err(Error::InvalidRepository(path.to_path_buf()));
    }

    let branch = match git.current_branch(path).await {
        Ok(branch) => Some(branch),
        Err(e) => {
            tracing::debug!("branch lookup failed for {}: {}", path.display(), e);
            None
        }
    };

    let is_clean = git.is_clean(path).await?;

    let remote_refreshed = match git.fetch(path).await {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!("fetch failed for {}: {}", path.display(), e);
            false
        }
    };

    // Tracking-ref comparisons can fail on branches without an upstream;
    // treat that as neither ahead nor behind.
    let ahead_of_remote = git.ahead_count(path).await.map(|n| n > 0).unwrap_or(false);
    let behind_remote = git.behind_count(path).await.map(|n| n > 0).unwrap_or(false);

    Ok(RepoStatus {
        exists: true,
        branch,
        is_clean,
        has_uncommitted: !is_clean,
        ahead_of_remote,
        behind_remote,
        remote_refreshed,
    })
}
