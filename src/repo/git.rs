//! Thin wrapper around the git CLI.
//!
//! Every operation is a single `git` invocation guarded by a timeout.
//! Nothing here interprets repository state; that is the analyzer's job.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Timeout for local state queries.
const QUERY_TIMEOUT: Duration = Duration::from_secs(10);
/// Timeout for operations that talk to the remote.
const REMOTE_TIMEOUT: Duration = Duration::from_secs(120);

/// Git operations the synchronizer depends on.
///
/// The production implementation shells out to `git`; tests substitute
/// scripted fakes.
#[async_trait]
pub trait GitOps: Send + Sync {
    async fn current_branch(&self, dir: &Path) -> Result<String>;

    /// True when `git status --porcelain` reports nothing.
    async fn is_clean(&self, dir: &Path) -> Result<bool>;

    /// Refreshes remote tracking refs.
    async fn fetch(&self, dir: &Path) -> Result<()>;

    /// Commits on the local branch that the upstream lacks.
    async fn ahead_count(&self, dir: &Path) -> Result<u64>;

    /// Commits on the upstream that the local branch lacks.
    async fn behind_count(&self, dir: &Path) -> Result<u64>;

    async fn clone_repo(&self, url: &str, dest: &Path) -> Result<()>;

    /// Fast-forward pull. Never merges.
    async fn pull_ff(&self, dir: &Path) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GitCli;

impl GitCli {
    pub fn new() -> Self {
        GitCli
    }

    async fn run(&self, dir: Option<&Path>, args: &[&str], limit: Duration) -> Result<Output> {
        let mut command = Command::new("git");
        if let Some(dir) = dir {
            command.current_dir(dir);
        }
        command.args(args);

        let spelled = format!("git {}", args.join(" "));
        tracing::debug!("running {}", spelled);
        match timeout(limit, command.output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(Error::CommandFailed {
                command: spelled,
                detail: e.to_string(),
            }),
            Err(_) => Err(Error::CommandFailed {
                command: spelled,
                detail: format!("timed out after {}s", limit.as_secs()),
            }),
        }
    }

    async fn run_checked(
        &self,
        dir: Option<&Path>,
        args: &[&str],
        limit: Duration,
    ) -> Result<Output> {
        let output = self.run(dir, args, limit).await?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(Error::CommandFailed {
                command: format!("git {}", args.join(" ")),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    async fn stdout_line(&self, dir: &Path, args: &[&str]) -> Result<String> {
        let output = self.run_checked(Some(dir), args, QUERY_TIMEOUT).await?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn rev_count(&self, dir: &Path, range: &str) -> Result<u64> {
        let line = self.stdout_line(dir, &["rev-list", "--count", range]).await?;
        line.parse().map_err(|_| Error::CommandFailed {
            command: "git rev-list".to_string(),
            detail: format!("unexpected output '{}'", line),
        })
    }
}

#[async_trait]
impl GitOps for GitCli {
    async fn current_branch(&self, dir: &Path) -> Result<String> {
        self.stdout_line(dir, &["rev-parse", "--abbrev-ref", "HEAD"])
            .await
    }

    async fn is_clean(&self, dir: &Path) -> Result<bool> {
        let output = self
            .run_checked(Some(dir), &["status", "--porcelain"], QUERY_TIMEOUT)
            .await?;
        Ok(output.stdout.iter().all(|b| b.is_ascii_whitespace()))
    }

    async fn fetch(&self, dir: &Path) -> Result<()> {
        self.run_checked(Some(dir), &["fetch", "--quiet"], REMOTE_TIMEOUT)
            .await
            .map(|_| ())
    }

    async fn ahead_count(&self, dir: &Path) -> Result<u64> {
        self.rev_count(dir, "@{u}..HEAD").await
    }

    async fn behind_count(&self, dir: &Path) -> Result<u64> {
        self.rev_count(dir, "HEAD..@{u}").await
    }

    async fn clone_repo(&self, url: &str, dest: &Path) -> Result<()> {
        let dest = dest.to_string_lossy().into_owned();
        self.run_checked(None, &["clone", url, &dest], REMOTE_TIMEOUT)
            .await
            .map(|_| ())
    }

    async fn pull_ff(&self, dir: &Path) -> Result<()> {
        self.run_checked(Some(dir), &["pull", "--ff-only"], REMOTE_TIMEOUT)
            .await
            .map(|_| ())
    }
}
