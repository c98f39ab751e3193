//! Repository reconciliation.
//!
//! `flo sync` walks the service map in category order and brings each
//! working tree up to date without ever risking local work: clone what is
//! missing, fast-forward what is safely behind, skip whatever has
//! uncommitted changes or unpushed commits. The cache is not built from
//! source; its row reports liveness instead. Services are processed one at
//! a time so the report reads in a stable order and git never contends
//! with itself.

use crate::control::UnitControl;
use crate::error::{Error, Result};
use crate::probe;
use crate::registry::{Registry, ServiceKind};
use crate::repo::{self, GitOps, RepoStatus};
use crate::store::{expand_home, Options, ServiceEntry, ServiceMap};
use std::fmt;
use tokio_util::sync::CancellationToken;

/// What happened to one service during a sync pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Cloned,
    Updated,
    UpToDate,
    Skipped,
    Error,
}

impl SyncOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncOutcome::Cloned => "cloned",
            SyncOutcome::Updated => "updated",
            SyncOutcome::UpToDate => "up to date",
            SyncOutcome::Skipped => "skipped",
            SyncOutcome::Error => "error",
        }
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the sync report.
#[derive(Debug, Clone)]
pub struct SyncRow {
    pub service_id: String,
    pub outcome: SyncOutcome,
    pub reason: String,
}

/// Full report of a sync pass. Every selected service gets exactly one row,
/// whatever happened to its siblings.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub rows: Vec<SyncRow>,
}

impl SyncReport {
    pub fn count(&self, outcome: SyncOutcome) -> usize {
        self.rows.iter().filter(|r| r.outcome == outcome).count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(SyncOutcome::Error) > 0
    }

    /// `Err` exactly when at least one row failed. Skips are not failures.
    pub fn as_result(&self) -> Result<()> {
        let failed = self.count(SyncOutcome::Error);
        if failed == 0 {
            Ok(())
        } else {
            Err(Error::SyncFailed {
                failed,
                total: self.rows.len(),
            })
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} cloned, {} updated, {} up to date, {} skipped, {} failed",
            self.count(SyncOutcome::Cloned),
            self.count(SyncOutcome::Updated),
            self.count(SyncOutcome::UpToDate),
            self.count(SyncOutcome::Skipped),
            self.count(SyncOutcome::Error),
        )
    }
}

/// The action a sync pass takes for one analyzed working tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDecision {
    /// No working tree yet.
    Clone,
    /// Clean, behind the remote, nothing unpushed.
    Pull,
    /// Clean and not behind.
    AlreadyCurrent,
    /// Local state makes pulling unsafe.
    Skip(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UncommittedChanges,
    UnpushedCommits,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::UncommittedChanges => "uncommitted changes",
            SkipReason::UnpushedCommits => "unpushed commits",
        }
    }
}

/// Pure decision table over a repository snapshot.
///
/// Uncommitted changes win over unpushed commits when both apply, and a
/// pull happens only when [`RepoStatus::can_safely_pull`] holds.
pub fn decide(status: &RepoStatus) -> SyncDecision {
    if !status.exists {
        return SyncDecision::Clone;
    }
    if status.has_uncommitted {
        return SyncDecision::Skip(SkipReason::UncommittedChanges);
    }
    if status.ahead_of_remote {
        return SyncDecision::Skip(SkipReason::UnpushedCommits);
    }
    if status.behind_remote && status.can_safely_pull() {
        return SyncDecision::Pull;
    }
    SyncDecision::AlreadyCurrent
}

/// Walks the service map and reconciles every selected working tree.
pub struct Synchronizer<'a> {
    git: &'a dyn GitOps,
    units: &'a dyn UnitControl,
    registry: &'a Registry,
    options: &'a Options,
    cancel: CancellationToken,
}

impl<'a> Synchronizer<'a> {
    pub fn new(
        git: &'a dyn GitOps,
        units: &'a dyn UnitControl,
        registry: &'a Registry,
        options: &'a Options,
    ) -> Self {
        Synchronizer {
            git,
            units,
            registry,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Installs a token that stops the pass between services.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Reconciles every entry matching `selection` (empty selects all), one
    /// at a time, in category order. Always returns a complete report:
    /// per-service failures become rows, never early exits.
    pub async fn run(&self, map: &ServiceMap, selection: &[String]) -> SyncReport {
        let mut report = SyncReport::default();
        for (kind, entry) in map.iter_ordered() {
            if !self.selected(selection, entry) {
                continue;
            }
            if self.cancel.is_cancelled() {
                tracing::warn!("sync cancelled before {}", entry.id);
                report.rows.push(SyncRow {
                    service_id: entry.id.clone(),
                    outcome: SyncOutcome::Skipped,
                    reason: "cancelled".to_string(),
                });
                continue;
            }
            let row = match kind {
                ServiceKind::Os => self.check_cache(entry).await,
                _ => self.sync_repo(entry).await,
            };
            tracing::info!("{}: {} ({})", row.service_id, row.outcome, row.reason);
            report.rows.push(row);
        }
        report
    }

    fn selected(&self, selection: &[String], entry: &ServiceEntry) -> bool {
        if selection.is_empty() {
            return true;
        }
        selection.iter().any(|name| {
            name == &entry.id
                || self
                    .registry
                    .find(name)
                    .map(|def| def.id == entry.id)
                    .unwrap_or(false)
        })
    }

    async fn sync_repo(&self, entry: &ServiceEntry) -> SyncRow {
        let row = |outcome, reason: String| SyncRow {
            service_id: entry.id.clone(),
            outcome,
            reason,
        };

        if entry.repo.is_empty() {
            return row(SyncOutcome::Skipped, "no repository configured".to_string());
        }

        let source = if !entry.source.is_empty() {
            entry.source.clone()
        } else {
            self.registry
                .by_id(&entry.id)
                .map(|def| def.source_path.to_string())
                .unwrap_or_default()
        };
        if source.is_empty() {
            return row(SyncOutcome::Error, "no source path configured".to_string());
        }
        let path = expand_home(&source);

        let status = match repo::analyze(self.git, &path).await {
            Ok(status) => status,
            Err(e) => return row(SyncOutcome::Error, e.to_string()),
        };

        match decide(&status) {
            SyncDecision::Clone => match self.git.clone_repo(&entry.repo, &path).await {
                Ok(()) => row(SyncOutcome::Cloned, format!("cloned from {}", entry.repo)),
                Err(e) => row(SyncOutcome::Error, format!("clone failed: {}", e)),
            },
            SyncDecision::Pull => match self.git.pull_ff(&path).await {
                Ok(()) => row(SyncOutcome::Updated, "fast-forwarded".to_string()),
                Err(e) => row(SyncOutcome::Error, format!("pull failed: {}", e)),
            },
            SyncDecision::AlreadyCurrent => {
                let reason = if status.remote_refreshed {
                    "up to date".to_string()
                } else {
                    "up to date (remote unverified)".to_string()
                };
                row(SyncOutcome::UpToDate, reason)
            }
            SyncDecision::Skip(skip) => row(SyncOutcome::Skipped, skip.as_str().to_string()),
        }
    }

    /// The cache has no working tree; its sync row reports liveness. The
    /// managing unit must be active and the socket must answer a ping.
    async fn check_cache(&self, entry: &ServiceEntry) -> SyncRow {
        let row = |outcome, reason: String| SyncRow {
            service_id: entry.id.clone(),
            outcome,
            reason,
        };

        if entry.socket.is_empty() {
            return row(
                SyncOutcome::Skipped,
                "no socket endpoint configured".to_string(),
            );
        }

        if let Some(unit) = self.registry.by_id(&entry.id).and_then(|def| def.unit) {
            if !self.units.is_active(unit).await {
                return row(SyncOutcome::Error, format!("unit {} is not active", unit));
            }
        }

        match probe::ping_configured(self.options, entry, probe::PROBE_TIMEOUT).await {
            Ok(()) => row(SyncOutcome::UpToDate, "cache alive".to_string()),
            Err(e) => row(SyncOutcome::Error, format!("cache ping failed: {}", e)),
        }
    }
}
