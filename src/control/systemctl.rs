//! systemd collaborator.
//!
//! Wraps `systemctl` invocations behind the [`UnitControl`] trait so the
//! fan-out logic (and its tests) never depends on a real systemd.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::fmt;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Timeout for a state-changing `systemctl` call. Units with slow stop jobs
/// can legitimately take a while.
const CONTROL_TIMEOUT: Duration = Duration::from_secs(30);
/// Timeout for a read-only query.
const QUERY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Start,
    Stop,
    Restart,
}

impl ControlAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ControlAction::Start => "start",
            ControlAction::Stop => "stop",
            ControlAction::Restart => "restart",
        }
    }

    /// Past tense, for report lines.
    pub fn past_tense(self) -> &'static str {
        match self {
            ControlAction::Start => "started",
            ControlAction::Stop => "stopped",
            ControlAction::Restart => "restarted",
        }
    }
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process-control operations the lifecycle fan-out depends on.
#[async_trait]
pub trait UnitControl: Send + Sync {
    /// Applies one action to one unit.
    async fn control(&self, action: ControlAction, unit: &str) -> Result<()>;

    /// Whether the unit is currently active. Query failures count as
    /// inactive.
    async fn is_active(&self, unit: &str) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Systemctl;

impl Systemctl {
    pub fn new() -> Self {
        Systemctl
    }

    async fn run(&self, args: &[&str], limit: Duration) -> Result<Output> {
        let mut command = Command::new("systemctl");
        command.args(args);

        let spelled = format!("systemctl {}", args.join(" "));
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
}

#[async_trait]
impl UnitControl for Systemctl {
    async fn control(&self, action: ControlAction, unit: &str) -> Result<()> {
        let output = self.run(&[action.as_str(), unit], CONTROL_TIMEOUT).await?;
        if output.status.success() {
            Ok(())
        } else {
            // systemctl writes its reason to stderr.
            Err(Error::CommandFailed {
                command: format!("systemctl {} {}", action, unit),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    async fn is_active(&self, unit: &str) -> bool {
        match self.run(&["is-active", unit], QUERY_TIMEOUT).await {
            Ok(output) => {
                output.status.success()
                    && String::from_utf8_lossy(&output.stdout).trim() == "active"
            }
            Err(e) => {
                tracing::debug!("is-active {} failed: {}", unit, e);
                false
            }
        }
    }
}
