//! Concurrent lifecycle control.
//!
//! Start/stop/restart fan out over all targeted units at once and wait for
//! the whole group. Each task produces a typed outcome; nothing panics
//! across the join and one failed unit never aborts its siblings. The
//! caller renders every outcome, then [`aggregate`] folds the failures
//! into a single error.

mod systemctl;

pub use systemctl::{ControlAction, Systemctl, UnitControl};

use crate::error::{Error, Result};
use crate::registry::ServiceDefinition;
use futures::future::join_all;

/// Result of one action applied to one unit.
#[derive(Debug, Clone)]
pub struct ControlOutcome {
    pub service_id: String,
    pub unit: String,
    pub action: ControlAction,
    /// `None` on success.
    pub error: Option<String>,
}

impl ControlOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Applies `action` to every manageable definition in `targets`,
/// concurrently. Anything else (CLI tools, host-provisioned infrastructure)
/// is filtered out, not failed. Outcomes come back in target order.
pub async fn apply(
    control: &dyn UnitControl,
    action: ControlAction,
    targets: &[&ServiceDefinition],
) -> Vec<ControlOutcome> {
    let tasks = targets
        .iter()
        .filter(|def| def.is_manageable())
        .filter_map(|def| def.unit.map(|unit| (def, unit)))
        .map(|(def, unit)| async move {
            tracing::info!("{} {}", action, unit);
            let result = control.control(action, unit).await;
            ControlOutcome {
                service_id: def.id.to_string(),
                unit: unit.to_string(),
                action,
                error: result.err().map(|e| e.to_string()),
            }
        });
    join_all(tasks).await
}

/// Collapses a batch of outcomes into one result: `Ok` when everything
/// succeeded, the lone error when exactly one unit failed, and
/// [`Error::Multiple`] otherwise.
pub fn aggregate(outcomes: &[ControlOutcome]) -> Result<()> {
    let mut failures: Vec<Error> = outcomes
        .iter()
        .filter_map(|outcome| {
            outcome.error.as_ref().map(|message| Error::ControlFailed {
                service: outcome.service_id.clone(),
                message: message.clone(),
            })
        })
        .collect();

    match failures.len() {
        0 => Ok(()),
        1 => Err(failures.remove(0)),
        _ => Err(Error::Multiple(failures)),
    }
}
